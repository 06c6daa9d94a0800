use district_siege_core::{District, DistrictId, Perimeter};
use district_siege_system_defeat_tracking::{DefeatTracker, KillOutcome};
use glam::Vec3;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn districts() -> Vec<District> {
    (0..3)
        .map(|index| {
            District::new(
                DistrictId::new(index),
                format!("District {index}"),
                Vec3::new(index as f32 * 30.0, 0.0, 0.0),
                Perimeter::new(-5.0, -5.0, 5.0, 5.0),
                4,
            )
        })
        .collect()
}

#[test]
fn clearing_requires_full_allotment() {
    let mut tracker = DefeatTracker::new(&districts());
    let district = DistrictId::new(0);

    for _ in 0..3 {
        assert!(tracker.record_spawn(district));
    }
    for _ in 0..3 {
        assert_eq!(
            tracker.record_kill(district),
            KillOutcome::Counted { district }
        );
    }
    assert!(
        !tracker.is_district_cleared(district),
        "three of four enemies is not a clear"
    );

    assert!(tracker.record_spawn(district));
    assert_eq!(
        tracker.record_kill(district),
        KillOutcome::DistrictCleared { district }
    );
    assert!(tracker.is_district_cleared(district));
}

#[test]
fn spawns_beyond_the_cap_are_refused() {
    let mut tracker = DefeatTracker::new(&districts());
    let district = DistrictId::new(2);

    for _ in 0..4 {
        assert!(tracker.record_spawn(district));
    }
    assert!(!tracker.record_spawn(district));
    assert_eq!(tracker.wave(district).map(|wave| wave.spawned()), Some(4));
}

#[test]
fn clear_is_reported_exactly_once() {
    let mut tracker = DefeatTracker::new(&districts());
    let district = DistrictId::new(1);
    for _ in 0..4 {
        assert!(tracker.record_spawn(district));
    }

    let outcomes: Vec<_> = (0..6).map(|_| tracker.record_kill(district)).collect();
    let clears = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, KillOutcome::DistrictCleared { .. }))
        .count();

    assert_eq!(clears, 1);
    assert_eq!(outcomes[4], KillOutcome::Ignored);
    assert_eq!(outcomes[5], KillOutcome::Ignored);
    assert_eq!(tracker.total_defeated(), 4);
}

#[test]
fn counters_hold_invariant_under_arbitrary_event_order() {
    for seed in 0..64_u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut tracker = DefeatTracker::new(&districts());

        let mut reports: Vec<(bool, u32)> = Vec::new();
        for district in 0..4_u32 {
            for _ in 0..6 {
                reports.push((true, district));
                reports.push((false, district));
            }
        }
        for _ in 0..10 {
            reports.push((false, rng.gen_range(0..5)));
        }
        reports.shuffle(&mut rng);

        for (is_spawn, district) in reports {
            let district = DistrictId::new(district);
            if is_spawn {
                let _ = tracker.record_spawn(district);
            } else {
                let _ = tracker.record_kill(district);
            }

            for index in 0..3 {
                let wave = tracker
                    .wave(DistrictId::new(index))
                    .expect("district exists");
                assert!(wave.defeated() <= wave.spawned(), "seed {seed}: {wave:?}");
                assert!(wave.spawned() <= 4, "seed {seed}: {wave:?}");
            }
        }
    }
}

#[test]
fn resume_seeding_clears_earlier_districts_only() {
    let mut tracker = DefeatTracker::new(&districts());
    tracker.mark_cleared(DistrictId::new(0));
    tracker.mark_cleared(DistrictId::new(1));

    assert!(tracker.is_district_cleared(DistrictId::new(0)));
    assert!(tracker.is_district_cleared(DistrictId::new(1)));
    assert!(!tracker.is_district_cleared(DistrictId::new(2)));
    assert!(!tracker.all_cleared());
    assert_eq!(tracker.total_defeated(), 8);
}
