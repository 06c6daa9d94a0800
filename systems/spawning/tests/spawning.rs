use std::time::Duration;

use district_siege_core::{District, DistrictId, Perimeter, SpawnRejection};
use district_siege_system_spawning::{Config, SpawnGate, SpawnPolicy};
use glam::Vec3;

fn harbor() -> District {
    District::new(
        DistrictId::new(1),
        "Harbor",
        Vec3::new(40.0, 0.0, 0.0),
        Perimeter::new(30.0, -12.0, 52.0, 8.0),
        4,
    )
}

fn open_gate() -> SpawnGate {
    SpawnGate {
        storm_active: false,
        spawned: 0,
        local_live: 0,
        arena_live: 0,
    }
}

#[test]
fn planned_positions_stay_inside_the_perimeter() {
    let district = harbor();
    let mut policy = SpawnPolicy::new(Config::new(4, Duration::ZERO, 0.5, 0x5eed));

    for _ in 0..16 {
        let wave = policy.plan_wave(&district);
        assert_eq!(wave.len(), 4);
        for spawn in wave {
            assert!(
                district.perimeter().contains(spawn.position),
                "spawn {:?} escaped the perimeter",
                spawn.position
            );
            assert!((spawn.position.y - 0.5).abs() < f32::EPSILON);
        }
    }
}

#[test]
fn wave_is_capped_at_four_enemies() {
    let mut policy = SpawnPolicy::new(Config::new(10, Duration::ZERO, 0.0, 7));
    assert_eq!(policy.plan_wave(&harbor()).len(), 4);

    let mut small = SpawnPolicy::new(Config::new(3, Duration::ZERO, 0.0, 7));
    assert_eq!(small.plan_wave(&harbor()).len(), 3);
}

#[test]
fn releases_are_staggered_by_index() {
    let mut policy = SpawnPolicy::new(Config::with_seed(11));
    let delays: Vec<_> = policy
        .plan_wave(&harbor())
        .into_iter()
        .map(|spawn| spawn.delay)
        .collect();

    assert_eq!(
        delays,
        vec![
            Duration::ZERO,
            Duration::from_millis(800),
            Duration::from_millis(1600),
            Duration::from_millis(2400),
        ]
    );
}

#[test]
fn identical_seeds_plan_identical_waves() {
    let mut first = SpawnPolicy::new(Config::with_seed(0x4d59_5df4));
    let mut second = SpawnPolicy::new(Config::with_seed(0x4d59_5df4));

    assert_eq!(first.plan_wave(&harbor()), second.plan_wave(&harbor()));
    assert_eq!(first.plan_wave(&harbor()), second.plan_wave(&harbor()));
}

#[test]
fn storm_rejects_every_spawn() {
    let policy = SpawnPolicy::new(Config::with_seed(1));
    let gate = SpawnGate {
        storm_active: true,
        ..open_gate()
    };
    assert_eq!(
        policy.admit(&harbor(), gate),
        Err(SpawnRejection::StormActive)
    );
}

#[test]
fn exhausted_allotment_is_rejected() {
    let policy = SpawnPolicy::new(Config::with_seed(1));
    let gate = SpawnGate {
        spawned: 4,
        ..open_gate()
    };
    assert_eq!(
        policy.admit(&harbor(), gate),
        Err(SpawnRejection::AllotmentExhausted)
    );
}

#[test]
fn either_registry_at_cap_blocks_spawn() {
    let policy = SpawnPolicy::new(Config::with_seed(1));

    let local_full = SpawnGate {
        spawned: 2,
        local_live: 4,
        ..open_gate()
    };
    assert_eq!(
        policy.admit(&harbor(), local_full),
        Err(SpawnRejection::LiveCapReached)
    );

    let arena_full = SpawnGate {
        spawned: 2,
        arena_live: 4,
        ..open_gate()
    };
    assert_eq!(
        policy.admit(&harbor(), arena_full),
        Err(SpawnRejection::LiveCapReached)
    );

    assert_eq!(policy.admit(&harbor(), open_gate()), Ok(()));
}
