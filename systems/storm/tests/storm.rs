use std::time::Duration;

use district_siege_core::StormEndReason;
use district_siege_system_storm::{Config, DamageScaling, StormController, StormSignal, StormState};
use glam::Vec3;

const FRAME: Duration = Duration::from_nanos(16_666_667);

fn started() -> StormController {
    let mut storm = StormController::new(Config::default());
    assert!(storm.start(Vec3::new(10.0, 0.0, -20.0)));
    storm
}

/// Runs frames until the final countdown starts, returning the frame count.
fn run_until_countdown(storm: &mut StormController, clock: &mut Duration) -> u32 {
    let mut frames = 0;
    let mut signals = Vec::new();
    while storm.state() == StormState::Active {
        *clock += FRAME;
        frames += 1;
        storm.update(*clock, &mut signals);
        assert!(frames < 10_000, "storm never reached its final radius");
    }
    frames
}

#[test]
fn start_is_one_shot() {
    let mut storm = started();
    assert!(!storm.start(Vec3::ZERO));
    assert_eq!(storm.center(), Vec3::new(10.0, 0.0, -20.0));
    assert_eq!(storm.radius(), 100.0);
}

#[test]
fn radius_decays_monotonically_and_countdown_starts_once() {
    let mut storm = started();
    let mut clock = Duration::ZERO;
    let mut previous = storm.radius();
    let mut countdown_starts = 0;

    for _ in 0..2_400 {
        clock += FRAME;
        let mut signals = Vec::new();
        let was_active = storm.state() == StormState::Active;
        storm.update(clock, &mut signals);

        assert!(storm.radius() <= previous, "radius grew while active");
        previous = storm.radius();

        let started_now = signals.contains(&StormSignal::FinalCountdownStarted);
        if started_now {
            countdown_starts += 1;
            assert!(was_active);
            assert!(storm.radius() <= 15.0);
        } else if storm.state() == StormState::Active {
            assert!(storm.radius() > 15.0, "countdown skipped the first eligible frame");
        }
    }

    assert_eq!(countdown_starts, 1);
}

#[test]
fn shrink_takes_twenty_seconds_at_default_speed() {
    let mut storm = started();
    let mut clock = Duration::ZERO;
    let frames = run_until_countdown(&mut storm, &mut clock);

    assert!(
        (1_199..=1_202).contains(&frames),
        "expected about 1200 frames, took {frames}"
    );
}

#[test]
fn countdown_reports_whole_seconds_and_ends() {
    let mut storm = started();
    let mut clock = Duration::ZERO;
    let _ = run_until_countdown(&mut storm, &mut clock);
    assert_eq!(storm.remaining_seconds(), Some(7));

    let mut reported = Vec::new();
    let mut ended = 0;
    for _ in 0..60 {
        clock += Duration::from_millis(250);
        let mut signals = Vec::new();
        storm.update(clock, &mut signals);
        for signal in signals {
            match signal {
                StormSignal::Countdown { remaining_seconds } => reported.push(remaining_seconds),
                StormSignal::Ended => ended += 1,
                StormSignal::FinalCountdownStarted => panic!("countdown restarted"),
            }
        }
    }

    assert_eq!(reported, vec![6, 5, 4, 3, 2, 1, 0]);
    assert_eq!(ended, 1);
    assert_eq!(storm.state(), StormState::Ended(StormEndReason::Elapsed));
    assert!(storm.take_completion());
    assert!(!storm.take_completion(), "completion signal is one-shot");
}

#[test]
fn boundary_is_safe_and_outside_costs_a_quarter_per_frame() {
    let storm = started();
    let center = storm.center();

    let on_edge = center + Vec3::new(100.0, 0.0, 0.0);
    assert_eq!(storm.check_boundary(on_edge, FRAME), 0.0);

    let inside = center + Vec3::new(0.0, 0.0, 99.0);
    assert_eq!(storm.check_boundary(inside, FRAME), 0.0);

    let outside = center + Vec3::new(100.01, 0.0, 0.0);
    assert!((storm.check_boundary(outside, FRAME) - 0.25).abs() < 1e-6);

    let long_frame = Duration::from_millis(100);
    assert!((storm.check_boundary(outside, long_frame) - 0.25).abs() < 1e-6);
}

#[test]
fn elapsed_scaling_charges_by_frame_time() {
    let mut storm = StormController::new(Config {
        damage_scaling: DamageScaling::Elapsed,
        ..Config::default()
    });
    assert!(storm.start(Vec3::ZERO));

    let outside = Vec3::new(150.0, 0.0, 0.0);
    let damage = storm.check_boundary(outside, Duration::from_millis(100));
    assert!((damage - 1.5).abs() < 1e-5);
}

#[test]
fn stop_ends_without_completion_signal() {
    let mut storm = started();
    assert!(storm.stop());
    assert_eq!(storm.state(), StormState::Ended(StormEndReason::Aborted));
    assert!(!storm.take_completion());
    assert!(!storm.stop(), "stopping twice is a no-op");

    let mut signals = Vec::new();
    storm.update(Duration::from_secs(60), &mut signals);
    assert!(signals.is_empty());
    assert_eq!(
        storm.check_boundary(Vec3::new(500.0, 0.0, 0.0), FRAME),
        0.0
    );
}
