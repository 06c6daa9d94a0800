#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shrinking safe-zone controller driving the storm endgame.
//!
//! The controller walks `Inactive -> Active -> FinalCountdown -> Ended`. While
//! active the safe-zone radius decays linearly by a fixed amount per frame;
//! once it reaches the final radius a fixed countdown runs on the level clock.
//! Ending the countdown arms a one-shot completion signal that the level
//! consumes with [`StormController::take_completion`]. The controller never
//! mutates the player: [`StormController::check_boundary`] only reports the
//! damage owed for the frame.

use std::time::Duration;

use district_siege_core::StormEndReason;
use glam::Vec3;

/// How boundary damage relates to frame timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DamageScaling {
    /// Fixed quantum per frame assuming the nominal tick rate.
    #[default]
    PerFrame,
    /// Damage scaled by the frame's elapsed time.
    Elapsed,
}

/// Tuning of the storm's geometry, pacing and damage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Safe-zone radius when the storm starts.
    pub initial_radius: f32,
    /// Radius at which the final countdown begins.
    pub final_radius: f32,
    /// Nominal seconds to shrink from initial to final radius before the speed factor.
    pub shrink_duration_seconds: f32,
    /// Multiplier applied to the per-frame shrink.
    pub speed_factor: f32,
    /// Frame rate the per-frame quantities assume.
    pub tick_rate: f32,
    /// Damage owed per second spent outside the safe zone.
    pub damage_per_second: f32,
    /// Length of the terminal countdown.
    pub countdown: Duration,
    /// How boundary damage relates to frame timing.
    pub damage_scaling: DamageScaling,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_radius: 100.0,
            final_radius: 15.0,
            shrink_duration_seconds: 30.0,
            speed_factor: 1.5,
            tick_rate: 60.0,
            damage_per_second: 15.0,
            countdown: Duration::from_millis(7_000),
            damage_scaling: DamageScaling::PerFrame,
        }
    }
}

impl Config {
    /// Radius lost per frame before the speed factor is applied.
    #[must_use]
    pub fn shrink_rate(&self) -> f32 {
        let frames = self.shrink_duration_seconds * self.tick_rate;
        if frames <= 0.0 {
            return self.initial_radius - self.final_radius;
        }
        (self.initial_radius - self.final_radius) / frames
    }
}

/// Lifecycle of the storm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StormState {
    /// The storm has not started.
    Inactive,
    /// The safe zone is shrinking.
    Active,
    /// The final radius was reached; the countdown is running.
    FinalCountdown,
    /// The storm is over.
    Ended(StormEndReason),
}

/// Notable changes produced by a storm update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StormSignal {
    /// The radius reached its floor and the countdown started.
    FinalCountdownStarted,
    /// The whole seconds left in the countdown changed.
    Countdown {
        /// Seconds remaining, rounded up.
        remaining_seconds: u32,
    },
    /// The countdown ran out.
    Ended,
}

/// State machine owning the storm geometry.
#[derive(Clone, Debug)]
pub struct StormController {
    config: Config,
    state: StormState,
    center: Vec3,
    radius: f32,
    countdown_started: Option<Duration>,
    remaining_seconds: Option<u32>,
    completion_pending: bool,
}

impl StormController {
    /// Creates an inactive storm.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: StormState::Inactive,
            center: Vec3::ZERO,
            radius: config.initial_radius,
            countdown_started: None,
            remaining_seconds: None,
            completion_pending: false,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> StormState {
        self.state
    }

    /// Reports whether the storm is shrinking or counting down.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.state, StormState::Active | StormState::FinalCountdown)
    }

    /// Center of the safe zone.
    #[must_use]
    pub const fn center(&self) -> Vec3 {
        self.center
    }

    /// Current safe-zone radius.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Seconds left in the final countdown, once it started.
    #[must_use]
    pub const fn remaining_seconds(&self) -> Option<u32> {
        self.remaining_seconds
    }

    /// Starts shrinking around `center`; returns `false` unless the storm was inactive.
    pub fn start(&mut self, center: Vec3) -> bool {
        if self.state != StormState::Inactive {
            return false;
        }

        self.state = StormState::Active;
        self.center = center;
        self.radius = self.config.initial_radius;
        true
    }

    /// Advances the storm by one frame ending at `now` on the level clock.
    pub fn update(&mut self, now: Duration, out: &mut Vec<StormSignal>) {
        match self.state {
            StormState::Active => {
                self.radius -= self.config.shrink_rate() * self.config.speed_factor;
                if self.radius <= self.config.final_radius {
                    self.state = StormState::FinalCountdown;
                    self.countdown_started = Some(now);
                    out.push(StormSignal::FinalCountdownStarted);
                    self.advance_countdown(now, out);
                }
            }
            StormState::FinalCountdown => self.advance_countdown(now, out),
            StormState::Inactive | StormState::Ended(_) => {}
        }
    }

    /// Damage owed this frame by a player standing at `position`.
    ///
    /// Standing exactly on the boundary is safe.
    #[must_use]
    pub fn check_boundary(&self, position: Vec3, dt: Duration) -> f32 {
        if !self.is_running() {
            return 0.0;
        }

        if position.distance(self.center) <= self.radius {
            return 0.0;
        }

        match self.config.damage_scaling {
            DamageScaling::PerFrame => self.config.damage_per_second / self.config.tick_rate,
            DamageScaling::Elapsed => self.config.damage_per_second * dt.as_secs_f32(),
        }
    }

    /// Ends a running storm immediately without arming the completion signal.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }

        self.state = StormState::Ended(StormEndReason::Aborted);
        self.completion_pending = false;
        true
    }

    /// Consumes the completion signal armed when the countdown ran out.
    pub fn take_completion(&mut self) -> bool {
        std::mem::replace(&mut self.completion_pending, false)
    }

    fn advance_countdown(&mut self, now: Duration, out: &mut Vec<StormSignal>) {
        let Some(started) = self.countdown_started else {
            return;
        };

        let elapsed = now.saturating_sub(started);
        let left = self.config.countdown.saturating_sub(elapsed);
        let remaining = u32::try_from(left.as_millis().div_ceil(1_000)).unwrap_or(u32::MAX);

        if self.remaining_seconds != Some(remaining) {
            self.remaining_seconds = Some(remaining);
            out.push(StormSignal::Countdown {
                remaining_seconds: remaining,
            });
        }

        if remaining == 0 {
            self.state = StormState::Ended(StormEndReason::Elapsed);
            self.completion_pending = true;
            out.push(StormSignal::Ended);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_shrink_rate_matches_thirty_second_schedule() {
        let config = Config::default();
        let expected = 85.0 / 1_800.0;
        assert!((config.shrink_rate() - expected).abs() < 1e-6);
    }

    #[test]
    fn zero_duration_collapses_in_one_frame() {
        let config = Config {
            shrink_duration_seconds: 0.0,
            speed_factor: 1.0,
            ..Config::default()
        };
        let mut storm = StormController::new(config);
        assert!(storm.start(Vec3::ZERO));

        let mut signals = Vec::new();
        storm.update(Duration::from_millis(16), &mut signals);
        assert_eq!(storm.state(), StormState::FinalCountdown);
    }

    #[test]
    fn inactive_storm_deals_no_damage() {
        let storm = StormController::new(Config::default());
        let far = Vec3::new(500.0, 0.0, 0.0);
        assert_eq!(storm.check_boundary(far, Duration::from_millis(16)), 0.0);
    }
}
