//! Tunable level layout and pacing.
//!
//! Every section has a `Default` matching the shipped level, and the whole
//! configuration deserializes with `serde` so adapters can override any subset
//! of it from a TOML file.

use std::time::Duration;

use district_siege_core::{
    CheckpointId, CheckpointSpec, District, DistrictId, Perimeter, CHECKPOINT_COUNT,
    DISTRICT_COUNT, DISTRICT_ENEMY_CAP,
};
use district_siege_system_spawning as spawning;
use district_siege_system_storm::{self as storm, DamageScaling};
use glam::Vec3;
use serde::Deserialize;
use thiserror::Error;

/// Complete description of a level.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Combat districts in the order they are fought.
    pub districts: Vec<District>,
    /// Checkpoints in sequence order.
    pub checkpoints: Vec<CheckpointSpec>,
    /// Center of the storm's safe zone.
    pub storm_center: Vec3,
    /// Location of the captive.
    pub rescue_position: Vec3,
    /// Offsets from the player at which allies appear; one ally per entry.
    pub ally_offsets: Vec<Vec3>,
    /// Wave composition and pacing.
    pub spawn: SpawnTuning,
    /// Storm geometry and damage.
    pub storm: StormTuning,
    /// Delays and rewards between phases.
    pub pacing: PacingTuning,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            districts: vec![
                District::new(
                    DistrictId::new(0),
                    "Market Quarter",
                    Vec3::new(0.0, 0.0, -40.0),
                    Perimeter::new(-20.0, -60.0, 20.0, -20.0),
                    DISTRICT_ENEMY_CAP,
                ),
                District::new(
                    DistrictId::new(1),
                    "Harbor Quarter",
                    Vec3::new(60.0, 0.0, -40.0),
                    Perimeter::new(40.0, -60.0, 80.0, -20.0),
                    DISTRICT_ENEMY_CAP,
                ),
                District::new(
                    DistrictId::new(2),
                    "Old Town",
                    Vec3::new(60.0, 0.0, 40.0),
                    Perimeter::new(40.0, 20.0, 80.0, 60.0),
                    DISTRICT_ENEMY_CAP,
                ),
            ],
            checkpoints: vec![
                checkpoint(0, "Staging Yard", Vec3::new(0.0, 0.0, 0.0)),
                checkpoint(1, "Market Gate", Vec3::new(0.0, 0.0, -15.0)),
                checkpoint(2, "Harbor Gate", Vec3::new(35.0, 0.0, -40.0)),
                checkpoint(3, "Old Town Gate", Vec3::new(60.0, 0.0, 15.0)),
                checkpoint(4, "Storm Eye", Vec3::new(30.0, 0.0, 20.0)),
            ],
            storm_center: Vec3::new(30.0, 0.0, 20.0),
            rescue_position: Vec3::new(32.0, 0.0, 24.0),
            ally_offsets: vec![Vec3::new(2.0, 0.0, 2.0), Vec3::new(-2.0, 0.0, 2.0)],
            spawn: SpawnTuning::default(),
            storm: StormTuning::default(),
            pacing: PacingTuning::default(),
        }
    }
}

impl LevelConfig {
    /// Default layout with every presentation delay removed.
    #[must_use]
    pub fn instant() -> Self {
        Self {
            spawn: SpawnTuning {
                stagger_ms: 0,
                ..SpawnTuning::default()
            },
            pacing: PacingTuning {
                advance_delay_ms: 0,
                settle_delay_ms: 0,
                rescue_fallback_ms: 0,
                ..PacingTuning::default()
            },
            ..Self::default()
        }
    }

    /// Checks the structural requirements the level relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.districts.len() != DISTRICT_COUNT {
            return Err(ConfigError::DistrictCount {
                expected: DISTRICT_COUNT,
                found: self.districts.len(),
            });
        }
        if self.checkpoints.len() != CHECKPOINT_COUNT {
            return Err(ConfigError::CheckpointCount {
                expected: CHECKPOINT_COUNT,
                found: self.checkpoints.len(),
            });
        }

        for (position, district) in self.districts.iter().enumerate() {
            if district.id().index() != position {
                return Err(ConfigError::DistrictOrder {
                    position,
                    id: district.id().get(),
                });
            }
        }
        for (position, checkpoint) in self.checkpoints.iter().enumerate() {
            if checkpoint.id.index() != position {
                return Err(ConfigError::CheckpointOrder {
                    position,
                    id: checkpoint.id.get(),
                });
            }
        }

        for district in &self.districts {
            let cap = district.enemy_cap();
            if cap == 0 {
                return Err(ConfigError::EmptyDistrict {
                    district: district.id().get(),
                });
            }
            if self.spawn.wave_size < cap {
                return Err(ConfigError::WaveBelowCap {
                    district: district.id().get(),
                    wave_size: self.spawn.wave_size,
                    cap,
                });
            }
        }

        if !(self.storm.final_radius < self.storm.initial_radius) {
            return Err(ConfigError::StormRadii {
                initial: self.storm.initial_radius,
                final_radius: self.storm.final_radius,
            });
        }
        if !(self.storm.tick_rate > 0.0) {
            return Err(ConfigError::TickRate(self.storm.tick_rate));
        }

        Ok(())
    }
}

/// Structural problems detected in a [`LevelConfig`].
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The level needs exactly [`DISTRICT_COUNT`] districts.
    #[error("expected {expected} districts, found {found}")]
    DistrictCount {
        /// Districts the level needs.
        expected: usize,
        /// Districts present in the configuration.
        found: usize,
    },
    /// The level needs exactly [`CHECKPOINT_COUNT`] checkpoints.
    #[error("expected {expected} checkpoints, found {found}")]
    CheckpointCount {
        /// Checkpoints the level needs.
        expected: usize,
        /// Checkpoints present in the configuration.
        found: usize,
    },
    /// A district is listed out of order.
    #[error("district listed at position {position} carries id {id}")]
    DistrictOrder {
        /// Position within the list.
        position: usize,
        /// Identifier the entry carries.
        id: u32,
    },
    /// A checkpoint is listed out of order.
    #[error("checkpoint listed at position {position} carries id {id}")]
    CheckpointOrder {
        /// Position within the list.
        position: usize,
        /// Identifier the entry carries.
        id: u32,
    },
    /// A district fields no enemies and could never be cleared.
    #[error("district {district} has an enemy cap of zero")]
    EmptyDistrict {
        /// Identifier of the district.
        district: u32,
    },
    /// Waves are too small to exhaust a district's allotment.
    #[error("wave size {wave_size} is below the enemy cap {cap} of district {district}")]
    WaveBelowCap {
        /// Identifier of the district.
        district: u32,
        /// Configured wave size.
        wave_size: u32,
        /// Enemy cap of the district.
        cap: u32,
    },
    /// The storm would not shrink.
    #[error("storm final radius {final_radius} must be below initial radius {initial}")]
    StormRadii {
        /// Configured initial radius.
        initial: f32,
        /// Configured final radius.
        final_radius: f32,
    },
    /// The nominal frame rate must be positive.
    #[error("storm tick rate must be positive, found {0}")]
    TickRate(f32),
}

/// Wave composition and pacing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Enemies requested per wave before the district cap applies.
    pub wave_size: u32,
    /// Delay between consecutive releases within a wave.
    pub stagger_ms: u64,
    /// Seed of the placement generator.
    pub rng_seed: u64,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            wave_size: DISTRICT_ENEMY_CAP,
            stagger_ms: 800,
            rng_seed: 0x5d15_7a1c_7e55_0005,
        }
    }
}

impl SpawnTuning {
    pub(crate) fn to_config(self, ground_offset: f32) -> spawning::Config {
        spawning::Config::new(
            self.wave_size,
            Duration::from_millis(self.stagger_ms),
            ground_offset,
            self.rng_seed,
        )
    }
}

/// Storm geometry and damage.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct StormTuning {
    /// Safe-zone radius when the storm starts.
    pub initial_radius: f32,
    /// Radius at which the final countdown begins.
    pub final_radius: f32,
    /// Nominal shrink duration before the speed factor applies.
    pub shrink_duration_seconds: f32,
    /// Multiplier applied to the per-frame shrink.
    pub speed_factor: f32,
    /// Frame rate the per-frame quantities assume.
    pub tick_rate: f32,
    /// Damage owed per second outside the safe zone.
    pub damage_per_second: f32,
    /// Length of the final countdown.
    pub countdown_ms: u64,
    /// Scale boundary damage by frame time instead of charging a fixed quantum per frame.
    pub frame_rate_independent_damage: bool,
}

impl Default for StormTuning {
    fn default() -> Self {
        let defaults = storm::Config::default();
        Self {
            initial_radius: defaults.initial_radius,
            final_radius: defaults.final_radius,
            shrink_duration_seconds: defaults.shrink_duration_seconds,
            speed_factor: defaults.speed_factor,
            tick_rate: defaults.tick_rate,
            damage_per_second: defaults.damage_per_second,
            countdown_ms: 7_000,
            frame_rate_independent_damage: false,
        }
    }
}

impl StormTuning {
    pub(crate) fn to_config(self) -> storm::Config {
        storm::Config {
            initial_radius: self.initial_radius,
            final_radius: self.final_radius,
            shrink_duration_seconds: self.shrink_duration_seconds,
            speed_factor: self.speed_factor,
            tick_rate: self.tick_rate,
            damage_per_second: self.damage_per_second,
            countdown: Duration::from_millis(self.countdown_ms),
            damage_scaling: if self.frame_rate_independent_damage {
                DamageScaling::Elapsed
            } else {
                DamageScaling::PerFrame
            },
        }
    }
}

/// Delays and rewards between phases.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PacingTuning {
    /// Delay between clearing a district and its successor's wave.
    pub advance_delay_ms: u64,
    /// Delay between the storm ending and the rescue opening.
    pub settle_delay_ms: u64,
    /// Delay before completing the level when the rescue target failed to load.
    pub rescue_fallback_ms: u64,
    /// Share of maximum health restored when a district is cleared.
    pub heal_fraction: f32,
    /// How long presenter messages stay visible.
    pub message_ms: u64,
    /// Height enemies spawn at.
    pub ground_offset: f32,
}

impl Default for PacingTuning {
    fn default() -> Self {
        Self {
            advance_delay_ms: 3_000,
            settle_delay_ms: 6_000,
            rescue_fallback_ms: 4_000,
            heal_fraction: 0.5,
            message_ms: 3_000,
            ground_offset: 0.0,
        }
    }
}

impl PacingTuning {
    pub(crate) fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    pub(crate) fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub(crate) fn rescue_fallback(&self) -> Duration {
        Duration::from_millis(self.rescue_fallback_ms)
    }

    pub(crate) fn message_duration(&self) -> Duration {
        Duration::from_millis(self.message_ms)
    }
}

fn checkpoint(id: u32, name: &str, position: Vec3) -> CheckpointSpec {
    CheckpointSpec {
        id: CheckpointId::new(id),
        name: name.to_owned(),
        position,
    }
}
