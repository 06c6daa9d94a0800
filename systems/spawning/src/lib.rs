#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning policy deciding where and when district enemies appear.

use std::time::Duration;

use district_siege_core::{District, SpawnRejection, DISTRICT_ENEMY_CAP};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const DEFAULT_WAVE_SIZE: u32 = 4;
const DEFAULT_STAGGER: Duration = Duration::from_millis(800);
const DEFAULT_GROUND_OFFSET: f32 = 0.0;

/// Configuration parameters required to construct the spawning policy.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    wave_size: u32,
    stagger: Duration,
    ground_offset: f32,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided wave size, cadence and seed.
    #[must_use]
    pub const fn new(wave_size: u32, stagger: Duration, ground_offset: f32, rng_seed: u64) -> Self {
        Self {
            wave_size,
            stagger,
            ground_offset,
            rng_seed,
        }
    }

    /// Default pacing with the provided seed.
    #[must_use]
    pub const fn with_seed(rng_seed: u64) -> Self {
        Self::new(
            DEFAULT_WAVE_SIZE,
            DEFAULT_STAGGER,
            DEFAULT_GROUND_OFFSET,
            rng_seed,
        )
    }
}

/// A single enemy release within a planned wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannedSpawn {
    /// Where the enemy appears.
    pub position: Vec3,
    /// Delay measured from the start of the wave.
    pub delay: Duration,
}

/// Counts consulted before an enemy is admitted into a district.
///
/// `local_live` is the level's own per-district bookkeeping while
/// `arena_live` is a query against the owned enemy arena. Both must stay
/// under the cap; disagreement between them never lets a spawn through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnGate {
    /// Whether the storm already superseded combat.
    pub storm_active: bool,
    /// Enemies the district already fielded.
    pub spawned: u32,
    /// Live enemies according to the district's wave counters.
    pub local_live: u32,
    /// Live enemies according to the enemy arena.
    pub arena_live: u32,
}

/// Pure policy that plans district waves and admits individual spawns.
#[derive(Debug)]
pub struct SpawnPolicy {
    wave_size: u32,
    stagger: Duration,
    ground_offset: f32,
    rng: ChaCha8Rng,
}

impl SpawnPolicy {
    /// Creates a new spawning policy using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            wave_size: config.wave_size,
            stagger: config.stagger,
            ground_offset: config.ground_offset,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Number of enemies a wave for `district` contains.
    #[must_use]
    pub fn wave_size(&self, district: &District) -> u32 {
        self.wave_size
            .min(district.enemy_cap())
            .min(DISTRICT_ENEMY_CAP)
    }

    /// Plans the positions and release delays of a district's wave.
    ///
    /// Positions are drawn uniformly from the district perimeter with x and z
    /// sampled independently; every enemy stands at the configured ground
    /// offset.
    pub fn plan_wave(&mut self, district: &District) -> Vec<PlannedSpawn> {
        let count = self.wave_size(district);
        let perimeter = district.perimeter();
        let mut planned = Vec::with_capacity(count as usize);

        for index in 0..count {
            let x = sample_axis(&mut self.rng, perimeter.min_x(), perimeter.max_x());
            let z = sample_axis(&mut self.rng, perimeter.min_z(), perimeter.max_z());
            planned.push(PlannedSpawn {
                position: Vec3::new(x, self.ground_offset, z),
                delay: self.stagger(index),
            });
        }

        planned
    }

    /// Delay applied to the enemy released at `index` within a wave.
    #[must_use]
    pub fn stagger(&self, index: u32) -> Duration {
        self.stagger.saturating_mul(index)
    }

    /// Decides whether another enemy may join `district`.
    pub fn admit(&self, district: &District, gate: SpawnGate) -> Result<(), SpawnRejection> {
        if gate.storm_active {
            return Err(SpawnRejection::StormActive);
        }

        let cap = district.enemy_cap();
        if gate.spawned >= cap {
            return Err(SpawnRejection::AllotmentExhausted);
        }

        if gate.local_live >= DISTRICT_ENEMY_CAP || gate.arena_live >= DISTRICT_ENEMY_CAP {
            return Err(SpawnRejection::LiveCapReached);
        }

        Ok(())
    }
}

fn sample_axis(rng: &mut ChaCha8Rng, a: f32, b: f32) -> f32 {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    if low == high {
        return low;
    }
    rng.gen_range(low..=high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use district_siege_core::{DistrictId, Perimeter};

    fn district(cap: u32) -> District {
        District::new(
            DistrictId::new(0),
            "Market",
            Vec3::ZERO,
            Perimeter::new(-5.0, -5.0, 5.0, 5.0),
            cap,
        )
    }

    #[test]
    fn degenerate_axis_collapses_to_single_value() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(sample_axis(&mut rng, 2.5, 2.5), 2.5);
    }

    #[test]
    fn inverted_axis_bounds_are_normalised() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..32 {
            let value = sample_axis(&mut rng, 4.0, -4.0);
            assert!((-4.0..=4.0).contains(&value));
        }
    }

    #[test]
    fn wave_size_honours_district_cap() {
        let policy = SpawnPolicy::new(Config::new(9, Duration::ZERO, 0.0, 1));
        assert_eq!(policy.wave_size(&district(2)), 2);
        assert_eq!(policy.wave_size(&district(4)), 4);
    }
}
