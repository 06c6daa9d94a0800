#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-district defeat accounting.
//!
//! The tracker only detects the moment a district becomes cleared; reacting to
//! it (checkpoints, heals, advancing) is left to the level so that forced
//! clears travel through the exact same detection path as ordinary kills.

use district_siege_core::{District, DistrictId};
use tracing::{debug, warn};

/// Spawn and defeat counters of a single district.
///
/// `defeated <= spawned <= cap` holds at all times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveState {
    spawned: u32,
    defeated: u32,
    cap: u32,
}

impl WaveState {
    /// Creates empty counters for a district fielding `cap` enemies.
    #[must_use]
    pub const fn new(cap: u32) -> Self {
        Self {
            spawned: 0,
            defeated: 0,
            cap,
        }
    }

    /// Enemies spawned so far.
    #[must_use]
    pub const fn spawned(&self) -> u32 {
        self.spawned
    }

    /// Enemies defeated so far.
    #[must_use]
    pub const fn defeated(&self) -> u32 {
        self.defeated
    }

    /// Total enemies the district fields.
    #[must_use]
    pub const fn cap(&self) -> u32 {
        self.cap
    }

    /// Enemies spawned but not yet defeated.
    #[must_use]
    pub const fn live(&self) -> u32 {
        self.spawned - self.defeated
    }

    /// Reports whether every allotted enemy was spawned and defeated.
    #[must_use]
    pub const fn is_cleared(&self) -> bool {
        self.defeated >= self.spawned && self.spawned == self.cap
    }
}

/// Result of reporting a kill to the tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KillOutcome {
    /// The kill could not be attributed and nothing was counted.
    Ignored,
    /// The kill was counted; the district still has enemies left.
    Counted {
        /// District the kill was attributed to.
        district: DistrictId,
    },
    /// The kill was counted and completed the district.
    DistrictCleared {
        /// District that became cleared.
        district: DistrictId,
    },
}

/// Counts spawns and kills for every district of the level.
#[derive(Clone, Debug)]
pub struct DefeatTracker {
    waves: Vec<WaveState>,
    total_defeated: u32,
}

impl DefeatTracker {
    /// Creates a tracker with empty counters for the provided districts.
    #[must_use]
    pub fn new(districts: &[District]) -> Self {
        Self {
            waves: districts
                .iter()
                .map(|district| WaveState::new(district.enemy_cap()))
                .collect(),
            total_defeated: 0,
        }
    }

    /// Counters of the provided district.
    #[must_use]
    pub fn wave(&self, district: DistrictId) -> Option<&WaveState> {
        self.waves.get(district.index())
    }

    /// Enemies defeated across every district.
    #[must_use]
    pub const fn total_defeated(&self) -> u32 {
        self.total_defeated
    }

    /// Reports whether the provided district is cleared; unknown districts never are.
    #[must_use]
    pub fn is_district_cleared(&self, district: DistrictId) -> bool {
        self.wave(district).is_some_and(WaveState::is_cleared)
    }

    /// Reports whether every district is cleared.
    #[must_use]
    pub fn all_cleared(&self) -> bool {
        self.waves.iter().all(WaveState::is_cleared)
    }

    /// Records that an enemy joined `district`.
    ///
    /// Returns `false` without counting when the district is unknown or its
    /// allotment is exhausted.
    pub fn record_spawn(&mut self, district: DistrictId) -> bool {
        let Some(wave) = self.waves.get_mut(district.index()) else {
            warn!(district = district.get(), "spawn reported for unknown district");
            return false;
        };

        if wave.spawned >= wave.cap {
            return false;
        }

        wave.spawned += 1;
        true
    }

    /// Records that an enemy of `district` died.
    pub fn record_kill(&mut self, district: DistrictId) -> KillOutcome {
        let Some(wave) = self.waves.get_mut(district.index()) else {
            warn!(district = district.get(), "kill reported for unknown district; dropped");
            return KillOutcome::Ignored;
        };

        if wave.defeated >= wave.spawned {
            debug!(district = district.get(), "kill exceeds spawned enemies; dropped");
            return KillOutcome::Ignored;
        }

        wave.defeated += 1;
        self.total_defeated += 1;

        if wave.is_cleared() {
            KillOutcome::DistrictCleared { district }
        } else {
            KillOutcome::Counted { district }
        }
    }

    /// Seeds `district` as fully spawned and defeated, skipping its wave.
    pub fn mark_cleared(&mut self, district: DistrictId) {
        if let Some(wave) = self.waves.get_mut(district.index()) {
            let newly_defeated = wave.cap - wave.defeated;
            wave.spawned = wave.cap;
            wave.defeated = wave.cap;
            self.total_defeated += newly_defeated;
        }
    }
}
