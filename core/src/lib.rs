#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the District Siege level engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative level, and pure systems. Adapters submit [`Command`] values
//! describing desired transitions, the level executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values that presenters,
//! AI adapters and the level manager react to. Rejected operations are never
//! fatal: they surface as [`Event::TransitionRejected`] carrying a
//! [`TransitionError`].

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of combat districts that make up the level.
pub const DISTRICT_COUNT: usize = 3;

/// Number of checkpoints defined for the level, including the starting point.
pub const CHECKPOINT_COUNT: usize = 5;

/// Hard ceiling on the enemies a single district may ever field.
pub const DISTRICT_ENEMY_CAP: u32 = 4;

/// Checkpoint saved when the storm begins.
pub const STORM_CHECKPOINT: CheckpointId = CheckpointId::new(4);

/// Session store key under which the checkpoint index is persisted.
pub const CHECKPOINT_KEY: &str = "level5_checkpoint";

/// Commands that express all permissible level mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Registers the player avatar reported by the adapter.
    AttachPlayer {
        /// Current world position of the avatar.
        position: Vec3,
        /// Health the avatar currently holds.
        current_health: f32,
        /// Upper bound for the avatar's health.
        max_health: f32,
    },
    /// Forgets the player avatar, e.g. while the adapter rebuilds it.
    DetachPlayer,
    /// Resolves the starting checkpoint and begins the level.
    Start,
    /// Advances the level clock by one simulation frame.
    Tick {
        /// Wall-clock time covered by the frame.
        dt: Duration,
    },
    /// Reports that an enemy died in combat.
    EnemyDefeated {
        /// Enemy that was destroyed.
        enemy: EnemyId,
    },
    /// Moves the level to the next district's wave.
    AdvanceDistrict,
    /// Spawns the remaining allotment of the active district and defeats every
    /// enemy in it through the regular kill path.
    ForceClearDistrict,
    /// Starts the storm phase.
    StartStorm,
    /// Frees the captive, completing the level.
    ReleaseRescueTarget,
    /// Completes the level from any phase.
    ForceComplete,
    /// Re-evaluates whether combat has concluded.
    CheckCompletion,
    /// Moves the player to a named landmark.
    TeleportPlayer {
        /// Landmark the player should be placed at.
        destination: Landmark,
    },
    /// Reports the outcome of the rescue target asset load.
    RescueTargetLoaded {
        /// Whether the asset became available.
        outcome: AssetLoad,
    },
    /// Tears the level down, cancelling every pending task.
    Dispose,
}

/// Events broadcast by the level after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that the level started from the provided checkpoint.
    LevelStarted {
        /// Checkpoint the level resumed from.
        checkpoint: CheckpointId,
    },
    /// Announces a phase transition.
    PhaseChanged {
        /// Phase active before the transition.
        from: LevelPhase,
        /// Phase active after the transition.
        to: LevelPhase,
    },
    /// Confirms the player avatar was moved.
    PlayerPlaced {
        /// Position the avatar now occupies.
        position: Vec3,
    },
    /// Confirms the player avatar regained health.
    PlayerHealed {
        /// Health restored by the heal.
        amount: f32,
        /// Health held after the heal.
        health: f32,
    },
    /// Reports storm damage applied to the player avatar.
    PlayerDamaged {
        /// Damage applied this frame.
        amount: f32,
        /// Health held after the damage.
        health: f32,
    },
    /// Confirms that an allied companion was created.
    AllySpawned {
        /// Identifier assigned to the ally.
        ally: AllyId,
        /// Position the ally appears at.
        position: Vec3,
    },
    /// Announces that a district's wave began.
    WaveStarted {
        /// District fielding the wave.
        district: DistrictId,
        /// Number of enemies planned for the wave.
        planned: u32,
    },
    /// Confirms that an enemy was created.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// District the enemy belongs to.
        district: DistrictId,
        /// Position the enemy appears at.
        position: Vec3,
    },
    /// Reports that a spawn request was refused.
    SpawnRejected {
        /// District the spawn was requested for.
        district: DistrictId,
        /// Reason the request was refused.
        reason: SpawnRejection,
    },
    /// Confirms that a defeated enemy was counted.
    EnemyDefeated {
        /// Enemy that was counted.
        enemy: EnemyId,
        /// District the enemy belonged to.
        district: DistrictId,
    },
    /// Requests that the adapter remove an enemy without counting a kill.
    EnemyDespawned {
        /// Enemy that left the level.
        enemy: EnemyId,
    },
    /// Announces that every allotted enemy of a district was defeated.
    DistrictCleared {
        /// District that was cleared.
        district: DistrictId,
    },
    /// Confirms that progress was persisted.
    CheckpointSaved {
        /// Checkpoint that became current.
        checkpoint: CheckpointId,
    },
    /// Confirms that persisted progress was removed.
    CheckpointCleared,
    /// Announces that the storm started shrinking.
    StormStarted {
        /// Center of the safe zone.
        center: Vec3,
        /// Initial safe-zone radius.
        radius: f32,
    },
    /// Announces that the storm reached its final radius.
    StormFinalCountdownStarted,
    /// Reports the whole seconds left in the final countdown.
    StormCountdown {
        /// Seconds remaining, rounded up.
        remaining_seconds: u32,
    },
    /// Announces that the storm ended.
    StormEnded {
        /// How the storm ended.
        reason: StormEndReason,
    },
    /// Requests that the adapter load the rescue target asset.
    RescueTargetRequested {
        /// Position the target should be placed at.
        position: Vec3,
    },
    /// Confirms that the rescue target is present in the level.
    RescueTargetPlaced {
        /// Position of the target.
        position: Vec3,
    },
    /// Reports that the rescue target could not be loaded.
    RescueTargetLoadFailed,
    /// Confirms that the captive was freed.
    RescueReleased,
    /// Requests that the presenter display a message.
    MessageShown {
        /// Message contents.
        text: String,
        /// How long the message stays visible.
        duration: Duration,
    },
    /// Requests that the presenter play the victory celebration.
    CelebrationShown,
    /// Announces that the level reached its terminal phase.
    LevelCompleted,
    /// Requests that the level manager load the next level.
    NextLevelRequested,
    /// Confirms that every level resource was released.
    LevelDisposed,
    /// Reports that a command was refused without changing state.
    TransitionRejected {
        /// Reason the command was refused.
        reason: TransitionError,
    },
}

/// Explicit state of the level's progression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LevelPhase {
    /// Combat against the wave of the provided district.
    DistrictCombat(DistrictId),
    /// The storm is shrinking toward its final radius.
    StormActive,
    /// The storm reached its final radius and is counting down.
    StormFinalCountdown,
    /// The storm ended; the captive awaits release.
    RescuePending,
    /// The level is finished.
    Completed,
}

impl LevelPhase {
    /// Reports whether the transition table allows moving to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: LevelPhase) -> bool {
        match (self, next) {
            (Self::DistrictCombat(current), Self::DistrictCombat(following)) => {
                following.index() == current.index() + 1 && following.index() < DISTRICT_COUNT
            }
            (Self::DistrictCombat(_), Self::StormActive | Self::Completed) => true,
            (Self::StormActive, Self::StormFinalCountdown | Self::Completed) => true,
            (Self::StormFinalCountdown, Self::RescuePending | Self::Completed) => true,
            (Self::RescuePending, Self::Completed) => true,
            _ => false,
        }
    }

    /// District under attack, if the level is still in combat.
    #[must_use]
    pub const fn district(self) -> Option<DistrictId> {
        match self {
            Self::DistrictCombat(district) => Some(district),
            _ => None,
        }
    }

    /// Reports whether the storm has been started at some point.
    #[must_use]
    pub const fn storm_started(self) -> bool {
        !matches!(self, Self::DistrictCombat(_))
    }
}

/// Reasons a level command may be refused.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The level has not been started yet.
    #[error("level has not started")]
    NotStarted,
    /// The level was already started.
    #[error("level already started")]
    AlreadyStarted,
    /// The level was disposed.
    #[error("level was disposed")]
    Disposed,
    /// The level already reached its terminal phase.
    #[error("level already completed")]
    AlreadyCompleted,
    /// No player avatar is attached.
    #[error("player avatar not found")]
    PlayerMissing,
    /// The enemy is not alive in this level.
    #[error("enemy {0:?} is not alive in this level")]
    UnknownEnemy(EnemyId),
    /// The district index lies outside the level layout.
    #[error("district {0:?} is out of range")]
    DistrictOutOfRange(DistrictId),
    /// The storm has already started.
    #[error("storm already started")]
    StormAlreadyStarted,
    /// The storm has not started yet.
    #[error("storm has not started")]
    StormNotStarted,
    /// The captive was already released.
    #[error("rescue target already released")]
    RescueAlreadyReleased,
    /// The phase table forbids the requested transition.
    #[error("transition from {from:?} to {to:?} is not allowed")]
    IllegalTransition {
        /// Phase active when the transition was requested.
        from: LevelPhase,
        /// Phase that was requested.
        to: LevelPhase,
    },
}

impl TransitionError {
    /// Reports whether the error stems from repeating a one-shot operation.
    ///
    /// Repeats are idempotent no-ops and are not surfaced to presenters.
    #[must_use]
    pub const fn is_repeat(&self) -> bool {
        matches!(
            self,
            Self::AlreadyStarted
                | Self::AlreadyCompleted
                | Self::UnknownEnemy(_)
                | Self::StormAlreadyStarted
                | Self::RescueAlreadyReleased
        )
    }
}

/// Reasons a spawn request may be refused.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum SpawnRejection {
    /// The storm supersedes combat.
    #[error("storm is active")]
    StormActive,
    /// The district already fielded its full allotment.
    #[error("district allotment exhausted")]
    AllotmentExhausted,
    /// The arena already holds the maximum number of live enemies for the district.
    #[error("district live-enemy cap reached")]
    LiveCapReached,
    /// The district index lies outside the level layout.
    #[error("district is out of range")]
    DistrictOutOfRange,
}

/// How the storm came to an end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StormEndReason {
    /// The final countdown ran out.
    Elapsed,
    /// The storm was stopped early.
    Aborted,
}

/// Outcome of an asynchronous asset load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetLoad {
    /// The asset loaded and was placed.
    Ready,
    /// The asset could not be loaded.
    Failed,
}

/// Named destinations the player may be teleported to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Landmark {
    /// Center of the provided district.
    District(DistrictId),
    /// Location of the captive.
    Rescue,
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an allied companion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllyId(u32);

impl AllyId {
    /// Creates a new ally identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a district within the level layout.
///
/// Any value is representable so that out-of-range reports can be carried to
/// the point where they are diagnosed and dropped.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DistrictId(u32);

impl DistrictId {
    /// Creates a district index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index usable for slice access.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// District that follows this one, if the layout has one.
    #[must_use]
    pub const fn next(&self) -> Option<DistrictId> {
        if self.index() + 1 < DISTRICT_COUNT {
            Some(DistrictId(self.0 + 1))
        } else {
            None
        }
    }

    /// Checkpoint saved once this district is cleared.
    #[must_use]
    pub const fn cleared_checkpoint(&self) -> CheckpointId {
        CheckpointId(self.0 + 1)
    }
}

/// Index of a checkpoint within the ordered checkpoint sequence.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CheckpointId(u32);

impl CheckpointId {
    /// Creates a checkpoint index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index usable for slice access.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Number of districts already won when resuming from this checkpoint.
    #[must_use]
    pub fn districts_cleared(&self) -> usize {
        self.index().min(DISTRICT_COUNT)
    }
}

/// Axis-aligned ground rectangle enemies of a district spawn within.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Perimeter {
    min_x: f32,
    min_z: f32,
    max_x: f32,
    max_z: f32,
}

impl Perimeter {
    /// Creates a perimeter from its corner coordinates.
    #[must_use]
    pub const fn new(min_x: f32, min_z: f32, max_x: f32, max_z: f32) -> Self {
        Self {
            min_x,
            min_z,
            max_x,
            max_z,
        }
    }

    /// Smallest x coordinate inside the perimeter.
    #[must_use]
    pub const fn min_x(&self) -> f32 {
        self.min_x
    }

    /// Smallest z coordinate inside the perimeter.
    #[must_use]
    pub const fn min_z(&self) -> f32 {
        self.min_z
    }

    /// Largest x coordinate inside the perimeter.
    #[must_use]
    pub const fn max_x(&self) -> f32 {
        self.max_x
    }

    /// Largest z coordinate inside the perimeter.
    #[must_use]
    pub const fn max_z(&self) -> f32 {
        self.max_z
    }

    /// Reports whether the ground projection of `position` lies inside.
    #[must_use]
    pub fn contains(&self, position: Vec3) -> bool {
        (self.min_x..=self.max_x).contains(&position.x)
            && (self.min_z..=self.max_z).contains(&position.z)
    }
}

/// Immutable description of one combat district.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct District {
    id: DistrictId,
    name: String,
    center: Vec3,
    perimeter: Perimeter,
    enemy_cap: u32,
}

impl District {
    /// Creates a district; the cap is clamped to [`DISTRICT_ENEMY_CAP`].
    #[must_use]
    pub fn new(
        id: DistrictId,
        name: impl Into<String>,
        center: Vec3,
        perimeter: Perimeter,
        enemy_cap: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            center,
            perimeter,
            enemy_cap: enemy_cap.min(DISTRICT_ENEMY_CAP),
        }
    }

    /// Index of the district.
    #[must_use]
    pub const fn id(&self) -> DistrictId {
        self.id
    }

    /// Display name of the district.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Center used for teleports and ally placement.
    #[must_use]
    pub const fn center(&self) -> Vec3 {
        self.center
    }

    /// Rectangle enemies spawn within.
    #[must_use]
    pub const fn perimeter(&self) -> Perimeter {
        self.perimeter
    }

    /// Number of enemies the district fields in total.
    #[must_use]
    pub fn enemy_cap(&self) -> u32 {
        self.enemy_cap.min(DISTRICT_ENEMY_CAP)
    }
}

/// Static description of a checkpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSpec {
    /// Position of the checkpoint within the sequence.
    pub id: CheckpointId,
    /// Display name of the checkpoint.
    pub name: String,
    /// Where the player is placed when resuming from the checkpoint.
    pub position: Vec3,
}
