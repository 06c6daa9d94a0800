#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level state for District Siege.
//!
//! [`Level`] is the progression controller: it owns the explicit
//! [`LevelPhase`], the enemy arena, the deferred-task set and the systems that
//! plan waves, count defeats, persist checkpoints and drive the storm. Every
//! mutation enters through [`apply`]; every read goes through [`query`].
//! Rejected commands never panic: repeats of one-shot operations are silent
//! no-ops and everything else is reported as [`Event::TransitionRejected`].

mod arena;
mod config;
mod tasks;

pub use config::{ConfigError, LevelConfig, PacingTuning, SpawnTuning, StormTuning};
pub use district_siege_system_checkpoints::{MemorySessionStore, SessionStore};

use std::time::Duration;

use district_siege_core::{
    AssetLoad, CheckpointId, Command, District, DistrictId, EnemyId, Event, Landmark, LevelPhase,
    SpawnRejection, StormEndReason, TransitionError, DISTRICT_COUNT, STORM_CHECKPOINT,
};
use district_siege_system_checkpoints::CheckpointStore;
use district_siege_system_defeat_tracking::{DefeatTracker, KillOutcome};
use district_siege_system_spawning::{SpawnGate, SpawnPolicy};
use district_siege_system_storm::{StormController, StormSignal};
use glam::Vec3;
use tracing::{debug, info, warn};

use crate::{
    arena::{AllyRoster, EnemyArena},
    tasks::{DeferredTask, TaskSet},
};

/// Coarse lifecycle of a level, orthogonal to its [`LevelPhase`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Constructed but not started; only player registration is accepted.
    Pending,
    /// Started and receiving frames.
    Running,
    /// Torn down; every command is dropped.
    Disposed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Player {
    position: Vec3,
    current_health: f32,
    max_health: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct RescueObjective {
    released: bool,
    target_placed: bool,
}

/// Represents one playable District Siege level.
#[derive(Debug)]
pub struct Level {
    config: LevelConfig,
    lifecycle: Lifecycle,
    phase: LevelPhase,
    clock: Duration,
    player: Option<Player>,
    enemies: EnemyArena,
    allies: AllyRoster,
    spawning: SpawnPolicy,
    defeats: DefeatTracker,
    checkpoints: CheckpointStore,
    storm: StormController,
    tasks: TaskSet,
    rescue: RescueObjective,
    next_level_requested: bool,
}

impl Level {
    /// Creates a level from `config`, persisting progress into `session`.
    pub fn new(config: LevelConfig, session: Box<dyn SessionStore>) -> Result<Self, ConfigError> {
        config.validate()?;

        let spawning = SpawnPolicy::new(config.spawn.to_config(config.pacing.ground_offset));
        let defeats = DefeatTracker::new(&config.districts);
        let checkpoints = CheckpointStore::new(config.checkpoints.clone(), session);
        let storm = StormController::new(config.storm.to_config());

        Ok(Self {
            config,
            lifecycle: Lifecycle::Pending,
            phase: LevelPhase::DistrictCombat(DistrictId::new(0)),
            clock: Duration::ZERO,
            player: None,
            enemies: EnemyArena::new(),
            allies: AllyRoster::new(),
            spawning,
            defeats,
            checkpoints,
            storm,
            tasks: TaskSet::new(),
            rescue: RescueObjective::default(),
            next_level_requested: false,
        })
    }

    fn ensure_running(&self) -> Result<(), TransitionError> {
        match self.lifecycle {
            Lifecycle::Running => Ok(()),
            Lifecycle::Pending => Err(TransitionError::NotStarted),
            Lifecycle::Disposed => Err(TransitionError::Disposed),
        }
    }

    fn transition(&mut self, next: LevelPhase, out: &mut Vec<Event>) -> Result<(), TransitionError> {
        let from = self.phase;
        if !from.can_transition_to(next) {
            return Err(TransitionError::IllegalTransition { from, to: next });
        }

        self.phase = next;
        info!(?from, to = ?next, "phase changed");
        out.push(Event::PhaseChanged { from, to: next });
        Ok(())
    }

    fn message(&self, text: impl Into<String>, out: &mut Vec<Event>) {
        out.push(Event::MessageShown {
            text: text.into(),
            duration: self.config.pacing.message_duration(),
        });
    }

    /// Runs `task` after `delay`; a zero delay runs it immediately.
    fn defer(&mut self, delay: Duration, task: DeferredTask, out: &mut Vec<Event>) {
        if delay.is_zero() {
            self.run_task(task, out);
        } else {
            self.tasks.schedule(self.clock.saturating_add(delay), task);
        }
    }

    fn run_task(&mut self, task: DeferredTask, out: &mut Vec<Event>) {
        match task {
            DeferredTask::ReleaseEnemy { district, position } => {
                self.release_enemy(district, position, out);
            }
            DeferredTask::AdvanceFrom { district } => {
                if self.phase != LevelPhase::DistrictCombat(district) {
                    debug!(district = district.get(), "stale district advance dropped");
                    return;
                }
                if let Err(reason) = self.advance_from(district, out) {
                    reject(reason, out);
                }
            }
            DeferredTask::BeginRescue => self.begin_rescue(out),
            DeferredTask::FallbackCompletion => {
                if self.phase == LevelPhase::Completed {
                    return;
                }
                warn!("rescue target unavailable; completing level through fallback");
                if let Err(reason) = self.complete(out) {
                    reject(reason, out);
                }
            }
        }
    }

    fn start(&mut self, out: &mut Vec<Event>) -> Result<(), TransitionError> {
        match self.lifecycle {
            Lifecycle::Pending => {}
            Lifecycle::Running => return Err(TransitionError::AlreadyStarted),
            Lifecycle::Disposed => return Err(TransitionError::Disposed),
        }
        if self.player.is_none() {
            return Err(TransitionError::PlayerMissing);
        }

        let resumed = self
            .checkpoints
            .load()
            .map(|checkpoint| (checkpoint.id(), checkpoint.position(), checkpoint.name().to_owned()));
        let fresh_position = self
            .config
            .checkpoints
            .first()
            .map_or(Vec3::ZERO, |checkpoint| checkpoint.position);

        self.lifecycle = Lifecycle::Running;
        let (checkpoint, position) = match resumed {
            Some((id, position, name)) => {
                info!(checkpoint = id.get(), %name, "level resumed");
                out.push(Event::LevelStarted { checkpoint: id });
                self.message(format!("Resuming from {name}"), out);
                (id, position)
            }
            None => {
                info!("level started fresh");
                out.push(Event::LevelStarted {
                    checkpoint: CheckpointId::new(0),
                });
                (CheckpointId::new(0), fresh_position)
            }
        };

        self.place_player(position, out);
        for offset in &self.config.ally_offsets {
            let ally_position = position + *offset;
            let ally = self.allies.insert(ally_position);
            out.push(Event::AllySpawned {
                ally,
                position: ally_position,
            });
        }

        let cleared = checkpoint.districts_cleared();
        for index in 0..cleared {
            self.defeats.mark_cleared(DistrictId::new(index as u32));
        }

        if cleared < DISTRICT_COUNT {
            let district = DistrictId::new(cleared as u32);
            self.phase = LevelPhase::DistrictCombat(district);
            self.begin_wave(district, out);
            Ok(())
        } else {
            self.start_storm_inner(out)
        }
    }

    fn place_player(&mut self, position: Vec3, out: &mut Vec<Event>) {
        if let Some(player) = self.player.as_mut() {
            player.position = position;
            out.push(Event::PlayerPlaced { position });
        }
    }

    fn begin_wave(&mut self, district: DistrictId, out: &mut Vec<Event>) {
        let Some(layout) = self.config.districts.get(district.index()) else {
            warn!(district = district.get(), "wave requested for unknown district");
            return;
        };

        let plan = self.spawning.plan_wave(layout);
        let name = layout.name().to_owned();
        info!(district = district.get(), planned = plan.len(), "wave started");
        out.push(Event::WaveStarted {
            district,
            planned: plan.len() as u32,
        });
        self.message(format!("{name} is under attack"), out);

        for spawn in plan {
            self.defer(
                spawn.delay,
                DeferredTask::ReleaseEnemy {
                    district,
                    position: spawn.position,
                },
                out,
            );
        }
    }

    fn release_enemy(&mut self, district: DistrictId, position: Vec3, out: &mut Vec<Event>) {
        if self.phase.district() != Some(district) {
            debug!(district = district.get(), "stale enemy release dropped");
            return;
        }

        let Some(layout) = self.config.districts.get(district.index()) else {
            out.push(Event::SpawnRejected {
                district,
                reason: SpawnRejection::DistrictOutOfRange,
            });
            return;
        };

        let (spawned, local_live) = self
            .defeats
            .wave(district)
            .map_or((0, 0), |wave| (wave.spawned(), wave.live()));
        let gate = SpawnGate {
            storm_active: self.storm.is_running(),
            spawned,
            local_live,
            arena_live: self.enemies.live_in_district(district),
        };

        if let Err(reason) = self.spawning.admit(layout, gate) {
            warn!(district = district.get(), %reason, "spawn rejected");
            out.push(Event::SpawnRejected { district, reason });
            return;
        }

        if !self.defeats.record_spawn(district) {
            return;
        }

        let enemy = self.enemies.insert(district, position);
        debug!(enemy = enemy.get(), district = district.get(), "enemy spawned");
        out.push(Event::EnemySpawned {
            enemy,
            district,
            position,
        });
    }

    fn enemy_defeated(&mut self, enemy: EnemyId, out: &mut Vec<Event>) -> Result<(), TransitionError> {
        self.ensure_running()?;

        let Some(record) = self.enemies.remove(enemy) else {
            return Err(TransitionError::UnknownEnemy(enemy));
        };

        match self.defeats.record_kill(record.district) {
            KillOutcome::Ignored => {
                return Err(TransitionError::DistrictOutOfRange(record.district));
            }
            KillOutcome::Counted { district } => {
                out.push(Event::EnemyDefeated { enemy, district });
            }
            KillOutcome::DistrictCleared { district } => {
                out.push(Event::EnemyDefeated { enemy, district });
                self.district_cleared(district, out)?;
            }
        }

        self.check_completion_inner(out);
        Ok(())
    }

    fn district_cleared(
        &mut self,
        district: DistrictId,
        out: &mut Vec<Event>,
    ) -> Result<(), TransitionError> {
        info!(district = district.get(), "district cleared");
        out.push(Event::DistrictCleared { district });

        if self.phase.district() != Some(district) {
            debug!(district = district.get(), "cleared district is no longer active");
            return Ok(());
        }

        self.save_checkpoint(district.cleared_checkpoint(), out);
        self.heal_player(out);

        if district.next().is_some() {
            self.message("District cleared! Regroup before moving on", out);
            let delay = self.config.pacing.advance_delay();
            self.defer(delay, DeferredTask::AdvanceFrom { district }, out);
            Ok(())
        } else {
            self.start_storm_inner(out)
        }
    }

    fn save_checkpoint(&mut self, checkpoint: CheckpointId, out: &mut Vec<Event>) {
        if self.checkpoints.save(checkpoint) {
            out.push(Event::CheckpointSaved { checkpoint });
        }
    }

    fn heal_player(&mut self, out: &mut Vec<Event>) {
        let fraction = self.config.pacing.heal_fraction;
        let Some(player) = self.player.as_mut() else {
            warn!("player avatar missing; district heal skipped");
            return;
        };

        let before = player.current_health;
        player.current_health = (before + player.max_health * fraction)
            .min(player.max_health)
            .max(before);
        out.push(Event::PlayerHealed {
            amount: player.current_health - before,
            health: player.current_health,
        });
    }

    fn advance_district(&mut self, out: &mut Vec<Event>) -> Result<(), TransitionError> {
        self.ensure_running()?;
        match self.phase {
            LevelPhase::DistrictCombat(current) => self.advance_from(current, out),
            LevelPhase::Completed => Err(TransitionError::AlreadyCompleted),
            _ => Err(TransitionError::StormAlreadyStarted),
        }
    }

    fn advance_from(
        &mut self,
        current: DistrictId,
        out: &mut Vec<Event>,
    ) -> Result<(), TransitionError> {
        let _ = self.tasks.take_where(|task| {
            matches!(task, DeferredTask::ReleaseEnemy { district, .. } if *district == current)
        });
        for enemy in self.enemies.remove_district(current) {
            out.push(Event::EnemyDespawned { enemy });
        }

        match current.next() {
            Some(next) => {
                self.transition(LevelPhase::DistrictCombat(next), out)?;
                self.begin_wave(next, out);
                Ok(())
            }
            None => self.start_storm_inner(out),
        }
    }

    fn force_clear_district(&mut self, out: &mut Vec<Event>) -> Result<(), TransitionError> {
        self.ensure_running()?;
        let district = match self.phase {
            LevelPhase::DistrictCombat(district) => district,
            LevelPhase::Completed => return Err(TransitionError::AlreadyCompleted),
            _ => return Err(TransitionError::StormAlreadyStarted),
        };

        let pending = self.tasks.take_where(|task| {
            matches!(task, DeferredTask::ReleaseEnemy { district: owner, .. } if *owner == district)
        });
        for task in pending {
            self.run_task(task, out);
        }

        let missing = self
            .defeats
            .wave(district)
            .map_or(0, |wave| wave.cap() - wave.spawned());
        if missing > 0 {
            if let Some(layout) = self.config.districts.get(district.index()) {
                let extra = self.spawning.plan_wave(layout);
                for spawn in extra.into_iter().take(missing as usize) {
                    self.release_enemy(district, spawn.position, out);
                }
            }
        }

        for enemy in self.enemies.ids_in_district(district) {
            self.enemy_defeated(enemy, out)?;
        }
        Ok(())
    }

    fn start_storm(&mut self, out: &mut Vec<Event>) -> Result<(), TransitionError> {
        self.ensure_running()?;
        if self.phase == LevelPhase::Completed {
            return Err(TransitionError::AlreadyCompleted);
        }
        self.start_storm_inner(out)
    }

    fn start_storm_inner(&mut self, out: &mut Vec<Event>) -> Result<(), TransitionError> {
        if self.phase.storm_started() {
            return Err(TransitionError::StormAlreadyStarted);
        }
        self.transition(LevelPhase::StormActive, out)?;

        let cancelled = self
            .tasks
            .take_where(|task| {
                matches!(
                    task,
                    DeferredTask::ReleaseEnemy { .. } | DeferredTask::AdvanceFrom { .. }
                )
            })
            .len();
        for enemy in self.enemies.drain() {
            out.push(Event::EnemyDespawned { enemy });
        }

        self.save_checkpoint(STORM_CHECKPOINT, out);

        let center = self.config.storm_center;
        let _ = self.storm.start(center);
        info!(cancelled, radius = self.storm.radius(), "storm started");
        out.push(Event::StormStarted {
            center,
            radius: self.storm.radius(),
        });
        self.message("The storm is closing in! Stay inside the safe zone", out);
        out.push(Event::RescueTargetRequested {
            position: self.config.rescue_position,
        });
        Ok(())
    }

    fn tick(&mut self, dt: Duration, out: &mut Vec<Event>) {
        if self.lifecycle != Lifecycle::Running || self.phase == LevelPhase::Completed {
            return;
        }

        self.clock = self.clock.saturating_add(dt);
        while let Some(task) = self.tasks.pop_due(self.clock) {
            self.run_task(task, out);
        }

        self.update_storm(dt, out);
        self.check_completion_inner(out);
    }

    fn update_storm(&mut self, dt: Duration, out: &mut Vec<Event>) {
        if !self.storm.is_running() {
            return;
        }

        let mut signals = Vec::new();
        self.storm.update(self.clock, &mut signals);
        for signal in signals {
            match signal {
                StormSignal::FinalCountdownStarted => {
                    if let Err(reason) = self.transition(LevelPhase::StormFinalCountdown, out) {
                        reject(reason, out);
                    }
                    out.push(Event::StormFinalCountdownStarted);
                    self.message("The storm reached its limit. Hold on!", out);
                }
                StormSignal::Countdown { remaining_seconds } => {
                    out.push(Event::StormCountdown { remaining_seconds });
                }
                StormSignal::Ended => {
                    info!("storm countdown elapsed");
                    out.push(Event::StormEnded {
                        reason: StormEndReason::Elapsed,
                    });
                }
            }
        }

        if self.storm.take_completion() {
            let delay = self.config.pacing.settle_delay();
            self.defer(delay, DeferredTask::BeginRescue, out);
        }

        let Some(player) = self.player.as_mut() else {
            return;
        };
        let damage = self.storm.check_boundary(player.position, dt);
        if damage > 0.0 {
            player.current_health = (player.current_health - damage).max(0.0);
            out.push(Event::PlayerDamaged {
                amount: damage,
                health: player.current_health,
            });
        }
    }

    fn begin_rescue(&mut self, out: &mut Vec<Event>) {
        if self.phase != LevelPhase::StormFinalCountdown {
            debug!(phase = ?self.phase, "stale rescue opening dropped");
            return;
        }
        if let Err(reason) = self.transition(LevelPhase::RescuePending, out) {
            reject(reason, out);
            return;
        }
        self.message("The storm has passed. Free the captive!", out);
    }

    fn rescue_target_loaded(
        &mut self,
        outcome: AssetLoad,
        out: &mut Vec<Event>,
    ) -> Result<(), TransitionError> {
        self.ensure_running()?;
        if self.phase == LevelPhase::Completed {
            debug!(?outcome, "rescue target load finished after completion; ignored");
            return Ok(());
        }
        if !self.phase.storm_started() {
            return Err(TransitionError::StormNotStarted);
        }

        match outcome {
            AssetLoad::Ready => {
                self.rescue.target_placed = true;
                out.push(Event::RescueTargetPlaced {
                    position: self.config.rescue_position,
                });
            }
            AssetLoad::Failed => {
                warn!("rescue target failed to load; scheduling fallback completion");
                out.push(Event::RescueTargetLoadFailed);
                let delay = self.config.pacing.rescue_fallback();
                self.defer(delay, DeferredTask::FallbackCompletion, out);
            }
        }
        Ok(())
    }

    fn release_rescue_target(&mut self, out: &mut Vec<Event>) -> Result<(), TransitionError> {
        self.ensure_running()?;
        if self.rescue.released {
            return Err(TransitionError::RescueAlreadyReleased);
        }
        if self.phase == LevelPhase::Completed {
            return Err(TransitionError::AlreadyCompleted);
        }
        if !self.phase.storm_started() {
            return Err(TransitionError::StormNotStarted);
        }
        self.complete(out)
    }

    fn force_complete(&mut self, out: &mut Vec<Event>) -> Result<(), TransitionError> {
        self.ensure_running()?;
        if self.phase == LevelPhase::Completed {
            return Err(TransitionError::AlreadyCompleted);
        }
        self.complete(out)
    }

    fn complete(&mut self, out: &mut Vec<Event>) -> Result<(), TransitionError> {
        self.transition(LevelPhase::Completed, out)?;

        self.rescue.released = true;
        out.push(Event::RescueReleased);

        if self.storm.stop() {
            out.push(Event::StormEnded {
                reason: StormEndReason::Aborted,
            });
        }
        let cancelled = self.tasks.clear();
        for enemy in self.enemies.drain() {
            out.push(Event::EnemyDespawned { enemy });
        }

        self.checkpoints.clear();
        out.push(Event::CheckpointCleared);

        out.push(Event::CelebrationShown);
        self.message("The captive is free! Level complete", out);
        info!(cancelled, "level completed");
        out.push(Event::LevelCompleted);

        if !self.next_level_requested {
            self.next_level_requested = true;
            out.push(Event::NextLevelRequested);
        }
        Ok(())
    }

    fn check_completion(&mut self, out: &mut Vec<Event>) -> Result<(), TransitionError> {
        self.ensure_running()?;
        self.check_completion_inner(out);
        Ok(())
    }

    /// Hands off to the storm once every district is exhausted and no enemy lives.
    fn check_completion_inner(&mut self, out: &mut Vec<Event>) {
        if !self.enemies.is_empty() || self.phase.district().is_none() {
            return;
        }
        if !self.defeats.all_cleared() {
            return;
        }

        info!("every district exhausted; handing off to the storm");
        if let Err(reason) = self.start_storm_inner(out) {
            reject(reason, out);
        }
    }

    fn teleport(&mut self, destination: Landmark, out: &mut Vec<Event>) -> Result<(), TransitionError> {
        self.ensure_running()?;
        let position = match destination {
            Landmark::District(district) => self
                .config
                .districts
                .get(district.index())
                .map(District::center)
                .ok_or(TransitionError::DistrictOutOfRange(district))?,
            Landmark::Rescue => self.config.rescue_position,
        };

        if self.player.is_none() {
            return Err(TransitionError::PlayerMissing);
        }
        self.place_player(position, out);
        Ok(())
    }

    fn dispose(&mut self, out: &mut Vec<Event>) {
        let stopped = self.storm.stop();
        let cancelled = self.tasks.clear();
        let despawned = self.enemies.drain();
        for enemy in &despawned {
            out.push(Event::EnemyDespawned { enemy: *enemy });
        }
        self.allies.clear();
        self.player = None;
        self.lifecycle = Lifecycle::Disposed;

        info!(
            cancelled,
            despawned = despawned.len(),
            stopped,
            "level disposed"
        );
        out.push(Event::LevelDisposed);
    }
}

/// Applies the provided command to the level, mutating state deterministically.
pub fn apply(level: &mut Level, command: Command, out_events: &mut Vec<Event>) {
    if level.lifecycle == Lifecycle::Disposed {
        debug!(?command, "level disposed; command dropped");
        return;
    }

    let result = match command {
        Command::AttachPlayer {
            position,
            current_health,
            max_health,
        } => {
            level.player = Some(Player {
                position,
                current_health: current_health.min(max_health),
                max_health,
            });
            Ok(())
        }
        Command::DetachPlayer => {
            level.player = None;
            Ok(())
        }
        Command::Start => level.start(out_events),
        Command::Tick { dt } => {
            level.tick(dt, out_events);
            Ok(())
        }
        Command::EnemyDefeated { enemy } => level.enemy_defeated(enemy, out_events),
        Command::AdvanceDistrict => level.advance_district(out_events),
        Command::ForceClearDistrict => level.force_clear_district(out_events),
        Command::StartStorm => level.start_storm(out_events),
        Command::ReleaseRescueTarget => level.release_rescue_target(out_events),
        Command::ForceComplete => level.force_complete(out_events),
        Command::CheckCompletion => level.check_completion(out_events),
        Command::TeleportPlayer { destination } => level.teleport(destination, out_events),
        Command::RescueTargetLoaded { outcome } => level.rescue_target_loaded(outcome, out_events),
        Command::Dispose => {
            level.dispose(out_events);
            Ok(())
        }
    };

    if let Err(reason) = result {
        reject(reason, out_events);
    }
}

fn reject(reason: TransitionError, out: &mut Vec<Event>) {
    if reason.is_repeat() {
        debug!(%reason, "repeated one-shot operation ignored");
        return;
    }
    warn!(%reason, "command rejected");
    out.push(Event::TransitionRejected { reason });
}

/// Query functions that provide read-only access to the level state.
pub mod query {
    use std::time::Duration;

    use district_siege_core::{
        AllyId, CheckpointId, District, DistrictId, EnemyId, Landmark, LevelPhase,
    };
    use glam::Vec3;

    pub use district_siege_system_checkpoints::Checkpoint;
    pub use district_siege_system_defeat_tracking::WaveState;
    pub use district_siege_system_storm::StormState;

    use super::{Level, Lifecycle};

    /// Phase the level is currently in.
    #[must_use]
    pub fn phase(level: &Level) -> LevelPhase {
        level.phase
    }

    /// Lifecycle the level is currently in.
    #[must_use]
    pub fn lifecycle(level: &Level) -> Lifecycle {
        level.lifecycle
    }

    /// Time accumulated by frames since the level started.
    #[must_use]
    pub fn clock(level: &Level) -> Duration {
        level.clock
    }

    /// Layout of every district.
    #[must_use]
    pub fn districts(level: &Level) -> &[District] {
        &level.config.districts
    }

    /// District under attack, if the level is still in combat.
    #[must_use]
    pub fn current_district(level: &Level) -> Option<DistrictId> {
        level.phase.district()
    }

    /// Spawn and defeat counters of a district.
    #[must_use]
    pub fn wave_state(level: &Level, district: DistrictId) -> Option<WaveState> {
        level.defeats.wave(district).copied()
    }

    /// Reports whether a district is cleared.
    #[must_use]
    pub fn is_district_cleared(level: &Level, district: DistrictId) -> bool {
        level.defeats.is_district_cleared(district)
    }

    /// Enemies defeated across every district, including resumed ones.
    #[must_use]
    pub fn total_defeated(level: &Level) -> u32 {
        level.defeats.total_defeated()
    }

    /// Immutable representation of a live enemy.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct EnemySnapshot {
        /// Identifier of the enemy.
        pub id: EnemyId,
        /// District whose wave the enemy belongs to.
        pub district: DistrictId,
        /// Position the enemy spawned at.
        pub position: Vec3,
    }

    /// Captures every live enemy in identifier order.
    #[must_use]
    pub fn live_enemies(level: &Level) -> Vec<EnemySnapshot> {
        level
            .enemies
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                district: enemy.district,
                position: enemy.position,
            })
            .collect()
    }

    /// Live enemies belonging to a district.
    #[must_use]
    pub fn live_enemy_count(level: &Level, district: DistrictId) -> u32 {
        level.enemies.live_in_district(district)
    }

    /// Immutable representation of an allied companion.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct AllySnapshot {
        /// Identifier of the ally.
        pub id: AllyId,
        /// Position the ally spawned at.
        pub position: Vec3,
    }

    /// Captures every ally in identifier order.
    #[must_use]
    pub fn allies(level: &Level) -> Vec<AllySnapshot> {
        level
            .allies
            .iter()
            .map(|ally| AllySnapshot {
                id: ally.id,
                position: ally.position,
            })
            .collect()
    }

    /// Immutable representation of the player avatar.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct PlayerSnapshot {
        /// Position of the avatar.
        pub position: Vec3,
        /// Health the avatar holds.
        pub current_health: f32,
        /// Upper bound for the avatar's health.
        pub max_health: f32,
    }

    /// Captures the player avatar, if one is attached.
    #[must_use]
    pub fn player(level: &Level) -> Option<PlayerSnapshot> {
        level.player.map(|player| PlayerSnapshot {
            position: player.position,
            current_health: player.current_health,
            max_health: player.max_health,
        })
    }

    /// Furthest checkpoint reached.
    #[must_use]
    pub fn current_checkpoint(level: &Level) -> CheckpointId {
        level.checkpoints.current()
    }

    /// Every checkpoint with its reached flag.
    #[must_use]
    pub fn checkpoints(level: &Level) -> &[Checkpoint] {
        level.checkpoints.checkpoints()
    }

    /// Raw progress value held by the session store.
    #[must_use]
    pub fn persisted_checkpoint(level: &Level) -> Option<String> {
        level.checkpoints.persisted()
    }

    /// Immutable representation of the storm.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct StormSnapshot {
        /// Lifecycle state of the storm.
        pub state: StormState,
        /// Center of the safe zone.
        pub center: Vec3,
        /// Current safe-zone radius.
        pub radius: f32,
        /// Seconds left in the final countdown, once it started.
        pub remaining_seconds: Option<u32>,
    }

    /// Captures the storm.
    #[must_use]
    pub fn storm(level: &Level) -> StormSnapshot {
        StormSnapshot {
            state: level.storm.state(),
            center: level.storm.center(),
            radius: level.storm.radius(),
            remaining_seconds: level.storm.remaining_seconds(),
        }
    }

    /// Reports whether the captive was released.
    #[must_use]
    pub fn rescue_released(level: &Level) -> bool {
        level.rescue.released
    }

    /// Reports whether the rescue target asset is in place.
    #[must_use]
    pub fn rescue_target_placed(level: &Level) -> bool {
        level.rescue.target_placed
    }

    /// Deferred tasks waiting on the level clock.
    #[must_use]
    pub fn pending_tasks(level: &Level) -> usize {
        level.tasks.len()
    }

    /// Position a teleport to `landmark` would place the player at.
    #[must_use]
    pub fn landmark_position(level: &Level, landmark: Landmark) -> Option<Vec3> {
        match landmark {
            Landmark::District(district) => level
                .config
                .districts
                .get(district.index())
                .map(District::center),
            Landmark::Rescue => Some(level.config.rescue_position),
        }
    }

    /// Comparable capture of every observable piece of level state.
    #[derive(Clone, Debug, PartialEq)]
    pub struct LevelSnapshot {
        /// Phase of the level.
        pub phase: LevelPhase,
        /// Lifecycle of the level.
        pub lifecycle: Lifecycle,
        /// Level clock.
        pub clock: Duration,
        /// Counters of every district.
        pub waves: Vec<WaveState>,
        /// Live enemies.
        pub enemies: Vec<EnemySnapshot>,
        /// Allied companions.
        pub allies: Vec<AllySnapshot>,
        /// Player avatar.
        pub player: Option<PlayerSnapshot>,
        /// Furthest checkpoint reached.
        pub checkpoint: CheckpointId,
        /// Raw persisted progress.
        pub persisted: Option<String>,
        /// Storm state.
        pub storm: StormSnapshot,
        /// Whether the captive was released.
        pub rescue_released: bool,
        /// Deferred tasks pending.
        pub pending_tasks: usize,
    }

    /// Captures the complete observable state of the level.
    #[must_use]
    pub fn snapshot(level: &Level) -> LevelSnapshot {
        let waves = (0..level.config.districts.len())
            .filter_map(|index| wave_state(level, DistrictId::new(index as u32)))
            .collect();

        LevelSnapshot {
            phase: phase(level),
            lifecycle: lifecycle(level),
            clock: clock(level),
            waves,
            enemies: live_enemies(level),
            allies: allies(level),
            player: player(level),
            checkpoint: current_checkpoint(level),
            persisted: persisted_checkpoint(level),
            storm: storm(level),
            rescue_released: rescue_released(level),
            pending_tasks: pending_tasks(level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use district_siege_core::CHECKPOINT_KEY;

    fn attach(level: &mut Level, events: &mut Vec<Event>) {
        apply(
            level,
            Command::AttachPlayer {
                position: Vec3::ZERO,
                current_health: 40.0,
                max_health: 100.0,
            },
            events,
        );
    }

    fn started(config: LevelConfig, session: MemorySessionStore) -> (Level, Vec<Event>) {
        let mut level = Level::new(config, Box::new(session)).expect("valid config");
        let mut events = Vec::new();
        attach(&mut level, &mut events);
        apply(&mut level, Command::Start, &mut events);
        (level, events)
    }

    #[test]
    fn start_without_player_is_rejected() {
        let mut level =
            Level::new(LevelConfig::instant(), Box::new(MemorySessionStore::new())).expect("valid");
        let mut events = Vec::new();

        apply(&mut level, Command::Start, &mut events);

        assert_eq!(
            events,
            vec![Event::TransitionRejected {
                reason: TransitionError::PlayerMissing
            }]
        );
        assert_eq!(query::lifecycle(&level), Lifecycle::Pending);
    }

    #[test]
    fn fresh_start_fights_first_district() {
        let (level, events) = started(LevelConfig::instant(), MemorySessionStore::new());

        assert_eq!(
            events.first(),
            Some(&Event::LevelStarted {
                checkpoint: CheckpointId::new(0)
            })
        );
        assert_eq!(
            query::phase(&level),
            LevelPhase::DistrictCombat(DistrictId::new(0))
        );
        assert_eq!(query::live_enemy_count(&level, DistrictId::new(0)), 4);
        assert_eq!(query::allies(&level).len(), 2);
        assert_eq!(
            query::player(&level).map(|player| player.position),
            Some(Vec3::ZERO)
        );
    }

    #[test]
    fn staggered_releases_wait_for_the_clock() {
        let (mut level, _) = started(LevelConfig::default(), MemorySessionStore::new());
        let district = DistrictId::new(0);

        assert_eq!(query::live_enemy_count(&level, district), 1);
        assert_eq!(query::pending_tasks(&level), 3);

        let mut events = Vec::new();
        apply(
            &mut level,
            Command::Tick {
                dt: Duration::from_millis(800),
            },
            &mut events,
        );
        assert_eq!(query::live_enemy_count(&level, district), 2);
    }

    #[test]
    fn resume_skips_cleared_districts() {
        let session = MemorySessionStore::new().with_entry(CHECKPOINT_KEY, "2");
        let (level, events) = started(LevelConfig::instant(), session);

        assert!(events.contains(&Event::LevelStarted {
            checkpoint: CheckpointId::new(2)
        }));
        assert_eq!(
            query::phase(&level),
            LevelPhase::DistrictCombat(DistrictId::new(2))
        );
        assert!(query::is_district_cleared(&level, DistrictId::new(0)));
        assert!(query::is_district_cleared(&level, DistrictId::new(1)));
        assert_eq!(query::total_defeated(&level), 8);
        let expected = level.config.checkpoints[2].position;
        assert_eq!(
            query::player(&level).map(|player| player.position),
            Some(expected)
        );
    }

    #[test]
    fn resume_from_final_gate_opens_the_storm() {
        let session = MemorySessionStore::new().with_entry(CHECKPOINT_KEY, "3");
        let (level, events) = started(LevelConfig::instant(), session);

        assert_eq!(query::phase(&level), LevelPhase::StormActive);
        assert!(query::live_enemies(&level).is_empty());
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::StormStarted { .. })));
    }

    #[test]
    fn resume_from_storm_checkpoint_opens_the_storm() {
        let session = MemorySessionStore::new().with_entry(CHECKPOINT_KEY, "4");
        let (level, events) = started(LevelConfig::instant(), session);

        assert!(events.contains(&Event::LevelStarted {
            checkpoint: STORM_CHECKPOINT
        }));
        assert_eq!(query::phase(&level), LevelPhase::StormActive);
        assert_eq!(query::current_checkpoint(&level), STORM_CHECKPOINT);
        for index in 0..3 {
            assert!(query::is_district_cleared(&level, DistrictId::new(index)));
        }
        assert!(query::live_enemies(&level).is_empty());
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::CheckpointSaved { .. })));
        assert_eq!(query::persisted_checkpoint(&level).as_deref(), Some("4"));
    }

    #[test]
    fn level_refuses_waves_that_cannot_clear_a_district() {
        let mut config = LevelConfig::instant();
        config.spawn.wave_size = 2;

        let result = Level::new(config, Box::new(MemorySessionStore::new()));

        assert!(matches!(
            result,
            Err(ConfigError::WaveBelowCap { wave_size: 2, .. })
        ));
    }

    #[test]
    fn corrupt_progress_starts_fresh() {
        let session = MemorySessionStore::new().with_entry(CHECKPOINT_KEY, "garbage");
        let (level, _) = started(LevelConfig::instant(), session);

        assert_eq!(
            query::phase(&level),
            LevelPhase::DistrictCombat(DistrictId::new(0))
        );
        assert_eq!(query::current_checkpoint(&level), CheckpointId::new(0));
    }

    #[test]
    fn storm_start_cancels_pending_releases() {
        let (mut level, _) = started(LevelConfig::default(), MemorySessionStore::new());
        let mut events = Vec::new();

        apply(&mut level, Command::StartStorm, &mut events);

        assert_eq!(query::pending_tasks(&level), 0);
        assert!(query::live_enemies(&level).is_empty());
        assert_eq!(query::current_checkpoint(&level), STORM_CHECKPOINT);

        events.clear();
        apply(
            &mut level,
            Command::Tick {
                dt: Duration::from_secs(5),
            },
            &mut events,
        );
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::EnemySpawned { .. })));
    }

    #[test]
    fn repeated_storm_start_is_silent() {
        let (mut level, _) = started(LevelConfig::instant(), MemorySessionStore::new());
        let mut events = Vec::new();
        apply(&mut level, Command::StartStorm, &mut events);

        events.clear();
        apply(&mut level, Command::StartStorm, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn commands_before_start_are_rejected() {
        let mut level =
            Level::new(LevelConfig::instant(), Box::new(MemorySessionStore::new())).expect("valid");
        let mut events = Vec::new();

        apply(&mut level, Command::AdvanceDistrict, &mut events);

        assert_eq!(
            events,
            vec![Event::TransitionRejected {
                reason: TransitionError::NotStarted
            }]
        );
    }

    #[test]
    fn disposed_level_drops_every_command() {
        let (mut level, _) = started(LevelConfig::default(), MemorySessionStore::new());
        let mut events = Vec::new();
        apply(&mut level, Command::Dispose, &mut events);
        assert_eq!(events.last(), Some(&Event::LevelDisposed));

        let before = query::snapshot(&level);
        events.clear();
        apply(
            &mut level,
            Command::Tick {
                dt: Duration::from_secs(60),
            },
            &mut events,
        );
        apply(&mut level, Command::ForceComplete, &mut events);
        apply(&mut level, Command::Start, &mut events);

        assert!(events.is_empty());
        assert_eq!(query::snapshot(&level), before);
        assert_eq!(query::pending_tasks(&level), 0);
    }

    #[test]
    fn heal_restores_half_of_max_health() {
        let (mut level, _) = started(LevelConfig::instant(), MemorySessionStore::new());
        let mut events = Vec::new();

        apply(&mut level, Command::ForceClearDistrict, &mut events);

        assert!(events.contains(&Event::PlayerHealed {
            amount: 50.0,
            health: 90.0
        }));
        assert_eq!(
            query::phase(&level),
            LevelPhase::DistrictCombat(DistrictId::new(1))
        );
    }
}
