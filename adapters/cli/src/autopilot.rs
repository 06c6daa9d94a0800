//! Scripted player that walks a level through every phase.

use std::time::Duration;

use district_siege_core::{AssetLoad, Command, Event, Landmark, LevelPhase};
use district_siege_debug_menu::{DebugAction, DebugMenu};
use district_siege_world::{self as world, query, Level};
use glam::Vec3;
use tracing::{debug, info};

const PLAYER_MAX_HEALTH: f32 = 100.0;

/// How a scripted run ended.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Outcome {
    /// The level completed and was disposed.
    Completed { frames: u32, clock: Duration },
    /// The frame budget ran out first.
    TimedOut { phase: LevelPhase },
}

/// Plays a level the way an attentive player would: defeat enemies at a fixed
/// pace, walk to the captive once the storm starts, free it when possible.
#[derive(Debug)]
pub(crate) struct Autopilot {
    frame: Duration,
    kill_interval: Duration,
    rescue_asset: AssetLoad,
    echo: bool,
    menu: DebugMenu,
    since_last_kill: Duration,
}

impl Autopilot {
    pub(crate) fn new(
        frame: Duration,
        kill_interval: Duration,
        rescue_asset: AssetLoad,
        echo: bool,
    ) -> Self {
        Self {
            frame,
            kill_interval,
            rescue_asset,
            echo,
            menu: DebugMenu::new(),
            since_last_kill: Duration::ZERO,
        }
    }

    pub(crate) fn run(
        &mut self,
        level: &mut Level,
        debug_actions: &[DebugAction],
        max_frames: u32,
    ) -> Outcome {
        let mut events = Vec::new();
        world::apply(
            level,
            Command::AttachPlayer {
                position: Vec3::ZERO,
                current_health: PLAYER_MAX_HEALTH,
                max_health: PLAYER_MAX_HEALTH,
            },
            &mut events,
        );
        world::apply(level, Command::Start, &mut events);
        for action in debug_actions {
            self.menu.dispatch(*action, level, &mut events);
        }

        let mut frames = 0;
        loop {
            self.react(level, std::mem::take(&mut events));

            if query::phase(level) == LevelPhase::Completed {
                let clock = query::clock(level);
                world::apply(level, Command::Dispose, &mut events);
                self.react(level, std::mem::take(&mut events));
                info!(frames, "scripted run completed");
                return Outcome::Completed { frames, clock };
            }
            if frames >= max_frames {
                return Outcome::TimedOut {
                    phase: query::phase(level),
                };
            }

            frames += 1;
            world::apply(level, Command::Tick { dt: self.frame }, &mut events);
            self.fight(level, &mut events);

            if query::phase(level) == LevelPhase::RescuePending {
                world::apply(level, Command::ReleaseRescueTarget, &mut events);
            }
        }
    }

    fn fight(&mut self, level: &mut Level, events: &mut Vec<Event>) {
        self.since_last_kill = self.since_last_kill.saturating_add(self.frame);
        if self.since_last_kill < self.kill_interval {
            return;
        }

        if let Some(enemy) = query::live_enemies(level).first() {
            debug!(enemy = enemy.id.get(), "autopilot defeats enemy");
            world::apply(level, Command::EnemyDefeated { enemy: enemy.id }, events);
            self.since_last_kill = Duration::ZERO;
        }
    }

    /// Prints `pending` and answers the requests it contains until the level goes quiet.
    fn react(&mut self, level: &mut Level, mut pending: Vec<Event>) {
        while !pending.is_empty() {
            let mut follow_up = Vec::new();
            for event in &pending {
                if self.echo {
                    println!("[{:>8.3}s] {event:?}", query::clock(level).as_secs_f32());
                }

                if let Event::RescueTargetRequested { .. } = event {
                    world::apply(
                        level,
                        Command::RescueTargetLoaded {
                            outcome: self.rescue_asset,
                        },
                        &mut follow_up,
                    );
                    world::apply(
                        level,
                        Command::TeleportPlayer {
                            destination: Landmark::Rescue,
                        },
                        &mut follow_up,
                    );
                }
            }
            pending = follow_up;
        }
    }
}
