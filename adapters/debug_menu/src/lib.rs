#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Developer shortcuts for District Siege.
//!
//! The menu never touches level internals: every action is translated into
//! ordinary [`Command`]s and fed through [`world::apply`], so a shortcut obeys
//! the same phase guards as regular play.

use std::time::Duration;

use district_siege_core::{Command, DistrictId, Event, Landmark, LevelPhase, DISTRICT_COUNT};
use district_siege_world::{self as world, query, Level, Lifecycle};
use tracing::{info, warn};

/// How long the menu's own notices stay on screen.
const NOTICE_DURATION: Duration = Duration::from_secs(3);

/// Shortcut offered by the debug menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DebugAction {
    /// Clears the remaining districts one after another until the storm starts.
    FinishAllDistricts,
    /// Starts the storm immediately.
    StartStorm,
    /// Releases the captive immediately.
    ReleaseRescueTarget,
    /// Completes the level immediately.
    ForceComplete,
    /// Skips to the next district without clearing the current one.
    AdvanceDistrict,
    /// Moves the player avatar to a landmark.
    Teleport(Landmark),
}

impl DebugAction {
    /// Every action in menu order, including one teleport per landmark.
    #[must_use]
    pub fn all() -> Vec<DebugAction> {
        let mut actions = vec![
            Self::FinishAllDistricts,
            Self::StartStorm,
            Self::ReleaseRescueTarget,
            Self::ForceComplete,
            Self::AdvanceDistrict,
        ];
        actions.extend(
            (0..DISTRICT_COUNT)
                .map(|index| Self::Teleport(Landmark::District(DistrictId::new(index as u32)))),
        );
        actions.push(Self::Teleport(Landmark::Rescue));
        actions
    }

    /// Text shown for the action in the menu.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::FinishAllDistricts => "Finish all districts".to_owned(),
            Self::StartStorm => "Start storm".to_owned(),
            Self::ReleaseRescueTarget => "Release captive".to_owned(),
            Self::ForceComplete => "Complete level".to_owned(),
            Self::AdvanceDistrict => "Skip district".to_owned(),
            Self::Teleport(Landmark::District(district)) => {
                format!("Teleport to district {}", district.get() + 1)
            }
            Self::Teleport(Landmark::Rescue) => "Teleport to captive".to_owned(),
        }
    }
}

/// Dispatches debug shortcuts against a level.
#[derive(Debug, Default)]
pub struct DebugMenu {
    dispatched: u32,
}

impl DebugMenu {
    /// Creates a menu.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of actions dispatched so far.
    #[must_use]
    pub const fn dispatched(&self) -> u32 {
        self.dispatched
    }

    /// Executes `action` against `level`, appending every resulting event.
    pub fn dispatch(&mut self, action: DebugAction, level: &mut Level, out_events: &mut Vec<Event>) {
        self.dispatched += 1;
        info!(action = %action.label(), "debug action dispatched");

        match action {
            DebugAction::FinishAllDistricts => finish_all_districts(level, out_events),
            DebugAction::StartStorm => world::apply(level, Command::StartStorm, out_events),
            DebugAction::ReleaseRescueTarget => {
                world::apply(level, Command::ReleaseRescueTarget, out_events);
            }
            DebugAction::ForceComplete => world::apply(level, Command::ForceComplete, out_events),
            DebugAction::AdvanceDistrict => {
                world::apply(level, Command::AdvanceDistrict, out_events);
            }
            DebugAction::Teleport(destination) => teleport(level, destination, out_events),
        }
    }
}

fn finish_all_districts(level: &mut Level, out_events: &mut Vec<Event>) {
    if query::lifecycle(level) != Lifecycle::Running {
        world::apply(level, Command::ForceClearDistrict, out_events);
        return;
    }

    for _ in 0..DISTRICT_COUNT {
        let LevelPhase::DistrictCombat(district) = query::phase(level) else {
            return;
        };

        world::apply(level, Command::ForceClearDistrict, out_events);
        if query::phase(level) == LevelPhase::DistrictCombat(district) {
            world::apply(level, Command::AdvanceDistrict, out_events);
        }
    }

    if query::current_district(level).is_some() {
        warn!(phase = ?query::phase(level), "districts still active after finishing all");
    }
}

fn teleport(level: &mut Level, destination: Landmark, out_events: &mut Vec<Event>) {
    if query::player(level).is_none() || query::landmark_position(level, destination).is_none() {
        warn!(?destination, "teleport target not found");
        out_events.push(Event::MessageShown {
            text: "Teleport target not found".to_owned(),
            duration: NOTICE_DURATION,
        });
        return;
    }

    world::apply(level, Command::TeleportPlayer { destination }, out_events);
}
