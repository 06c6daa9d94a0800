#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Resumable checkpoint progress and its persisted data contract.
//!
//! Progress is a single decimal integer stored under [`CHECKPOINT_KEY`] in a
//! session-scoped [`SessionStore`]. An absent key means a fresh start; a value
//! that cannot be parsed or lies outside the checkpoint sequence is treated
//! exactly like an absent one.

use std::{collections::BTreeMap, fmt, num::ParseIntError};

use district_siege_core::{CheckpointId, CheckpointSpec, CHECKPOINT_KEY};
use glam::Vec3;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Key-value string storage scoped to a play session.
pub trait SessionStore: fmt::Debug {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: String);

    /// Removes the value stored under `key`.
    fn remove(&mut self, key: &str);
}

/// Session store that keeps entries in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemorySessionStore {
    entries: BTreeMap<String, String>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the store with an additional entry.
    #[must_use]
    pub fn with_entry(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value.into());
        self
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        let _ = self.entries.insert(key.to_owned(), value);
    }

    fn remove(&mut self, key: &str) {
        let _ = self.entries.remove(key);
    }
}

/// Reasons persisted progress could not be resolved.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The stored value is not a non-negative integer.
    #[error("persisted checkpoint `{value}` is not a valid index")]
    Corrupt {
        /// Raw value found in the store.
        value: String,
        /// Parse failure.
        #[source]
        source: ParseIntError,
    },
    /// The stored index lies outside the checkpoint sequence.
    #[error("persisted checkpoint {id} is outside 0..{len}")]
    OutOfRange {
        /// Index found in the store.
        id: u64,
        /// Number of checkpoints in the sequence.
        len: usize,
    },
}

/// A checkpoint together with whether the player reached it.
#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint {
    spec: CheckpointSpec,
    reached: bool,
}

impl Checkpoint {
    /// Position of the checkpoint within the sequence.
    #[must_use]
    pub const fn id(&self) -> CheckpointId {
        self.spec.id
    }

    /// Display name of the checkpoint.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Where the player resumes from.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.spec.position
    }

    /// Whether the player reached the checkpoint.
    #[must_use]
    pub const fn reached(&self) -> bool {
        self.reached
    }
}

/// Ordered checkpoint sequence backed by a session store.
#[derive(Debug)]
pub struct CheckpointStore {
    checkpoints: Vec<Checkpoint>,
    current: CheckpointId,
    session: Box<dyn SessionStore>,
}

impl CheckpointStore {
    /// Creates a store over `specs`; the first checkpoint starts out reached.
    #[must_use]
    pub fn new(specs: Vec<CheckpointSpec>, session: Box<dyn SessionStore>) -> Self {
        let checkpoints = specs
            .into_iter()
            .enumerate()
            .map(|(index, spec)| Checkpoint {
                spec,
                reached: index == 0,
            })
            .collect();

        Self {
            checkpoints,
            current: CheckpointId::new(0),
            session,
        }
    }

    /// Index of the furthest checkpoint reached.
    #[must_use]
    pub const fn current(&self) -> CheckpointId {
        self.current
    }

    /// Looks up a checkpoint by index.
    #[must_use]
    pub fn checkpoint(&self, id: CheckpointId) -> Option<&Checkpoint> {
        self.checkpoints.get(id.index())
    }

    /// Every checkpoint in sequence order.
    #[must_use]
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Raw value currently persisted for the level, if any.
    #[must_use]
    pub fn persisted(&self) -> Option<String> {
        self.session.get(CHECKPOINT_KEY)
    }

    /// Persists `id` as the furthest progress.
    ///
    /// Returns `false` without touching the store when `id` does not lie past
    /// the current checkpoint or outside the sequence.
    pub fn save(&mut self, id: CheckpointId) -> bool {
        if id <= self.current {
            debug!(
                checkpoint = id.get(),
                current = self.current.get(),
                "checkpoint would regress; ignored"
            );
            return false;
        }

        let Some(checkpoint) = self.checkpoints.get_mut(id.index()) else {
            warn!(checkpoint = id.get(), "checkpoint outside sequence; ignored");
            return false;
        };

        checkpoint.reached = true;
        self.current = id;
        self.session.set(CHECKPOINT_KEY, id.get().to_string());
        info!(checkpoint = id.get(), name = %checkpoint.name(), "checkpoint saved");
        true
    }

    /// Reads the persisted index without applying it.
    pub fn read(&self) -> Result<Option<CheckpointId>, CheckpointError> {
        let Some(value) = self.persisted() else {
            return Ok(None);
        };

        let id = value
            .trim()
            .parse::<u64>()
            .map_err(|source| CheckpointError::Corrupt {
                value: value.clone(),
                source,
            })?;

        let len = self.checkpoints.len();
        match u32::try_from(id) {
            Ok(index) if (index as usize) < len => Ok(Some(CheckpointId::new(index))),
            _ => Err(CheckpointError::OutOfRange { id, len }),
        }
    }

    /// Applies the persisted progress, returning the checkpoint to resume from.
    ///
    /// Every checkpoint up to the persisted one is marked reached. Absent or
    /// invalid progress yields `None`, meaning a fresh start.
    pub fn load(&mut self) -> Option<&Checkpoint> {
        let id = match self.read() {
            Ok(Some(id)) => id,
            Ok(None) => return None,
            Err(error) => {
                warn!(%error, "ignoring persisted checkpoint");
                return None;
            }
        };

        for checkpoint in self.checkpoints.iter_mut().take(id.index() + 1) {
            checkpoint.reached = true;
        }
        if id > self.current {
            self.current = id;
        }

        self.checkpoints.get(id.index())
    }

    /// Removes persisted progress.
    pub fn clear(&mut self) {
        self.session.remove(CHECKPOINT_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs() -> Vec<CheckpointSpec> {
        (0..5)
            .map(|index| CheckpointSpec {
                id: CheckpointId::new(index),
                name: format!("Checkpoint {index}"),
                position: Vec3::new(index as f32, 0.0, 0.0),
            })
            .collect()
    }

    #[test]
    fn negative_value_is_corrupt() {
        let session = MemorySessionStore::new().with_entry(CHECKPOINT_KEY, "-1");
        let store = CheckpointStore::new(specs(), Box::new(session));
        assert!(matches!(store.read(), Err(CheckpointError::Corrupt { .. })));
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let session = MemorySessionStore::new().with_entry(CHECKPOINT_KEY, " 3\n");
        let store = CheckpointStore::new(specs(), Box::new(session));
        assert_eq!(store.read().ok().flatten(), Some(CheckpointId::new(3)));
    }

    #[test]
    fn only_first_checkpoint_starts_reached() {
        let store = CheckpointStore::new(specs(), Box::new(MemorySessionStore::new()));
        let reached: Vec<_> = store.checkpoints().iter().map(Checkpoint::reached).collect();
        assert_eq!(reached, vec![true, false, false, false, false]);
    }
}
