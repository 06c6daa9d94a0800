//! Cancellable deferred tasks owned by a level.

use std::{collections::BTreeMap, time::Duration};

use district_siege_core::DistrictId;
use glam::Vec3;

/// Continuation scheduled to run on the level clock.
///
/// Tasks carry plain data only; the level re-validates its phase when a task
/// fires, so a task that outlived the situation it was scheduled for is a
/// no-op.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum DeferredTask {
    /// Releases one enemy of a staggered wave.
    ReleaseEnemy {
        district: DistrictId,
        position: Vec3,
    },
    /// Moves on from a cleared district after the pacing delay.
    AdvanceFrom { district: DistrictId },
    /// Opens the rescue objective once the storm settled.
    BeginRescue,
    /// Completes the level when the rescue target never became available.
    FallbackCompletion,
}

/// Ordered set of pending tasks keyed by due time and scheduling order.
#[derive(Debug, Default)]
pub(crate) struct TaskSet {
    pending: BTreeMap<(Duration, u64), DeferredTask>,
    next_sequence: u64,
}

impl TaskSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn schedule(&mut self, due: Duration, task: DeferredTask) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let _ = self.pending.insert((due, sequence), task);
    }

    /// Removes and returns the earliest task due at or before `now`.
    pub(crate) fn pop_due(&mut self, now: Duration) -> Option<DeferredTask> {
        let (&(due, _), _) = self.pending.first_key_value()?;
        if due > now {
            return None;
        }
        self.pending.pop_first().map(|(_, task)| task)
    }

    /// Removes every task matching `predicate`, returning them in firing order.
    pub(crate) fn take_where(
        &mut self,
        mut predicate: impl FnMut(&DeferredTask) -> bool,
    ) -> Vec<DeferredTask> {
        let keys: Vec<_> = self
            .pending
            .iter()
            .filter(|(_, task)| predicate(task))
            .map(|(key, _)| *key)
            .collect();

        keys.into_iter()
            .filter_map(|key| self.pending.remove(&key))
            .collect()
    }

    /// Cancels every pending task, returning how many were dropped.
    pub(crate) fn clear(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        cancelled
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_fire_in_due_then_schedule_order() {
        let mut tasks = TaskSet::new();
        tasks.schedule(Duration::from_millis(800), DeferredTask::BeginRescue);
        tasks.schedule(
            Duration::from_millis(100),
            DeferredTask::AdvanceFrom {
                district: DistrictId::new(0),
            },
        );
        tasks.schedule(Duration::from_millis(100), DeferredTask::FallbackCompletion);

        assert_eq!(tasks.pop_due(Duration::from_millis(50)), None);
        assert_eq!(
            tasks.pop_due(Duration::from_millis(900)),
            Some(DeferredTask::AdvanceFrom {
                district: DistrictId::new(0)
            })
        );
        assert_eq!(
            tasks.pop_due(Duration::from_millis(900)),
            Some(DeferredTask::FallbackCompletion)
        );
        assert_eq!(
            tasks.pop_due(Duration::from_millis(900)),
            Some(DeferredTask::BeginRescue)
        );
        assert_eq!(tasks.pop_due(Duration::from_millis(900)), None);
    }

    #[test]
    fn take_where_removes_only_matching_tasks() {
        let mut tasks = TaskSet::new();
        for index in 0..3 {
            tasks.schedule(
                Duration::from_millis(index * 800),
                DeferredTask::ReleaseEnemy {
                    district: DistrictId::new(1),
                    position: Vec3::ZERO,
                },
            );
        }
        tasks.schedule(Duration::from_secs(6), DeferredTask::BeginRescue);

        let taken = tasks.take_where(|task| matches!(task, DeferredTask::ReleaseEnemy { .. }));
        assert_eq!(taken.len(), 3);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks.clear(), 1);
        assert_eq!(tasks.len(), 0);
    }
}
