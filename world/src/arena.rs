//! Owned registries of the combatants living in a level.

use std::collections::BTreeMap;

use district_siege_core::{AllyId, DistrictId, EnemyId};
use glam::Vec3;

/// Enemy record stored inside the level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct EnemyState {
    /// Identifier allocated by the level for the enemy.
    pub(crate) id: EnemyId,
    /// District whose wave the enemy belongs to.
    pub(crate) district: DistrictId,
    /// Position the enemy spawned at.
    pub(crate) position: Vec3,
}

/// Arena that owns every live enemy and allocates identifiers.
///
/// Identifiers are never reused within a level, so a stale kill report can
/// never hit a newer enemy.
#[derive(Debug)]
pub(crate) struct EnemyArena {
    entries: BTreeMap<EnemyId, EnemyState>,
    next_enemy_id: EnemyId,
}

impl EnemyArena {
    /// Creates an empty arena with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_enemy_id: EnemyId::new(0),
        }
    }

    pub(crate) fn insert(&mut self, district: DistrictId, position: Vec3) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get() + 1);
        let _ = self.entries.insert(
            id,
            EnemyState {
                id,
                district,
                position,
            },
        );
        id
    }

    pub(crate) fn remove(&mut self, id: EnemyId) -> Option<EnemyState> {
        self.entries.remove(&id)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &EnemyState> {
        self.entries.values()
    }

    pub(crate) fn live_in_district(&self, district: DistrictId) -> u32 {
        let count = self
            .entries
            .values()
            .filter(|enemy| enemy.district == district)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    pub(crate) fn ids_in_district(&self, district: DistrictId) -> Vec<EnemyId> {
        self.entries
            .values()
            .filter(|enemy| enemy.district == district)
            .map(|enemy| enemy.id)
            .collect()
    }

    /// Removes every enemy of `district`, returning their identifiers in order.
    pub(crate) fn remove_district(&mut self, district: DistrictId) -> Vec<EnemyId> {
        let ids = self.ids_in_district(district);
        for id in &ids {
            let _ = self.entries.remove(id);
        }
        ids
    }

    /// Removes every enemy, returning their identifiers in order.
    pub(crate) fn drain(&mut self) -> Vec<EnemyId> {
        std::mem::take(&mut self.entries).into_keys().collect()
    }
}

/// Ally record stored inside the level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct AllyState {
    pub(crate) id: AllyId,
    pub(crate) position: Vec3,
}

/// Roster of the companions following the player.
#[derive(Debug)]
pub(crate) struct AllyRoster {
    entries: BTreeMap<AllyId, AllyState>,
    next_ally_id: AllyId,
}

impl AllyRoster {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_ally_id: AllyId::new(0),
        }
    }

    pub(crate) fn insert(&mut self, position: Vec3) -> AllyId {
        let id = self.next_ally_id;
        self.next_ally_id = AllyId::new(id.get() + 1);
        let _ = self.entries.insert(id, AllyState { id, position });
        id
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &AllyState> {
        self.entries.values()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_starts_empty_with_zero_identifier() {
        let arena = EnemyArena::new();
        assert!(arena.is_empty());
        assert_eq!(arena.next_enemy_id.get(), 0);
    }

    #[test]
    fn identifiers_are_never_reused() {
        let mut arena = EnemyArena::new();
        let first = arena.insert(DistrictId::new(0), Vec3::ZERO);
        assert!(arena.remove(first).is_some());
        let second = arena.insert(DistrictId::new(0), Vec3::ZERO);
        assert_ne!(first, second);
        assert!(arena.remove(first).is_none());
    }

    #[test]
    fn district_counts_ignore_other_districts() {
        let mut arena = EnemyArena::new();
        let _ = arena.insert(DistrictId::new(0), Vec3::ZERO);
        let _ = arena.insert(DistrictId::new(1), Vec3::ZERO);
        let _ = arena.insert(DistrictId::new(1), Vec3::ONE);

        assert_eq!(arena.live_in_district(DistrictId::new(0)), 1);
        assert_eq!(arena.live_in_district(DistrictId::new(1)), 2);

        let removed = arena.remove_district(DistrictId::new(1));
        assert_eq!(removed.len(), 2);
        assert_eq!(arena.live_in_district(DistrictId::new(1)), 0);
        assert_eq!(arena.drain().len(), 1);
        assert!(arena.is_empty());
    }
}
