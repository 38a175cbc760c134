//! The live spawn arena.
//!
//! [`LiveSpawns`] stores every creature the engine has placed in the world
//! together with its `too_far` flag. The distance monitor writes the flags;
//! the cleanup sweep walks the arena from the back and removes entries in
//! O(1) by swapping the last entry into the hole.

use std::collections::HashSet;

use wildspawn_types::EntityId;

/// A creature the engine placed in the world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSpawn {
    /// Host entity handle.
    pub entity: EntityId,
    /// Canonical type name at spawn time.
    pub type_name: String,
    /// Set by the distance monitor when no valid player is near.
    pub too_far: bool,
}

/// What a reverse sweep does with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAction {
    /// Leave the entry in place.
    Keep,
    /// Drop the entry from the arena.
    Remove,
}

/// Arena of live spawns with an identity index.
#[derive(Debug, Default)]
pub struct LiveSpawns {
    entries: Vec<LiveSpawn>,
    index: HashSet<EntityId>,
}

impl LiveSpawns {
    /// An empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly placed spawn. Returns false if already present.
    pub fn push(&mut self, entity: EntityId, type_name: &str) -> bool {
        if !self.index.insert(entity) {
            return false;
        }
        self.entries.push(LiveSpawn {
            entity,
            type_name: type_name.to_owned(),
            too_far: false,
        });
        true
    }

    /// Whether `entity` is live.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.index.contains(&entity)
    }

    /// Number of live spawns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = &LiveSpawn> {
        self.entries.iter()
    }

    /// Iterate mutably (flag updates only; identity must not change).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LiveSpawn> {
        self.entries.iter_mut()
    }

    /// Number of entries flagged too far.
    pub fn too_far_count(&self) -> usize {
        self.entries.iter().filter(|s| s.too_far).count()
    }

    /// Visit entries from last to first, removing those `decide` rejects.
    /// Returns the number removed.
    pub fn sweep_rev<F>(&mut self, mut decide: F) -> usize
    where
        F: FnMut(&LiveSpawn) -> SweepAction,
    {
        let mut removed: usize = 0;
        let mut i = self.entries.len();
        while i > 0 {
            i = i.saturating_sub(1);
            let action = match self.entries.get(i) {
                Some(spawn) => decide(spawn),
                None => continue,
            };
            if action == SweepAction::Remove {
                // Entries past `i` were already visited, so the swapped-in
                // tail entry is not visited twice.
                let spawn = self.entries.swap_remove(i);
                self.index.remove(&spawn.entity);
                removed = removed.saturating_add(1);
            }
        }
        removed
    }

    /// Remove and return every entry.
    pub fn drain_all(&mut self) -> Vec<LiveSpawn> {
        self.index.clear();
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_rejects_duplicates() {
        let mut live = LiveSpawns::new();
        let id = EntityId::new();
        assert!(live.push(id, "Rat"));
        assert!(!live.push(id, "Rat"));
        assert_eq!(live.len(), 1);
        assert!(live.contains(id));
    }

    #[test]
    fn sweep_rev_visits_each_entry_once() {
        let mut live = LiveSpawns::new();
        let ids: Vec<EntityId> = (0..6).map(|_| EntityId::new()).collect();
        for id in &ids {
            live.push(*id, "Rat");
        }
        let mut visited = Vec::new();
        let removed = live.sweep_rev(|spawn| {
            visited.push(spawn.entity);
            if visited.len() % 2 == 0 {
                SweepAction::Remove
            } else {
                SweepAction::Keep
            }
        });
        assert_eq!(removed, 3);
        assert_eq!(visited.len(), 6);
        let mut expected = ids.clone();
        expected.reverse();
        assert_eq!(visited, expected);
        assert_eq!(live.len(), 3);
        for id in visited.iter().skip(1).step_by(2) {
            assert!(!live.contains(*id));
        }
    }

    #[test]
    fn too_far_count_and_drain() {
        let mut live = LiveSpawns::new();
        live.push(EntityId::new(), "Rat");
        live.push(EntityId::new(), "Wolf");
        if let Some(first) = live.iter_mut().next() {
            first.too_far = true;
        }
        assert_eq!(live.too_far_count(), 1);
        let drained = live.drain_all();
        assert_eq!(drained.len(), 2);
        assert!(live.is_empty());
    }
}
