//! Type-bucketed recycle pool.
//!
//! Creatures that wandered out of every player's range are parked here
//! instead of being deleted, hidden on the internal map with combat state
//! cleared and invulnerability on. Materialization takes the oldest parked
//! creature of the requested type before building a new one.
//!
//! Two quotas bound the pool: `max_per_type` per bucket and `max_total`
//! across all buckets. A full pool rejects the add and the caller deletes
//! the creature instead.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::warn;
use wildspawn_types::EntityId;

use crate::config::RecycleConfig;
use crate::world::WorldHost;

/// Why [`RecyclePool::try_add`] refused an entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecycleRejection {
    /// The type's bucket is at `max_per_type`.
    #[error("recycle bucket for {type_name} is full ({len})")]
    TypeFull {
        /// The full bucket's type.
        type_name: String,
        /// Current bucket length.
        len: usize,
    },

    /// The pool is at `max_total`.
    #[error("recycle pool is full ({total})")]
    PoolFull {
        /// Current pool size.
        total: usize,
    },

    /// The entity is deleted, unknown, or already pooled.
    #[error("entity {0} cannot be pooled")]
    NotPoolable(EntityId),
}

/// Bounded per-type FIFO pool of hidden, inert creatures.
#[derive(Debug)]
pub struct RecyclePool {
    config: RecycleConfig,
    buckets: HashMap<String, VecDeque<EntityId>>,
    pooled: HashSet<EntityId>,
    invalid_discarded: u64,
}

impl RecyclePool {
    /// An empty pool with the given quotas.
    pub fn new(config: RecycleConfig) -> Self {
        Self {
            config,
            buckets: HashMap::new(),
            pooled: HashSet::new(),
            invalid_discarded: 0,
        }
    }

    /// Take the oldest valid creature of `type_name`.
    ///
    /// Entries the host reports as deleted or unknown are dropped and the
    /// next one is tried; an invalid entity is never returned.
    pub fn try_get(&mut self, host: &dyn WorldHost, type_name: &str) -> Option<EntityId> {
        let bucket = self.buckets.get_mut(type_name)?;
        let mut found = None;
        while let Some(entity) = bucket.pop_front() {
            self.pooled.remove(&entity);
            if host.entity_state(entity).is_some_and(|s| s.is_valid()) {
                found = Some(entity);
                break;
            }
            warn!(%entity, type_name, "discarding invalid pooled entity");
            self.invalid_discarded = self.invalid_discarded.saturating_add(1);
        }
        if bucket.is_empty() {
            self.buckets.remove(type_name);
        }
        found
    }

    /// Park `entity` under `type_name`.
    ///
    /// On success the creature has its combat state reset, is invulnerable,
    /// and sits in the holding area.
    ///
    /// # Errors
    ///
    /// Returns a [`RecycleRejection`] (already logged) when a quota is hit
    /// or the entity is not poolable. The entity is left untouched.
    pub fn try_add(
        &mut self,
        host: &mut dyn WorldHost,
        entity: EntityId,
        type_name: &str,
    ) -> Result<(), RecycleRejection> {
        let rejection = self.check_add(host, entity, type_name);
        if let Some(rejection) = rejection {
            warn!(%entity, type_name, reason = %rejection, "recycle rejected");
            return Err(rejection);
        }

        host.reset_combat(entity);
        host.set_invulnerable(entity, true);
        host.move_to_holding(entity);

        self.buckets
            .entry(type_name.to_owned())
            .or_default()
            .push_back(entity);
        self.pooled.insert(entity);
        Ok(())
    }

    fn check_add(
        &self,
        host: &dyn WorldHost,
        entity: EntityId,
        type_name: &str,
    ) -> Option<RecycleRejection> {
        let valid = host.entity_state(entity).is_some_and(|s| s.is_valid());
        if !valid || self.pooled.contains(&entity) {
            return Some(RecycleRejection::NotPoolable(entity));
        }
        let len = self.len_for(type_name);
        if len >= self.config.max_per_type {
            return Some(RecycleRejection::TypeFull {
                type_name: type_name.to_owned(),
                len,
            });
        }
        let total = self.len();
        if total >= self.config.max_total {
            return Some(RecycleRejection::PoolFull { total });
        }
        None
    }

    /// Delete every pooled creature and empty all buckets. Returns the
    /// number of entities handed to [`WorldHost::delete`].
    pub fn clear_all(&mut self, host: &mut dyn WorldHost) -> usize {
        let mut deleted: usize = 0;
        for (_, bucket) in self.buckets.drain() {
            for entity in bucket {
                host.delete(entity);
                deleted = deleted.saturating_add(1);
            }
        }
        self.pooled.clear();
        deleted
    }

    /// Whether `entity` is pooled.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.pooled.contains(&entity)
    }

    /// Total pooled entities.
    pub fn len(&self) -> usize {
        self.pooled.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.pooled.is_empty()
    }

    /// Pooled entities of `type_name`.
    pub fn len_for(&self, type_name: &str) -> usize {
        self.buckets.get(type_name).map_or(0, VecDeque::len)
    }

    /// Per-type bucket lengths.
    pub fn bucket_lengths(&self) -> impl Iterator<Item = (&str, usize)> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v.len()))
    }

    /// Invalid entries dropped by [`RecyclePool::try_get`] so far.
    pub const fn invalid_discarded(&self) -> u64 {
        self.invalid_discarded
    }

    /// Configured quotas.
    pub const fn config(&self) -> RecycleConfig {
        self.config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wildspawn_types::{MapId, Point3D};

    use super::*;
    use crate::memory::{MemoryMap, MemoryWorld};

    fn world() -> MemoryWorld {
        let mut world = MemoryWorld::new();
        world.add_map(MapId(0), MemoryMap::new(100, 100));
        world
    }

    fn rat(world: &mut MemoryWorld) -> EntityId {
        world.spawn_wild("Rat", MapId(0), Point3D::new(5, 5, 0))
    }

    #[test]
    fn third_rat_rejected_at_type_quota() {
        let mut world = world();
        let mut pool = RecyclePool::new(RecycleConfig {
            max_per_type: 2,
            max_total: 10,
        });
        let (a, b, c) = (rat(&mut world), rat(&mut world), rat(&mut world));
        assert!(pool.try_add(&mut world, a, "Rat").is_ok());
        assert!(pool.try_add(&mut world, b, "Rat").is_ok());
        assert!(matches!(
            pool.try_add(&mut world, c, "Rat"),
            Err(RecycleRejection::TypeFull { len: 2, .. })
        ));
        assert_eq!(pool.len_for("Rat"), 2);
        // The rejected rat is untouched and still in the world.
        assert_eq!(world.entity(c).unwrap().map, MapId(0));
    }

    #[test]
    fn global_quota_applies_across_types() {
        let mut world = world();
        let mut pool = RecyclePool::new(RecycleConfig {
            max_per_type: 5,
            max_total: 2,
        });
        let a = rat(&mut world);
        let b = world.spawn_wild("Wolf", MapId(0), Point3D::default());
        let c = world.spawn_wild("Bear", MapId(0), Point3D::default());
        assert!(pool.try_add(&mut world, a, "Rat").is_ok());
        assert!(pool.try_add(&mut world, b, "Wolf").is_ok());
        assert!(matches!(
            pool.try_add(&mut world, c, "Bear"),
            Err(RecycleRejection::PoolFull { total: 2 })
        ));
        assert!(pool.len() <= 2);
    }

    #[test]
    fn added_entities_are_neutralized_and_hidden() {
        let mut world = world();
        let mut pool = RecyclePool::new(RecycleConfig::default());
        let a = rat(&mut world);
        world.set_in_combat(a, true);
        pool.try_add(&mut world, a, "Rat").unwrap();
        let e = world.entity(a).unwrap();
        assert!(e.map.is_internal());
        assert!(e.invulnerable);
        assert!(!e.in_combat);
        assert!(pool.contains(a));
    }

    #[test]
    fn deleted_or_duplicate_entities_are_not_poolable() {
        let mut world = world();
        let mut pool = RecyclePool::new(RecycleConfig::default());
        let a = rat(&mut world);
        pool.try_add(&mut world, a, "Rat").unwrap();
        assert!(matches!(
            pool.try_add(&mut world, a, "Rat"),
            Err(RecycleRejection::NotPoolable(_))
        ));
        let b = rat(&mut world);
        world.mark_deleted(b);
        assert!(pool.try_add(&mut world, b, "Rat").is_err());
    }

    #[test]
    fn try_get_is_fifo_and_skips_invalid() {
        let mut world = world();
        let mut pool = RecyclePool::new(RecycleConfig::default());
        let (a, b, c) = (rat(&mut world), rat(&mut world), rat(&mut world));
        for id in [a, b, c] {
            pool.try_add(&mut world, id, "Rat").unwrap();
        }
        world.mark_deleted(a);
        world.forget(b);
        assert_eq!(pool.try_get(&world, "Rat"), Some(c));
        assert_eq!(pool.invalid_discarded(), 2);
        assert!(pool.is_empty());
    }

    #[test]
    fn try_get_all_invalid_leaves_bucket_empty() {
        let mut world = world();
        let mut pool = RecyclePool::new(RecycleConfig::default());
        let (a, b) = (rat(&mut world), rat(&mut world));
        pool.try_add(&mut world, a, "Rat").unwrap();
        pool.try_add(&mut world, b, "Rat").unwrap();
        world.mark_deleted(a);
        world.mark_deleted(b);
        assert_eq!(pool.try_get(&world, "Rat"), None);
        assert_eq!(pool.len_for("Rat"), 0);
        assert_eq!(pool.try_get(&world, "Wolf"), None);
    }

    #[test]
    fn clear_all_deletes_everything_and_is_idempotent() {
        let mut world = world();
        let mut pool = RecyclePool::new(RecycleConfig::default());
        for _ in 0..3 {
            let id = rat(&mut world);
            pool.try_add(&mut world, id, "Rat").unwrap();
        }
        assert_eq!(pool.clear_all(&mut world), 3);
        assert_eq!(world.deleted_count(), 3);
        assert_eq!(pool.clear_all(&mut world), 0);
        assert!(pool.is_empty());
    }
}
