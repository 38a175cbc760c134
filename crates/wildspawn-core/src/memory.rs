//! In-memory [`WorldHost`] implementation.
//!
//! `MemoryWorld` models flat maps with rectangular water, region, and
//! terrain patches plus a flat entity table. The host binary runs on it
//! when no game server is attached, and every engine test drives it.

use std::collections::{HashMap, HashSet};

use wildspawn_types::{EntityId, MapBounds, MapId, PlayerId, Point3D, Weather};

use crate::registry::CreatureBlueprint;
use crate::world::{CountFilter, EntityState, HostError, MapRules, WorldHost};

/// Inclusive tile rectangle used to paint map features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    /// West edge.
    pub x1: i32,
    /// North edge.
    pub y1: i32,
    /// East edge.
    pub x2: i32,
    /// South edge.
    pub y2: i32,
}

impl TileRect {
    /// Rectangle from two corners.
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Whether the rectangle covers `point`.
    pub const fn contains(&self, point: Point3D) -> bool {
        point.x >= self.x1 && point.x <= self.x2 && point.y >= self.y1 && point.y <= self.y2
    }
}

/// One map of the in-memory world.
#[derive(Debug, Clone)]
pub struct MemoryMap {
    bounds: MapBounds,
    rules: MapRules,
    surface_z: i32,
    default_tile: String,
    tiles: Vec<(TileRect, String)>,
    water: Vec<TileRect>,
    regions: Vec<(TileRect, String)>,
    weather: Weather,
}

impl MemoryMap {
    /// A grass-covered map of the given size with clear weather.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            bounds: MapBounds { width, height },
            rules: MapRules::default(),
            surface_z: 0,
            default_tile: String::from("grass"),
            tiles: Vec::new(),
            water: Vec::new(),
            regions: Vec::new(),
            weather: Weather::Clear,
        }
    }

    /// Paint navigable water.
    #[must_use]
    pub fn with_water(mut self, rect: TileRect) -> Self {
        self.water.push(rect);
        self
    }

    /// Paint a terrain patch.
    #[must_use]
    pub fn with_tile(mut self, rect: TileRect, name: &str) -> Self {
        self.tiles.push((rect, name.to_owned()));
        self
    }

    /// Add a named region.
    #[must_use]
    pub fn with_region(mut self, rect: TileRect, name: &str) -> Self {
        self.regions.push((rect, name.to_owned()));
        self
    }

    /// Set map-wide weather.
    #[must_use]
    pub const fn with_weather(mut self, weather: Weather) -> Self {
        self.weather = weather;
        self
    }

    /// Set PvP and swim rules.
    #[must_use]
    pub const fn with_rules(mut self, rules: MapRules) -> Self {
        self.rules = rules;
        self
    }

    fn is_water(&self, point: Point3D) -> bool {
        self.water.iter().any(|r| r.contains(point))
    }
}

/// One entity of the in-memory world.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryEntity {
    /// Canonical type name.
    pub type_name: String,
    /// Constructor arguments it was built with.
    pub args: Vec<String>,
    /// Current map.
    pub map: MapId,
    /// Current location.
    pub location: Point3D,
    /// Whether the entity was deleted.
    pub deleted: bool,
    /// Whether the creature is alive.
    pub alive: bool,
    /// Whether the creature is fighting.
    pub in_combat: bool,
    /// Whether the creature is invulnerable.
    pub invulnerable: bool,
    /// Owned by a player.
    pub tamed: bool,
    /// Summoned rather than born.
    pub summoned: bool,
    /// Player the creature was set to fight.
    pub combatant: Option<PlayerId>,
    /// Difficulty factor applied at spawn.
    pub difficulty: f64,
}

impl MemoryEntity {
    fn wild(type_name: &str, map: MapId, location: Point3D) -> Self {
        Self {
            type_name: type_name.to_owned(),
            args: Vec::new(),
            map,
            location,
            deleted: false,
            alive: true,
            in_combat: false,
            invulnerable: false,
            tamed: false,
            summoned: false,
            combatant: None,
            difficulty: 1.0,
        }
    }
}

/// Flat in-memory world.
#[derive(Debug, Default)]
pub struct MemoryWorld {
    maps: HashMap<MapId, MemoryMap>,
    entities: HashMap<EntityId, MemoryEntity>,
    rejected_types: HashSet<String>,
    reject_placement: bool,
    created: usize,
    deleted: usize,
    effects: usize,
    before_hooks: usize,
    after_hooks: usize,
}

impl MemoryWorld {
    /// A world with no maps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a map.
    pub fn add_map(&mut self, map: MapId, memory_map: MemoryMap) {
        self.maps.insert(map, memory_map);
    }

    /// Change a map's weather.
    pub fn set_weather(&mut self, map: MapId, weather: Weather) {
        if let Some(m) = self.maps.get_mut(&map) {
            m.weather = weather;
        }
    }

    /// Insert a wild creature that the engine did not spawn.
    pub fn spawn_wild(&mut self, type_name: &str, map: MapId, location: Point3D) -> EntityId {
        let id = EntityId::new();
        self.entities
            .insert(id, MemoryEntity::wild(type_name, map, location));
        id
    }

    /// Insert a tamed pet.
    pub fn spawn_pet(&mut self, type_name: &str, map: MapId, location: Point3D) -> EntityId {
        let id = EntityId::new();
        let mut pet = MemoryEntity::wild(type_name, map, location);
        pet.tamed = true;
        self.entities.insert(id, pet);
        id
    }

    /// Flag an entity as deleted while keeping its stale handle around.
    pub fn mark_deleted(&mut self, entity: EntityId) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.deleted = true;
        }
    }

    /// Drop an entity entirely, leaving a dangling handle.
    pub fn forget(&mut self, entity: EntityId) {
        self.entities.remove(&entity);
    }

    /// Kill a creature without deleting it.
    pub fn kill(&mut self, entity: EntityId) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.alive = false;
        }
    }

    /// Put a creature in or out of combat.
    pub fn set_in_combat(&mut self, entity: EntityId, in_combat: bool) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.in_combat = in_combat;
        }
    }

    /// Move an entity directly, bypassing the engine.
    pub fn teleport(&mut self, entity: EntityId, map: MapId, location: Point3D) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.map = map;
            e.location = location;
        }
    }

    /// Make [`WorldHost::create_creature`] fail for `type_name`.
    pub fn reject_type(&mut self, type_name: &str) {
        self.rejected_types.insert(type_name.to_owned());
    }

    /// Make every [`WorldHost::move_to_world`] call fail.
    pub const fn set_reject_placement(&mut self, reject: bool) {
        self.reject_placement = reject;
    }

    /// Look at an entity.
    pub fn entity(&self, entity: EntityId) -> Option<&MemoryEntity> {
        self.entities.get(&entity)
    }

    /// Number of non-deleted entities on `map`.
    pub fn population(&self, map: MapId) -> usize {
        self.entities
            .values()
            .filter(|e| !e.deleted && e.map == map)
            .count()
    }

    /// Entities removed through [`WorldHost::delete`].
    pub const fn deleted_count(&self) -> usize {
        self.deleted
    }

    /// Entities still in the table, including ones flagged deleted.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Creatures built through [`WorldHost::create_creature`].
    pub const fn created_count(&self) -> usize {
        self.created
    }

    /// Placement effects played.
    pub const fn effect_count(&self) -> usize {
        self.effects
    }

    /// `(before_spawn, after_spawn)` hook invocations.
    pub const fn hook_counts(&self) -> (usize, usize) {
        (self.before_hooks, self.after_hooks)
    }
}

impl WorldHost for MemoryWorld {
    fn map_bounds(&self, map: MapId) -> Option<MapBounds> {
        self.maps.get(&map).map(|m| m.bounds)
    }

    fn map_rules(&self, map: MapId) -> MapRules {
        self.maps.get(&map).map(|m| m.rules).unwrap_or_default()
    }

    fn surface_z(&self, map: MapId, _x: i32, _y: i32) -> i32 {
        self.maps.get(&map).map_or(0, |m| m.surface_z)
    }

    fn is_navigable_water(&self, map: MapId, point: Point3D) -> bool {
        self.maps.get(&map).is_some_and(|m| m.is_water(point))
    }

    fn can_spawn_creature(&self, map: MapId, point: Point3D) -> bool {
        self.maps
            .get(&map)
            .is_some_and(|m| m.bounds.contains(point.x, point.y) && !m.is_water(point))
    }

    fn tile_name(&self, map: MapId, point: Point3D) -> String {
        let Some(m) = self.maps.get(&map) else {
            return String::new();
        };
        m.tiles
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(point))
            .map_or_else(|| m.default_tile.clone(), |(_, name)| name.clone())
    }

    fn region_at(&self, map: MapId, point: Point3D) -> Option<String> {
        self.maps.get(&map).and_then(|m| {
            m.regions
                .iter()
                .find(|(rect, _)| rect.contains(point))
                .map(|(_, name)| name.clone())
        })
    }

    fn weather_at(&self, map: MapId, _point: Point3D) -> Weather {
        self.maps.get(&map).map_or(Weather::Clear, |m| m.weather)
    }

    fn count_creatures(
        &self,
        map: MapId,
        center: Point3D,
        range: f64,
        filter: CountFilter,
    ) -> usize {
        self.entities
            .values()
            .filter(|e| !e.deleted && e.map == map && !map.is_internal())
            .filter(|e| match filter {
                CountFilter::Untamed => !e.tamed,
                CountFilter::NonPet => !e.tamed && !e.summoned,
            })
            .filter(|e| center.in_range(&e.location, range))
            .count()
    }

    fn entity_state(&self, entity: EntityId) -> Option<EntityState> {
        self.entities.get(&entity).map(|e| EntityState {
            type_name: e.type_name.clone(),
            map: e.map,
            location: e.location,
            deleted: e.deleted,
            alive: e.alive,
            in_combat: e.in_combat,
        })
    }

    fn create_creature(&mut self, blueprint: &CreatureBlueprint) -> Result<EntityId, HostError> {
        if self.rejected_types.contains(&blueprint.type_name) {
            return Err(HostError::CreationFailed {
                type_name: blueprint.type_name.clone(),
                reason: "type rejected by host".to_owned(),
            });
        }
        let id = EntityId::new();
        let mut entity =
            MemoryEntity::wild(&blueprint.type_name, MapId::INTERNAL, Point3D::default());
        entity.args.clone_from(&blueprint.args);
        self.entities.insert(id, entity);
        self.created = self.created.saturating_add(1);
        Ok(id)
    }

    fn before_spawn(&mut self, _entity: EntityId, _map: MapId, _location: Point3D) {
        self.before_hooks = self.before_hooks.saturating_add(1);
    }

    fn move_to_world(
        &mut self,
        entity: EntityId,
        map: MapId,
        location: Point3D,
    ) -> Result<(), HostError> {
        if self.reject_placement {
            return Err(HostError::PlacementRejected {
                entity,
                map,
                location,
            });
        }
        let e = self
            .entities
            .get_mut(&entity)
            .filter(|e| !e.deleted)
            .ok_or(HostError::UnknownEntity(entity))?;
        e.map = map;
        e.location = location;
        e.invulnerable = false;
        Ok(())
    }

    fn placement_effect(&mut self, _map: MapId, _location: Point3D) {
        self.effects = self.effects.saturating_add(1);
    }

    fn after_spawn(&mut self, _entity: EntityId) {
        self.after_hooks = self.after_hooks.saturating_add(1);
    }

    fn apply_difficulty(&mut self, entity: EntityId, factor: f64) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.difficulty = factor;
        }
    }

    fn set_combatant(&mut self, entity: EntityId, player: PlayerId) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.combatant = Some(player);
            e.in_combat = true;
        }
    }

    fn reset_combat(&mut self, entity: EntityId) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.combatant = None;
            e.in_combat = false;
        }
    }

    fn set_invulnerable(&mut self, entity: EntityId, invulnerable: bool) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.invulnerable = invulnerable;
        }
    }

    fn move_to_holding(&mut self, entity: EntityId) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.map = MapId::INTERNAL;
            e.location = Point3D::default();
        }
    }

    fn delete(&mut self, entity: EntityId) {
        if self.entities.remove(&entity).is_some() {
            self.deleted = self.deleted.saturating_add(1);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registry::CreatureRole;

    fn world() -> MemoryWorld {
        let mut world = MemoryWorld::new();
        world.add_map(
            MapId(0),
            MemoryMap::new(2000, 2000)
                .with_water(TileRect::new(0, 0, 99, 99))
                .with_tile(TileRect::new(500, 500, 600, 600), "forest")
                .with_region(TileRect::new(1000, 1000, 1200, 1200), "Yew"),
        );
        world
    }

    #[test]
    fn terrain_queries() {
        let world = world();
        let map = MapId(0);
        assert!(world.is_navigable_water(map, Point3D::new(50, 50, 0)));
        assert!(!world.can_spawn_creature(map, Point3D::new(50, 50, 0)));
        assert!(world.can_spawn_creature(map, Point3D::new(150, 50, 0)));
        assert!(!world.can_spawn_creature(map, Point3D::new(2500, 50, 0)));
        assert_eq!(world.tile_name(map, Point3D::new(550, 550, 0)), "forest");
        assert_eq!(world.tile_name(map, Point3D::new(10, 550, 0)), "grass");
        assert_eq!(
            world.region_at(map, Point3D::new(1100, 1100, 0)).as_deref(),
            Some("Yew")
        );
    }

    #[test]
    fn counts_respect_filters() {
        let mut world = world();
        let map = MapId(0);
        let here = Point3D::new(700, 700, 0);
        world.spawn_wild("Rat", map, here);
        world.spawn_pet("Horse", map, here);
        let summoned = world.spawn_wild("Daemon", map, here);
        if let Some(e) = world.entities.get_mut(&summoned) {
            e.summoned = true;
        }
        world.spawn_wild("Rat", map, Point3D::new(900, 900, 0));
        assert_eq!(world.count_creatures(map, here, 10.0, CountFilter::Untamed), 2);
        assert_eq!(world.count_creatures(map, here, 10.0, CountFilter::NonPet), 1);
    }

    #[test]
    fn created_creatures_start_in_holding() {
        let mut world = world();
        let blueprint = CreatureBlueprint {
            type_name: "Rat".to_owned(),
            args: vec![],
            can_swim: false,
            role: CreatureRole::Creature,
        };
        let id = world.create_creature(&blueprint).unwrap();
        let state = world.entity_state(id).unwrap();
        assert!(state.map.is_internal());
        assert!(state.is_recyclable());

        world.move_to_world(id, MapId(0), Point3D::new(5, 5, 0)).unwrap();
        assert_eq!(world.entity_state(id).unwrap().map, MapId(0));

        world.delete(id);
        assert!(world.entity_state(id).is_none());
        assert!(world.move_to_world(id, MapId(0), Point3D::default()).is_err());
    }

    #[test]
    fn delete_drops_entities_from_the_table() {
        let mut world = world();
        let map = MapId(0);
        let here = Point3D::new(700, 700, 0);
        let first = world.spawn_wild("Rat", map, here);
        let second = world.spawn_wild("Rat", map, here);
        world.spawn_wild("Rat", map, here);

        world.delete(first);
        world.delete(second);
        world.delete(second);

        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.deleted_count(), 2);
        assert_eq!(world.count_creatures(map, here, 10.0, CountFilter::Untamed), 1);
        assert_eq!(world.population(map), 1);
    }

    #[test]
    fn rejected_types_fail_creation() {
        let mut world = world();
        world.reject_type("Rat");
        let blueprint = CreatureBlueprint {
            type_name: "Rat".to_owned(),
            args: vec![],
            can_swim: false,
            role: CreatureRole::Creature,
        };
        assert!(world.create_creature(&blueprint).is_err());
    }
}
