//! Host world boundary.
//!
//! The engine never owns game entities. Everything it does to the world
//! (terrain probes, creature counts, creating, moving, hiding, and deleting
//! entities) goes through the [`WorldHost`] capability supplied by the
//! embedding server.

use wildspawn_types::{EntityId, MapBounds, MapId, PlayerId, Point3D, Weather};

use crate::registry::CreatureBlueprint;

/// Errors the host can report for world mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The entity handle does not refer to a live entity.
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// The host could not construct a creature.
    #[error("failed to create {type_name}: {reason}")]
    CreationFailed {
        /// The type that failed to build.
        type_name: String,
        /// Host-provided reason.
        reason: String,
    },

    /// The host refused to place an entity at a location.
    #[error("placement of {entity} on {map} at {location} rejected")]
    PlacementRejected {
        /// The entity being placed.
        entity: EntityId,
        /// Target map.
        map: MapId,
        /// Target location.
        location: Point3D,
    },
}

/// PvP and movement rules of a map, consumed by the aggro policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapRules {
    /// Whether player-versus-player combat is allowed.
    pub pvp: bool,
    /// Whether swimming creatures can reach players on this map.
    pub swim_capable: bool,
}

/// Which creatures a proximity count includes. Players are never counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountFilter {
    /// Every creature that is not tamed by a player.
    Untamed,
    /// Every creature that is not a pet or summon.
    NonPet,
}

/// Snapshot of one entity as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityState {
    /// Canonical creature type name.
    pub type_name: String,
    /// Current map ([`MapId::INTERNAL`] while pooled).
    pub map: MapId,
    /// Current location.
    pub location: Point3D,
    /// Deleted entities linger as stale handles until the engine drops them.
    pub deleted: bool,
    /// Whether the creature is alive.
    pub alive: bool,
    /// Whether the creature is currently fighting.
    pub in_combat: bool,
}

impl EntityState {
    /// Not deleted.
    pub const fn is_valid(&self) -> bool {
        !self.deleted
    }

    /// Not deleted, alive, and out of combat.
    pub const fn is_recyclable(&self) -> bool {
        !self.deleted && self.alive && !self.in_combat
    }
}

/// World capability the engine drives.
pub trait WorldHost: Send {
    // --- Terrain queries ---

    /// Playable extent of `map`, or `None` if the map does not exist.
    fn map_bounds(&self, map: MapId) -> Option<MapBounds>;

    /// PvP and swim rules of `map`.
    fn map_rules(&self, map: MapId) -> MapRules;

    /// Altitude of the walkable surface at `(x, y)`.
    fn surface_z(&self, map: MapId, x: i32, y: i32) -> i32;

    /// Whether `point` is navigable water.
    fn is_navigable_water(&self, map: MapId, point: Point3D) -> bool;

    /// Whether a land creature can stand at `point`.
    fn can_spawn_creature(&self, map: MapId, point: Point3D) -> bool;

    /// Terrain name of the tile at `point`.
    fn tile_name(&self, map: MapId, point: Point3D) -> String;

    /// Named region containing `point`, if any.
    fn region_at(&self, map: MapId, point: Point3D) -> Option<String>;

    /// Weather at `point`.
    fn weather_at(&self, map: MapId, point: Point3D) -> Weather;

    /// Number of non-player creatures within `range` of `center`.
    fn count_creatures(&self, map: MapId, center: Point3D, range: f64, filter: CountFilter)
    -> usize;

    // --- Entity queries ---

    /// Current state of `entity`, or `None` if the handle is unknown.
    fn entity_state(&self, entity: EntityId) -> Option<EntityState>;

    // --- Entity mutations ---

    /// Build a new creature from `blueprint`. The entity starts out of the
    /// world on [`MapId::INTERNAL`].
    fn create_creature(&mut self, blueprint: &CreatureBlueprint) -> Result<EntityId, HostError>;

    /// Hook run before a creature enters the world.
    fn before_spawn(&mut self, entity: EntityId, map: MapId, location: Point3D);

    /// Move `entity` into the world.
    fn move_to_world(
        &mut self,
        entity: EntityId,
        map: MapId,
        location: Point3D,
    ) -> Result<(), HostError>;

    /// Play the placement visual effect.
    fn placement_effect(&mut self, map: MapId, location: Point3D);

    /// Hook run after a creature entered the world.
    fn after_spawn(&mut self, entity: EntityId);

    /// Scale a creature's stats by `factor`.
    fn apply_difficulty(&mut self, entity: EntityId, factor: f64);

    /// Make `entity` fight `player`.
    fn set_combatant(&mut self, entity: EntityId, player: PlayerId);

    /// Clear aggression, combatant, and damage state.
    fn reset_combat(&mut self, entity: EntityId);

    /// Toggle invulnerability.
    fn set_invulnerable(&mut self, entity: EntityId, invulnerable: bool);

    /// Move `entity` to the hidden holding area on [`MapId::INTERNAL`].
    fn move_to_holding(&mut self, entity: EntityId);

    /// Permanently remove `entity`.
    fn delete(&mut self, entity: EntityId);
}
