//! Spawn point generation.
//!
//! For a player standing at some location, [`SpawnPointGenerator`] projects
//! a random point between `min_range` and `max_range` away, rejects points
//! outside the map or in crowded spots, classifies the point as water or
//! land, and retries up to `max_retries` times. Running out of attempts is
//! an ordinary outcome: the caller simply tries again next tick.

use std::f64::consts::TAU;

use tracing::debug;
use wildspawn_types::{MapId, Point3D};

use crate::config::SpawnSettings;
use crate::dice::Dice;
use crate::world::{CountFilter, WorldHost};

/// Altitude offset of the second water probe.
const WATER_PROBE_DROP: i32 = 5;

/// An accepted spawn location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnPoint {
    /// Map the point lies on.
    pub map: MapId,
    /// Location including surface altitude.
    pub location: Point3D,
    /// Whether the point is navigable water.
    pub is_water: bool,
}

/// Why a generation attempt produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationSkip {
    /// The player's surroundings are at the population cap.
    PopulationCap,
    /// Every attempt was rejected.
    RetriesExhausted,
}

/// Stateless spawn point generator over a host and a settings snapshot.
#[derive(Debug, Clone, Copy)]
pub struct SpawnPointGenerator<'a> {
    settings: &'a SpawnSettings,
}

impl<'a> SpawnPointGenerator<'a> {
    /// Generator using `settings`.
    pub const fn new(settings: &'a SpawnSettings) -> Self {
        Self { settings }
    }

    /// Whether the untamed creature count around `center` has reached
    /// `max_mobs`.
    pub fn nearby_cap_reached(&self, host: &dyn WorldHost, map: MapId, center: Point3D) -> bool {
        let nearby = host.count_creatures(map, center, self.settings.max_range, CountFilter::Untamed);
        nearby >= usize::try_from(self.settings.max_mobs).unwrap_or(usize::MAX)
    }

    /// Generate a spawn point around `center`, or report why none was made.
    pub fn generate(
        &self,
        host: &dyn WorldHost,
        dice: &mut dyn Dice,
        map: MapId,
        center: Point3D,
    ) -> Result<SpawnPoint, GenerationSkip> {
        if self.nearby_cap_reached(host, map, center) {
            debug!(%map, %center, "population cap reached, skipping generation");
            return Err(GenerationSkip::PopulationCap);
        }
        self.propose(host, dice, map, center)
            .ok_or(GenerationSkip::RetriesExhausted)
    }

    /// Try up to `max_retries` projections around `center`.
    pub fn propose(
        &self,
        host: &dyn WorldHost,
        dice: &mut dyn Dice,
        map: MapId,
        center: Point3D,
    ) -> Option<SpawnPoint> {
        let bounds = host.map_bounds(map)?;
        let max_crowd = usize::try_from(self.settings.max_crowd).unwrap_or(usize::MAX);

        for _ in 0..self.settings.max_retries {
            let (x, y) = self.project(dice, center);
            if !bounds.contains(x, y) {
                continue;
            }
            let z = host.surface_z(map, x, y);
            let candidate = Point3D::new(x, y, z);

            let crowd =
                host.count_creatures(map, candidate, self.settings.min_range, CountFilter::NonPet);
            if crowd >= max_crowd {
                continue;
            }

            let lower = Point3D::new(x, y, z.saturating_sub(WATER_PROBE_DROP));
            let is_water =
                host.is_navigable_water(map, candidate) || host.is_navigable_water(map, lower);

            if is_water && dice.roll() < self.settings.chances.water {
                return Some(SpawnPoint {
                    map,
                    location: candidate,
                    is_water: true,
                });
            }
            if !is_water && host.can_spawn_creature(map, candidate) {
                return Some(SpawnPoint {
                    map,
                    location: candidate,
                    is_water: false,
                });
            }
        }
        None
    }

    /// A uniformly random angle and distance in `[min_range, max_range]`.
    #[allow(clippy::cast_possible_truncation)]
    fn project(&self, dice: &mut dyn Dice, center: Point3D) -> (i32, i32) {
        let angle = dice.roll() * TAU;
        let span = self.settings.max_range - self.settings.min_range;
        let distance = dice.roll().mul_add(span, self.settings.min_range);
        let x = f64::from(center.x) + distance * angle.cos();
        let y = f64::from(center.y) + distance * angle.sin();
        // Saturating float-to-int casts; out-of-range values fail the bounds check.
        (x.round() as i32, y.round() as i32)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::memory::{MemoryMap, MemoryWorld, TileRect};

    fn settings() -> SpawnSettings {
        SpawnSettings {
            max_mobs: 15,
            min_range: 10.0,
            max_range: 50.0,
            max_crowd: 3,
            ..SpawnSettings::default()
        }
    }

    fn world() -> MemoryWorld {
        let mut world = MemoryWorld::new();
        world.add_map(MapId(0), MemoryMap::new(4000, 4000));
        world
    }

    const PLAYER: Point3D = Point3D::new(1000, 1000, 0);

    #[test]
    fn fourteen_nearby_still_generates() {
        let mut world = world();
        for i in 0..14 {
            world.spawn_wild("Rat", MapId(0), Point3D::new(1000 + i, 1040, 0));
        }
        let settings = settings();
        let generator = SpawnPointGenerator::new(&settings);
        // angle 0, distance min_range: lands at (1010, 1000).
        let mut dice = ScriptedDice::new(&[0.0, 0.0]);
        let point = generator
            .generate(&world, &mut dice, MapId(0), PLAYER)
            .unwrap();
        assert_eq!(point.location, Point3D::new(1010, 1000, 0));
        assert!(!point.is_water);
    }

    #[test]
    fn fifteen_nearby_skips_generation() {
        let mut world = world();
        for i in 0..15 {
            world.spawn_wild("Rat", MapId(0), Point3D::new(1000 + i, 1040, 0));
        }
        let settings = settings();
        let generator = SpawnPointGenerator::new(&settings);
        let mut dice = ScriptedDice::new(&[0.0, 0.0]);
        assert_eq!(
            generator.generate(&world, &mut dice, MapId(0), PLAYER),
            Err(GenerationSkip::PopulationCap)
        );
    }

    #[test]
    fn tamed_pets_do_not_count_toward_cap() {
        let mut world = world();
        for i in 0..15 {
            world.spawn_pet("Horse", MapId(0), Point3D::new(1000 + i, 1040, 0));
        }
        let settings = settings();
        let generator = SpawnPointGenerator::new(&settings);
        assert!(!generator.nearby_cap_reached(&world, MapId(0), PLAYER));
    }

    #[test]
    fn crowded_points_are_retried() {
        let mut world = world();
        for _ in 0..3 {
            world.spawn_wild("Rat", MapId(0), Point3D::new(1010, 1000, 0));
        }
        let settings = settings();
        let generator = SpawnPointGenerator::new(&settings);
        // First attempt east (crowded), second attempt west at max range.
        let mut dice = ScriptedDice::new(&[0.0, 0.0, 0.5, 1.0]);
        let point = generator
            .propose(&world, &mut dice, MapId(0), PLAYER)
            .unwrap();
        assert_eq!(point.location, Point3D::new(950, 1000, 0));
    }

    #[test]
    fn out_of_bounds_exhausts_retries() {
        let mut world = MemoryWorld::new();
        world.add_map(MapId(0), MemoryMap::new(20, 20));
        let settings = settings();
        let generator = SpawnPointGenerator::new(&settings);
        // Every projection from (10, 10) lands at least 10 tiles away: the
        // scripted dice point east at distance 10, just past the edge.
        let mut dice = ScriptedDice::new(&[]);
        assert_eq!(
            generator.generate(&world, &mut dice, MapId(0), Point3D::new(10, 10, 0)),
            Err(GenerationSkip::RetriesExhausted)
        );
    }

    #[test]
    fn unknown_map_yields_nothing() {
        let world = world();
        let settings = settings();
        let generator = SpawnPointGenerator::new(&settings);
        let mut dice = ScriptedDice::new(&[]);
        assert!(generator.propose(&world, &mut dice, MapId(9), PLAYER).is_none());
    }

    #[test]
    fn water_points_pass_on_low_roll() {
        let mut world = MemoryWorld::new();
        world.add_map(
            MapId(0),
            MemoryMap::new(4000, 4000).with_water(TileRect::new(1005, 990, 1020, 1010)),
        );
        let settings = settings();
        let generator = SpawnPointGenerator::new(&settings);
        let mut dice = ScriptedDice::new(&[0.0, 0.0, 0.1]);
        let point = generator
            .propose(&world, &mut dice, MapId(0), PLAYER)
            .unwrap();
        assert!(point.is_water);
    }

    #[test]
    fn water_points_rejected_on_high_roll() {
        let mut world = MemoryWorld::new();
        world.add_map(
            MapId(0),
            MemoryMap::new(4000, 4000).with_water(TileRect::new(1005, 990, 1020, 1010)),
        );
        let settings = settings();
        let generator = SpawnPointGenerator::new(&settings);
        // Water rejected (0.9 >= 0.5), then a land point to the west.
        let mut dice = ScriptedDice::new(&[0.0, 0.0, 0.9, 0.5, 0.0]);
        let point = generator
            .propose(&world, &mut dice, MapId(0), PLAYER)
            .unwrap();
        assert!(!point.is_water);
        assert_eq!(point.location, Point3D::new(990, 1000, 0));
    }
}
