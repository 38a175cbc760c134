//! Demo world and wandering players.
//!
//! Without a game server attached the binary runs the engine against a
//! [`MemoryWorld`]: one map with a lake, a forest and a swamp region, and a
//! handful of simulated players who wander around so the sweeps have
//! something to do. Configured by the `demo` section of
//! `wildspawn-config.yaml`.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, info};
use wildspawn_core::memory::{MemoryMap, MemoryWorld, TileRect};
use wildspawn_core::roster::Player;
use wildspawn_core::scheduler::{EngineHandle, SchedulerError};
use wildspawn_core::world::MapRules;
use wildspawn_types::{MapId, PlayerId, Point3D};

/// Demo world settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DemoConfig {
    /// Number of simulated players.
    #[serde(default = "default_players")]
    pub players: u32,

    /// Map width and height in tiles.
    #[serde(default = "default_map_size")]
    pub map_size: i32,

    /// Largest step a player takes per move on each axis.
    #[serde(default = "default_wander_step")]
    pub wander_step: i32,

    /// Milliseconds between player moves.
    #[serde(default = "default_wander_ms")]
    pub wander_ms: u64,

    /// Whether the demo map allows PvP.
    #[serde(default)]
    pub pvp: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            players: default_players(),
            map_size: default_map_size(),
            wander_step: default_wander_step(),
            wander_ms: default_wander_ms(),
            pvp: false,
        }
    }
}

const fn default_players() -> u32 {
    3
}

const fn default_map_size() -> i32 {
    4096
}

const fn default_wander_step() -> i32 {
    12
}

const fn default_wander_ms() -> u64 {
    1000
}

/// The demo map.
pub const DEMO_MAP: MapId = MapId(0);

/// Build the in-memory demo world.
pub fn build_world(config: &DemoConfig) -> MemoryWorld {
    let size = config.map_size;
    let quarter = size / 4;
    let half = size / 2;

    let map = MemoryMap::new(size, size)
        .with_water(TileRect::new(quarter, quarter, half, half))
        .with_tile(TileRect::new(half, 0, size, quarter), "forest")
        .with_region(TileRect::new(0, half, quarter, size), "Blackmarsh")
        .with_rules(MapRules {
            pvp: config.pvp,
            swim_capable: true,
        });

    let mut world = MemoryWorld::new();
    world.add_map(DEMO_MAP, map);
    world
}

/// Starting points spread along the map diagonal.
fn start_positions(config: &DemoConfig) -> Vec<Point3D> {
    let count = i32::try_from(config.players).unwrap_or(i32::MAX);
    let spacing = config
        .map_size
        .checked_div(count.saturating_add(1))
        .unwrap_or(0);
    (1..=count)
        .map(|n| {
            let at = spacing.saturating_mul(n);
            Point3D::new(at, at, 0)
        })
        .collect()
}

/// Log in `config.players` players. Returns each player with its position.
pub async fn login_players(
    handle: &EngineHandle,
    config: &DemoConfig,
) -> Result<Vec<(PlayerId, Point3D)>, SchedulerError> {
    let mut players = Vec::new();
    for location in start_positions(config) {
        let id = PlayerId::new();
        handle.login(Player::new(id, DEMO_MAP, location)).await?;
        players.push((id, location));
    }
    info!(players = players.len(), "demo players logged in");
    Ok(players)
}

/// Move every player by a random step until shutdown or the engine goes
/// away.
pub async fn wander(
    handle: EngineHandle,
    mut players: Vec<(PlayerId, Point3D)>,
    config: DemoConfig,
    seed: u64,
) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut interval = tokio::time::interval(Duration::from_millis(config.wander_ms));
    let control = handle.control();
    let max = config.map_size.saturating_sub(1);
    let step = config.wander_step.max(1);

    while !control.is_shutdown_requested() {
        interval.tick().await;
        for (id, location) in &mut players {
            let dx = rng.random_range(-step..=step);
            let dy = rng.random_range(-step..=step);
            location.x = location.x.saturating_add(dx).clamp(0, max);
            location.y = location.y.saturating_add(dy).clamp(0, max);
            if handle.move_player(*id, DEMO_MAP, *location).await.is_err() {
                debug!("engine gone, demo players stop wandering");
                return;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wildspawn_core::world::WorldHost;

    use super::*;

    #[test]
    fn demo_world_has_every_terrain_feature() {
        let world = build_world(&DemoConfig::default());
        assert!(world.is_navigable_water(DEMO_MAP, Point3D::new(1500, 1500, 0)));
        assert_eq!(world.tile_name(DEMO_MAP, Point3D::new(3000, 100, 0)), "forest");
        assert_eq!(
            world.region_at(DEMO_MAP, Point3D::new(100, 3000, 0)).as_deref(),
            Some("Blackmarsh")
        );
        assert!(world.map_rules(DEMO_MAP).swim_capable);
    }

    #[test]
    fn players_start_spread_inside_the_map() {
        let config = DemoConfig {
            players: 3,
            map_size: 400,
            ..DemoConfig::default()
        };
        let starts = start_positions(&config);
        assert_eq!(
            starts,
            vec![
                Point3D::new(100, 100, 0),
                Point3D::new(200, 200, 0),
                Point3D::new(300, 300, 0),
            ]
        );
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: DemoConfig = serde_yml::from_str("players: 7").unwrap();
        assert_eq!(config.players, 7);
        assert_eq!(config.map_size, 4096);
        assert!(!config.pvp);
    }
}
