//! Proximity spawn engine for the Wildspawn world host.
//!
//! Creatures are spawned around each online player from data-driven rule
//! tables, kept while a player is near, and retired into a recycle pool or
//! deleted once everyone has moved away. Three periodic sweeps drive it:
//! dispatch (fast), distance (about a second) and cleanup (about ten
//! seconds), all serialized on one scheduler task.
//!
//! # Modules
//!
//! - [`aggro`] -- [`AggroPolicy`] hook deciding spawn-time aggression.
//! - [`clock`] -- [`GameClock`] and the eight time-of-day buckets.
//! - [`config`] -- Configuration loading from `wildspawn-config.yaml`.
//! - [`control`] -- Timer stop/start and shutdown flags.
//! - [`dice`] -- Injectable randomness.
//! - [`engine`] -- [`SpawnEngine`]: dispatch, distance and cleanup sweeps.
//! - [`error`] -- [`EngineError`].
//! - [`generator`] -- Spawn point generation with crowding and caps.
//! - [`live`] -- Arena of live spawns with reverse sweeping.
//! - [`memory`] -- In-memory [`WorldHost`] implementation.
//! - [`metrics`] -- Counters and cleanup duration window.
//! - [`recycle`] -- Type-bucketed recycle pool.
//! - [`registry`] -- Creature type registry and name cache.
//! - [`resolver`] -- Rule tier resolution.
//! - [`roster`] -- Players and their spawn queues.
//! - [`rules`] -- Spawn rule tables loaded from `spawn-rules.yaml`.
//! - [`scheduler`] -- Tokio actor driving the engine.
//! - [`world`] -- [`WorldHost`] capability trait.
//!
//! [`AggroPolicy`]: aggro::AggroPolicy
//! [`GameClock`]: clock::GameClock
//! [`SpawnEngine`]: engine::SpawnEngine
//! [`EngineError`]: error::EngineError
//! [`WorldHost`]: world::WorldHost

pub mod aggro;
pub mod clock;
pub mod config;
pub mod control;
pub mod dice;
pub mod engine;
pub mod error;
pub mod generator;
pub mod live;
pub mod memory;
pub mod metrics;
pub mod recycle;
pub mod registry;
pub mod resolver;
pub mod roster;
pub mod rules;
pub mod scheduler;
pub mod world;
