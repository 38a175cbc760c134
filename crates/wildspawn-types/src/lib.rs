//! Shared type definitions for the Wildspawn proximity spawn engine.
//!
//! Every crate in the workspace agrees on these identifiers, coordinates,
//! and environment enums. Nothing here carries engine behavior.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for entities and players
//! - [`enums`] -- Weather, time-of-day buckets, spawn categories, rarity
//! - [`geometry`] -- Map identifiers and world coordinates

pub mod enums;
pub mod geometry;
pub mod ids;

pub use enums::{Rarity, SpawnCategory, TimeOfDay, Weather};
pub use geometry::{MapBounds, MapId, Point3D};
pub use ids::{EntityId, PlayerId};
