//! Map identifiers and world coordinates.

use serde::{Deserialize, Serialize};

/// Identifier of a world map (facet).
///
/// [`MapId::INTERNAL`] is the "nowhere" pseudo-map: entities parked there are
/// out of the world, and players standing on it are not valid spawn anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapId(pub u32);

impl MapId {
    /// The hidden holding map used for logged-out players and pooled spawns.
    pub const INTERNAL: Self = Self(u32::MAX);

    /// Whether this is the hidden holding map.
    pub const fn is_internal(self) -> bool {
        self.0 == u32::MAX
    }
}

impl core::fmt::Display for MapId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_internal() {
            write!(f, "internal")
        } else {
            write!(f, "map{}", self.0)
        }
    }
}

/// A tile coordinate with altitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point3D {
    /// East-west tile coordinate.
    pub x: i32,
    /// North-south tile coordinate.
    pub y: i32,
    /// Altitude.
    pub z: i32,
}

impl Point3D {
    /// Build a point from its three components.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Planar (x/y) euclidean distance to `other`. Altitude is ignored.
    pub fn distance_2d(&self, other: &Self) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        dx.hypot(dy)
    }

    /// Whether `other` lies within `range` tiles on the plane.
    pub fn in_range(&self, other: &Self, range: f64) -> bool {
        self.distance_2d(other) <= range
    }
}

impl core::fmt::Display for Point3D {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Playable extent of a map. Valid tiles satisfy `0 <= x < width` and
/// `0 <= y < height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapBounds {
    /// Width in tiles.
    pub width: i32,
    /// Height in tiles.
    pub height: i32,
}

impl MapBounds {
    /// Whether the tile `(x, y)` lies inside the map.
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_ignores_altitude() {
        let a = Point3D::new(0, 0, 0);
        let b = Point3D::new(3, 4, 90);
        assert!((a.distance_2d(&b) - 5.0).abs() < f64::EPSILON);
        assert!(a.in_range(&b, 5.0));
        assert!(!a.in_range(&b, 4.9));
    }

    #[test]
    fn bounds_exclude_edges() {
        let bounds = MapBounds { width: 10, height: 10 };
        assert!(bounds.contains(0, 0));
        assert!(bounds.contains(9, 9));
        assert!(!bounds.contains(10, 5));
        assert!(!bounds.contains(-1, 5));
    }

    #[test]
    fn internal_map_is_flagged() {
        assert!(MapId::INTERNAL.is_internal());
        assert!(!MapId(0).is_internal());
        assert_eq!(MapId(2).to_string(), "map2");
    }
}
