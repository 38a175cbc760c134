//! Spawn rule tables.
//!
//! A [`SpawnRuleStore`] holds one rule list per map. Each [`SpawnRule`]
//! names an area (rectangle, tile type, or region), optional weather and
//! time-of-day triggers, and six creature name lists. The store is
//! immutable once built; a reload builds a fresh store and the engine swaps
//! it in whole.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use wildspawn_types::{MapId, Point3D, SpawnCategory, TimeOfDay, Weather};

/// Errors that can occur when loading a rule table.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Failed to read the rule file.
    #[error("failed to read rule file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse rule YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for RuleError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// The area a rule covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleArea {
    /// Inclusive tile rectangle.
    Rect {
        /// West edge.
        x1: i32,
        /// North edge.
        y1: i32,
        /// East edge.
        x2: i32,
        /// South edge.
        y2: i32,
    },
    /// Every tile whose terrain name matches.
    Tile {
        /// Terrain name, compared case-insensitively.
        name: String,
    },
    /// A named region (static spawn area).
    Region {
        /// Region name, compared case-insensitively.
        name: String,
    },
}

impl RuleArea {
    /// Whether a rectangle rule covers `point`. Always false for other kinds.
    pub fn covers(&self, point: &Point3D) -> bool {
        match self {
            Self::Rect { x1, y1, x2, y2 } => {
                point.x >= (*x1).min(*x2)
                    && point.x <= (*x1).max(*x2)
                    && point.y >= (*y1).min(*y2)
                    && point.y <= (*y1).max(*y2)
            }
            Self::Tile { .. } | Self::Region { .. } => false,
        }
    }
}

/// The six creature name lists of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnLists {
    /// Spawned on navigable water.
    #[serde(default)]
    pub water: Vec<String>,
    /// Spawned while the rule's weather trigger is active.
    #[serde(default)]
    pub weather: Vec<String>,
    /// Spawned during the rule's time-of-day bucket.
    #[serde(default)]
    pub timed: Vec<String>,
    /// Everyday spawns.
    #[serde(default)]
    pub common: Vec<String>,
    /// Less frequent spawns.
    #[serde(default)]
    pub uncommon: Vec<String>,
    /// Rarest spawns.
    #[serde(default)]
    pub rare: Vec<String>,
}

impl SpawnLists {
    /// The list for `category`.
    pub fn get(&self, category: SpawnCategory) -> &[String] {
        match category {
            SpawnCategory::Water => &self.water,
            SpawnCategory::Weather => &self.weather,
            SpawnCategory::Timed => &self.timed,
            SpawnCategory::Common => &self.common,
            SpawnCategory::Uncommon => &self.uncommon,
            SpawnCategory::Rare => &self.rare,
        }
    }

    /// Whether any of the common/uncommon/rare lists has an entry.
    pub fn has_rarity_entries(&self) -> bool {
        !(self.common.is_empty() && self.uncommon.is_empty() && self.rare.is_empty())
    }

    fn all_names(&self) -> impl Iterator<Item = &str> {
        self.water
            .iter()
            .chain(&self.weather)
            .chain(&self.timed)
            .chain(&self.common)
            .chain(&self.uncommon)
            .chain(&self.rare)
            .map(String::as_str)
    }
}

/// A single spawn rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRule {
    /// Human-readable label used in logs.
    #[serde(default)]
    pub name: String,

    /// The area this rule covers.
    pub area: RuleArea,

    /// Weather that activates the weather list.
    #[serde(default)]
    pub weather: Option<Weather>,

    /// Bucket that activates the timed list.
    #[serde(default)]
    pub time: Option<TimeOfDay>,

    /// Creature name lists.
    #[serde(default)]
    pub spawns: SpawnLists,
}

/// Rules that apply at one point, split by tier.
#[derive(Debug, Default)]
pub struct RuleMatches<'a> {
    /// Region (static) rules, in table order.
    pub region: Vec<&'a SpawnRule>,
    /// Rectangle rules followed by tile rules, each in table order.
    pub area: Vec<&'a SpawnRule>,
}

impl<'a> RuleMatches<'a> {
    /// Every matching rule, region rules first.
    pub fn all(&self) -> impl Iterator<Item = &'a SpawnRule> + '_ {
        self.region.iter().chain(&self.area).copied()
    }

    /// Whether no rule matched.
    pub fn is_empty(&self) -> bool {
        self.region.is_empty() && self.area.is_empty()
    }
}

/// Per-map spawn rule tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRuleStore {
    /// Rules keyed by map.
    #[serde(default)]
    pub maps: BTreeMap<MapId, Vec<SpawnRule>>,
}

impl SpawnRuleStore {
    /// Load a rule table from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Io`] or [`RuleError::Yaml`].
    pub fn from_file(path: &Path) -> Result<Self, RuleError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a rule table from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Yaml`] if the content is malformed.
    pub fn parse(yaml: &str) -> Result<Self, RuleError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Append a rule to `map`'s table.
    pub fn insert(&mut self, map: MapId, rule: SpawnRule) {
        self.maps.entry(map).or_default().push(rule);
    }

    /// Total number of rules across all maps.
    pub fn rule_count(&self) -> usize {
        self.maps.values().map(Vec::len).sum()
    }

    /// Rules on `map` that apply at `point`, given the point's region and
    /// terrain tile name.
    pub fn matching(
        &self,
        map: MapId,
        point: &Point3D,
        region: Option<&str>,
        tile: &str,
    ) -> RuleMatches<'_> {
        let mut matches = RuleMatches::default();
        let Some(rules) = self.maps.get(&map) else {
            return matches;
        };

        let mut tiles = Vec::new();
        for rule in rules {
            match &rule.area {
                RuleArea::Region { name } => {
                    if region.is_some_and(|r| r.eq_ignore_ascii_case(name)) {
                        matches.region.push(rule);
                    }
                }
                RuleArea::Rect { .. } => {
                    if rule.area.covers(point) {
                        matches.area.push(rule);
                    }
                }
                RuleArea::Tile { name } => {
                    if tile.eq_ignore_ascii_case(name) {
                        tiles.push(rule);
                    }
                }
            }
        }
        matches.area.extend(tiles);
        matches
    }

    /// Every distinct creature name referenced by any rule, sorted.
    pub fn referenced_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .maps
            .values()
            .flatten()
            .flat_map(|rule| rule.spawns.all_names())
            .map(str::to_owned)
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
