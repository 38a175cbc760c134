//! Configuration loading and typed config structures for the spawn engine.
//!
//! The canonical configuration lives in `wildspawn-config.yaml` next to the
//! host binary. Every field has a serde default, so a missing section (or a
//! missing file) falls back to the values documented on each field.
//!
//! [`EngineConfig::validate`] performs range sanity only: probabilities in
//! `[0, 1]`, ordered rarity thresholds, ordered ranges, non-zero periods.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside its permitted range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of which value is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// World-level settings (seed, fallback type names).
    #[serde(default)]
    pub world: WorldConfig,

    /// Spawn tuning values, replaceable at runtime.
    #[serde(default)]
    pub spawn: SpawnSettings,

    /// Recycle pool quotas.
    #[serde(default)]
    pub recycle: RecycleConfig,

    /// Sweep periods.
    #[serde(default)]
    pub timers: TimerConfig,

    /// Time-of-day bucket boundaries.
    #[serde(default)]
    pub time: TimeConfig,
}

impl EngineConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails range checks.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] or [`ConfigError::Invalid`].
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.spawn.validate()?;
        self.recycle.validate()?;
        self.timers.validate()?;
        self.time.validate()
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Seed for the engine's random number generator.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Creature type substituted when a rule names an unknown type.
    #[serde(default = "default_fallback_type")]
    pub fallback_type: String,

    /// Name returned to staff testers when no rule matches and debug is on.
    #[serde(default = "default_placeholder_type")]
    pub placeholder_type: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            fallback_type: default_fallback_type(),
            placeholder_type: default_placeholder_type(),
        }
    }
}

/// Spawn tuning values.
///
/// Read-mostly: the scheduler swaps in a new copy on `UpdateSettings` and
/// the change is visible from the next sweep on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnSettings {
    /// Population cap: wild creatures within `max_range` of a player.
    #[serde(default = "default_max_mobs")]
    pub max_mobs: u32,

    /// Minimum projection distance, also the crowding radius.
    #[serde(default = "default_min_range")]
    pub min_range: f64,

    /// Maximum projection distance and population-count radius.
    #[serde(default = "default_max_range")]
    pub max_range: f64,

    /// Crowding limit: candidates with this many creatures within
    /// `min_range` are rejected.
    #[serde(default = "default_max_crowd")]
    pub max_crowd: u32,

    /// Placement attempts per generation before giving up for the tick.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// A player's queue must hold more than this many candidates to dispatch.
    #[serde(default)]
    pub min_queued: usize,

    /// Generation stops topping up a queue at this length.
    #[serde(default = "default_max_queued")]
    pub max_queued: usize,

    /// Players processed per dispatch tick.
    #[serde(default = "default_dispatch_batch")]
    pub dispatch_batch: usize,

    /// Global difficulty factor applied to every materialized creature.
    #[serde(default = "default_difficulty")]
    pub difficulty: f64,

    /// Probability thresholds for rule tiers and rarity rolls.
    #[serde(default)]
    pub chances: SpawnChances,

    /// Feature toggles.
    #[serde(default)]
    pub features: FeatureToggles,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            max_mobs: default_max_mobs(),
            min_range: default_min_range(),
            max_range: default_max_range(),
            max_crowd: default_max_crowd(),
            max_retries: default_max_retries(),
            min_queued: 0,
            max_queued: default_max_queued(),
            dispatch_batch: default_dispatch_batch(),
            difficulty: default_difficulty(),
            chances: SpawnChances::default(),
            features: FeatureToggles::default(),
        }
    }
}

impl SpawnSettings {
    /// Radius beyond which a spawn counts as too far from every player.
    pub const fn despawn_range(&self) -> f64 {
        self.max_range * 1.5
    }

    /// Range sanity for spawn values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_range >= 0.0 && self.min_range <= self.max_range) {
            return Err(invalid(format!(
                "spawn.min_range ({}) must be within [0, max_range ({})]",
                self.min_range, self.max_range
            )));
        }
        if self.max_range <= 0.0 {
            return Err(invalid("spawn.max_range must be positive".to_owned()));
        }
        if self.dispatch_batch == 0 {
            return Err(invalid("spawn.dispatch_batch must be at least 1".to_owned()));
        }
        if self.max_retries == 0 {
            return Err(invalid("spawn.max_retries must be at least 1".to_owned()));
        }
        if self.difficulty.is_nan() || self.difficulty <= 0.0 {
            return Err(invalid("spawn.difficulty must be positive".to_owned()));
        }
        self.chances.validate()
    }
}

/// Probability thresholds, each in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnChances {
    /// Accepting a water point, and consulting the water tier.
    #[serde(default = "default_half")]
    pub water: f64,

    /// Consulting the weather tier when a rule's trigger matches.
    #[serde(default = "default_half")]
    pub weather: f64,

    /// Consulting the timed tier when a rule's bucket matches.
    #[serde(default = "default_half")]
    pub timed: f64,

    /// Consulting region (static) rules before area rules.
    #[serde(default = "default_half")]
    pub static_region: f64,

    /// Cumulative threshold for the common list.
    #[serde(default = "default_common")]
    pub common: f64,

    /// Cumulative threshold for the uncommon list.
    #[serde(default = "default_uncommon")]
    pub uncommon: f64,

    /// Cumulative threshold for the rare list.
    #[serde(default = "default_rare")]
    pub rare: f64,
}

impl Default for SpawnChances {
    fn default() -> Self {
        Self {
            water: default_half(),
            weather: default_half(),
            timed: default_half(),
            static_region: default_half(),
            common: default_common(),
            uncommon: default_uncommon(),
            rare: default_rare(),
        }
    }
}

impl SpawnChances {
    fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("water", self.water),
            ("weather", self.weather),
            ("timed", self.timed),
            ("static_region", self.static_region),
            ("common", self.common),
            ("uncommon", self.uncommon),
            ("rare", self.rare),
        ];
        for (name, value) in named {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!(
                    "spawn.chances.{name} ({value}) must be within [0, 1]"
                )));
            }
        }
        if self.rare > self.uncommon || self.uncommon > self.common {
            return Err(invalid(
                "spawn.chances must satisfy common >= uncommon >= rare".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Feature toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureToggles {
    /// Hand staff testers a placeholder when no rule matches.
    #[serde(default)]
    pub debug: bool,

    /// Allow rift-role creature types to spawn.
    #[serde(default)]
    pub rift_spawn: bool,

    /// Allow vendor-role types to spawn.
    #[serde(default)]
    pub vendor_spawn: bool,
}

/// Recycle pool quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecycleConfig {
    /// Maximum pooled entities for a single type.
    #[serde(default = "default_max_per_type")]
    pub max_per_type: usize,

    /// Maximum pooled entities across all types.
    #[serde(default = "default_max_total")]
    pub max_total: usize,
}

impl Default for RecycleConfig {
    fn default() -> Self {
        Self {
            max_per_type: default_max_per_type(),
            max_total: default_max_total(),
        }
    }
}

impl RecycleConfig {
    fn validate(self) -> Result<(), ConfigError> {
        if self.max_per_type > self.max_total {
            return Err(invalid(format!(
                "recycle.max_per_type ({}) exceeds recycle.max_total ({})",
                self.max_per_type, self.max_total
            )));
        }
        Ok(())
    }
}

/// Sweep periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Dispatch tick period in milliseconds.
    #[serde(default = "default_dispatch_ms")]
    pub dispatch_ms: u64,

    /// Distance monitor period in milliseconds.
    #[serde(default = "default_distance_ms")]
    pub distance_ms: u64,

    /// Cleanup sweep period in milliseconds.
    #[serde(default = "default_cleanup_ms")]
    pub cleanup_ms: u64,

    /// Status line period in seconds.
    #[serde(default = "default_status_secs")]
    pub status_secs: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            dispatch_ms: default_dispatch_ms(),
            distance_ms: default_distance_ms(),
            cleanup_ms: default_cleanup_ms(),
            status_secs: default_status_secs(),
        }
    }
}

impl TimerConfig {
    fn validate(self) -> Result<(), ConfigError> {
        if self.dispatch_ms == 0
            || self.distance_ms == 0
            || self.cleanup_ms == 0
            || self.status_secs == 0
        {
            return Err(invalid("timer periods must be non-zero".to_owned()));
        }
        Ok(())
    }
}

/// Time-of-day bucket boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeConfig {
    /// Starting hour of each of the eight buckets, strictly ascending.
    #[serde(default = "default_bucket_start_hours")]
    pub bucket_start_hours: Vec<u8>,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            bucket_start_hours: default_bucket_start_hours(),
        }
    }
}

impl TimeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        crate::clock::TimeBuckets::new(&self.bucket_start_hours)
            .map(|_| ())
            .map_err(|e| invalid(format!("time.bucket_start_hours: {e}")))
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

fn default_fallback_type() -> String {
    String::from("Rat")
}

fn default_placeholder_type() -> String {
    String::from("DebugPlaceholder")
}

const fn default_max_mobs() -> u32 {
    15
}

const fn default_min_range() -> f64 {
    10.0
}

const fn default_max_range() -> f64 {
    50.0
}

const fn default_max_crowd() -> u32 {
    3
}

const fn default_max_retries() -> u32 {
    10
}

const fn default_max_queued() -> usize {
    8
}

const fn default_dispatch_batch() -> usize {
    5
}

const fn default_difficulty() -> f64 {
    1.0
}

const fn default_half() -> f64 {
    0.5
}

const fn default_common() -> f64 {
    1.0
}

const fn default_uncommon() -> f64 {
    0.3
}

const fn default_rare() -> f64 {
    0.05
}

const fn default_max_per_type() -> usize {
    20
}

const fn default_max_total() -> usize {
    400
}

const fn default_dispatch_ms() -> u64 {
    50
}

const fn default_distance_ms() -> u64 {
    1_000
}

const fn default_cleanup_ms() -> u64 {
    10_000
}

const fn default_status_secs() -> u64 {
    60
}

fn default_bucket_start_hours() -> Vec<u8> {
    vec![0, 3, 6, 9, 12, 15, 18, 21]
}
