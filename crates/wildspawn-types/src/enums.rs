//! Enumeration types shared by the rule store, resolver, and host.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// Weather at a point in the world, as reported by the host.
///
/// Spawn rules may name one of these as their weather trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    /// No active weather system.
    Clear,
    /// Light or heavy rain.
    Rain,
    /// Thunderstorm.
    Storm,
    /// Snowfall.
    Snow,
    /// Heavy snow with wind.
    Blizzard,
    /// Dense fog.
    Fog,
}

// ---------------------------------------------------------------------------
// Time of day
// ---------------------------------------------------------------------------

/// One of the eight time-of-day buckets used to gate timed spawns.
///
/// The hour ranges are not fixed here; the core crate maps clock hours to
/// buckets from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    /// The dead of night, just after midnight.
    WitchingHour,
    /// Before sunrise.
    Dawn,
    /// First hours of daylight.
    EarlyMorning,
    /// Approaching noon.
    LateMorning,
    /// Early afternoon.
    Afternoon,
    /// Late afternoon into evening.
    EarlyEvening,
    /// Sunset.
    Dusk,
    /// Night before midnight.
    Night,
}

impl TimeOfDay {
    /// All buckets in chronological order, starting at midnight.
    pub const ALL: [Self; 8] = [
        Self::WitchingHour,
        Self::Dawn,
        Self::EarlyMorning,
        Self::LateMorning,
        Self::Afternoon,
        Self::EarlyEvening,
        Self::Dusk,
        Self::Night,
    ];
}

// ---------------------------------------------------------------------------
// Spawn categories
// ---------------------------------------------------------------------------

/// The six name lists every spawn rule carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnCategory {
    /// Creatures placed on navigable water.
    Water,
    /// Creatures that appear during the rule's weather trigger.
    Weather,
    /// Creatures that appear during the rule's time-of-day trigger.
    Timed,
    /// Everyday spawns.
    Common,
    /// Less frequent spawns.
    Uncommon,
    /// The rarest spawns.
    Rare,
}

/// Outcome of a rarity roll inside a matched rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Roll landed under the common threshold only.
    Common,
    /// Roll landed under the uncommon threshold.
    Uncommon,
    /// Roll landed under the rare threshold.
    Rare,
}

impl Rarity {
    /// The name list this rarity draws from.
    pub const fn category(self) -> SpawnCategory {
        match self {
            Self::Common => SpawnCategory::Common,
            Self::Uncommon => SpawnCategory::Uncommon,
            Self::Rare => SpawnCategory::Rare,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_buckets_are_chronological() {
        let mut sorted = TimeOfDay::ALL;
        sorted.sort();
        assert_eq!(sorted, TimeOfDay::ALL);
    }

    #[test]
    fn weather_uses_snake_case() {
        let json = serde_json::to_string(&Weather::Blizzard).ok();
        assert_eq!(json.as_deref(), Some("\"blizzard\""));
        let bucket: Option<TimeOfDay> = serde_json::from_str("\"late_morning\"").ok();
        assert_eq!(bucket, Some(TimeOfDay::LateMorning));
    }

    #[test]
    fn rarity_maps_to_category() {
        assert_eq!(Rarity::Rare.category(), SpawnCategory::Rare);
        assert_eq!(Rarity::Common.category(), SpawnCategory::Common);
    }
}
