//! Rule tier resolution.
//!
//! Given a spawn point and the conditions there, [`RuleResolver`] walks the
//! rule tiers in fixed priority order and returns one creature name:
//!
//! 1. **Water** -- point is water and the water roll passes.
//! 2. **Weather** -- a rule's weather trigger matches and the roll passes.
//! 3. **Timed** -- a rule's time-of-day bucket matches and the roll passes.
//! 4. **Region** -- region (static) rules exist and the roll passes;
//!    common/uncommon/rare roll inside the first region rule.
//! 5. **Area** -- rectangle rules, then tile rules; rarity roll inside the
//!    first one with entries.
//!
//! A tier only rolls when it has a candidate list, and an empty roll falls
//! through to the next tier. Staff testers with debug enabled receive a
//! placeholder name when nothing matches.

use std::time::{Duration, Instant};

use tracing::debug;
use wildspawn_types::{MapId, Point3D, Rarity, SpawnCategory, TimeOfDay, Weather};

use crate::config::SpawnChances;
use crate::dice::Dice;
use crate::rules::{SpawnRule, SpawnRuleStore};

/// Minimum spacing between placeholder log lines.
const PLACEHOLDER_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// The tier that produced a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleTier {
    /// Water list of a matching rule.
    Water,
    /// Weather list of a rule whose trigger is active.
    Weather,
    /// Timed list of a rule whose bucket is active.
    Timed,
    /// Region (static) rule.
    Region,
    /// Rectangle or tile rule.
    Area,
    /// Debug placeholder for staff.
    Placeholder,
}

/// Conditions at a spawn point.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Map of the point.
    pub map: MapId,
    /// The point itself.
    pub location: Point3D,
    /// Region containing the point.
    pub region: Option<&'a str>,
    /// Terrain name at the point.
    pub tile: &'a str,
    /// Whether the point is water.
    pub is_water: bool,
    /// Weather at the point.
    pub weather: Weather,
    /// Current time-of-day bucket.
    pub time: TimeOfDay,
    /// The triggering player is staff and debug spawning is enabled.
    pub staff_debug: bool,
}

/// A resolved creature name and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Raw rule entry (type name plus optional arguments).
    pub name: String,
    /// Tier that produced it.
    pub tier: RuleTier,
}

/// Walks rule tiers for a spawn point.
#[derive(Debug)]
pub struct RuleResolver {
    placeholder: String,
    last_placeholder_log: Option<Instant>,
}

impl RuleResolver {
    /// Resolver returning `placeholder` to staff testers when nothing matches.
    pub const fn new(placeholder: String) -> Self {
        Self {
            placeholder,
            last_placeholder_log: None,
        }
    }

    /// Pick a creature name for `ctx`, or `None`.
    pub fn resolve(
        &mut self,
        store: &SpawnRuleStore,
        chances: &SpawnChances,
        ctx: &ResolveContext<'_>,
        dice: &mut dyn Dice,
    ) -> Option<Resolution> {
        let matches = store.matching(ctx.map, &ctx.location, ctx.region, ctx.tile);

        if ctx.is_water {
            let rule = matches
                .all()
                .find(|r| !r.spawns.water.is_empty());
            if let Some(name) = rule.and_then(|r| {
                gated_pick(r, SpawnCategory::Water, chances.water, dice)
            }) {
                return Some(Resolution {
                    name,
                    tier: RuleTier::Water,
                });
            }
        }

        let rule = matches
            .all()
            .find(|r| r.weather == Some(ctx.weather) && !r.spawns.weather.is_empty());
        if let Some(name) =
            rule.and_then(|r| gated_pick(r, SpawnCategory::Weather, chances.weather, dice))
        {
            return Some(Resolution {
                name,
                tier: RuleTier::Weather,
            });
        }

        let rule = matches
            .all()
            .find(|r| r.time == Some(ctx.time) && !r.spawns.timed.is_empty());
        if let Some(name) = rule.and_then(|r| gated_pick(r, SpawnCategory::Timed, chances.timed, dice))
        {
            return Some(Resolution {
                name,
                tier: RuleTier::Timed,
            });
        }

        let rule = matches
            .region
            .iter()
            .find(|r| r.spawns.has_rarity_entries());
        if let Some(rule) = rule {
            if dice.roll() < chances.static_region {
                if let Some(name) = rarity_pick(rule, chances, dice) {
                    return Some(Resolution {
                        name,
                        tier: RuleTier::Region,
                    });
                }
            }
        }

        let rule = matches.area.iter().find(|r| r.spawns.has_rarity_entries());
        if let Some(name) = rule.and_then(|r| rarity_pick(r, chances, dice)) {
            return Some(Resolution {
                name,
                tier: RuleTier::Area,
            });
        }

        if ctx.staff_debug {
            self.log_placeholder(ctx);
            return Some(Resolution {
                name: self.placeholder.clone(),
                tier: RuleTier::Placeholder,
            });
        }
        None
    }

    fn log_placeholder(&mut self, ctx: &ResolveContext<'_>) {
        let now = Instant::now();
        let due = self
            .last_placeholder_log
            .is_none_or(|last| now.duration_since(last) >= PLACEHOLDER_LOG_INTERVAL);
        if due {
            self.last_placeholder_log = Some(now);
            debug!(
                map = %ctx.map,
                location = %ctx.location,
                tile = ctx.tile,
                region = ctx.region,
                "no spawn rule matched, using debug placeholder"
            );
        }
    }
}

/// Roll against `chance` and pick uniformly from `rule`'s `category` list.
fn gated_pick(
    rule: &SpawnRule,
    category: SpawnCategory,
    chance: f64,
    dice: &mut dyn Dice,
) -> Option<String> {
    if dice.roll() < chance {
        pick(rule.spawns.get(category), dice)
    } else {
        None
    }
}

/// Roll rarity against the cumulative thresholds and pick from the
/// resulting list, falling back toward common when a list is empty.
fn rarity_pick(rule: &SpawnRule, chances: &SpawnChances, dice: &mut dyn Dice) -> Option<String> {
    let roll = dice.roll();
    let rarity = if roll < chances.rare {
        Rarity::Rare
    } else if roll < chances.uncommon {
        Rarity::Uncommon
    } else if roll < chances.common {
        Rarity::Common
    } else {
        return None;
    };

    let order: &[Rarity] = match rarity {
        Rarity::Rare => &[Rarity::Rare, Rarity::Uncommon, Rarity::Common],
        Rarity::Uncommon => &[Rarity::Uncommon, Rarity::Common],
        Rarity::Common => &[Rarity::Common],
    };
    order
        .iter()
        .map(|r| rule.spawns.get(r.category()))
        .find(|list| !list.is_empty())
        .and_then(|list| pick(list, dice))
}

fn pick(list: &[String], dice: &mut dyn Dice) -> Option<String> {
    if list.is_empty() {
        return None;
    }
    list.get(dice.pick(list.len())).cloned()
}
