//! Spawn-time aggression policy.
//!
//! Whether a freshly placed creature should immediately attack the player
//! who triggered it is a game-balance decision. The engine asks an
//! [`AggroPolicy`] and, on a yes, calls [`WorldHost::set_combatant`].
//!
//! [`WorldHost::set_combatant`]: crate::world::WorldHost::set_combatant

use crate::registry::CreatureBlueprint;
use crate::roster::Player;
use crate::world::MapRules;

/// Facts available when deciding aggression.
#[derive(Debug, Clone, Copy)]
pub struct AggroContext<'a> {
    /// The triggering player.
    pub player: &'a Player,
    /// The creature that was placed.
    pub blueprint: &'a CreatureBlueprint,
    /// Rules of the map it was placed on.
    pub map_rules: MapRules,
}

/// Decides whether a new spawn engages its triggering player.
pub trait AggroPolicy: Send {
    /// True to make the creature fight `ctx.player`.
    fn should_engage(&self, ctx: &AggroContext<'_>) -> bool;
}

/// Engage everyone on PvP maps and only criminals elsewhere. Swimmers never
/// engage on swim-capable maps.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAggroPolicy;

impl AggroPolicy for DefaultAggroPolicy {
    fn should_engage(&self, ctx: &AggroContext<'_>) -> bool {
        if ctx.map_rules.swim_capable && ctx.blueprint.can_swim {
            return false;
        }
        ctx.map_rules.pvp || ctx.player.criminal
    }
}

/// Never engage.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassiveAggroPolicy;

impl AggroPolicy for PassiveAggroPolicy {
    fn should_engage(&self, _ctx: &AggroContext<'_>) -> bool {
        false
    }
}
