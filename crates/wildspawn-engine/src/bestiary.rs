//! Creature type registry setup.
//!
//! The `bestiary` section of `wildspawn-config.yaml` lists every creature
//! type the host can build, with its swim ability and role. The fallback
//! and placeholder types named in the `world` section are always present.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::info;
use wildspawn_core::config::WorldConfig;
use wildspawn_core::registry::{CreatureKind, CreatureRole, TypeRegistry};

/// Creature types known to the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BestiaryConfig {
    /// Type name to static traits.
    #[serde(default = "default_types")]
    pub types: BTreeMap<String, CreatureKind>,
}

impl Default for BestiaryConfig {
    fn default() -> Self {
        Self {
            types: default_types(),
        }
    }
}

fn default_types() -> BTreeMap<String, CreatureKind> {
    let creature = |can_swim| CreatureKind {
        can_swim,
        role: CreatureRole::Creature,
    };
    BTreeMap::from([
        (String::from("Rat"), creature(false)),
        (String::from("Rabbit"), creature(false)),
        (String::from("Wolf"), creature(false)),
        (String::from("Bear"), creature(false)),
        (String::from("BogLurker"), creature(true)),
        (String::from("Crab"), creature(true)),
        (String::from("Serpent"), creature(true)),
        (
            String::from("Peddler"),
            CreatureKind {
                can_swim: false,
                role: CreatureRole::Vendor,
            },
        ),
        (
            String::from("RiftWalker"),
            CreatureKind {
                can_swim: false,
                role: CreatureRole::Rift,
            },
        ),
    ])
}

/// Build the type registry for `bestiary`, adding the world's fallback and
/// placeholder types when the bestiary omits them.
pub fn build_registry(bestiary: &BestiaryConfig, world: &WorldConfig) -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    for (name, kind) in &bestiary.types {
        registry.register_kind(name, *kind);
    }
    for required in [&world.fallback_type, &world.placeholder_type] {
        if !registry.contains(required) {
            info!(type_name = %required, "registering missing built-in type");
            registry.register_kind(required, CreatureKind::default());
        }
    }
    registry
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_include_every_role() {
        let bestiary = BestiaryConfig::default();
        let roles: Vec<CreatureRole> = bestiary.types.values().map(|k| k.role).collect();
        assert!(roles.contains(&CreatureRole::Creature));
        assert!(roles.contains(&CreatureRole::Vendor));
        assert!(roles.contains(&CreatureRole::Rift));
    }

    #[test]
    fn registry_always_has_fallback_and_placeholder() {
        let bestiary = BestiaryConfig {
            types: BTreeMap::new(),
        };
        let registry = build_registry(&bestiary, &WorldConfig::default());
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("rat"));
        assert!(registry.contains("DebugPlaceholder"));
    }

    #[test]
    fn parses_from_yaml() {
        let yaml = "types:\n  Ghoul: { can_swim: false, role: creature }\n  Eel: { can_swim: true }\n";
        let bestiary: BestiaryConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(bestiary.types.len(), 2);
        assert!(bestiary.types["Eel"].can_swim);
    }
}
