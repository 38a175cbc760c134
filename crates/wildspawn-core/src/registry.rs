//! Creature type registry and per-name handle cache.
//!
//! Rule tables name creatures as strings such as `"Orc"` or
//! `"Orc warrior 3"` (type followed by constructor arguments). The
//! [`TypeRegistry`] maps a type name to a factory that turns those arguments
//! into a [`CreatureBlueprint`] the host can build. The registry is filled
//! once at startup; lookups never inspect types at runtime.
//!
//! [`TypeCache`] resolves each distinct raw name once and remembers the
//! answer, including the fallback substitution for unknown names.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Errors raised while resolving a creature name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No factory is registered under this type name.
    #[error("unknown creature type: {name}")]
    UnknownType {
        /// The type name that was looked up.
        name: String,
    },

    /// The raw name is empty or whitespace.
    #[error("invalid creature name: {raw:?}")]
    InvalidName {
        /// The raw rule-table entry.
        raw: String,
    },

    /// The factory rejected the constructor arguments.
    #[error("bad arguments for {type_name}: {reason}")]
    BadArguments {
        /// The type whose factory failed.
        type_name: String,
        /// Why the arguments were rejected.
        reason: String,
    },
}

/// What a creature type is for. Vendor and rift types are gated by
/// feature toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatureRole {
    /// Ordinary wildlife or monster.
    #[default]
    Creature,
    /// Wandering merchant.
    Vendor,
    /// Rift invader.
    Rift,
}

/// Everything the host needs to build one creature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureBlueprint {
    /// Canonical type name. Recycle pool buckets are keyed by this.
    pub type_name: String,
    /// Constructor arguments parsed from the rule entry.
    pub args: Vec<String>,
    /// Whether the creature can swim.
    pub can_swim: bool,
    /// Role of the type.
    pub role: CreatureRole,
}

/// Static traits of a registered type, used by [`TypeRegistry::register_kind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureKind {
    /// Whether the creature can swim.
    #[serde(default)]
    pub can_swim: bool,
    /// Role of the type.
    #[serde(default)]
    pub role: CreatureRole,
}

/// Factory building a blueprint from constructor arguments.
pub type CreatureFactory =
    Arc<dyn Fn(&[String]) -> Result<CreatureBlueprint, RegistryError> + Send + Sync>;

/// Name to factory mapping.
#[derive(Default, Clone)]
pub struct TypeRegistry {
    factories: HashMap<String, CreatureFactory>,
}

impl core::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name` (case-insensitive). Replaces any
    /// previous factory of that name.
    pub fn register(&mut self, name: &str, factory: CreatureFactory) {
        self.factories.insert(name.to_ascii_lowercase(), factory);
    }

    /// Register a type whose blueprint only depends on `kind`. Arguments are
    /// passed through untouched.
    pub fn register_kind(&mut self, name: &str, kind: CreatureKind) {
        let type_name = name.to_owned();
        self.register(
            name,
            Arc::new(move |args: &[String]| -> Result<CreatureBlueprint, RegistryError> {
                Ok(CreatureBlueprint {
                    type_name: type_name.clone(),
                    args: args.to_vec(),
                    can_swim: kind.can_swim,
                    role: kind.role,
                })
            }),
        );
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_ascii_lowercase())
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Build a blueprint for a raw rule entry such as `"Orc warrior 3"`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidName`] for a blank entry,
    /// [`RegistryError::UnknownType`] if the type is not registered, or
    /// whatever the factory reports.
    pub fn resolve(&self, raw: &str) -> Result<CreatureBlueprint, RegistryError> {
        let (type_name, args) = parse_entity_name(raw)?;
        let factory = self
            .factories
            .get(&type_name.to_ascii_lowercase())
            .ok_or_else(|| RegistryError::UnknownType {
                name: type_name.to_owned(),
            })?;
        factory(&args)
    }
}

/// Split a raw rule entry into type name and constructor arguments.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidName`] when the entry has no tokens.
pub fn parse_entity_name(raw: &str) -> Result<(&str, Vec<String>), RegistryError> {
    let mut tokens = raw.split_whitespace();
    let type_name = tokens.next().ok_or_else(|| RegistryError::InvalidName {
        raw: raw.to_owned(),
    })?;
    Ok((type_name, tokens.map(str::to_owned).collect()))
}

/// A resolved raw name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHandle {
    /// Blueprint to build from.
    pub blueprint: CreatureBlueprint,
    /// True when the raw name could not be resolved and the fallback type
    /// stands in for it.
    pub substituted: bool,
}

/// Cache of raw rule names to resolved handles.
#[derive(Debug, Default)]
pub struct TypeCache {
    handles: HashMap<String, Arc<TypeHandle>>,
}

impl TypeCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `raw`, building and caching the handle on first use.
    ///
    /// Unknown or malformed names resolve to `fallback_type` with
    /// `substituted = true`; a warning is logged once per distinct name.
    ///
    /// # Errors
    ///
    /// Returns the registry error if the fallback type itself cannot be
    /// built.
    pub fn handle(
        &mut self,
        registry: &TypeRegistry,
        raw: &str,
        fallback_type: &str,
    ) -> Result<Arc<TypeHandle>, RegistryError> {
        if let Some(handle) = self.handles.get(raw) {
            return Ok(Arc::clone(handle));
        }

        let handle = match registry.resolve(raw) {
            Ok(blueprint) => TypeHandle {
                blueprint,
                substituted: false,
            },
            Err(e) => {
                warn!(
                    name = raw,
                    fallback = fallback_type,
                    error = %e,
                    "creature type lookup failed, substituting fallback"
                );
                TypeHandle {
                    blueprint: registry.resolve(fallback_type)?,
                    substituted: true,
                }
            }
        };

        let handle = Arc::new(handle);
        self.handles.insert(raw.to_owned(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Number of cached names.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register_kind("Rat", CreatureKind::default());
        registry.register_kind(
            "Dolphin",
            CreatureKind {
                can_swim: true,
                role: CreatureRole::Creature,
            },
        );
        registry.register(
            "Orc",
            Arc::new(|args: &[String]| {
                if args.len() > 2 {
                    return Err(RegistryError::BadArguments {
                        type_name: "Orc".to_owned(),
                        reason: "at most two arguments".to_owned(),
                    });
                }
                Ok(CreatureBlueprint {
                    type_name: "Orc".to_owned(),
                    args: args.to_vec(),
                    can_swim: false,
                    role: CreatureRole::Creature,
                })
            }),
        );
        registry
    }

    #[test]
    fn resolves_case_insensitively_with_args() {
        let bp = registry().resolve("orc warrior 3").unwrap();
        assert_eq!(bp.type_name, "Orc");
        assert_eq!(bp.args, ["warrior", "3"]);
    }

    #[test]
    fn unknown_and_blank_names_fail() {
        let reg = registry();
        assert!(matches!(
            reg.resolve("Dragon"),
            Err(RegistryError::UnknownType { .. })
        ));
        assert!(matches!(
            reg.resolve("   "),
            Err(RegistryError::InvalidName { .. })
        ));
        assert!(matches!(
            reg.resolve("Orc a b c"),
            Err(RegistryError::BadArguments { .. })
        ));
    }

    #[test]
    fn cache_substitutes_fallback_once() {
        let reg = registry();
        let mut cache = TypeCache::new();
        let first = cache.handle(&reg, "Dragon", "Rat").unwrap();
        assert!(first.substituted);
        assert_eq!(first.blueprint.type_name, "Rat");
        let second = cache.handle(&reg, "Dragon", "Rat").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_fails_when_fallback_is_unknown() {
        let reg = registry();
        let mut cache = TypeCache::new();
        assert!(cache.handle(&reg, "Dragon", "Wyrm").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn known_names_are_not_substituted() {
        let reg = registry();
        let mut cache = TypeCache::new();
        let handle = cache.handle(&reg, "Dolphin", "Rat").unwrap();
        assert!(!handle.substituted);
        assert!(handle.blueprint.can_swim);
    }
}
