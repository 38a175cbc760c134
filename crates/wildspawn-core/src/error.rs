//! Engine-level error type.
//!
//! Sweeps and engine operations return [`EngineError`]. The scheduler logs
//! these at the sweep boundary and keeps running; none of them stop the
//! engine on their own.

use crate::clock::ClockError;
use crate::config::ConfigError;
use crate::registry::RegistryError;
use crate::rules::RuleError;
use crate::world::HostError;

/// Errors raised by [`SpawnEngine`](crate::engine::SpawnEngine) operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A creature type (including the fallback) could not be built.
    #[error("type registry error: {source}")]
    Registry {
        /// The underlying registry error.
        #[from]
        source: RegistryError,
    },

    /// A world host call failed.
    #[error("world host error: {source}")]
    Host {
        /// The underlying host error.
        #[from]
        source: HostError,
    },

    /// Replacement settings failed validation.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// Time-of-day bucket boundaries are malformed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A rule table could not be loaded.
    #[error("spawn rule error: {source}")]
    Rules {
        /// The underlying rule error.
        #[from]
        source: RuleError,
    },
}
