//! Error types for the spawn engine binary.
//!
//! [`HostError`] wraps every failure mode of startup and shutdown so `main`
//! can propagate with `?`.

/// Top-level error for the spawn engine binary.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: wildspawn_core::config::ConfigError,
    },

    /// Spawn rule loading failed.
    #[error("rule error: {source}")]
    Rules {
        /// The underlying rule error.
        #[from]
        source: wildspawn_core::rules::RuleError,
    },

    /// Engine construction failed.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: wildspawn_core::error::EngineError,
    },

    /// The scheduler could not be reached.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: wildspawn_core::scheduler::SchedulerError,
    },

    /// A config section (bestiary, demo) could not be read or parsed.
    #[error("config section error: {message}")]
    Section {
        /// Description of the section failure.
        message: String,
    },

    /// The scheduler task ended without returning its cleanup report.
    #[error("forced cleanup failed: {message}")]
    Shutdown {
        /// Description of the join failure.
        message: String,
    },
}
