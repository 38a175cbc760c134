//! Host binary for the Wildspawn proximity spawn engine.
//!
//! Wires configuration, spawn rules and the creature bestiary into a
//! [`SpawnEngine`] over the in-memory demo world, starts the scheduler, and
//! runs until Ctrl-C. Shutdown always goes through the forced cleanup.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `wildspawn-config.yaml`
//! 3. Load spawn rules from `spawn-rules.yaml`
//! 4. Build the type registry from the `bestiary` section
//! 5. Build the demo world from the `demo` section
//! 6. Start the scheduler and log in the demo players
//! 7. Wait for Ctrl-C, then shut down and log the final cleanup
//!
//! [`SpawnEngine`]: wildspawn_core::engine::SpawnEngine

mod bestiary;
mod demo;
mod error;

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wildspawn_core::config::EngineConfig;
use wildspawn_core::engine::SpawnEngine;
use wildspawn_core::rules::SpawnRuleStore;
use wildspawn_core::scheduler::spawn_scheduler;

use crate::bestiary::BestiaryConfig;
use crate::demo::DemoConfig;
use crate::error::HostError;

/// Configuration file read at startup.
const CONFIG_PATH: &str = "wildspawn-config.yaml";

/// Rule table read at startup.
const RULES_PATH: &str = "spawn-rules.yaml";

/// Rule table used when no rule file is present.
const BUILTIN_RULES: &str = include_str!("../../../spawn-rules.yaml");

/// Application entry point for the spawn engine.
///
/// # Errors
///
/// Returns an error if startup fails or the scheduler dies before handing
/// back its final cleanup report.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("wildspawn-engine starting");
    if let Err(e) = run().await {
        error!(error = %e, "wildspawn-engine failed");
        return Err(e.into());
    }
    Ok(())
}

/// Start everything, wait for Ctrl-C, and shut down through the forced
/// cleanup.
async fn run() -> Result<(), HostError> {
    // 2. Load configuration.
    let config = load_config()?;
    info!(
        seed = config.world.seed,
        max_mobs = config.spawn.max_mobs,
        min_range = config.spawn.min_range,
        max_range = config.spawn.max_range,
        dispatch_ms = config.timers.dispatch_ms,
        "Configuration loaded"
    );

    // 3. Load spawn rules.
    let rules = load_rules()?;
    info!(rules = rules.rule_count(), maps = rules.maps.len(), "Spawn rules loaded");

    // 4. Build the type registry.
    let bestiary: BestiaryConfig = load_section("bestiary")?;
    let registry = bestiary::build_registry(&bestiary, &config.world);
    info!(types = registry.len(), "Creature types registered");

    // 5. Build the demo world.
    let demo_config: DemoConfig = load_section("demo")?;
    let world = demo::build_world(&demo_config);

    // 6. Start the scheduler.
    let engine = SpawnEngine::new(&config, world, registry, rules)?;
    let (handle, task) = spawn_scheduler(engine, config.timers);

    let players = demo::login_players(&handle, &demo_config).await?;
    tokio::spawn(demo::wander(
        handle.clone(),
        players,
        demo_config,
        config.world.seed,
    ));

    // 7. Run until Ctrl-C.
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C, shutting down");
    }
    info!("Shutdown signal received");
    handle.control().request_shutdown();

    let report = task.await.map_err(|e| HostError::Shutdown {
        message: format!("{e}"),
    })?;
    info!(
        deleted = report.deleted,
        pool_cleared = report.pool_cleared,
        invalid_removed = report.invalid_removed,
        elapsed_ms = report.elapsed.as_millis(),
        "wildspawn-engine shutdown complete"
    );

    Ok(())
}

/// Load the engine configuration from `wildspawn-config.yaml`, or defaults
/// when the file is absent.
fn load_config() -> Result<EngineConfig, HostError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(EngineConfig::from_file(config_path)?)
    } else {
        info!("Config file not found, using defaults");
        Ok(EngineConfig::default())
    }
}

/// Load the rule table from `spawn-rules.yaml`, or the built-in table when
/// the file is absent.
fn load_rules() -> Result<SpawnRuleStore, HostError> {
    let rules_path = Path::new(RULES_PATH);
    if rules_path.exists() {
        Ok(SpawnRuleStore::from_file(rules_path)?)
    } else {
        info!("Rule file not found, using built-in rules");
        Ok(SpawnRuleStore::parse(BUILTIN_RULES)?)
    }
}

/// Read one top-level section of `wildspawn-config.yaml`, falling back to
/// its defaults when the file or the key is missing.
fn load_section<T: DeserializeOwned + Default>(key: &str) -> Result<T, HostError> {
    let config_path = Path::new(CONFIG_PATH);
    if !config_path.exists() {
        return Ok(T::default());
    }
    let contents = std::fs::read_to_string(config_path).map_err(|e| HostError::Section {
        message: format!("failed to read config file: {e}"),
    })?;
    let raw: serde_yml::Value =
        serde_yml::from_str(&contents).map_err(|e| HostError::Section {
            message: format!("failed to parse config YAML: {e}"),
        })?;
    match raw.get(key) {
        Some(value) => serde_yml::from_value(value.clone()).map_err(|e| HostError::Section {
            message: format!("failed to parse {key} section: {e}"),
        }),
        None => Ok(T::default()),
    }
}
