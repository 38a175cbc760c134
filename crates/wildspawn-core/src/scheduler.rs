//! Scheduler actor driving a [`SpawnEngine`].
//!
//! [`spawn_scheduler`] moves the engine onto one tokio task. That task is
//! the only owner of the engine's structures; it selects over:
//!
//! - three sweep intervals (dispatch, distance, cleanup), each with
//!   [`MissedTickBehavior::Skip`] so a slow sweep never queues up a burst,
//! - a status interval that logs a metrics line,
//! - an `mpsc` channel of [`EngineCommand`]s from any number of
//!   [`EngineHandle`]s,
//! - the shutdown signal of the shared [`SchedulerControl`].
//!
//! A sweep that takes longer than its period is logged as an overrun. On
//! shutdown, or when every handle is dropped, the task stops the timers,
//! runs [`SpawnEngine::forced_cleanup`] and returns its report through the
//! join handle.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{error, info, warn};
use wildspawn_types::{MapId, PlayerId, Point3D};

use crate::config::{SpawnSettings, TimerConfig};
use crate::control::SchedulerControl;
use crate::engine::{CleanupReport, SpawnEngine};
use crate::error::EngineError;
use crate::metrics::MetricsSnapshot;
use crate::roster::Player;
use crate::rules::SpawnRuleStore;
use crate::world::WorldHost;

/// Capacity of the command channel.
const COMMAND_BUFFER: usize = 256;

/// Errors returned by [`EngineHandle`] calls.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The scheduler task has exited; the engine can no longer be reached.
    #[error("spawn engine is unavailable")]
    EngineUnavailable,

    /// The engine refused the request.
    #[error("engine rejected request: {source}")]
    Rejected {
        /// The underlying engine error.
        #[from]
        source: EngineError,
    },
}

/// Requests processed by the scheduler task, in arrival order.
#[derive(Debug)]
pub enum EngineCommand {
    /// Start tracking a player.
    Login {
        /// The player.
        player: Player,
        /// Receives true if the player was newly added.
        reply: oneshot::Sender<bool>,
    },
    /// Stop tracking a player.
    Logout {
        /// Player to remove.
        id: PlayerId,
        /// Receives the number of discarded candidates.
        reply: oneshot::Sender<Option<usize>>,
    },
    /// Update a player's position.
    MovePlayer {
        /// Player to move.
        id: PlayerId,
        /// New map.
        map: MapId,
        /// New location.
        location: Point3D,
    },
    /// Replace the rule table.
    ReloadRules {
        /// The new table.
        rules: Box<SpawnRuleStore>,
    },
    /// Replace the spawn settings.
    UpdateSettings {
        /// The new settings.
        settings: Box<SpawnSettings>,
        /// Receives the validation outcome.
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    /// Read a metrics snapshot.
    Metrics {
        /// Receives the snapshot.
        reply: oneshot::Sender<MetricsSnapshot>,
    },
    /// Stop the timers and run a forced cleanup. Timers stay stopped.
    ForceCleanup {
        /// Receives the cleanup report.
        reply: oneshot::Sender<CleanupReport>,
    },
    /// Run the forced cleanup and exit.
    Shutdown,
}

/// Cloneable handle to a running scheduler.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
    control: Arc<SchedulerControl>,
}

impl EngineHandle {
    async fn send(&self, command: EngineCommand) -> Result<(), SchedulerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_closed| SchedulerError::EngineUnavailable)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> Result<T, SchedulerError> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await.map_err(|_dropped| SchedulerError::EngineUnavailable)
    }

    /// Track `player`. Returns true if newly added.
    pub async fn login(&self, player: Player) -> Result<bool, SchedulerError> {
        self.request(|reply| EngineCommand::Login { player, reply })
            .await
    }

    /// Stop tracking `id`. Returns the number of discarded candidates.
    pub async fn logout(&self, id: PlayerId) -> Result<Option<usize>, SchedulerError> {
        self.request(|reply| EngineCommand::Logout { id, reply }).await
    }

    /// Move a tracked player.
    pub async fn move_player(
        &self,
        id: PlayerId,
        map: MapId,
        location: Point3D,
    ) -> Result<(), SchedulerError> {
        self.send(EngineCommand::MovePlayer { id, map, location })
            .await
    }

    /// Replace the rule table.
    pub async fn reload_rules(&self, rules: SpawnRuleStore) -> Result<(), SchedulerError> {
        self.send(EngineCommand::ReloadRules {
            rules: Box::new(rules),
        })
        .await
    }

    /// Replace the spawn settings.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Rejected`] if the settings fail validation.
    pub async fn update_settings(&self, settings: SpawnSettings) -> Result<(), SchedulerError> {
        let settings = Box::new(settings);
        self.request(|reply| EngineCommand::UpdateSettings { settings, reply })
            .await??;
        Ok(())
    }

    /// Current metrics.
    pub async fn metrics(&self) -> Result<MetricsSnapshot, SchedulerError> {
        self.request(|reply| EngineCommand::Metrics { reply }).await
    }

    /// Stop the timers and tear down every spawn.
    pub async fn force_cleanup(&self) -> Result<CleanupReport, SchedulerError> {
        self.request(|reply| EngineCommand::ForceCleanup { reply })
            .await
    }

    /// Ask the scheduler to exit. Await the join handle for the final
    /// cleanup report.
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        self.send(EngineCommand::Shutdown).await
    }

    /// Pause the periodic sweeps (world save).
    pub fn stop_timers(&self) -> bool {
        self.control.stop_timers()
    }

    /// Resume the periodic sweeps.
    pub fn start_timers(&self) -> bool {
        self.control.start_timers()
    }

    /// The shared control state.
    pub fn control(&self) -> Arc<SchedulerControl> {
        Arc::clone(&self.control)
    }
}

/// Start the scheduler task for `engine`.
///
/// Must be called inside a tokio runtime.
pub fn spawn_scheduler<H>(
    engine: SpawnEngine<H>,
    timers: TimerConfig,
) -> (EngineHandle, JoinHandle<CleanupReport>)
where
    H: WorldHost + 'static,
{
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let control = Arc::new(SchedulerControl::new());
    let handle = EngineHandle {
        commands: tx,
        control: Arc::clone(&control),
    };
    let task = tokio::spawn(run_scheduler(engine, timers, control, rx));
    (handle, task)
}

/// The three periodic sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sweep {
    Dispatch,
    Distance,
    Cleanup,
}

impl Sweep {
    const fn name(self) -> &'static str {
        match self {
            Self::Dispatch => "dispatch",
            Self::Distance => "distance",
            Self::Cleanup => "cleanup",
        }
    }
}

/// Whether the loop keeps going after a command.
enum Flow {
    Continue,
    Exit,
}

fn sweep_interval(period: Duration) -> Interval {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn run_scheduler<H: WorldHost>(
    mut engine: SpawnEngine<H>,
    timers: TimerConfig,
    control: Arc<SchedulerControl>,
    mut commands: mpsc::Receiver<EngineCommand>,
) -> CleanupReport {
    let dispatch_period = Duration::from_millis(timers.dispatch_ms);
    let distance_period = Duration::from_millis(timers.distance_ms);
    let cleanup_period = Duration::from_millis(timers.cleanup_ms);

    let mut dispatch = sweep_interval(dispatch_period);
    let mut distance = sweep_interval(distance_period);
    let mut cleanup = sweep_interval(cleanup_period);
    let mut status = sweep_interval(Duration::from_secs(timers.status_secs));
    // Skip the immediate first status tick.
    status.reset();

    info!(
        dispatch_ms = timers.dispatch_ms,
        distance_ms = timers.distance_ms,
        cleanup_ms = timers.cleanup_ms,
        "spawn scheduler started"
    );

    loop {
        tokio::select! {
            _ = dispatch.tick() => {
                run_sweep(&mut engine, &control, Sweep::Dispatch, dispatch_period);
            }
            _ = distance.tick() => {
                run_sweep(&mut engine, &control, Sweep::Distance, distance_period);
            }
            _ = cleanup.tick() => {
                run_sweep(&mut engine, &control, Sweep::Cleanup, cleanup_period);
            }
            _ = status.tick() => {
                log_status(&engine, &control);
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    warn!("all engine handles dropped, shutting down");
                    break;
                };
                if matches!(handle_command(&mut engine, &control, command), Flow::Exit) {
                    break;
                }
            }
            () = control.shutdown_signal() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    control.stop_timers();
    let report = engine.forced_cleanup();
    let snapshot = engine.metrics_snapshot();
    match serde_json::to_string(&snapshot) {
        Ok(json) => info!(metrics = %json, "spawn scheduler stopped"),
        Err(e) => error!(error = %e, "failed to serialize final metrics"),
    }
    report
}

fn run_sweep<H: WorldHost>(
    engine: &mut SpawnEngine<H>,
    control: &SchedulerControl,
    sweep: Sweep,
    period: Duration,
) {
    if !control.timers_running() {
        return;
    }
    let started = Instant::now();
    match sweep {
        Sweep::Dispatch => {
            if let Err(e) = engine.dispatch_tick() {
                engine.record_sweep_error();
                error!(sweep = sweep.name(), error = %e, "sweep failed");
            }
        }
        Sweep::Distance => {
            engine.distance_sweep();
        }
        Sweep::Cleanup => {
            engine.cleanup_sweep();
        }
    }
    let elapsed = started.elapsed();
    if elapsed > period {
        engine.record_overrun();
        warn!(
            sweep = sweep.name(),
            elapsed_ms = elapsed.as_millis(),
            period_ms = period.as_millis(),
            "sweep overran its period"
        );
    }
}

fn handle_command<H: WorldHost>(
    engine: &mut SpawnEngine<H>,
    control: &SchedulerControl,
    command: EngineCommand,
) -> Flow {
    // A dropped reply receiver only means the caller stopped waiting.
    match command {
        EngineCommand::Login { player, reply } => {
            let _ = reply.send(engine.login(player));
        }
        EngineCommand::Logout { id, reply } => {
            let _ = reply.send(engine.logout(id));
        }
        EngineCommand::MovePlayer { id, map, location } => {
            engine.move_player(id, map, location);
        }
        EngineCommand::ReloadRules { rules } => {
            engine.reload_rules(*rules);
        }
        EngineCommand::UpdateSettings { settings, reply } => {
            let outcome = engine.update_settings(*settings);
            if let Err(e) = &outcome {
                warn!(error = %e, "rejected settings update");
            }
            let _ = reply.send(outcome);
        }
        EngineCommand::Metrics { reply } => {
            let _ = reply.send(engine.metrics_snapshot());
        }
        EngineCommand::ForceCleanup { reply } => {
            control.stop_timers();
            let _ = reply.send(engine.forced_cleanup());
        }
        EngineCommand::Shutdown => return Flow::Exit,
    }
    Flow::Continue
}

fn log_status<H: WorldHost>(engine: &SpawnEngine<H>, control: &SchedulerControl) {
    let snap = engine.metrics_snapshot();
    info!(
        timers_running = control.timers_running(),
        players = snap.gauges.players,
        queued = snap.gauges.queued,
        live = snap.gauges.live,
        too_far = snap.gauges.too_far,
        pooled = snap.gauges.pooled,
        staged = snap.gauges.staged,
        created = snap.counters.spawns_created,
        reused = snap.counters.spawns_reused_pool,
        recycled = snap.counters.recycled,
        deleted = snap.counters.deletions,
        cleanup_avg_ms = snap.cleanup.avg_ms,
        cleanup_peak_ms = snap.cleanup.peak_ms,
        "spawn engine status"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wildspawn_types::PlayerId;

    use super::*;
    use crate::clock::FixedClock;
    use crate::config::EngineConfig;
    use crate::dice::RngDice;
    use crate::memory::{MemoryMap, MemoryWorld};
    use crate::registry::{CreatureKind, TypeRegistry};

    const RULES: &str = r#"
maps:
  0:
    - name: meadow
      area: { kind: tile, name: grass }
      spawns:
        common: [Rat]
"#;

    fn engine() -> SpawnEngine<MemoryWorld> {
        let mut world = MemoryWorld::new();
        world.add_map(MapId(0), MemoryMap::new(2000, 2000));
        let mut registry = TypeRegistry::new();
        registry.register_kind("Rat", CreatureKind::default());
        let rules = SpawnRuleStore::parse(RULES).unwrap();
        SpawnEngine::new(&EngineConfig::default(), world, registry, rules)
            .unwrap()
            .with_dice(Box::new(RngDice::seeded(7)))
            .with_clock(Arc::new(FixedClock::new(12)))
    }

    fn fast_timers() -> TimerConfig {
        TimerConfig {
            dispatch_ms: 10,
            distance_ms: 50,
            cleanup_ms: 200,
            status_secs: 1,
        }
    }

    #[test]
    fn sweep_longer_than_its_period_counts_an_overrun() {
        let mut engine = engine();
        let control = SchedulerControl::new();

        run_sweep(&mut engine, &control, Sweep::Cleanup, Duration::ZERO);
        assert_eq!(engine.metrics_snapshot().counters.sweep_overruns, 1);

        run_sweep(&mut engine, &control, Sweep::Cleanup, Duration::from_secs(60));
        assert_eq!(engine.metrics_snapshot().counters.sweep_overruns, 1);
    }

    #[test]
    fn stopped_timers_skip_the_sweep_entirely() {
        let mut engine = engine();
        let control = SchedulerControl::new();
        control.stop_timers();

        run_sweep(&mut engine, &control, Sweep::Dispatch, Duration::ZERO);
        let counters = engine.metrics_snapshot().counters;
        assert_eq!(counters.dispatch_ticks, 0);
        assert_eq!(counters.sweep_overruns, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_spawns_and_cleans_up_on_shutdown() {
        let (handle, task) = spawn_scheduler(engine(), fast_timers());
        let player = Player::new(PlayerId::new(), MapId(0), Point3D::new(1000, 1000, 0));
        assert!(handle.login(player).await.unwrap());

        time::sleep(Duration::from_secs(2)).await;
        let snap = handle.metrics().await.unwrap();
        assert!(snap.counters.dispatch_ticks > 0);
        assert!(snap.gauges.live > 0);

        handle.shutdown().await.unwrap();
        let report = task.await.unwrap();
        assert!(report.deleted > 0);
        assert!(handle.metrics().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_timers_keep_queues_intact() {
        let (handle, task) = spawn_scheduler(engine(), fast_timers());
        let id = PlayerId::new();
        handle
            .login(Player::new(id, MapId(0), Point3D::new(1000, 1000, 0)))
            .await
            .unwrap();
        time::sleep(Duration::from_millis(100)).await;

        assert!(handle.stop_timers());
        assert!(!handle.stop_timers());
        let before = handle.metrics().await.unwrap();
        time::sleep(Duration::from_secs(1)).await;
        let after = handle.metrics().await.unwrap();
        assert_eq!(before.counters.dispatch_ticks, after.counters.dispatch_ticks);
        assert_eq!(before.gauges.queued, after.gauges.queued);

        assert!(handle.start_timers());
        time::sleep(Duration::from_millis(100)).await;
        let resumed = handle.metrics().await.unwrap();
        assert!(resumed.counters.dispatch_ticks > after.counters.dispatch_ticks);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_settings_are_rejected() {
        let (handle, task) = spawn_scheduler(engine(), fast_timers());
        let mut settings = SpawnSettings::default();
        settings.chances.rare = 2.0;
        assert!(matches!(
            handle.update_settings(settings).await,
            Err(SchedulerError::Rejected { .. })
        ));
        handle.control().request_shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn force_cleanup_twice_is_idempotent() {
        let (handle, task) = spawn_scheduler(engine(), fast_timers());
        handle
            .login(Player::new(PlayerId::new(), MapId(0), Point3D::new(1000, 1000, 0)))
            .await
            .unwrap();
        time::sleep(Duration::from_secs(1)).await;

        let first = handle.force_cleanup().await.unwrap();
        assert!(first.deleted > 0);
        let second = handle.force_cleanup().await.unwrap();
        assert!(second.is_idle());

        handle.shutdown().await.unwrap();
        let last = task.await.unwrap();
        assert!(last.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_every_handle_runs_forced_cleanup() {
        let (handle, task) = spawn_scheduler(engine(), fast_timers());
        drop(handle);
        let report = task.await.unwrap();
        assert!(report.is_idle());
    }
}
