//! Scheduler control state.
//!
//! Shared between the scheduler task and whoever drives it (the host's
//! world-save hook, the shutdown signal handler). Timers can be stopped and
//! started any number of times; both calls are idempotent and never touch
//! queued candidates. A shutdown request wakes the scheduler even while the
//! timers are stopped.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tracing::info;

/// Timer and shutdown flags for one scheduler.
#[derive(Debug)]
pub struct SchedulerControl {
    /// Whether the periodic sweeps run on their ticks.
    timers_running: AtomicBool,

    /// Whether a shutdown has been requested.
    shutdown_requested: AtomicBool,

    /// Wakes the scheduler loop on shutdown.
    shutdown_notify: Notify,
}

impl Default for SchedulerControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerControl {
    /// Timers running, no shutdown requested.
    pub fn new() -> Self {
        Self {
            timers_running: AtomicBool::new(true),
            shutdown_requested: AtomicBool::new(false),
            shutdown_notify: Notify::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    /// Whether sweeps currently run.
    pub fn timers_running(&self) -> bool {
        self.timers_running.load(Ordering::Acquire)
    }

    /// Pause all periodic sweeps. Returns true if they were running.
    pub fn stop_timers(&self) -> bool {
        let was_running = self.timers_running.swap(false, Ordering::AcqRel);
        if was_running {
            info!("spawn timers stopped");
        }
        was_running
    }

    /// Resume periodic sweeps. Returns true if they were stopped.
    pub fn start_timers(&self) -> bool {
        let was_running = self.timers_running.swap(true, Ordering::AcqRel);
        if !was_running {
            info!("spawn timers started");
        }
        !was_running
    }

    // -----------------------------------------------------------------------
    // Shutdown
    // -----------------------------------------------------------------------

    /// Ask the scheduler to run the forced cleanup and exit.
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
        self.shutdown_notify.notify_one();
    }

    /// Whether a shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Resolve once a shutdown has been requested.
    pub async fn shutdown_signal(&self) {
        while !self.is_shutdown_requested() {
            self.shutdown_notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn stop_and_start_are_idempotent() {
        let control = SchedulerControl::new();
        assert!(control.timers_running());
        assert!(control.stop_timers());
        assert!(!control.stop_timers());
        assert!(!control.timers_running());
        assert!(control.start_timers());
        assert!(!control.start_timers());
        assert!(control.timers_running());
    }

    #[tokio::test]
    async fn shutdown_signal_resolves_after_request() {
        let control = Arc::new(SchedulerControl::new());
        let waiter = {
            let control = Arc::clone(&control);
            tokio::spawn(async move { control.shutdown_signal().await })
        };
        control.request_shutdown();
        let joined = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(matches!(joined, Ok(Ok(()))));
        assert!(control.is_shutdown_requested());
    }

    #[tokio::test]
    async fn shutdown_signal_returns_immediately_when_already_requested() {
        let control = SchedulerControl::new();
        control.request_shutdown();
        control.shutdown_signal().await;
    }
}
