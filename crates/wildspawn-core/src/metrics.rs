//! Passive metrics recorder.
//!
//! [`SpawnMetrics`] is written to by the engine at each notable event and
//! read only for reporting. Control logic never branches on a counter.
//! Cleanup sweep durations go into a fixed-size rolling window so the status
//! line can report average, peak and minimum over recent cycles.

use std::time::Duration;

use serde::Serialize;

/// Number of cleanup duration samples kept.
pub const CLEANUP_WINDOW_LEN: usize = 100;

/// Monotonic event counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SpawnCounters {
    /// Creatures built through the host.
    pub spawns_created: u64,
    /// Creatures taken from the recycle pool.
    pub spawns_reused_pool: u64,
    /// Creatures taken from the staging list.
    pub spawns_reused_staged: u64,
    /// Creatures moved into the recycle pool.
    pub recycled: u64,
    /// Creatures moved into the deletion queue.
    pub cleanup_additions: u64,
    /// Creatures permanently deleted.
    pub deletions: u64,
    /// Invalid entries found and dropped from any structure.
    pub invalid_removed: u64,
    /// Rule names replaced by the fallback type.
    pub type_fallbacks: u64,
    /// Generation skipped because of the population cap.
    pub generation_skipped_cap: u64,
    /// Generation attempts that ran out of retries.
    pub generation_exhausted: u64,
    /// Queued candidates discarded as out of range.
    pub candidates_discarded: u64,
    /// Candidates dropped because their role is disabled.
    pub candidates_dropped_role: u64,
    /// Failed world placements.
    pub placement_failures: u64,
    /// Dispatch ticks run.
    pub dispatch_ticks: u64,
    /// Sweeps that took longer than their period.
    pub sweep_overruns: u64,
    /// Supplementary cleanups fired by the dispatch backlog check.
    pub backlog_cleanups: u64,
    /// Sweeps that returned an error.
    pub sweep_errors: u64,
}

/// Rolling statistics over recent cleanup sweeps, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DurationStats {
    /// Most recent sample.
    pub last_ms: f64,
    /// Mean over the window.
    pub avg_ms: f64,
    /// Largest sample in the window.
    pub peak_ms: f64,
    /// Smallest sample in the window.
    pub min_ms: f64,
    /// Samples currently in the window.
    pub samples: usize,
}

/// Current sizes of the engine's structures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineGauges {
    /// Tracked players.
    pub players: usize,
    /// Candidates queued across all players.
    pub queued: usize,
    /// Creatures in the world owned by the engine.
    pub live: usize,
    /// Live creatures currently flagged too far.
    pub too_far: usize,
    /// Creatures in the recycle pool.
    pub pooled: usize,
    /// Creatures in the staging list.
    pub staged: usize,
}

/// Point-in-time view of all metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Event counters.
    pub counters: SpawnCounters,
    /// Cleanup sweep durations.
    pub cleanup: DurationStats,
    /// Structure sizes.
    pub gauges: EngineGauges,
}

/// Counter sink plus cleanup duration window.
#[derive(Debug, Default)]
pub struct SpawnMetrics {
    counters: SpawnCounters,
    cleanup: RollingWindowMs,
}

impl SpawnMetrics {
    /// All counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable access for recording.
    pub const fn counters_mut(&mut self) -> &mut SpawnCounters {
        &mut self.counters
    }

    /// Read-only counters.
    pub const fn counters(&self) -> &SpawnCounters {
        &self.counters
    }

    /// Record one cleanup sweep's wall-clock duration.
    pub fn record_cleanup(&mut self, elapsed: Duration) {
        self.cleanup.push_ms(elapsed.as_secs_f64() * 1000.0);
    }

    /// Snapshot with the given gauges.
    pub fn snapshot(&self, gauges: EngineGauges) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters,
            cleanup: self.cleanup.stats(),
            gauges,
        }
    }
}

/// Add `n` to a counter, saturating.
pub fn bump(counter: &mut u64, n: usize) {
    *counter = counter.saturating_add(u64::try_from(n).unwrap_or(u64::MAX));
}

// ---------------------------------------------------------------------------
// Rolling window
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct RollingWindowMs {
    samples: [f64; CLEANUP_WINDOW_LEN],
    head: usize,
    count: usize,
    last: f64,
}

impl Default for RollingWindowMs {
    fn default() -> Self {
        Self {
            samples: [0.0; CLEANUP_WINDOW_LEN],
            head: 0,
            count: 0,
            last: 0.0,
        }
    }
}

impl RollingWindowMs {
    fn push_ms(&mut self, value: f64) {
        self.last = value;
        if let Some(slot) = self.samples.get_mut(self.head) {
            *slot = value;
        }
        self.head = self.head.saturating_add(1) % CLEANUP_WINDOW_LEN;
        if self.count < CLEANUP_WINDOW_LEN {
            self.count = self.count.saturating_add(1);
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn stats(&self) -> DurationStats {
        let window = self.samples.get(..self.count).unwrap_or_default();
        if window.is_empty() {
            return DurationStats::default();
        }
        let sum: f64 = window.iter().sum();
        let peak = window.iter().copied().fold(f64::MIN, f64::max);
        let min = window.iter().copied().fold(f64::MAX, f64::min);
        DurationStats {
            last_ms: self.last,
            avg_ms: sum / window.len() as f64,
            peak_ms: peak,
            min_ms: min,
            samples: window.len(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_reports_zeroes() {
        let metrics = SpawnMetrics::new();
        let snap = metrics.snapshot(EngineGauges::default());
        assert_eq!(snap.cleanup, DurationStats::default());
        assert_eq!(snap.counters, SpawnCounters::default());
    }

    #[test]
    fn window_tracks_avg_peak_min() {
        let mut metrics = SpawnMetrics::new();
        for ms in [2, 4, 6] {
            metrics.record_cleanup(Duration::from_millis(ms));
        }
        let stats = metrics.snapshot(EngineGauges::default()).cleanup;
        assert_eq!(stats.samples, 3);
        assert!((stats.avg_ms - 4.0).abs() < 1e-9);
        assert!((stats.peak_ms - 6.0).abs() < 1e-9);
        assert!((stats.min_ms - 2.0).abs() < 1e-9);
        assert!((stats.last_ms - 6.0).abs() < 1e-9);
    }

    #[test]
    fn window_evicts_oldest_after_capacity() {
        let mut metrics = SpawnMetrics::new();
        metrics.record_cleanup(Duration::from_millis(500));
        for _ in 0..CLEANUP_WINDOW_LEN {
            metrics.record_cleanup(Duration::from_millis(1));
        }
        let stats = metrics.snapshot(EngineGauges::default()).cleanup;
        assert_eq!(stats.samples, CLEANUP_WINDOW_LEN);
        assert!((stats.peak_ms - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bump_saturates() {
        let mut counter = u64::MAX - 1;
        bump(&mut counter, 5);
        assert_eq!(counter, u64::MAX);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut metrics = SpawnMetrics::new();
        metrics.counters_mut().recycled = 3;
        let json = serde_json::to_value(metrics.snapshot(EngineGauges {
            live: 7,
            ..EngineGauges::default()
        }))
        .unwrap();
        assert_eq!(json["counters"]["recycled"], 3);
        assert_eq!(json["gauges"]["live"], 7);
    }
}
