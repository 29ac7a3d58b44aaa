use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::warn;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "metrics lock poisoned; recovered inner value");
    }
}

/// Cumulative chunk cache activity of one map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheCounters {
    /// Chunks created into an empty slot.
    pub loads: u64,
    /// Destroyed chunks rebuilt in their existing slot.
    pub reloads: u64,
    pub evictions: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheMetricsSnapshot {
    pub resident_chunks: usize,
    pub loads_per_second: f32,
    pub evictions_per_second: f32,
    pub sweep_time_ms: f32,
}

#[derive(Clone, Debug)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<CacheMetricsSnapshot>>,
}

impl Default for MetricsHandle {
    fn default() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(CacheMetricsSnapshot::default())),
        }
    }
}

impl MetricsHandle {
    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub fn publish(&self, snapshot: CacheMetricsSnapshot) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("write");
                let mut guard = poisoned.into_inner();
                *guard = snapshot;
            }
        }
    }
}

/// Rates over simulated time. `now_ms` is the map's tick clock, so a
/// headless run produces the same numbers regardless of wall-clock speed.
#[derive(Debug)]
pub struct MetricsAccumulator {
    interval_start_ms: u64,
    interval_ms: u64,
    baseline: CacheCounters,
    sweeps: u32,
    sweep_time_sum: Duration,
}

impl MetricsAccumulator {
    pub fn new(interval: Duration, now_ms: u64) -> Self {
        Self {
            interval_start_ms: now_ms,
            interval_ms: interval.as_millis().max(1) as u64,
            baseline: CacheCounters::default(),
            sweeps: 0,
            sweep_time_sum: Duration::ZERO,
        }
    }

    pub fn record_sweep(&mut self, elapsed: Duration) {
        self.sweeps = self.sweeps.saturating_add(1);
        self.sweep_time_sum = self.sweep_time_sum.saturating_add(elapsed);
    }

    pub fn maybe_snapshot(
        &mut self,
        now_ms: u64,
        counters: CacheCounters,
        resident_chunks: usize,
    ) -> Option<CacheMetricsSnapshot> {
        let elapsed_ms = now_ms.saturating_sub(self.interval_start_ms);
        if elapsed_ms < self.interval_ms {
            return None;
        }

        let elapsed_seconds = (elapsed_ms as f32 / 1000.0).max(f32::EPSILON);
        let loads = (counters.loads + counters.reloads)
            .saturating_sub(self.baseline.loads + self.baseline.reloads);
        let evictions = counters.evictions.saturating_sub(self.baseline.evictions);
        let sweep_time_ms = if self.sweeps == 0 {
            0.0
        } else {
            (self.sweep_time_sum.as_secs_f32() / self.sweeps as f32) * 1000.0
        };

        let snapshot = CacheMetricsSnapshot {
            resident_chunks,
            loads_per_second: loads as f32 / elapsed_seconds,
            evictions_per_second: evictions as f32 / elapsed_seconds,
            sweep_time_ms,
        };

        self.interval_start_ms = now_ms;
        self.baseline = counters;
        self.sweeps = 0;
        self.sweep_time_sum = Duration::ZERO;

        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::RwLock;
    use std::thread;

    use super::*;

    fn poison_lock(lock: &RwLock<CacheMetricsSnapshot>) {
        thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = lock.write().expect("write guard");
                    panic!("poison metrics lock");
                })
                .join();
        });
    }

    #[test]
    fn snapshot_computes_rates_from_counter_deltas() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1), 0);
        accumulator.record_sweep(Duration::from_millis(2));
        accumulator.record_sweep(Duration::from_millis(4));

        let counters = CacheCounters {
            loads: 6,
            reloads: 2,
            evictions: 3,
        };
        let snapshot = accumulator
            .maybe_snapshot(2_000, counters, 5)
            .expect("snapshot should be emitted");

        assert_eq!(snapshot.resident_chunks, 5);
        assert!((snapshot.loads_per_second - 4.0).abs() < 0.001);
        assert!((snapshot.evictions_per_second - 1.5).abs() < 0.001);
        assert!((snapshot.sweep_time_ms - 3.0).abs() < 0.001);

        let next = accumulator
            .maybe_snapshot(3_000, counters, 5)
            .expect("second snapshot");
        assert_eq!(next.loads_per_second, 0.0);
        assert_eq!(next.sweep_time_ms, 0.0);
    }

    #[test]
    fn snapshot_not_emitted_before_interval() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1), 100);
        assert!(accumulator
            .maybe_snapshot(600, CacheCounters::default(), 0)
            .is_none());
    }

    #[test]
    fn snapshot_recovers_after_poison_without_panic() {
        let handle = MetricsHandle::default();
        poison_lock(handle.snapshot.as_ref());

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.resident_chunks, 0);
        assert_eq!(snapshot.loads_per_second, 0.0);
    }

    #[test]
    fn publish_recovers_after_poison_without_panic() {
        let handle = MetricsHandle::default();
        poison_lock(handle.snapshot.as_ref());

        handle.publish(CacheMetricsSnapshot {
            resident_chunks: 12,
            loads_per_second: 3.0,
            evictions_per_second: 1.0,
            sweep_time_ms: 0.5,
        });

        let actual = handle.snapshot();
        assert_eq!(actual.resident_chunks, 12);
        assert_eq!(actual.evictions_per_second, 1.0);
    }
}
