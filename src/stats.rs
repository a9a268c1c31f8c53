//! Aggregate run statistics, updated concurrently by every session.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Point-in-time view of the aggregate counters.
///
/// Averages are `0.0` while the corresponding count is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Tables created.
    pub created: u64,
    /// Tables dropped.
    pub dropped: u64,
    /// Errors of any kind (connection or per-iteration).
    pub errors: u64,
    /// Cumulative create latency in milliseconds.
    pub total_create_ms: f64,
    /// Cumulative drop latency in milliseconds.
    pub total_drop_ms: f64,
    /// Mean create latency in milliseconds.
    pub avg_create_ms: f64,
    /// Mean drop latency in milliseconds.
    pub avg_drop_ms: f64,
}

#[derive(Debug, Default)]
struct Counters {
    created: u64,
    dropped: u64,
    errors: u64,
    total_create_ms: f64,
    total_drop_ms: f64,
}

/// Statistics shared by all sessions and read by the monitor.
///
/// Each recorded event updates its count and latency sum as one unit, so a
/// concurrent [`Stats::snapshot`] never observes a count without its
/// matching contribution to the sum. All fields are monotonically
/// non-decreasing for the lifetime of a run.
#[derive(Clone, Default)]
pub struct Stats {
    inner: Arc<Mutex<Counters>>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful create and its wall-clock latency.
    pub fn record_create(&self, latency: Duration) {
        let mut counters = self.lock();
        counters.created += 1;
        counters.total_create_ms += latency.as_secs_f64() * 1000.0;
    }

    /// Record a successful drop and its wall-clock latency.
    pub fn record_drop(&self, latency: Duration) {
        let mut counters = self.lock();
        counters.dropped += 1;
        counters.total_drop_ms += latency.as_secs_f64() * 1000.0;
    }

    /// Record one error of any kind.
    pub fn record_error(&self) {
        self.lock().errors += 1;
    }

    /// Take a consistent snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        let counters = self.lock();
        StatsSnapshot {
            created: counters.created,
            dropped: counters.dropped,
            errors: counters.errors,
            total_create_ms: counters.total_create_ms,
            total_drop_ms: counters.total_drop_ms,
            avg_create_ms: if counters.created > 0 {
                counters.total_create_ms / counters.created as f64
            } else {
                0.0
            },
            avg_drop_ms: if counters.dropped > 0 {
                counters.total_drop_ms / counters.dropped as f64
            } else {
                0.0
            },
        }
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        // A poisoned lock means a session panicked mid-update; the counters
        // themselves are still valid, so keep serving them.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let stats = Stats::new();
        let snapshot = stats.snapshot();

        assert_eq!(snapshot.created, 0);
        assert_eq!(snapshot.dropped, 0);
        assert_eq!(snapshot.errors, 0);
        assert_eq!(snapshot.avg_create_ms, 0.0);
        assert_eq!(snapshot.avg_drop_ms, 0.0);
    }

    #[test]
    fn test_averages_follow_totals() {
        let stats = Stats::new();
        stats.record_create(Duration::from_millis(10));
        stats.record_create(Duration::from_millis(30));
        stats.record_drop(Duration::from_millis(4));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.created, 2);
        assert_eq!(snapshot.dropped, 1);
        assert!((snapshot.avg_create_ms - 20.0).abs() < 1e-9);
        assert!((snapshot.avg_drop_ms - 4.0).abs() < 1e-9);
        assert!(
            (snapshot.avg_create_ms - snapshot.total_create_ms / snapshot.created as f64).abs()
                < 1e-9
        );
    }

    #[test]
    fn test_errors_counted() {
        let stats = Stats::new();
        stats.record_error();
        stats.record_error();

        assert_eq!(stats.snapshot().errors, 2);
    }

    #[test]
    fn test_snapshots_monotonic() {
        let stats = Stats::new();
        stats.record_create(Duration::from_millis(5));
        let first = stats.snapshot();

        stats.record_create(Duration::from_millis(5));
        stats.record_drop(Duration::from_millis(1));
        stats.record_error();
        let second = stats.snapshot();

        assert!(second.created >= first.created);
        assert!(second.dropped >= first.dropped);
        assert!(second.errors >= first.errors);
        assert!(second.total_create_ms >= first.total_create_ms);
        assert!(second.total_drop_ms >= first.total_drop_ms);
    }

    #[test]
    fn test_no_lost_updates_under_contention() {
        let stats = Stats::new();
        let sessions: u64 = 8;
        let events: u64 = 1000;

        let handles: Vec<_> = (0..sessions)
            .map(|_| {
                let stats = stats.clone();
                std::thread::spawn(move || {
                    for _ in 0..events {
                        stats.record_create(Duration::from_micros(100));
                        stats.record_drop(Duration::from_micros(50));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.created, sessions * events);
        assert_eq!(snapshot.dropped, sessions * events);
        assert!((snapshot.avg_create_ms - 0.1).abs() < 1e-9);
        assert!((snapshot.avg_drop_ms - 0.05).abs() < 1e-9);
    }
}
