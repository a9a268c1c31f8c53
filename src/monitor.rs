//! Periodic progress reporting.

use crate::report::{ReportRow, ReportSink};
use crate::stats::Stats;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run the monitor until the token is cancelled.
///
/// On each tick: snapshot the stats, log one human-readable line, append
/// one row to the sink. The interval sleep is raced against the token, so
/// shutdown never waits out a full tick. Returns the sink so the caller
/// can emit the final row after all sessions have drained.
pub async fn run_monitor(
    stats: Stats,
    start: Instant,
    interval: Duration,
    mut sink: Box<dyn ReportSink>,
    token: CancellationToken,
) -> Box<dyn ReportSink> {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let snapshot = stats.snapshot();
        let elapsed = start.elapsed().as_secs_f64();
        info!(
            "created={} dropped={} errors={} avg_create={:.2}ms avg_drop={:.2}ms elapsed={:.1}s",
            snapshot.created,
            snapshot.dropped,
            snapshot.errors,
            snapshot.avg_create_ms,
            snapshot.avg_drop_ms,
            elapsed,
        );

        let row = ReportRow::from_snapshot(&snapshot, elapsed);
        if let Err(e) = sink.append(&row) {
            warn!("report append failed: {e}");
        }
    }

    sink
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryReportSink;

    #[tokio::test]
    async fn test_monitor_emits_rows_on_cadence() {
        let stats = Stats::new();
        let token = CancellationToken::new();
        let sink = MemoryReportSink::new();
        let rows = sink.clone();

        stats.record_create(Duration::from_millis(2));

        let handle = tokio::spawn(run_monitor(
            stats,
            Instant::now(),
            Duration::from_millis(20),
            Box::new(sink),
            token.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(110)).await;
        token.cancel();
        handle.await.unwrap();

        let emitted = rows.rows();
        assert!(
            (3..=7).contains(&emitted.len()),
            "expected ~5 rows, got {}",
            emitted.len()
        );
        assert!(emitted.iter().all(|r| r.created == 1));
        assert!(emitted
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(emitted.windows(2).all(|w| w[0].elapsed_s <= w[1].elapsed_s));
    }

    #[tokio::test]
    async fn test_monitor_stops_mid_sleep() {
        let stats = Stats::new();
        let token = CancellationToken::new();
        let sink = MemoryReportSink::new();
        let rows = sink.clone();

        let handle = tokio::spawn(run_monitor(
            stats,
            Instant::now(),
            Duration::from_secs(600),
            Box::new(sink),
            token.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor did not stop within a second")
            .unwrap();
        assert!(rows.rows().is_empty());
    }
}
