//! Run coordination: ramp-up, deadline enforcement, drain, finalization.

use crate::config::RunConfig;
use crate::monitor::run_monitor;
use crate::provider::ResourceProvider;
use crate::report::{CsvReportSink, NullReportSink, ReportRow, ReportSink};
use crate::session::{run_session, SessionConfig};
use crate::stats::{Stats, StatsSnapshot};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle of one run. `Finalized` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    RampingUp,
    Running,
    Draining,
    Finalized,
}

/// The run's time budget. Immutable once computed.
#[derive(Debug, Clone, Copy)]
pub struct TestWindow {
    pub start: Instant,
    pub deadline: Instant,
}

impl TestWindow {
    pub fn new(duration: Duration) -> Self {
        let start = Instant::now();
        Self {
            start,
            deadline: start + duration,
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Final outcome of a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Last snapshot, taken after every session drained.
    pub snapshot: StatsSnapshot,
    /// Wall-clock time from start to finalization.
    pub elapsed: Duration,
    /// Sessions actually spawned (ramp-up may be cut short).
    pub sessions_spawned: usize,
}

/// Owns the test window and the stop token; stages session startup and
/// coordinates shutdown.
pub struct Orchestrator<P: ResourceProvider> {
    provider: Arc<P>,
    config: RunConfig,
    stats: Stats,
    token: CancellationToken,
    state: RunState,
}

impl<P: ResourceProvider> Orchestrator<P> {
    pub fn new(provider: P, config: RunConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            config,
            stats: Stats::new(),
            token: CancellationToken::new(),
            state: RunState::Idle,
        }
    }

    /// Stop token observed by every session and the monitor.
    ///
    /// Cancelling it from outside (e.g. a signal handler) moves the run
    /// into draining regardless of remaining budget; cancelling again is a
    /// no-op.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Shared statistics handle.
    pub fn stats(&self) -> Stats {
        self.stats.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }

    /// Drive a full run to `Finalized`, writing the report configured in
    /// [`RunConfig::report_path`].
    pub async fn run(&mut self) -> anyhow::Result<RunSummary> {
        let sink: Box<dyn ReportSink> = match &self.config.report_path {
            Some(path) => Box::new(CsvReportSink::create(path)?),
            None => Box::new(NullReportSink),
        };
        self.run_with_sink(sink).await
    }

    /// Drive a full run to `Finalized`, reporting into the given sink.
    ///
    /// Draining waits for every session unconditionally; a session stuck
    /// inside a backend call delays finalization (no per-call timeout).
    pub async fn run_with_sink(
        &mut self,
        sink: Box<dyn ReportSink>,
    ) -> anyhow::Result<RunSummary> {
        let window = TestWindow::new(self.config.test_duration);

        let monitor = tokio::spawn(run_monitor(
            self.stats.clone(),
            window.start,
            self.config.log_interval,
            sink,
            self.token.clone(),
        ));

        self.transition(RunState::RampingUp);
        let mut sessions = Vec::with_capacity(self.config.max_sessions);
        for id in 1..=self.config.max_sessions {
            if self.token.is_cancelled() || window.expired() {
                info!("ramp-up cut short after {} sessions", sessions.len());
                break;
            }
            let session = SessionConfig {
                id,
                rows_per_table: self.config.rows_per_table,
                mean_delay: self.config.mean_delay,
                read_back: self.config.read_back,
            };
            sessions.push(tokio::spawn(run_session(
                self.provider.clone(),
                session,
                self.stats.clone(),
                self.token.clone(),
            )));

            tokio::select! {
                _ = self.token.cancelled() => {}
                _ = tokio::time::sleep(self.config.ramp_interval) => {}
            }
        }
        let sessions_spawned = sessions.len();
        info!("{sessions_spawned} sessions started");

        self.transition(RunState::Running);
        tokio::select! {
            _ = self.token.cancelled() => info!("stop requested, draining"),
            _ = tokio::time::sleep_until(tokio::time::Instant::from_std(window.deadline)) => {
                info!("test duration reached, draining");
            }
        }

        self.transition(RunState::Draining);
        self.token.cancel();
        for result in join_all(sessions).await {
            if let Err(e) = result {
                warn!("session task failed: {e}");
            }
        }

        let mut sink = monitor
            .await
            .map_err(|e| anyhow::anyhow!("monitor task failed: {e}"))?;

        let snapshot = self.stats.snapshot();
        let elapsed = window.start.elapsed();
        let row = ReportRow::from_snapshot(&snapshot, elapsed.as_secs_f64());
        sink.append(&row)?;
        sink.flush()?;

        self.transition(RunState::Finalized);
        info!(
            "final: created={} dropped={} errors={} avg_create={:.2}ms avg_drop={:.2}ms",
            snapshot.created,
            snapshot.dropped,
            snapshot.errors,
            snapshot.avg_create_ms,
            snapshot.avg_drop_ms,
        );

        Ok(RunSummary {
            snapshot,
            elapsed,
            sessions_spawned,
        })
    }
}
