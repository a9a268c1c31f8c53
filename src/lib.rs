//! pg-temp-stress Library
//!
//! A concurrent stress-test harness for PostgreSQL temp tables. A
//! configurable number of sessions, each holding one exclusive connection,
//! repeatedly create a uniquely named temp table, optionally read it back,
//! and drop it, recording create/drop latency until the time budget
//! expires or an interrupt asks the run to stop.
//!
//! # Features
//!
//! - Staged ramp-up: sessions start one at a time at a configured interval
//! - Failure isolation: a failing session or iteration never stops the run
//! - Consistent metrics: counts and latency sums update as one unit
//! - Cooperative shutdown: every sleep is raced against one stop token
//! - Periodic reporting: log lines plus an optional CSV report history
//!
//! # CLI Usage
//!
//! ```bash
//! pg-temp-stress --host 127.0.0.1 --port 5432 --dbname testdb \
//!   --user postgres --password secret \
//!   --max-sessions 50 --test-duration 120 --rows-per-table 5000 \
//!   --mean-delay 0.1 --csv-report report.csv
//! ```

pub mod config;
pub mod error;
pub mod monitor;
pub mod orchestrator;
pub mod pacing;
pub mod provider;
pub mod report;
pub mod session;
pub mod stats;
pub mod testing;

pub use config::{ConnectOpts, RunConfig};
pub use error::{ProviderError, ReportError};
pub use orchestrator::{Orchestrator, RunState, RunSummary, TestWindow};
pub use provider::{PostgresProvider, ProviderConnection, ResourceProvider};
pub use report::{CsvReportSink, NullReportSink, ReportRow, ReportSink};
pub use stats::{Stats, StatsSnapshot};
