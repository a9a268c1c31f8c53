//! Structured report rows and sinks.

use crate::error::ReportError;
use crate::stats::StatsSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One point-in-time snapshot of aggregate statistics. Immutable once
/// emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Wall-clock time the row was produced.
    pub timestamp: DateTime<Utc>,
    /// Seconds elapsed since test start.
    pub elapsed_s: f64,
    /// Tables created so far.
    pub created: u64,
    /// Tables dropped so far.
    pub dropped: u64,
    /// Errors so far.
    pub errors: u64,
    /// Mean create latency in milliseconds.
    pub avg_create_ms: f64,
    /// Mean drop latency in milliseconds.
    pub avg_drop_ms: f64,
}

impl ReportRow {
    /// Build a row from a snapshot, stamped with the current wall clock.
    pub fn from_snapshot(snapshot: &StatsSnapshot, elapsed_s: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            elapsed_s,
            created: snapshot.created,
            dropped: snapshot.dropped,
            errors: snapshot.errors,
            avg_create_ms: snapshot.avg_create_ms,
            avg_drop_ms: snapshot.avg_drop_ms,
        }
    }
}

/// Destination for report rows.
pub trait ReportSink: Send {
    /// Append one row.
    fn append(&mut self, row: &ReportRow) -> Result<(), ReportError>;

    /// Flush buffered rows to the underlying store.
    fn flush(&mut self) -> Result<(), ReportError>;
}

/// CSV sink with the column layout
/// `timestamp,elapsed_s,created,dropped,errors,avg_create_ms,avg_drop_ms`.
pub struct CsvReportSink {
    writer: csv::Writer<std::fs::File>,
}

impl CsvReportSink {
    /// Create the file and write the header row.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "timestamp",
            "elapsed_s",
            "created",
            "dropped",
            "errors",
            "avg_create_ms",
            "avg_drop_ms",
        ])?;
        writer.flush()?;
        Ok(Self { writer })
    }
}

impl ReportSink for CsvReportSink {
    fn append(&mut self, row: &ReportRow) -> Result<(), ReportError> {
        self.writer.write_record([
            row.timestamp.to_rfc3339(),
            format!("{:.1}", row.elapsed_s),
            row.created.to_string(),
            row.dropped.to_string(),
            row.errors.to_string(),
            format!("{:.2}", row.avg_create_ms),
            format!("{:.2}", row.avg_drop_ms),
        ])?;
        // Flush per row so an interrupted run keeps its history.
        self.writer.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ReportError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Sink used when no report path is configured.
#[derive(Debug, Default)]
pub struct NullReportSink;

impl ReportSink for NullReportSink {
    fn append(&mut self, _row: &ReportRow) -> Result<(), ReportError> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ReportError> {
        Ok(())
    }
}
