//! Error types for the stress harness.

use thiserror::Error;

/// Errors surfaced by a resource provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// PostgreSQL connection or query error.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Failure establishing a session's connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// Failure of a create/read/drop operation.
    #[error("operation failed: {0}")]
    Operation(String),
}

/// Errors surfaced by a report sink.
#[derive(Error, Debug)]
pub enum ReportError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
