//! Mock backend and sink infrastructure shared by unit and integration
//! tests.

use crate::error::{ProviderError, ReportError};
use crate::provider::{ProviderConnection, ResourceProvider};
use crate::report::{ReportRow, ReportSink};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Failure injection switches for [`MockProvider`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureMode {
    /// Refuse every connection handshake.
    pub fail_connect: bool,
    /// Fail every create.
    pub fail_create: bool,
    /// Fail every read.
    pub fail_read: bool,
    /// Fail every drop.
    pub fail_drop: bool,
}

/// Operation counters shared between a [`MockProvider`] and its
/// connections.
#[derive(Debug, Default)]
pub struct MockCounters {
    connects: AtomicU64,
    live_connections: AtomicU64,
    creates: AtomicU64,
    reads: AtomicU64,
    drops: AtomicU64,
}

impl MockCounters {
    /// Handshake attempts, including refused ones.
    pub fn connects(&self) -> u64 {
        self.connects.load(Ordering::SeqCst)
    }

    /// Connections currently held by a session. Zero once every session
    /// has released its handle.
    pub fn live_connections(&self) -> u64 {
        self.live_connections.load(Ordering::SeqCst)
    }

    /// Successful creates.
    pub fn creates(&self) -> u64 {
        self.creates.load(Ordering::SeqCst)
    }

    /// Successful reads.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Successful drops.
    pub fn drops(&self) -> u64 {
        self.drops.load(Ordering::SeqCst)
    }
}

/// In-memory provider with scriptable failures and per-operation latency.
#[derive(Clone, Default)]
pub struct MockProvider {
    failures: FailureMode,
    op_latency: Duration,
    counters: Arc<MockCounters>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject the given failure modes into every connection.
    pub fn with_failures(mut self, failures: FailureMode) -> Self {
        self.failures = failures;
        self
    }

    /// Add an artificial delay to every backend call.
    pub fn with_op_latency(mut self, latency: Duration) -> Self {
        self.op_latency = latency;
        self
    }

    /// Shared counters for assertions after a run.
    pub fn counters(&self) -> Arc<MockCounters> {
        self.counters.clone()
    }
}

#[async_trait]
impl ResourceProvider for MockProvider {
    type Conn = MockConnection;

    async fn connect(&self) -> Result<MockConnection, ProviderError> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        if self.failures.fail_connect {
            return Err(ProviderError::Connection("mock connect refused".into()));
        }
        self.counters.live_connections.fetch_add(1, Ordering::SeqCst);
        Ok(MockConnection {
            failures: self.failures,
            op_latency: self.op_latency,
            counters: self.counters.clone(),
        })
    }
}

/// Connection handle whose `Drop` decrements the live-connection gauge,
/// letting tests assert exactly-once release on every session exit path.
pub struct MockConnection {
    failures: FailureMode,
    op_latency: Duration,
    counters: Arc<MockCounters>,
}

impl MockConnection {
    async fn pause(&self) {
        if !self.op_latency.is_zero() {
            tokio::time::sleep(self.op_latency).await;
        }
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.counters.live_connections.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProviderConnection for MockConnection {
    async fn create_resource(&mut self, _name: &str, _size_hint: u32) -> Result<(), ProviderError> {
        self.pause().await;
        if self.failures.fail_create {
            return Err(ProviderError::Operation("mock create failed".into()));
        }
        self.counters.creates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn read_resource(&mut self, _name: &str) -> Result<(), ProviderError> {
        self.pause().await;
        if self.failures.fail_read {
            return Err(ProviderError::Operation("mock read failed".into()));
        }
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn drop_resource(&mut self, _name: &str) -> Result<(), ProviderError> {
        self.pause().await;
        if self.failures.fail_drop {
            return Err(ProviderError::Operation("mock drop failed".into()));
        }
        self.counters.drops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Sink capturing rows in memory; clone the handle before passing it in to
/// inspect the rows afterwards.
#[derive(Clone, Default)]
pub struct MemoryReportSink {
    rows: Arc<Mutex<Vec<ReportRow>>>,
}

impl MemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the rows appended so far.
    pub fn rows(&self) -> Vec<ReportRow> {
        self.rows.lock().unwrap().clone()
    }
}

impl ReportSink for MemoryReportSink {
    fn append(&mut self, row: &ReportRow) -> Result<(), ReportError> {
        self.rows.lock().unwrap().push(row.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ReportError> {
        Ok(())
    }
}
