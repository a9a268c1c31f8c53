//! Session worker: one exclusive connection churning ephemeral tables.

use crate::pacing::exponential_delay;
use crate::provider::{ProviderConnection, ResourceProvider};
use crate::stats::Stats;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// Per-session parameters fixed at spawn time.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session identity, used in log lines and table names.
    pub id: usize,
    /// Rows materialized into each temp table.
    pub rows_per_table: u32,
    /// Mean pacing delay between iterations.
    pub mean_delay: Duration,
    /// Read each table back after creating it.
    pub read_back: bool,
}

/// Generate a table name unique to this session and iteration.
fn resource_name(session_id: usize) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("tmp_{}_{}", session_id, &suffix[..8])
}

/// Run one session until the token is cancelled.
///
/// A handshake failure is fatal for this session only: one error is
/// counted and the session terminates without looping. Per-iteration
/// failures are counted and the loop continues. The drop is issued even
/// when the create failed, relying on drop-if-exists semantics so a
/// partially created table cannot leak; such a cleanup drop is not
/// recorded as a dropped table.
pub async fn run_session<P: ResourceProvider>(
    provider: Arc<P>,
    config: SessionConfig,
    stats: Stats,
    token: CancellationToken,
) {
    let mut conn = match provider.connect().await {
        Ok(conn) => conn,
        Err(e) => {
            stats.record_error();
            warn!(session = config.id, "connection failed: {e}");
            return;
        }
    };
    debug!(session = config.id, "session connected");

    while !token.is_cancelled() {
        let table = resource_name(config.id);

        let create_start = Instant::now();
        let created = match conn.create_resource(&table, config.rows_per_table).await {
            Ok(()) => {
                stats.record_create(create_start.elapsed());
                true
            }
            Err(e) => {
                stats.record_error();
                warn!(session = config.id, table = %table, "create failed: {e}");
                false
            }
        };

        if created && config.read_back {
            if let Err(e) = conn.read_resource(&table).await {
                stats.record_error();
                warn!(session = config.id, table = %table, "read failed: {e}");
            }
        }

        let drop_start = Instant::now();
        match conn.drop_resource(&table).await {
            Ok(()) if created => stats.record_drop(drop_start.elapsed()),
            Ok(()) => {}
            Err(e) => {
                stats.record_error();
                warn!(session = config.id, table = %table, "drop failed: {e}");
            }
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(exponential_delay(config.mean_delay)) => {}
        }
    }

    debug!(session = config.id, "session stopped");
}
