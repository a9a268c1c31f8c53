//! The backend seam: connection handshake plus create/read/drop.

use crate::error::ProviderError;
use async_trait::async_trait;
use tokio_postgres::NoTls;
use tracing::{debug, error};

/// A backend capable of opening independent exclusive sessions.
#[async_trait]
pub trait ResourceProvider: Send + Sync + 'static {
    /// Per-session connection handle.
    type Conn: ProviderConnection;

    /// Open one exclusive connection.
    async fn connect(&self) -> Result<Self::Conn, ProviderError>;
}

/// One session's exclusive connection.
///
/// Dropping the handle releases the underlying connection, so every session
/// exit path releases it exactly once.
#[async_trait]
pub trait ProviderConnection: Send + 'static {
    /// Create the named ephemeral resource, sized by `size_hint` rows.
    async fn create_resource(&mut self, name: &str, size_hint: u32) -> Result<(), ProviderError>;

    /// Read the named resource back.
    async fn read_resource(&mut self, name: &str) -> Result<(), ProviderError>;

    /// Drop the named resource. Must succeed when it no longer exists.
    async fn drop_resource(&mut self, name: &str) -> Result<(), ProviderError>;
}

/// Generate the DDL that materializes `size_hint` rows into a temp table.
fn create_table_sql(name: &str) -> String {
    format!(
        "CREATE TEMP TABLE {name} AS SELECT i AS n, md5(i::text) AS v FROM generate_series(1, $1) i"
    )
}

fn count_sql(name: &str) -> String {
    format!("SELECT count(*) FROM {name}")
}

fn drop_table_sql(name: &str) -> String {
    format!("DROP TABLE IF EXISTS {name}")
}

/// PostgreSQL provider; every session gets its own client and connection
/// driver task.
#[derive(Debug, Clone)]
pub struct PostgresProvider {
    connection_string: String,
}

impl PostgresProvider {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
        }
    }
}

#[async_trait]
impl ResourceProvider for PostgresProvider {
    type Conn = PostgresConnection;

    async fn connect(&self) -> Result<Self::Conn, ProviderError> {
        let (client, connection) = tokio_postgres::connect(&self.connection_string, NoTls).await?;

        // Drive the connection until the client is dropped.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {e}");
            }
        });

        // Test connection
        client.simple_query("SELECT 1").await?;
        debug!("PostgreSQL session established");

        Ok(PostgresConnection { client })
    }
}

/// One session's PostgreSQL client.
///
/// Temp tables are scoped to their session, so names cannot clash across
/// connections even before the random suffix.
pub struct PostgresConnection {
    client: tokio_postgres::Client,
}

#[async_trait]
impl ProviderConnection for PostgresConnection {
    async fn create_resource(&mut self, name: &str, size_hint: u32) -> Result<(), ProviderError> {
        let rows = size_hint as i32;
        self.client
            .execute(&create_table_sql(name), &[&rows])
            .await?;
        Ok(())
    }

    async fn read_resource(&mut self, name: &str) -> Result<(), ProviderError> {
        self.client.query_one(&count_sql(name), &[]).await?;
        Ok(())
    }

    async fn drop_resource(&mut self, name: &str) -> Result<(), ProviderError> {
        self.client.execute(&drop_table_sql(name), &[]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_sql() {
        let sql = create_table_sql("tmp_1_abcd1234");
        assert!(sql.starts_with("CREATE TEMP TABLE tmp_1_abcd1234 AS SELECT"));
        assert!(sql.contains("generate_series(1, $1)"));
    }

    #[test]
    fn test_drop_is_idempotent_sql() {
        assert_eq!(
            drop_table_sql("tmp_2_00ff00ff"),
            "DROP TABLE IF EXISTS tmp_2_00ff00ff"
        );
    }

    #[test]
    fn test_count_sql() {
        assert_eq!(count_sql("tmp_3_cafebabe"), "SELECT count(*) FROM tmp_3_cafebabe");
    }
}
