//! Run configuration.

use std::path::PathBuf;
use std::time::Duration;

/// PostgreSQL connection options for the target database.
#[derive(Debug, Clone)]
pub struct ConnectOpts {
    /// Host name or address.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Database name.
    pub dbname: String,
    /// User.
    pub user: String,
    /// Password.
    pub password: String,
}

impl ConnectOpts {
    /// Render a `tokio-postgres` connection string.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            self.host, self.port, self.user, self.password, self.dbname
        )
    }
}

/// Tunables for one stress run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Maximum number of concurrent sessions.
    pub max_sessions: usize,
    /// Pause between session starts during ramp-up.
    pub ramp_interval: Duration,
    /// Total time budget for the run.
    pub test_duration: Duration,
    /// Rows materialized into each temp table.
    pub rows_per_table: u32,
    /// Mean of the exponential pacing delay between a session's iterations.
    pub mean_delay: Duration,
    /// Read each table back with a `SELECT count(*)` after creating it.
    pub read_back: bool,
    /// Cadence of monitor log lines and report rows.
    pub log_interval: Duration,
    /// Structured CSV report destination, if any.
    pub report_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_sessions: 10,
            ramp_interval: Duration::from_millis(500),
            test_duration: Duration::from_secs(60),
            rows_per_table: 1000,
            mean_delay: Duration::from_millis(200),
            read_back: false,
            log_interval: Duration::from_secs(5),
            report_path: None,
        }
    }
}

impl RunConfig {
    /// Check the configuration for values the run cannot work with.
    ///
    /// A zero `mean_delay` is accepted; pacing floors it at use site.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.max_sessions >= 1, "max_sessions must be at least 1");
        anyhow::ensure!(
            !self.test_duration.is_zero(),
            "test_duration must be positive"
        );
        anyhow::ensure!(
            !self.log_interval.is_zero(),
            "log_interval must be positive"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_string() {
        let opts = ConnectOpts {
            host: "127.0.0.1".to_string(),
            port: 5432,
            dbname: "testdb".to_string(),
            user: "postgres".to_string(),
            password: "secret".to_string(),
        };

        assert_eq!(
            opts.connection_string(),
            "host=127.0.0.1 port=5432 user=postgres password=secret dbname=testdb"
        );
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_sessions_rejected() {
        let config = RunConfig {
            max_sessions: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_duration_rejected() {
        let config = RunConfig {
            test_duration: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_mean_delay_accepted() {
        let config = RunConfig {
            mean_delay: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
