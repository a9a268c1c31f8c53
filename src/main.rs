//! Command-line interface for pg-temp-stress
//!
//! # Usage Examples
//!
//! ```bash
//! # One minute, ten sessions, defaults throughout
//! pg-temp-stress --host 127.0.0.1 --dbname testdb --user postgres --password secret
//!
//! # Heavier run with a CSV report of the accumulated metrics history
//! pg-temp-stress --host 127.0.0.1 --port 5432 --dbname testdb \
//!   --user postgres --password secret \
//!   --max-sessions 50 --test-duration 120 --rows-per-table 5000 \
//!   --mean-delay 0.1 --select-after-create --csv-report report.csv
//! ```

use anyhow::Result;
use clap::Parser;
use pg_temp_stress::config::{ConnectOpts, RunConfig};
use pg_temp_stress::orchestrator::Orchestrator;
use pg_temp_stress::provider::PostgresProvider;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pg-temp-stress")]
#[command(about = "Async stress test for PostgreSQL temp tables")]
struct Cli {
    /// PostgreSQL host
    #[arg(long, env = "PGHOST")]
    host: String,

    /// PostgreSQL port
    #[arg(long, default_value = "5432", env = "PGPORT")]
    port: u16,

    /// Database name
    #[arg(long, env = "PGDATABASE")]
    dbname: String,

    /// Database user
    #[arg(long, env = "PGUSER")]
    user: String,

    /// Database password
    #[arg(long, env = "PGPASSWORD")]
    password: String,

    /// Maximum number of concurrent sessions
    #[arg(long, default_value = "10")]
    max_sessions: usize,

    /// Seconds to wait between session starts during ramp-up
    #[arg(long, default_value = "0.5")]
    ramp_interval: f64,

    /// Total test duration in seconds
    #[arg(long, default_value = "60")]
    test_duration: u64,

    /// Rows generated into each temp table
    #[arg(long, default_value = "1000")]
    rows_per_table: u32,

    /// Mean delay in seconds between a session's iterations
    #[arg(long, default_value = "0.2")]
    mean_delay: f64,

    /// Run a SELECT count(*) against each table after creating it
    #[arg(long)]
    select_after_create: bool,

    /// Seconds between monitor log lines and report rows
    #[arg(long, default_value = "5")]
    log_interval: u64,

    /// CSV file to write the metrics history to
    #[arg(long)]
    csv_report: Option<PathBuf>,
}

impl Cli {
    fn connect_opts(&self) -> ConnectOpts {
        ConnectOpts {
            host: self.host.clone(),
            port: self.port,
            dbname: self.dbname.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
        }
    }

    fn run_config(&self) -> RunConfig {
        RunConfig {
            max_sessions: self.max_sessions,
            ramp_interval: Duration::from_secs_f64(self.ramp_interval),
            test_duration: Duration::from_secs(self.test_duration),
            rows_per_table: self.rows_per_table,
            mean_delay: Duration::from_secs_f64(self.mean_delay),
            read_back: self.select_after_create,
            log_interval: Duration::from_secs(self.log_interval),
            report_path: self.csv_report.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pg_temp_stress=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(
        cli.ramp_interval >= 0.0,
        "ramp-interval must be non-negative"
    );
    anyhow::ensure!(cli.mean_delay >= 0.0, "mean-delay must be non-negative");

    let config = cli.run_config();
    config.validate()?;

    let provider = PostgresProvider::new(cli.connect_opts().connection_string());
    let mut orchestrator = Orchestrator::new(provider, config);

    let token = orchestrator.cancellation_token();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C signal handler");
        info!("interrupt received, stopping");
        token.cancel();
    });

    let summary = orchestrator.run().await?;

    info!(
        "run complete: {} sessions, {:.1}s elapsed",
        summary.sessions_spawned,
        summary.elapsed.as_secs_f64()
    );
    if let Some(path) = &cli.csv_report {
        info!("report saved to {}", path.display());
    }

    Ok(())
}
