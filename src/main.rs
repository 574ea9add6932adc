mod aggregate;
mod artifact_store;
mod categories;
mod config;
mod dedupe;
mod delimited;
mod error;
mod hierarchy;
mod models;
mod normalize;
mod pipeline;
mod report;
mod store;

use std::sync::Arc;

use anyhow::{Context, Result};
use config::Config;
use store::SqliteStore;
use tracing::{error, info};

fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "omnipath_db_stats=info".into()),
        )
        .init();

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let config = Config::from_env();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;
    let store = Arc::new(SqliteStore::new(&config.db_path));

    match pipeline::run_on(runtime, &config, store) {
        Ok(summary) => {
            info!(
                run_id = %summary.run_id,
                output = %summary.output_path.display(),
                resources = summary.total_resources,
                records = summary.total_records,
                "Unified database statistics written"
            );
            Ok(())
        }
        Err(err) => {
            error!("Stats run failed: {err:#}");
            Err(err)
        }
    }
}
