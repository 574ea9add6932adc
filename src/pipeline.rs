use std::{path::PathBuf, sync::Arc, time::{Duration, Instant}};

use anyhow::{Context, Result};
use tokio::{runtime::Runtime, time};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    aggregate::{aggregate_all, scan_all},
    artifact_store::{delete_file_if_exists, staging_path, write_json_atomic},
    categories::{CategoryLookup, ReferenceTables},
    config::Config,
    dedupe::dedupe,
    error::StatsError,
    report::{build_report, log_summary},
    store::RecordStore,
};

/// How long runtime shutdown waits on blocking scans still in flight.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub output_path: PathBuf,
    pub total_resources: usize,
    pub total_records: u64,
    pub size_bytes: u64,
}

/// Drives one run on `runtime` and then shuts the runtime down.
///
/// A scan that outlives the deadline is stuck in the blocking pool, so the
/// runtime is not dropped normally: shutdown waits at most
/// [`SHUTDOWN_GRACE`] and abandons whatever is still running.
pub fn run_on<S: RecordStore>(runtime: Runtime, config: &Config, store: Arc<S>) -> Result<RunSummary> {
    let outcome = runtime.block_on(run_with_store(config, store));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    outcome
}

/// Runs every stage against `store` under the job deadline. Nothing is
/// written unless all stages succeed.
pub async fn run_with_store<S: RecordStore>(config: &Config, store: Arc<S>) -> Result<RunSummary> {
    let run_id = Uuid::new_v4().to_string();
    match time::timeout(config.job_timeout, run_stages(config, store, &run_id)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!(
                run_id = %run_id,
                timeout_secs = config.job_timeout.as_secs_f64(),
                "Stats run exceeded its deadline"
            );
            delete_file_if_exists(&staging_path(&config.output_path, &run_id)).await?;
            Err(StatsError::Timeout(config.job_timeout).into())
        }
    }
}

async fn run_stages<S: RecordStore>(
    config: &Config,
    store: Arc<S>,
    run_id: &str,
) -> Result<RunSummary> {
    let started = Instant::now();
    info!(
        run_id = %run_id,
        db = %config.db_path.display(),
        output = %config.output_path.display(),
        timeout_secs = config.job_timeout.as_secs(),
        "Stats run started"
    );

    let tables = ReferenceTables::load(
        &config.maintenance_table,
        &config.license_table,
        config.annotation_groups.as_deref(),
    )
    .await?;
    let lookup = CategoryLookup::new(&tables);
    info!(
        run_id = %run_id,
        maintenance_groups = tables.maintenance.len(),
        license_groups = tables.license.len(),
        annotation_groups = lookup.annotation_categories().len(),
        "Reference tables loaded"
    );

    let snapshot = scan_all(store).await?;
    info!(run_id = %run_id, rows = snapshot.row_count(), "Record tables scanned");

    let raw: Vec<_> = aggregate_all(&snapshot)
        .into_iter()
        .map(|record| lookup.classify(record))
        .collect();
    info!(run_id = %run_id, records = raw.len(), "Per-source statistics aggregated");

    let resources = dedupe(raw, &lookup);
    info!(run_id = %run_id, resources = resources.len(), "Resources deduplicated");

    let stats = build_report(&snapshot, resources, config.weight_mode, run_id);
    info!(
        run_id = %run_id,
        overlap_rows = stats.resource_overlap.len(),
        literature_rows = stats.plot_data.literature_refs_by_database_and_type.len(),
        treemap_leaves = stats.plot_data.treemap.leaf_count(),
        "Report assembled"
    );

    let size_bytes = write_json_atomic(&config.output_path, run_id, &stats)
        .await
        .with_context(|| format!("Failed to write {}", config.output_path.display()))?;

    log_summary(&stats);
    info!(
        run_id = %run_id,
        output = %config.output_path.display(),
        size_bytes,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Stats run completed"
    );

    Ok(RunSummary {
        run_id: run_id.to_string(),
        output_path: config.output_path.clone(),
        total_resources: stats.metadata.total_resources,
        total_records: stats.metadata.total_records,
        size_bytes,
    })
}
