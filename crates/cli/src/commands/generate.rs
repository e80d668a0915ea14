//! `appraisal generate` - pipeline over files already in the input directory

use super::{print_report, record_store, run_pipeline, Outcome};
use anyhow::{Context, Result};
use domain::{RecordStore, Settings};
use tracing::info;

pub async fn execute(settings: &Settings) -> Result<Outcome> {
    let store = record_store(settings);
    let snapshot = store
        .load_snapshot()
        .await
        .with_context(|| format!("loading records from {}", settings.input_dir.display()))?;
    info!(records = snapshot.record_count(), "Loaded appraisal records");

    let report = run_pipeline(settings, store, &snapshot).await?;
    Ok(print_report(&report, settings))
}
