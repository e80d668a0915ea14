//! `appraisal extract` - login and dump the portal records, no generation

use super::{portal, record_store, session, Outcome, PortalArgs};
use crate::progress;
use anyhow::{Context, Result};
use application::extract_snapshot;
use console::style;
use domain::{RecordStore, Settings};

pub async fn execute(settings: &Settings, args: &PortalArgs) -> Result<Outcome> {
    let portal = portal(settings, args)?;
    let session = session(settings, &portal, args).await?;

    let spinner = progress::spinner("Extracting goals and attributes...");
    let snapshot = extract_snapshot(&portal, &session).await;
    spinner.finish_and_clear();
    let snapshot = snapshot.context("extracting records from the portal")?;

    record_store(settings)
        .save_snapshot(&snapshot)
        .await
        .context("saving extracted records")?;

    println!(
        "{} {} goals and {} attributes saved to {}",
        style("✓").green().bold(),
        snapshot.goals.len(),
        snapshot.attributes.len(),
        style(settings.input_dir.display()).cyan()
    );
    Ok(Outcome::Success)
}
