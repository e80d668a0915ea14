//! `appraisal run` - login, extract, dump, generate, fill back

use super::{portal, print_report, record_store, run_pipeline, session, Outcome, RunArgs};
use crate::progress;
use anyhow::{Context, Result};
use application::{extract_snapshot, submit_comments};
use console::style;
use domain::{RecordStore, Settings};
use tracing::info;

pub async fn execute(settings: &Settings, args: &RunArgs) -> Result<Outcome> {
    let portal = portal(settings, &args.portal)?;
    let session = session(settings, &portal, &args.portal).await?;

    let spinner = progress::spinner("Extracting goals and attributes...");
    let extracted = extract_snapshot(&portal, &session).await;
    spinner.finish_and_clear();
    let extracted = extracted.context("extracting records from the portal")?;

    let store = record_store(settings);
    store
        .save_snapshot(&extracted)
        .await
        .context("saving extracted records")?;
    // Read back so the associate's own notes are part of the run
    let snapshot = store
        .load_snapshot()
        .await
        .context("reloading extracted records")?;

    let report = run_pipeline(settings, store, &snapshot).await?;
    let outcome = print_report(&report, settings);

    if args.no_submit {
        info!("Skipping fill-back (--no-submit)");
        return Ok(outcome);
    }
    if report.comments.is_empty() {
        info!("Nothing to fill back");
        return Ok(outcome);
    }

    let spinner = progress::spinner("Filling comments back into the portal...");
    let receipt = submit_comments(&portal, &session, &report.comments).await;
    spinner.finish_and_clear();
    let receipt = receipt.context("submitting comments to the portal")?;

    println!(
        "{} portal accepted {} comment(s)",
        style("✓").green().bold(),
        receipt.accepted
    );
    if !receipt.is_complete() {
        println!(
            "{} portal rejected: {}",
            style("✗").red().bold(),
            receipt.rejected.join(", ")
        );
        return Ok(Outcome::RecordFailures);
    }
    Ok(outcome)
}
