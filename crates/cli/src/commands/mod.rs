//! Subcommands and the settings/wiring they share

pub mod extract;
pub mod generate;
pub mod run;

use crate::progress;
use anyhow::{bail, Context, Result};
use application::{
    CommentFinalizer, CommentGenerator, OutputWriter, Pipeline, RunReport,
};
use clap::Args;
use console::style;
use domain::{AppraisalSnapshot, Credentials, Session, Settings};
use infrastructure::{ConfigSource, HttpPortal, SessionStore, SettingsLoader, YamlRecordStore};
use llm::LlmClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const DEFAULT_OUTPUT_FILE: &str = "final_comments.yaml";

/// How a run ended when no fatal error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    RecordFailures,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Configuration file (toml, yaml or json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding goals.yaml, attributes.yaml and the context files
    #[arg(long, global = true)]
    pub input_dir: Option<PathBuf>,

    /// Output file for the finalized comments
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,

    /// Model identifier sent to the inference endpoint
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Inference endpoint URL
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Skip the proofreading call
    #[arg(long, global = true)]
    pub no_proofread: bool,

    /// More logging (-v info, -vv debug); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Debug, Args)]
pub struct PortalArgs {
    /// Portal user; falls back to APPRAISAL_USERNAME
    #[arg(long)]
    pub username: Option<String>,

    /// Portal automation bridge URL
    #[arg(long)]
    pub portal_url: Option<String>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub portal: PortalArgs,

    /// Generate and write the comments but do not fill them back
    #[arg(long)]
    pub no_submit: bool,
}

/// Defaults, config file and environment, then command line flags
pub async fn resolve_settings(args: &GlobalArgs) -> Result<Settings> {
    let mut loader = SettingsLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_path(path.clone());
    }
    let (mut settings, source) = loader.load().await?;
    match &source {
        ConfigSource::File(path) => info!("Using configuration from {}", path.display()),
        ConfigSource::Default => info!("No configuration file found, using defaults"),
    }

    if let Some(model) = &args.model {
        settings.model = model.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        settings.endpoint = endpoint.clone();
    }
    if let Some(input_dir) = &args.input_dir {
        settings.input_dir = input_dir.clone();
        // Keep the output next to the inputs unless told otherwise
        if args.output.is_none() {
            settings.output_path = input_dir.join(DEFAULT_OUTPUT_FILE);
        }
    }
    if let Some(output) = &args.output {
        settings.output_path = output.clone();
    }
    if args.no_proofread {
        settings.proofread = false;
    }

    settings.validate().context("invalid settings")?;
    Ok(settings)
}

pub(crate) fn record_store(settings: &Settings) -> Arc<YamlRecordStore> {
    Arc::new(YamlRecordStore::new(
        settings.input_dir.clone(),
        settings.output_path.clone(),
    ))
}

/// Build the pipeline and run it over `snapshot` with a progress bar
pub(crate) async fn run_pipeline(
    settings: &Settings,
    store: Arc<YamlRecordStore>,
    snapshot: &AppraisalSnapshot,
) -> Result<RunReport> {
    let client = Arc::new(LlmClient::from_settings(settings).context("creating the model client")?);
    info!(
        "Model {} at {} ({})",
        settings.model,
        settings.endpoint,
        settings.provider.name()
    );

    let mut finalizer = CommentFinalizer::new(settings.max_comment_chars);
    if settings.proofread {
        finalizer = finalizer.with_proofreading(client.clone(), settings.model.clone());
    }

    let bar = progress::records_bar(snapshot.record_count() as u64);
    let tick = bar.clone();
    let pipeline = Pipeline::new(
        CommentGenerator::new(client, settings.model.clone()),
        finalizer,
        OutputWriter::new(store),
    )
    .with_progress(Box::new(move |position, _total, record_id| {
        tick.set_position(position as u64);
        tick.set_message(record_id.to_string());
    }));

    let result = pipeline.run(snapshot).await;
    bar.finish_and_clear();
    Ok(result?)
}

pub(crate) fn portal(settings: &Settings, args: &PortalArgs) -> Result<HttpPortal> {
    let url = args.portal_url.as_deref().unwrap_or(&settings.portal_url);
    HttpPortal::new(url, Duration::from_secs(settings.request_timeout_secs))
        .context("creating the portal client")
}

fn credentials(args: &PortalArgs) -> Result<Credentials> {
    let username = match &args.username {
        Some(username) => username.clone(),
        None => match std::env::var("APPRAISAL_USERNAME") {
            Ok(username) if !username.trim().is_empty() => username,
            _ => bail!("no portal user: pass --username or set APPRAISAL_USERNAME"),
        },
    };
    let credentials = Credentials::new(username.trim());
    Ok(match std::env::var("APPRAISAL_PASSWORD") {
        Ok(password) if !password.is_empty() => credentials.with_password(password),
        _ => credentials,
    })
}

/// Saved session if the portal still accepts it, otherwise a fresh login
pub(crate) async fn session(
    settings: &Settings,
    portal: &HttpPortal,
    args: &PortalArgs,
) -> Result<Session> {
    let credentials = credentials(args)?;
    let spinner = progress::spinner("Connecting to the portal...");
    let result = SessionStore::new(settings.session_path.clone())
        .acquire(portal, &credentials)
        .await;
    spinner.finish_and_clear();
    result.context("logging in to the portal")
}

/// Counts, failures and the output location
pub(crate) fn print_report(report: &RunReport, settings: &Settings) -> Outcome {
    println!(
        "{} {} of {} comments written to {} in {:.1}s",
        style("✓").green().bold(),
        report.succeeded(),
        report.total(),
        style(settings.output_path.display()).cyan(),
        report.elapsed().num_milliseconds() as f64 / 1000.0
    );

    if !report.has_failures() {
        return Outcome::Success;
    }
    println!(
        "{} {} record(s) failed:",
        style("✗").red().bold(),
        report.failed()
    );
    for failure in &report.failures {
        println!("  {} {}", style("-").red(), failure);
    }
    Outcome::RecordFailures
}
