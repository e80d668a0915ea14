use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod progress;

use commands::{GlobalArgs, Outcome, RunArgs};

#[derive(Parser)]
#[command(name = "appraisal")]
#[command(about = "Draft appraisal comments for goals and attributes with a language model")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate comments from already extracted files
    Generate,
    /// Log in, extract, generate and fill the comments back into the portal
    Run(RunArgs),
    /// Log in and dump the portal records to the input directory
    Extract(commands::PortalArgs),
}

fn init_logging(verbose: u8, json: bool) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

async fn dispatch(cli: Cli) -> Result<Outcome> {
    let settings = commands::resolve_settings(&cli.global).await?;
    match cli.command {
        Commands::Generate => commands::generate::execute(&settings).await,
        Commands::Run(args) => commands::run::execute(&settings, &args).await,
        Commands::Extract(args) => commands::extract::execute(&settings, &args).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.global.verbose, cli.global.json_logs);

    match dispatch(cli).await {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::RecordFailures) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{} {:#}", style("error:").red().bold(), e);
            ExitCode::from(2)
        }
    }
}
