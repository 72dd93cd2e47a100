//! Console for the postal-code scraping backend: registers jobs, polls the
//! job list and follows each running job's live progress stream.

mod platform;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use platform::config::{load_config, LogTarget, ViewKind, CONFIG_FILENAME, TOKEN_ENV};

#[derive(Parser)]
#[command(name = "tracker")]
#[command(about = "Follow scraping jobs and their live progress", long_about = None)]
struct Args {
    /// Configuration file (RON)
    #[arg(long, default_value = CONFIG_FILENAME)]
    config: PathBuf,

    /// Backend base url, overrides the configuration file
    #[arg(long)]
    base_url: Option<String>,

    /// Show the aggregate dashboard instead of the registration view
    #[arg(long)]
    dashboard: bool,

    /// Where log lines go
    #[arg(long, value_enum)]
    log: Option<LogTarget>,

    /// Log at debug level
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if args.dashboard {
        config.view = ViewKind::Dashboard;
    }
    if let Some(log) = args.log {
        config.log = log;
    }
    config.apply_token_override(std::env::var(TOKEN_ENV).ok());

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    tracker_logging::initialize(config.log.into(), level);

    platform::run_app(config).await
}
