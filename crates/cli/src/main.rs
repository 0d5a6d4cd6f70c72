mod commands;
mod metrics;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tileharvest_core::{load_config, load_config_from_env, Config};

use commands::{ClassifyArgs, ExtractArgs};

/// Default configuration file, used when present.
const DEFAULT_CONFIG: &str = "tileharvest.toml";

#[derive(Parser)]
#[command(name = "tileharvest", version, about = "Harvest image tiles from 360° viewer pages")]
struct Cli {
    /// Configuration file (defaults to ./tileharvest.toml when present).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a viewer page, drive it and download every tile it requested.
    Extract(ExtractArgs),
    /// Show how URLs would be classified and named, without a browser.
    Classify(ClassifyArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            1
        }
    };
    std::process::exit(code);
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Command::Extract(args) => commands::extract::run(args, config).await,
        Command::Classify(args) => commands::classify::run(args, &config),
    }
}

fn resolve_config(explicit: Option<&std::path::Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG);
            default.exists().then_some(default)
        }
    };

    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        None => load_config_from_env().context("Failed to load configuration"),
    }
}
