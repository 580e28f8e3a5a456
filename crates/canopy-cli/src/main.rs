// crates/canopy-cli/src/main.rs
//
// CLI entrypoint for the Canopy governance engine.
//
// Loads JSON fixtures into in-memory stores, runs them through the engine,
// and prints the resulting read models as tables or JSON.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::access::AccessCmd;
use commands::compose::ComposeCmd;
use commands::stewardship::StewardshipCmd;
use commands::trust::TrustCmd;
use commands::Context;
use output::OutputFormat;

use canopy_engine::EngineConfig;

/// Canopy: trust, reach, and stewardship governance.
#[derive(Parser, Debug)]
#[command(
    name = "canopy",
    version = "0.1.0",
    about = "Evaluate content trust, access, stewardship, and feedback profiles"
)]
struct Cli {
    /// Path to the TOML configuration file (default: ~/.canopy/config.toml).
    #[arg(long, global = true)]
    config: Option<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve a content item's trust profile and effective reach.
    Trust(TrustCmd),

    /// Check a requester against an access requirement.
    Access(AccessCmd),

    /// Show a content item's stewardship allocations.
    Stewardship(StewardshipCmd),

    /// Compose feedback profiles along a path.
    Compose(ComposeCmd),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(EngineConfig::default_path);
    let loaded = EngineConfig::load(&config_path);
    let log_level = loaded
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    let config = match loaded {
        Ok(cfg) => {
            tracing::debug!("Loaded configuration from {}", config_path);
            cfg
        }
        Err(e) => {
            // An explicitly requested file that fails to load is worth a warning;
            // a missing default file is not.
            if cli.config.is_some() {
                tracing::warn!("Could not load config from {}: {}. Using defaults.", config_path, e);
            } else {
                tracing::debug!("No config at {}: {}. Using defaults.", config_path, e);
            }
            EngineConfig::default()
        }
    };

    let ctx = Context {
        config,
        format: cli.format,
    };

    match &cli.command {
        Commands::Trust(cmd) => commands::trust::run(&ctx, cmd)?,
        Commands::Access(cmd) => commands::access::run(&ctx, cmd)?,
        Commands::Stewardship(cmd) => commands::stewardship::run(&ctx, cmd)?,
        Commands::Compose(cmd) => commands::compose::run(&ctx, cmd)?,
    }

    Ok(())
}
