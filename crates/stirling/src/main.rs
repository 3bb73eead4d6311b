//! Stirling - asset tracker telemetry feed
//!
//! Single binary that provides:
//! - `/api/fixes`, the normalized fix feed over the telemetry table
//! - the static map dashboard
//! - a one-shot `fetch` for scripting

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use stirling_common::config::{LogFormat, LoggingConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod server;

use server::StirlingServer;

#[derive(Parser)]
#[command(name = "stirling")]
#[command(author, version, about = "Stirling - asset tracker telemetry feed", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path (TOML, YAML or JSON)
    #[arg(short, long, global = true, default_value = "stirling.toml", env = "STIRLING_CONFIG")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,

    /// Fetch fixes once and print them as JSON
    Fetch {
        /// Only fixes at or after this RowKey
        #[arg(long, conflicts_with = "before")]
        since: Option<String>,

        /// Only fixes at or before this RowKey
        #[arg(long)]
        before: Option<String>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("Stirling version {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = config::load(&cli.config).await?;
    init_tracing(&config.logging)?;

    match cli.command {
        Commands::Serve => {
            info!("Starting Stirling server...");

            let server = StirlingServer::new(&config)?;

            // Handle shutdown gracefully
            let shutdown = async {
                tokio::signal::ctrl_c().await.ok();
                info!("Shutdown signal received");
            };

            server.run(shutdown).await?;
        }

        Commands::Fetch { since, before, pretty } => {
            cli::fetch(&config, since, before, pretty).await?;
        }

        Commands::Version => {}
    }

    Ok(())
}

/// `RUST_LOG` wins over the configured level. Logs go to stderr so `fetch`
/// output stays clean.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging.level))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }

    Ok(())
}
