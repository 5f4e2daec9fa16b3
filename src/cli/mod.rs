//! Command-line interface for folio-sync.

pub mod args;
mod commands;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::{App, AppError};
use crate::backend::RemoteError;
use crate::collections::CodecError;
use crate::config::{read_config, ConfigError, LogConfig};
use crate::mirror::StorageError;
use crate::repository::RepositoryError;

pub use args::{GlobalArgs, InputSource, OutputSink};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during CLI execution.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument processing error.
    #[error("{0}")]
    Args(#[from] args::ArgsError),

    /// Configuration error.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// App error.
    #[error("{0}")]
    App(#[from] AppError),

    /// Repository error.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Remote error.
    #[error("{0}")]
    Remote(#[from] RemoteError),

    /// Local storage error.
    #[error("{0}")]
    Storage(#[from] StorageError),

    /// Invalid collection value.
    #[error("{0}")]
    Codec(#[from] CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

// =============================================================================
// CLI Definition
// =============================================================================

/// folio - keep portfolio collections in sync with a GitHub repository.
#[derive(Parser, Debug)]
#[command(name = "folio", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Remote repository settings.
    Remote {
        #[command(subcommand)]
        command: commands::remote::RemoteCommand,
    },

    /// Collection reads and saves.
    Collection {
        #[command(subcommand)]
        command: commands::collection::CollectionCommand,
    },

    /// Image uploads.
    Asset {
        #[command(subcommand)]
        command: commands::asset::AssetCommand,
    },
}

// =============================================================================
// CLI Execution
// =============================================================================

impl Cli {
    /// Parse command-line arguments and return the CLI instance.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let config_result = read_config(&self.global.to_config_source())?;
        init_tracing(&config_result.config.log);

        let app = App::from_config(config_result)?;
        for warning in app.warnings() {
            tracing::warn!("{}", warning);
        }

        match self.command {
            Command::Remote { command } => command.run(&app, &self.global).await,
            Command::Collection { command } => command.run(&app, &self.global).await,
            Command::Asset { command } => command.run(&app, &self.global).await,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the config.
fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so command output on stdout stays parseable.
    let result = if log.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("warning: logging not initialized: {}", e);
    }
}

/// Main entry point for the CLI.
pub async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.run().await
}
