//! Remote repository subcommands.

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::App;
use crate::cli::{GlobalArgs, OutputSink, Result};
use crate::store::RemoteConfig;

// =============================================================================
// Remote Subcommands
// =============================================================================

/// Remote repository subcommands.
#[derive(Subcommand, Debug)]
pub enum RemoteCommand {
    /// Store the repository coordinates and access token.
    Configure(ConfigureArgs),

    /// Show the stored settings. The token is never printed.
    Show(ShowArgs),

    /// Forget the stored settings and work locally only.
    Clear,

    /// Verify that the repository is reachable with the stored token.
    Check(CheckArgs),
}

impl RemoteCommand {
    /// Run the remote subcommand.
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        match self {
            RemoteCommand::Configure(args) => args.run(app, global).await,
            RemoteCommand::Show(args) => args.run(app, global).await,
            RemoteCommand::Clear => {
                app.store().clear_config()?;
                Ok(())
            }
            RemoteCommand::Check(args) => args.run(app, global).await,
        }
    }
}

// =============================================================================
// Configure
// =============================================================================

/// Arguments for the configure command.
#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// Repository owner (user or organization).
    #[arg(long)]
    pub owner: String,

    /// Repository name.
    #[arg(long)]
    pub repo: String,

    /// Access token with write permission on the repository.
    #[arg(long)]
    pub token: String,

    /// Branch to read and write. Defaults to main.
    #[arg(long)]
    pub branch: Option<String>,
}

impl ConfigureArgs {
    pub async fn run(self, app: &App, _global: &GlobalArgs) -> Result<()> {
        let mut config = RemoteConfig::new(self.owner, self.repo, self.token);
        if let Some(branch) = self.branch {
            config = config.with_branch(branch);
        }
        app.store().configure(config)?;
        app.repository().invalidate_all();
        Ok(())
    }
}

// =============================================================================
// Show
// =============================================================================

#[derive(Debug, Serialize)]
struct RemoteSummary {
    configured: bool,
    owner: String,
    repo: String,
    branch: String,
    token_set: bool,
    pages_url: Option<String>,
}

/// Arguments for the show command.
#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub output: OutputSink,
}

impl ShowArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let config = app.store().config();
        let summary = RemoteSummary {
            configured: config.is_configured(),
            token_set: !config.credential.is_empty(),
            pages_url: app.store().pages_url(),
            owner: config.owner,
            repo: config.repo,
            branch: config.branch,
        };

        if global.json {
            self.output.write_json(&summary).await?;
        } else if !summary.configured {
            self.output.write_str("not configured").await?;
        } else {
            let mut text = format!(
                "repository: {}/{}\nbranch: {}",
                summary.owner, summary.repo, summary.branch
            );
            if let Some(url) = &summary.pages_url {
                text.push_str(&format!("\npages: {}", url));
            }
            self.output.write_str(&text).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Check
// =============================================================================

/// Arguments for the check command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub output: OutputSink,
}

impl CheckArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let info = app.store().check_connection().await?;
        if global.json {
            self.output.write_json(&info).await?;
        } else {
            let visibility = if info.private { "private" } else { "public" };
            self.output
                .write_str(&format!("ok: {} ({})", info.full_name, visibility))
                .await?;
        }
        Ok(())
    }
}
