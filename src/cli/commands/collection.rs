//! Collection subcommands.

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::App;
use crate::cli::{GlobalArgs, InputSource, OutputSink, Result};
use crate::collections::CollectionId;
use crate::repository::{CollectionStatus, SaveReport, SyncStatus};

// =============================================================================
// Collection Subcommands
// =============================================================================

/// Collection subcommands.
#[derive(Subcommand, Debug)]
pub enum CollectionCommand {
    /// Print a collection as JSON.
    Get(GetArgs),

    /// Replace a collection with a JSON value.
    Put(PutArgs),

    /// Push every collection's local copy to the remote.
    #[command(name = "sync-all")]
    SyncAll(SyncAllArgs),

    /// Compare the local and remote copies of a collection.
    Status(StatusArgs),
}

impl CollectionCommand {
    /// Run the collection subcommand.
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        match self {
            CollectionCommand::Get(args) => args.run(app, global).await,
            CollectionCommand::Put(args) => args.run(app, global).await,
            CollectionCommand::SyncAll(args) => args.run(app, global).await,
            CollectionCommand::Status(args) => args.run(app, global).await,
        }
    }
}

// =============================================================================
// Report formatting
// =============================================================================

#[derive(Debug, Serialize)]
struct SaveOutput {
    collection: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<&SaveReport> for SaveOutput {
    fn from(report: &SaveReport) -> Self {
        let (status, revision, error) = match &report.status {
            SyncStatus::LocalOnly => ("local-only", None, None),
            SyncStatus::Synced { revision } => ("synced", Some(revision.clone()), None),
            SyncStatus::Failed { error } => ("failed", None, Some(error.to_string())),
        };
        SaveOutput {
            collection: report.collection.to_string(),
            status,
            revision,
            error,
        }
    }
}

impl SaveOutput {
    fn line(&self) -> String {
        match (&self.revision, &self.error) {
            (Some(revision), _) => format!("{}: {} ({})", self.collection, self.status, revision),
            (_, Some(error)) => format!("{}: {}: {}", self.collection, self.status, error),
            _ => format!("{}: {}", self.collection, self.status),
        }
    }
}

// =============================================================================
// Get
// =============================================================================

/// Arguments for the get command.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Collection name: photos, notes, categories, folders or profile.
    pub name: CollectionId,

    #[command(flatten)]
    pub output: OutputSink,
}

impl GetArgs {
    pub async fn run(self, app: &App, _global: &GlobalArgs) -> Result<()> {
        let value = app.repository().get_json(self.name).await;
        self.output.write_json(&value).await?;
        Ok(())
    }
}

// =============================================================================
// Put
// =============================================================================

/// Arguments for the put command.
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Collection name.
    pub name: CollectionId,

    /// JSON value. Read from --input-file or stdin when omitted.
    pub value: Option<String>,

    #[command(flatten)]
    pub input: InputSource,

    #[command(flatten)]
    pub output: OutputSink,
}

impl PutArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let value = self.input.read_json(self.value.as_deref()).await?;
        let report = app.repository().save_json(self.name, value).await?;
        let output = SaveOutput::from(&report);
        if global.json {
            self.output.write_json(&output).await?;
        } else {
            self.output.write_str(&output.line()).await?;
        }
        Ok(())
    }
}

// =============================================================================
// SyncAll
// =============================================================================

/// Arguments for the sync-all command.
#[derive(Args, Debug)]
pub struct SyncAllArgs {
    #[command(flatten)]
    pub output: OutputSink,
}

impl SyncAllArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let reports = app.repository().sync_all().await?;
        let outputs: Vec<SaveOutput> = reports.iter().map(SaveOutput::from).collect();
        if global.json {
            self.output.write_json(&outputs).await?;
        } else if outputs.is_empty() {
            self.output
                .write_str("remote not configured; nothing to sync")
                .await?;
        } else {
            let lines: Vec<String> = outputs.iter().map(SaveOutput::line).collect();
            self.output.write_str(&lines.join("\n")).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Serialize)]
struct StatusOutput {
    collection: String,
    local: bool,
    remote_revision: Option<String>,
    in_sync: Option<bool>,
}

impl From<CollectionStatus> for StatusOutput {
    fn from(status: CollectionStatus) -> Self {
        StatusOutput {
            collection: status.collection.to_string(),
            local: status.local,
            remote_revision: status.remote_revision,
            in_sync: status.in_sync,
        }
    }
}

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Collection name.
    pub name: CollectionId,

    #[command(flatten)]
    pub output: OutputSink,
}

impl StatusArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let status = StatusOutput::from(app.repository().status(self.name).await);
        if global.json {
            return Ok(self.output.write_json(&status).await?);
        }

        let remote = status.remote_revision.as_deref().unwrap_or("absent");
        let sync = match status.in_sync {
            Some(true) => "in sync",
            Some(false) => "differs",
            None => "unknown",
        };
        self.output
            .write_str(&format!(
                "{}: local {}, remote {}, {}",
                status.collection,
                if status.local { "present" } else { "absent" },
                remote,
                sync
            ))
            .await?;
        Ok(())
    }
}
