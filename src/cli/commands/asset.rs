//! Asset subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::App;
use crate::cli::{CliError, GlobalArgs, OutputSink, Result};
use crate::repository::{AssetPath, AssetVariant};

// =============================================================================
// Asset Subcommands
// =============================================================================

/// Asset subcommands.
#[derive(Subcommand, Debug)]
pub enum AssetCommand {
    /// Upload an image file.
    Upload(UploadArgs),

    /// Delete a stored asset by its repository path.
    Delete(DeleteArgs),

    /// Print the public URL of a stored asset.
    Url(UrlArgs),
}

impl AssetCommand {
    /// Run the asset subcommand.
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        match self {
            AssetCommand::Upload(args) => args.run(app, global).await,
            AssetCommand::Delete(args) => args.run(app, global).await,
            AssetCommand::Url(args) => args.run(app, global).await,
        }
    }
}

// =============================================================================
// Upload
// =============================================================================

#[derive(Debug, Serialize)]
struct UploadOutput {
    path: String,
    revision: String,
    url: Option<String>,
}

/// Arguments for the upload command.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local image file.
    pub file: PathBuf,

    /// Category the photo belongs to.
    #[arg(long)]
    pub category: String,

    /// Folder within the category.
    #[arg(long)]
    pub folder: String,

    /// Which rendition this file is: original or watermarked.
    #[arg(long, default_value = "original")]
    pub variant: AssetVariant,

    /// Position of the file within its upload batch.
    #[arg(long, default_value_t = 0)]
    pub index: u32,

    /// Stored file name. Defaults to the local file name.
    #[arg(long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub output: OutputSink,
}

impl UploadArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let file_name = match &self.name {
            Some(name) => name.clone(),
            None => self
                .file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    CliError::Other(format!("{} has no file name", self.file.display()))
                })?,
        };

        let content = tokio::fs::read(&self.file).await?;
        let path = AssetPath::new(
            &self.category,
            &self.folder,
            self.variant,
            self.index,
            &file_name,
        );
        let uploaded = app.repository().upload_asset(&path, &content).await?;

        let output = UploadOutput {
            path: uploaded.path,
            revision: uploaded.revision,
            url: uploaded.url,
        };
        if global.json {
            self.output.write_json(&output).await?;
        } else {
            let text = match &output.url {
                Some(url) => format!("{}\n{}", output.path, url),
                None => output.path.clone(),
            };
            self.output.write_str(&text).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Delete
// =============================================================================

/// Arguments for the delete command.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Repository path, e.g. images/nature/trip/original/1700000000000_0_a.jpg
    pub path: String,
}

impl DeleteArgs {
    pub async fn run(self, app: &App, _global: &GlobalArgs) -> Result<()> {
        app.repository().delete_asset(&self.path).await?;
        Ok(())
    }
}

// =============================================================================
// Url
// =============================================================================

/// Arguments for the url command.
#[derive(Args, Debug)]
pub struct UrlArgs {
    /// Repository path of the asset.
    pub path: String,

    #[command(flatten)]
    pub output: OutputSink,
}

impl UrlArgs {
    pub async fn run(self, app: &App, _global: &GlobalArgs) -> Result<()> {
        let url = app.repository().asset_url(&self.path).ok_or_else(|| {
            CliError::Other("no public URL: remote is not configured".to_string())
        })?;
        self.output.write_str(&url).await?;
        Ok(())
    }
}
