//! Conflict-aware, time-bounded access to individual remote files.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::backend::{
    ContentBackend, DeleteRequest, PutRequest, RemoteError, RemoteTarget, RepositoryInfo, Result,
    Revision,
};
use crate::mirror::{LocalMirror, StorageError};

use super::content_encoding::{decode_content, encode_content};
use super::remote_config::RemoteConfig;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(45);

/// Time bounds for remote operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Bound for reads and metadata calls.
    pub read: Duration,
    /// Bound for writes and deletes.
    pub write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            read: DEFAULT_READ_TIMEOUT,
            write: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// A remote file with decoded content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub content: Vec<u8>,
    /// Must accompany the next write to this path.
    pub revision: Revision,
}

impl RemoteFile {
    /// The content as UTF-8 text.
    pub fn text(&self) -> std::result::Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.content)
    }
}

/// Reads, writes and deletes remote files on behalf of the configured target.
///
/// Owns the [`RemoteConfig`]; changes made through [`RemoteFileStore::configure`]
/// are persisted to the local mirror before any later call can observe them.
pub struct RemoteFileStore {
    backend: Arc<dyn ContentBackend>,
    mirror: Arc<dyn LocalMirror>,
    config: RwLock<RemoteConfig>,
    timeouts: Timeouts,
    pages_base_url: Option<String>,
}

impl RemoteFileStore {
    /// Create a store, loading the remote config persisted in `mirror`.
    pub fn new(
        backend: Arc<dyn ContentBackend>,
        mirror: Arc<dyn LocalMirror>,
        timeouts: Timeouts,
    ) -> Self {
        let config = RemoteConfig::load(mirror.as_ref());
        Self {
            backend,
            mirror,
            config: RwLock::new(config),
            timeouts,
            pages_base_url: None,
        }
    }

    /// Serve asset URLs from this base instead of `https://{owner}.github.io/{repo}`.
    pub fn with_pages_base_url(mut self, base_url: Option<String>) -> Self {
        self.pages_base_url = base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        self
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// A copy of the current remote config.
    pub fn config(&self) -> RemoteConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_configured(&self) -> bool {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_configured()
    }

    /// Replace the remote config. It is persisted first; if that fails the
    /// current config stays in effect.
    pub fn configure(&self, config: RemoteConfig) -> std::result::Result<(), StorageError> {
        let config = config.normalized();
        config.persist(self.mirror.as_ref())?;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        tracing::info!("remote configuration updated");
        Ok(())
    }

    /// Forget the remote config, turning the store back into local-only mode.
    pub fn clear_config(&self) -> std::result::Result<(), StorageError> {
        self.mirror.remove(super::remote_config::SETTINGS_KEY)?;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = RemoteConfig::default();
        Ok(())
    }

    /// Base URL under which stored assets are publicly served.
    pub fn pages_url(&self) -> Option<String> {
        if let Some(base) = &self.pages_base_url {
            return Some(base.clone());
        }
        let config = self.config();
        config
            .is_configured()
            .then(|| format!("https://{}.github.io/{}", config.owner, config.repo))
    }

    fn target(&self) -> Result<RemoteTarget> {
        let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
        if config.is_configured() {
            Ok(config.target())
        } else {
            Err(RemoteError::NotConfigured)
        }
    }

    /// Read a file. `Ok(None)` means it does not exist remotely.
    pub async fn read(&self, path: &str) -> Result<Option<RemoteFile>> {
        let target = self.target()?;
        let wire = bounded(
            "read",
            self.timeouts.read,
            self.backend.get_file(&target, path),
        )
        .await?;

        let Some(wire) = wire else {
            return Ok(None);
        };
        let content = decode_content(&wire.content).map_err(|e| RemoteError::InvalidContent {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(RemoteFile {
            path: wire.path,
            content,
            revision: wire.revision,
        }))
    }

    /// Current revision of a file, or `None` if it does not exist.
    ///
    /// Unlike [`read`](Self::read) this never needs the content, so it also
    /// works for files the API will not inline.
    pub async fn revision(&self, path: &str) -> Result<Option<Revision>> {
        let target = self.target()?;
        bounded(
            "revision lookup",
            self.timeouts.read,
            self.backend.get_revision(&target, path),
        )
        .await
    }

    /// Create or update a file.
    ///
    /// `expected_revision` must be the current remote revision when the file
    /// exists; a mismatch surfaces as [`RemoteError::Conflict`]. Content that
    /// is already base64 is sent as-is.
    pub async fn write(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        expected_revision: Option<&str>,
    ) -> Result<RemoteFile> {
        let target = self.target()?;
        let req = PutRequest {
            message: message.to_string(),
            content: encode_content(content),
            sha: expected_revision.map(str::to_string),
            branch: target.branch.clone(),
        };

        let stored = bounded(
            "write",
            self.timeouts.write,
            self.backend.put_file(&target, path, &req),
        )
        .await?;

        let content = decode_content(&req.content).map_err(|e| RemoteError::InvalidContent {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(RemoteFile {
            path: stored.path,
            content,
            revision: stored.revision,
        })
    }

    /// Delete a file at a known revision.
    pub async fn delete(&self, path: &str, message: &str, revision: &str) -> Result<()> {
        if revision.trim().is_empty() {
            return Err(RemoteError::MissingRevision {
                path: path.to_string(),
            });
        }
        let target = self.target()?;
        let req = DeleteRequest {
            message: message.to_string(),
            sha: revision.to_string(),
            branch: target.branch.clone(),
        };
        bounded(
            "delete",
            self.timeouts.write,
            self.backend.delete_file(&target, path, &req),
        )
        .await
    }

    /// Verify that the configured repository is reachable with the credential.
    pub async fn check_connection(&self) -> Result<RepositoryInfo> {
        let target = self.target()?;
        bounded(
            "connection check",
            self.timeouts.read,
            self.backend.repository_info(&target),
        )
        .await
    }
}

/// Run `fut`, cancelling it once `after` elapses.
async fn bounded<T>(
    operation: &'static str,
    after: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, ?after, "remote operation timed out");
            Err(RemoteError::Timeout { operation, after })
        }
    }
}
