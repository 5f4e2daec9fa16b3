//! Top-level application component.
//!
//! The [`App`] owns all global services and is the root for the application's functionality.

use std::sync::Arc;

use thiserror::Error;

use crate::backend::{ContentBackend, GithubBackend, RemoteError};
use crate::caches::SyncCache;
use crate::config::{ConfigHelper, ConfigResult};
use crate::mirror::{LmdbMirror, LocalMirror, StorageError};
use crate::repository::CollectionRepository;
use crate::store::RemoteFileStore;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during App operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// The local mirror could not be opened.
    #[error("failed to open local mirror: {0}")]
    Mirror(#[from] StorageError),

    /// The remote client could not be built.
    #[error("failed to create remote client: {0}")]
    Remote(#[from] RemoteError),
}

/// Result type for App operations.
pub type Result<T> = std::result::Result<T, AppError>;

// =============================================================================
// App
// =============================================================================

/// The top-level application component.
///
/// Built once at startup; owns the local mirror, the remote file store and
/// the collection repository that sits on both.
pub struct App {
    config: ConfigHelper,
    warnings: Vec<String>,
    mirror: Arc<dyn LocalMirror>,
    store: Arc<RemoteFileStore>,
    repository: CollectionRepository,
}

impl App {
    /// Create an App from configuration that has already been read.
    pub fn from_config(config_result: ConfigResult) -> Result<Self> {
        let config = ConfigHelper::new(config_result.config);

        let mirror_path = config.config().mirror.path.clone();
        let mirror: Arc<dyn LocalMirror> =
            Arc::new(LmdbMirror::open(&mirror_path, config.mirror_map_size())?);
        tracing::debug!(path = %mirror_path.display(), "opened local mirror");

        let backend: Arc<dyn ContentBackend> = Arc::new(GithubBackend::new(
            config.config().remote.api_base.clone(),
            &config.user_agent(),
        )?);

        let mut app = Self::with_services(config, mirror, backend);
        app.warnings = config_result.warnings;
        Ok(app)
    }

    /// Assemble an App from already-built services.
    pub fn with_services(
        config: ConfigHelper,
        mirror: Arc<dyn LocalMirror>,
        backend: Arc<dyn ContentBackend>,
    ) -> Self {
        let store = Arc::new(
            RemoteFileStore::new(backend, mirror.clone(), config.timeouts())
                .with_pages_base_url(config.config().remote.pages_base_url.clone()),
        );
        let cache = SyncCache::new(config.config().cache.freshness_window.0);
        let repository =
            CollectionRepository::new(store.clone(), mirror.clone(), cache, config.retry_policy());

        Self {
            config,
            warnings: Vec::new(),
            mirror,
            store,
            repository,
        }
    }

    /// Get the configuration helper.
    pub fn config(&self) -> &ConfigHelper {
        &self.config
    }

    /// Warnings produced while loading configuration.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn mirror(&self) -> &Arc<dyn LocalMirror> {
        &self.mirror
    }

    pub fn store(&self) -> &RemoteFileStore {
        &self.store
    }

    pub fn repository(&self) -> &CollectionRepository {
        &self.repository
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::collections::{Folder, Folders};
    use crate::config::{read_config, ConfigSource};
    use crate::mirror::MemoryMirror;
    use crate::repository::SyncStatus;
    use crate::store::RemoteConfig;
    use tempfile::TempDir;

    fn app_in(dir: &TempDir) -> App {
        let source = ConfigSource {
            overrides: vec![(
                "mirror.path".to_string(),
                dir.path().join("mirror").display().to_string(),
            )],
            ..ConfigSource::default()
        };
        App::from_config(read_config(&source).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_app_creation() {
        let dir = TempDir::new().unwrap();
        let app = app_in(&dir);

        assert!(!app.store().is_configured());
        assert!(dir.path().join("mirror").exists());
    }

    #[tokio::test]
    async fn test_mirror_survives_restart() {
        let dir = TempDir::new().unwrap();
        let folders = vec![Folder::new("f1", "Trip", "nature")];
        {
            let app = app_in(&dir);
            let report = app.repository().save::<Folders>(&folders).await.unwrap();
            assert_eq!(report.status, SyncStatus::LocalOnly);
        }

        let app = app_in(&dir);
        assert_eq!(app.repository().get::<Folders>().await, folders);
    }

    #[tokio::test]
    async fn test_with_services_wires_remote_config_from_mirror() {
        let mirror = Arc::new(MemoryMirror::new());
        RemoteConfig::new("alice", "site", "token")
            .persist(mirror.as_ref())
            .unwrap();

        let config = ConfigHelper::new(
            read_config(&ConfigSource::default()).unwrap().config,
        );
        let app = App::with_services(config, mirror, Arc::new(MemoryBackend::new()));

        assert!(app.store().is_configured());
        let report = app
            .repository()
            .save::<Folders>(&vec![Folder::new("f1", "Trip", "nature")])
            .await
            .unwrap();
        assert!(report.is_synced());
    }
}
