//! The entry point the rest of the application uses for collection data.
//!
//! Reads resolve through cache, remote, local mirror and finally the
//! compiled-in default. Saves always land in the local mirror first; the
//! remote push that follows is best-effort and its outcome is reported, not
//! raised.

use std::sync::Arc;

use serde_json::Value;

use crate::backend::{RemoteError, Revision};
use crate::caches::SyncCache;
use crate::collections::{from_json, to_json, CodecError, Collection, CollectionId, Shape};
use crate::mirror::LocalMirror;
use crate::store::{RemoteFile, RemoteFileStore};

use super::assets::{public_url, AssetPath, UploadedAsset};
use super::error::Result;
use super::retry::RetryPolicy;

// =============================================================================
// Save outcome
// =============================================================================

/// What happened to the remote copy during a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// No remote is configured.
    LocalOnly,
    /// The remote now holds the saved value.
    Synced { revision: Revision },
    /// The remote push failed; the value is saved locally only.
    Failed { error: RemoteError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub collection: CollectionId,
    pub status: SyncStatus,
}

impl SaveReport {
    pub fn is_synced(&self) -> bool {
        matches!(self.status, SyncStatus::Synced { .. })
    }
}

/// Local and remote presence of a collection, read without the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStatus {
    pub collection: CollectionId,
    pub local: bool,
    /// `None` when unconfigured, unreachable or absent remotely.
    pub remote_revision: Option<Revision>,
    /// Whether local and remote hold the same value, when both exist.
    pub in_sync: Option<bool>,
}

// =============================================================================
// CollectionRepository
// =============================================================================

pub struct CollectionRepository {
    store: Arc<RemoteFileStore>,
    mirror: Arc<dyn LocalMirror>,
    cache: SyncCache,
    retry: RetryPolicy,
}

impl CollectionRepository {
    pub fn new(
        store: Arc<RemoteFileStore>,
        mirror: Arc<dyn LocalMirror>,
        cache: SyncCache,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            mirror,
            cache,
            retry,
        }
    }

    pub fn store(&self) -> &RemoteFileStore {
        &self.store
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Current value of collection `C`. Never fails.
    pub async fn get<C: Collection>(&self) -> C::Value {
        let value = self.get_json(C::ID).await;
        match from_json::<C>(value) {
            Ok(typed) => typed,
            Err(e) => {
                tracing::warn!(collection = %C::ID, error = %e, "using default value");
                C::default_value()
            }
        }
    }

    /// Current value of a collection as JSON. Never fails.
    pub async fn get_json(&self, id: CollectionId) -> Value {
        if let Some(value) = self.cache.get(id) {
            return value;
        }

        let (value, synced) = match self.read_remote(id).await {
            Some(value) => (value, true),
            None => match self.read_local(id) {
                Some(value) => (value, false),
                None => (id.default_value(), false),
            },
        };
        self.cache.put(id, value.clone(), synced);
        value
    }

    async fn read_remote(&self, id: CollectionId) -> Option<Value> {
        if !self.store.is_configured() {
            return None;
        }
        let file = match self.store.read(id.remote_path()).await {
            Ok(Some(file)) => file,
            Ok(None) => {
                tracing::debug!(collection = %id, "no remote copy");
                return None;
            }
            Err(e) => {
                tracing::warn!(collection = %id, error = %e, "remote read failed, falling back to local copy");
                return None;
            }
        };
        let decoded = file
            .text()
            .map_err(|e| e.to_string())
            .and_then(|text| id.decode(text).map_err(|e| e.to_string()));
        match decoded {
            Ok(value) if id.is_empty(&value) => None,
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(collection = %id, error = %e, "ignoring unusable remote copy");
                None
            }
        }
    }

    fn read_local(&self, id: CollectionId) -> Option<Value> {
        let raw = self.mirror.read(id.local_key())?;
        match id.decode(&raw) {
            // An empty profile is treated as never having been filled in.
            Ok(value) if id.shape() == Shape::Object && id.is_empty(&value) => None,
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(collection = %id, error = %e, "ignoring unusable local copy");
                None
            }
        }
    }

    /// Compare the local and remote copies of a collection.
    pub async fn status(&self, id: CollectionId) -> CollectionStatus {
        let local = self.read_local(id);
        let remote = if self.store.is_configured() {
            self.store.read(id.remote_path()).await.ok().flatten()
        } else {
            None
        };
        let remote_value = remote
            .as_ref()
            .and_then(|file| file.text().ok())
            .and_then(|text| id.decode(text).ok());
        let in_sync = match (&local, &remote_value) {
            (Some(local), Some(remote)) => Some(local == remote),
            _ => None,
        };
        CollectionStatus {
            collection: id,
            local: local.is_some(),
            remote_revision: remote.map(|file| file.revision),
            in_sync,
        }
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Save collection `C`.
    ///
    /// Fails only if the local write fails. The remote outcome is in the report.
    pub async fn save<C: Collection>(&self, value: &C::Value) -> Result<SaveReport> {
        let json = to_json::<C>(value)?;
        self.save_value(C::ID, json).await
    }

    /// Save a collection from JSON, validating it first.
    pub async fn save_json(&self, id: CollectionId, value: Value) -> Result<SaveReport> {
        let value = id.validate(value)?;
        self.save_value(id, value).await
    }

    async fn save_value(&self, id: CollectionId, value: Value) -> Result<SaveReport> {
        let compact = render(id, &value, false)?;
        self.mirror.write(id.local_key(), &compact)?;
        self.cache.put(id, value.clone(), false);

        let status = if self.store.is_configured() {
            self.sync_value(id, &value).await?
        } else {
            SyncStatus::LocalOnly
        };
        Ok(SaveReport {
            collection: id,
            status,
        })
    }

    /// Push `value` as the remote copy of `id`. Remote failures are reported, not raised.
    async fn sync_value(&self, id: CollectionId, value: &Value) -> Result<SyncStatus> {
        let body = render(id, value, true)?;
        let message = format!("Update {}", id.name());
        let status = match self.push(id.remote_path(), body.as_bytes(), &message).await {
            Ok(file) => {
                self.cache.mark_synced(id, value);
                tracing::info!(collection = %id, revision = %file.revision, "synced to remote");
                SyncStatus::Synced {
                    revision: file.revision,
                }
            }
            Err(error) => {
                tracing::warn!(collection = %id, error = %error, "remote sync failed, saved locally only");
                SyncStatus::Failed { error }
            }
        };
        Ok(status)
    }

    /// Push the local copy (or default) of every collection to the remote.
    ///
    /// The local mirror is left untouched. Without a configured remote there
    /// is nothing to do and no reports are returned.
    pub async fn sync_all(&self) -> Result<Vec<SaveReport>> {
        if !self.store.is_configured() {
            tracing::info!("remote not configured, skipping sync");
            return Ok(Vec::new());
        }

        let mut reports = Vec::with_capacity(CollectionId::ALL.len());
        for id in CollectionId::ALL {
            let value = self.read_local(id).unwrap_or_else(|| id.default_value());
            let status = self.sync_value(id, &value).await?;
            reports.push(SaveReport {
                collection: id,
                status,
            });
        }
        Ok(reports)
    }

    /// Write `content` to `path`, re-reading the revision before every attempt.
    async fn push(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> std::result::Result<RemoteFile, RemoteError> {
        let store = &self.store;
        self.retry
            .run(path, |_| async move {
                let revision = store.revision(path).await?;
                store.write(path, content, message, revision.as_deref()).await
            })
            .await
    }

    // -------------------------------------------------------------------------
    // Assets
    // -------------------------------------------------------------------------

    /// Upload an image. Unlike collection saves, any remote failure is an error.
    pub async fn upload_asset(&self, path: &AssetPath, content: &[u8]) -> Result<UploadedAsset> {
        let path = path.to_string();
        let message = format!("Upload {}", path);
        let file = self.push(&path, content, &message).await?;
        let url = self.asset_url(&path);
        tracing::info!(%path, revision = %file.revision, "uploaded asset");
        Ok(UploadedAsset {
            path,
            revision: file.revision,
            url,
        })
    }

    /// Delete an image. Deleting an absent path succeeds.
    pub async fn delete_asset(&self, path: &str) -> Result<()> {
        let message_text = format!("Delete {}", path);
        let message = message_text.as_str();
        let store = &self.store;
        self.retry
            .run(path, |_| async move {
                match store.revision(path).await? {
                    Some(revision) => store.delete(path, message, &revision).await,
                    None => Ok(()),
                }
            })
            .await?;
        Ok(())
    }

    /// Public URL of a stored asset, if a pages URL is known.
    pub fn asset_url(&self, path: &str) -> Option<String> {
        self.store.pages_url().map(|base| public_url(&base, path))
    }

    // -------------------------------------------------------------------------
    // Cache control
    // -------------------------------------------------------------------------

    pub fn invalidate(&self, id: CollectionId) {
        self.cache.invalidate(id);
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Whether the cached value is known to match the remote.
    pub fn is_synced(&self, id: CollectionId) -> Option<bool> {
        self.cache.is_synced(id)
    }
}

fn render(id: CollectionId, value: &Value, pretty: bool) -> std::result::Result<String, CodecError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.map_err(|e| CodecError::Schema {
        collection: id,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use httpmock::Method::{DELETE, GET, PUT};
    use httpmock::MockServer;
    use serde_json::json;
    use tokio::time::Instant;

    use crate::backend::{GithubBackend, MemoryBackend};
    use crate::collections::{
        populated_sample, AboutInfo, Categories, Category, Folder, Folders, Note, Notes, Photo,
        Photos, Profile,
    };
    use crate::mirror::{MemoryMirror, StorageError};
    use crate::repository::{AssetVariant, RepositoryError};
    use crate::store::{decode_content, encode_content, RemoteConfig, Timeouts};

    struct Fixture {
        backend: Arc<MemoryBackend>,
        mirror: Arc<MemoryMirror>,
        repo: CollectionRepository,
    }

    fn fixture_with_mirror(mirror: MemoryMirror, configured: bool) -> Fixture {
        let backend = Arc::new(MemoryBackend::new());
        let mirror = Arc::new(mirror);
        let store = RemoteFileStore::new(backend.clone(), mirror.clone(), Timeouts::default());
        if configured {
            store
                .configure(RemoteConfig::new("alice", "site", "token"))
                .unwrap();
        }
        let repo = CollectionRepository::new(
            Arc::new(store),
            mirror.clone(),
            SyncCache::default(),
            RetryPolicy::default(),
        );
        Fixture {
            backend,
            mirror,
            repo,
        }
    }

    fn fixture(configured: bool) -> Fixture {
        fixture_with_mirror(MemoryMirror::new(), configured)
    }

    /// A repository talking to a mock GitHub API.
    fn github_repo(server: &MockServer) -> CollectionRepository {
        let backend = GithubBackend::new(server.base_url(), "folio-sync-test").unwrap();
        let mirror = Arc::new(MemoryMirror::new());
        let store = RemoteFileStore::new(Arc::new(backend), mirror.clone(), Timeouts::default())
            .with_pages_base_url(Some("https://photos.example.com".to_string()));
        store
            .configure(RemoteConfig::new("alice", "site", "token"))
            .unwrap();
        CollectionRepository::new(
            Arc::new(store),
            mirror,
            SyncCache::default(),
            RetryPolicy::default(),
        )
    }

    fn trip() -> Vec<Folder> {
        vec![Folder::new("f1", "Trip", "nature")]
    }

    #[tokio::test]
    async fn test_unconfigured_save_then_get_uses_local_only() {
        let f = fixture(false);

        let report = f.repo.save::<Folders>(&trip()).await.unwrap();
        assert_eq!(report.status, SyncStatus::LocalOnly);

        let raw = f.mirror.read("photographyFolders").unwrap();
        let stored: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.as_array().unwrap().len(), 1);
        assert_eq!(stored[0]["name"], "Trip");

        assert_eq!(f.repo.get::<Folders>().await, trip());
        assert_eq!(f.backend.read_count(), 0);
        assert_eq!(f.backend.write_count(), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_get_never_calls_remote() {
        let f = fixture(false);
        assert_eq!(f.repo.get::<Photos>().await, Vec::<Photo>::new());
        assert_eq!(f.repo.get::<Profile>().await, AboutInfo::default());
        assert_eq!(f.backend.read_count(), 0);
    }

    #[tokio::test]
    async fn test_save_then_get_returns_value_for_every_collection() {
        for configured in [false, true] {
            let f = fixture(configured);

            let photos = vec![Photo::new("photo_1", "Dusk", "nature")];
            let notes = vec![Note::new("n1", "Gear", "35mm f/1.4")];
            let categories = vec![Category::new("custom_1", "Street")];
            let mut about = AboutInfo::default();
            about.name = "Lin".to_string();
            about.contacts.email = Some("lin@example.com".to_string());

            f.repo.save::<Photos>(&photos).await.unwrap();
            f.repo.save::<Notes>(&notes).await.unwrap();
            f.repo.save::<Categories>(&categories).await.unwrap();
            f.repo.save::<Folders>(&trip()).await.unwrap();
            f.repo.save::<Profile>(&about).await.unwrap();

            assert_eq!(f.repo.get::<Photos>().await, photos);
            assert_eq!(f.repo.get::<Notes>().await, notes);
            assert_eq!(f.repo.get::<Categories>().await, categories);
            assert_eq!(f.repo.get::<Folders>().await, trip());
            assert_eq!(f.repo.get::<Profile>().await, about);
        }
    }

    #[tokio::test]
    async fn test_save_then_get_when_remote_is_failing() {
        let f = fixture(true);
        f.backend.fail_next_read(RemoteError::Transport {
            status: None,
            message: "connection reset".to_string(),
        });

        let report = f.repo.save::<Folders>(&trip()).await.unwrap();
        assert!(matches!(report.status, SyncStatus::Failed { .. }));
        assert_eq!(f.repo.get::<Folders>().await, trip());
    }

    #[tokio::test]
    async fn test_remote_round_trip_through_base64() {
        let f = fixture(true);
        let about = AboutInfo {
            name: "摄影师".to_string(),
            ..AboutInfo::default()
        };
        f.repo.save::<Profile>(&about).await.unwrap();
        f.repo.save::<Notes>(&vec![Note::new("n1", "Light", "golden hour")]).await.unwrap();

        // Forget everything local; the remote copy alone must reproduce the values.
        f.mirror.remove("aboutInfo").unwrap();
        f.mirror.remove("photographyNotes").unwrap();
        f.repo.invalidate_all();

        assert_eq!(f.repo.get::<Profile>().await, about);
        assert_eq!(f.repo.get::<Notes>().await[0].content, "golden hour");
        assert_eq!(f.repo.is_synced(CollectionId::Profile), Some(true));
    }

    #[tokio::test]
    async fn test_every_collection_reads_back_from_remote_alone() {
        let f = fixture(true);

        for id in CollectionId::ALL {
            for value in [id.default_value(), populated_sample(id)] {
                let report = f.repo.save_json(id, value.clone()).await.unwrap();
                assert!(report.is_synced(), "{}", id);

                let wire = f.backend.file(id.remote_path()).unwrap().content;
                let bytes = decode_content(&wire).unwrap();
                let stored = id.decode(std::str::from_utf8(&bytes).unwrap()).unwrap();
                assert_eq!(stored, value, "{}", id);

                f.mirror.remove(id.local_key()).unwrap();
                f.repo.invalidate(id);
                assert_eq!(f.repo.get_json(id).await, value, "{}", id);
            }
            // The populated value was served by the remote, not the default.
            assert_eq!(f.repo.is_synced(id), Some(true), "{}", id);
        }
    }

    #[tokio::test]
    async fn test_missing_remote_falls_back_to_local_then_default() {
        let f = fixture(true);
        assert_eq!(f.repo.get_json(CollectionId::Photos).await, json!([]));
        assert_eq!(f.backend.read_count(), 1);

        f.repo.invalidate(CollectionId::Photos);
        f.mirror
            .write("photographyPhotos", r#"[{"id":"p1","title":"Local"}]"#)
            .unwrap();
        let photos = f.repo.get::<Photos>().await;
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].title, "Local");
        assert_eq!(f.repo.is_synced(CollectionId::Photos), Some(false));
    }

    #[tokio::test]
    async fn test_empty_or_malformed_remote_is_ignored() {
        let f = fixture(true);
        f.mirror
            .write("photographyNotes", r#"[{"id":"n1","title":"Local"}]"#)
            .unwrap();

        f.backend.insert("data/notes.json", &encode_content(b"[]"));
        assert_eq!(f.repo.get::<Notes>().await[0].title, "Local");

        f.repo.invalidate(CollectionId::Notes);
        f.backend
            .insert("data/notes.json", &encode_content(br#"{"id":"n1"}"#));
        assert_eq!(f.repo.get::<Notes>().await[0].title, "Local");
    }

    #[tokio::test]
    async fn test_empty_local_profile_counts_as_absent() {
        let f = fixture(false);
        f.mirror.write("aboutInfo", "{}").unwrap();
        assert_eq!(f.repo.get::<Profile>().await, AboutInfo::default());

        // An empty list is a legitimate value.
        f.mirror.write("photographyFolders", "[]").unwrap();
        assert_eq!(f.repo.get::<Folders>().await, Vec::<Folder>::new());
    }

    #[tokio::test]
    async fn test_cached_value_short_circuits_until_invalidated() {
        let f = fixture(true);
        f.backend
            .insert("data/folders.json", &encode_content(br#"[{"id":"a","name":"A"}]"#));
        assert_eq!(f.repo.get::<Folders>().await[0].name, "A");

        f.backend
            .insert("data/folders.json", &encode_content(br#"[{"id":"b","name":"B"}]"#));
        assert_eq!(f.repo.get::<Folders>().await[0].name, "A");
        assert_eq!(f.backend.read_count(), 1);

        f.repo.invalidate(CollectionId::Folders);
        assert_eq!(f.repo.get::<Folders>().await[0].name, "B");
        assert_eq!(f.backend.read_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_repeats_fallback_chain() {
        let f = fixture(true);
        assert_eq!(f.repo.get_json(CollectionId::Categories).await, json!([]));
        assert_eq!(f.backend.read_count(), 1);

        tokio::time::advance(Duration::from_secs(10)).await;
        f.repo.get_json(CollectionId::Categories).await;
        assert_eq!(f.backend.read_count(), 1);

        tokio::time::advance(Duration::from_secs(21)).await;
        f.backend.insert(
            "data/categories.json",
            &encode_content(br#"[{"id":"c","name":"Street"}]"#),
        );
        let categories = f.repo.get::<Categories>().await;
        assert_eq!(categories[0].name, "Street");
        assert_eq!(f.backend.read_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflict_then_success() {
        let f = fixture(true);
        f.backend.fail_next_write(RemoteError::Conflict {
            path: "data/folders.json".to_string(),
        });

        let start = Instant::now();
        let report = f.repo.save::<Folders>(&trip()).await.unwrap();

        assert!(report.is_synced());
        assert_eq!(f.backend.write_count(), 2);
        assert!(start.elapsed() >= Duration::from_secs(1));
        assert_eq!(f.repo.get::<Folders>().await, trip());
        assert_eq!(f.repo.is_synced(CollectionId::Folders), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_rereads_revision_after_concurrent_write() {
        let f = fixture(true);
        f.backend
            .insert("data/notes.json", &encode_content(br#"[{"id":"old"}]"#));
        // Another writer lands between our revision read and our write.
        f.backend
            .interleave_write("data/notes.json", &encode_content(br#"[{"id":"theirs"}]"#));

        let notes = vec![Note::new("ours", "t", "c")];
        let report = f.repo.save::<Notes>(&notes).await.unwrap();
        assert!(report.is_synced());
        assert_eq!(f.backend.write_count(), 2);

        f.repo.invalidate_all();
        f.mirror.remove("photographyNotes").unwrap();
        assert_eq!(f.repo.get::<Notes>().await, notes);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_are_capped_at_three_attempts() {
        let f = fixture(true);
        for _ in 0..5 {
            f.backend.fail_next_write(RemoteError::Conflict {
                path: "data/folders.json".to_string(),
            });
        }

        let start = Instant::now();
        let report = f.repo.save::<Folders>(&trip()).await.unwrap();

        assert!(matches!(
            report.status,
            SyncStatus::Failed {
                error: RemoteError::Conflict { .. }
            }
        ));
        assert_eq!(f.backend.write_count(), 3);
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert_eq!(f.repo.get::<Folders>().await, trip());
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_unavailable_is_retried() {
        let f = fixture(true);
        f.backend
            .fail_next_write(RemoteError::ServiceUnavailable { status: 503 });

        let report = f.repo.save::<Folders>(&trip()).await.unwrap();
        assert!(report.is_synced());
        assert_eq!(f.backend.write_count(), 2);
    }

    #[tokio::test]
    async fn test_permission_denied_save_succeeds_locally() {
        let f = fixture(true);
        f.backend.fail_next_write(RemoteError::Permission {
            path: "data/folders.json".to_string(),
            message: "Resource not accessible by integration".to_string(),
        });

        let report = f.repo.save::<Folders>(&trip()).await.unwrap();

        assert!(!report.is_synced());
        assert_eq!(f.backend.write_count(), 1);
        assert_eq!(f.repo.is_synced(CollectionId::Folders), Some(false));
        assert!(f.mirror.read("photographyFolders").is_some());
    }

    #[tokio::test]
    async fn test_permission_denied_asset_upload_fails() {
        let f = fixture(true);
        f.backend.fail_next_write(RemoteError::Permission {
            path: "images".to_string(),
            message: "denied".to_string(),
        });

        let path = AssetPath::new("nature", "f1", AssetVariant::Original, 0, "a.jpg");
        let result = f.repo.upload_asset(&path, b"\xFF\xD8\xFF").await;
        assert!(matches!(
            result,
            Err(RepositoryError::Remote(RemoteError::Permission { .. }))
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_asset_upload_fails() {
        let f = fixture(false);
        let path = AssetPath::new("nature", "f1", AssetVariant::Original, 0, "a.jpg");
        let result = f.repo.upload_asset(&path, b"\xFF\xD8\xFF").await;
        assert!(matches!(
            result,
            Err(RepositoryError::Remote(RemoteError::NotConfigured))
        ));
    }

    #[tokio::test]
    async fn test_upload_and_delete_asset() {
        let f = fixture(true);
        let path = AssetPath::new("nature", "f1", AssetVariant::Watermarked, 1, "sun set.jpg")
            .with_timestamp(42);

        let uploaded = f.repo.upload_asset(&path, b"\xFF\xD8\xFF\xE0").await.unwrap();
        assert_eq!(uploaded.path, "images/nature/f1/watermarked/42_1_sun set.jpg");
        assert_eq!(
            uploaded.url.as_deref(),
            Some("https://alice.github.io/site/images/nature/f1/watermarked/42_1_sun%20set.jpg")
        );
        assert!(f.backend.file(&uploaded.path).is_some());

        f.repo.delete_asset(&uploaded.path).await.unwrap();
        assert!(f.backend.file(&uploaded.path).is_none());

        // Already gone.
        f.repo.delete_asset(&uploaded.path).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_asset_too_large_to_inline() {
        let server = MockServer::start_async().await;
        let path = "images/n/f/original/1_0_big.jpg";
        let lookup = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(format!("/repos/alice/site/contents/{}", path));
                then.status(200).json_body(json!({
                    "path": path,
                    "sha": "abc",
                    "content": "",
                    "encoding": "none"
                }));
            })
            .await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path(format!("/repos/alice/site/contents/{}", path))
                    .json_body_partial(r#"{"sha": "abc"}"#);
                then.status(200).json_body(json!({ "commit": {} }));
            })
            .await;

        github_repo(&server).delete_asset(path).await.unwrap();

        lookup.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_reupload_over_large_asset_uses_its_revision() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/alice/site/contents/images/n/f/original/1_0_big.jpg");
                then.status(200).json_body(json!({
                    "path": "images/n/f/original/1_0_big.jpg",
                    "sha": "abc",
                    "content": "",
                    "encoding": "none"
                }));
            })
            .await;
        let put = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/repos/alice/site/contents/images/n/f/original/1_0_big.jpg")
                    .json_body_partial(r#"{"sha": "abc"}"#);
                then.status(200).json_body(json!({
                    "content": { "path": "images/n/f/original/1_0_big.jpg", "sha": "def" }
                }));
            })
            .await;

        let path = AssetPath::new("n", "f", AssetVariant::Original, 0, "big.jpg").with_timestamp(1);
        let uploaded = github_repo(&server)
            .upload_asset(&path, b"\xFF\xD8\xFF\xE0")
            .await
            .unwrap();

        put.assert_async().await;
        assert_eq!(uploaded.revision, "def");
    }

    #[tokio::test]
    async fn test_asset_names_with_reserved_characters_keep_their_path() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/contents/images/");
                then.status(404).json_body(json!({ "message": "Not Found" }));
            })
            .await;
        // Unencoded, the name would be cut at '?' or '#'.
        let put = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path_contains("/contents/images/n/f/original/1_0_what")
                    .path_contains(".jpg");
                then.status(201).json_body(json!({
                    "content": { "path": "images/n/f/original/1_0_what?#%.jpg", "sha": "s1" }
                }));
            })
            .await;

        let path =
            AssetPath::new("n", "f", AssetVariant::Original, 0, "what?#%.jpg").with_timestamp(1);
        let uploaded = github_repo(&server)
            .upload_asset(&path, b"\xFF\xD8\xFF\xE0")
            .await
            .unwrap();

        put.assert_async().await;
        assert_eq!(uploaded.path, "images/n/f/original/1_0_what?#%.jpg");
        assert_eq!(
            uploaded.url.as_deref(),
            Some("https://photos.example.com/images/n/f/original/1_0_what%3F%23%25.jpg")
        );
    }

    #[tokio::test]
    async fn test_quota_failure_aborts_save() {
        let f = fixture_with_mirror(MemoryMirror::with_quota(16), false);

        let result = f.repo.save::<Folders>(&trip()).await;
        assert!(matches!(
            result,
            Err(RepositoryError::Storage(StorageError::QuotaExceeded { .. }))
        ));
        assert_eq!(f.repo.is_synced(CollectionId::Folders), None);
        assert_eq!(f.repo.get::<Folders>().await, Vec::<Folder>::new());
    }

    #[tokio::test]
    async fn test_save_json_validates() {
        let f = fixture(false);
        let result = f
            .repo
            .save_json(CollectionId::Folders, json!([{ "id": "f1" }]))
            .await;
        assert!(matches!(result, Err(RepositoryError::Codec(_))));
        assert!(f.mirror.read("photographyFolders").is_none());

        let report = f
            .repo
            .save_json(CollectionId::Profile, json!({ "name": "Lin", "theme": "dark" }))
            .await
            .unwrap();
        assert_eq!(report.status, SyncStatus::LocalOnly);
        let profile = f.repo.get_json(CollectionId::Profile).await;
        assert_eq!(profile["theme"], "dark");
    }

    #[tokio::test]
    async fn test_sync_all_pushes_every_collection() {
        let f = fixture(true);
        f.mirror
            .write("photographyFolders", r#"[{"id":"f1","name":"Trip","category":"nature"}]"#)
            .unwrap();

        let reports = f.repo.sync_all().await.unwrap();

        assert_eq!(reports.len(), 5);
        assert!(reports.iter().all(SaveReport::is_synced));
        for id in CollectionId::ALL {
            assert!(f.backend.file(id.remote_path()).is_some());
        }
        // Defaults are pushed, not written back locally.
        assert!(f.mirror.read("aboutInfo").is_none());
        assert!(f.mirror.read("photographyPhotos").is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_sync_all_does_nothing() {
        let f = fixture(false);
        f.mirror
            .write("photographyFolders", r#"[{"id":"f1","name":"Trip","category":"nature"}]"#)
            .unwrap();

        let reports = f.repo.sync_all().await.unwrap();

        assert!(reports.is_empty());
        for id in CollectionId::ALL.into_iter().filter(|id| *id != CollectionId::Folders) {
            assert!(f.mirror.read(id.local_key()).is_none(), "{}", id);
        }
        assert_eq!(f.backend.read_count(), 0);
        assert_eq!(f.backend.write_count(), 0);
    }

    #[tokio::test]
    async fn test_status_compares_local_and_remote() {
        let f = fixture(true);
        f.repo.save::<Folders>(&trip()).await.unwrap();

        let status = f.repo.status(CollectionId::Folders).await;
        assert!(status.local);
        assert!(status.remote_revision.is_some());
        assert_eq!(status.in_sync, Some(true));

        f.mirror.write("photographyFolders", "[]").unwrap();
        let status = f.repo.status(CollectionId::Folders).await;
        assert_eq!(status.in_sync, Some(false));

        let status = f.repo.status(CollectionId::Notes).await;
        assert!(!status.local);
        assert_eq!(status.remote_revision, None);
        assert_eq!(status.in_sync, None);
    }
}
