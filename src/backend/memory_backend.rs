use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::content_backend::{
    ContentBackend, DeleteRequest, PutRequest, RemoteError, RemoteTarget, RepositoryInfo, Result,
    Revision, WireFile,
};

/// An in-memory `ContentBackend`, intended primarily for testing.
///
/// Enforces revision checks the way the hosted API does and can be scripted
/// to fail or stall upcoming calls.
#[derive(Default)]
pub struct MemoryBackend {
    files: Mutex<HashMap<String, WireFile>>,
    read_failures: Mutex<VecDeque<RemoteError>>,
    write_failures: Mutex<VecDeque<RemoteError>>,
    interleaved: Mutex<VecDeque<(String, String)>>,
    latency: Mutex<Option<Duration>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file as if it had been committed remotely. Returns its revision.
    pub fn insert(&self, path: &str, base64_content: &str) -> String {
        let file = WireFile {
            path: path.to_string(),
            content: base64_content.to_string(),
            revision: revision_of(path, base64_content),
        };
        let revision = file.revision.clone();
        lock(&self.files).insert(path.to_string(), file);
        revision
    }

    /// Current stored file at `path`, bypassing call accounting.
    pub fn file(&self, path: &str) -> Option<WireFile> {
        lock(&self.files).get(path).cloned()
    }

    /// Fail the next read with `error`. Queued failures are consumed in order.
    pub fn fail_next_read(&self, error: RemoteError) {
        lock(&self.read_failures).push_back(error);
    }

    /// Fail the next write (put or delete) with `error`.
    pub fn fail_next_write(&self, error: RemoteError) {
        lock(&self.write_failures).push_back(error);
    }

    /// Commit `base64_content` to `path` just before the next put is
    /// processed, as if another client had raced ahead of it.
    pub fn interleave_write(&self, path: &str, base64_content: &str) {
        lock(&self.interleaved).push_back((path.to_string(), base64_content.to_string()));
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.latency) = latency;
    }

    /// Number of read calls (file reads, revision lookups and repository info) received.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of write calls (puts and deletes) received.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn revision_of(path: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(20).map(|b| format!("{:02x}", b)).collect()
}

#[async_trait]
impl ContentBackend for MemoryBackend {
    async fn get_file(&self, _target: &RemoteTarget, path: &str) -> Result<Option<WireFile>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if let Some(error) = lock(&self.read_failures).pop_front() {
            return Err(error);
        }
        Ok(lock(&self.files).get(path).cloned())
    }

    async fn get_revision(&self, _target: &RemoteTarget, path: &str) -> Result<Option<Revision>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if let Some(error) = lock(&self.read_failures).pop_front() {
            return Err(error);
        }
        Ok(lock(&self.files).get(path).map(|file| file.revision.clone()))
    }

    async fn put_file(
        &self,
        _target: &RemoteTarget,
        path: &str,
        req: &PutRequest,
    ) -> Result<WireFile> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if let Some(error) = lock(&self.write_failures).pop_front() {
            return Err(error);
        }
        let racing = lock(&self.interleaved).pop_front();
        if let Some((racing_path, racing_content)) = racing {
            self.insert(&racing_path, &racing_content);
        }

        let mut files = lock(&self.files);
        let current = files.get(path).map(|f| f.revision.as_str());
        match (current, req.sha.as_deref()) {
            (None, None) => {}
            (Some(current), Some(expected)) if current == expected => {}
            (Some(_), None) => {
                return Err(RemoteError::Transport {
                    status: Some(422),
                    message: format!("\"sha\" wasn't supplied for existing file {}", path),
                })
            }
            _ => {
                return Err(RemoteError::Conflict {
                    path: path.to_string(),
                })
            }
        }

        let file = WireFile {
            path: path.to_string(),
            content: req.content.clone(),
            revision: revision_of(path, &req.content),
        };
        files.insert(path.to_string(), file.clone());
        Ok(file)
    }

    async fn delete_file(
        &self,
        _target: &RemoteTarget,
        path: &str,
        req: &DeleteRequest,
    ) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if let Some(error) = lock(&self.write_failures).pop_front() {
            return Err(error);
        }

        let mut files = lock(&self.files);
        match files.get(path) {
            Some(file) if file.revision == req.sha => {
                files.remove(path);
                Ok(())
            }
            Some(_) => Err(RemoteError::Conflict {
                path: path.to_string(),
            }),
            None => Err(RemoteError::Transport {
                status: Some(404),
                message: format!("{} not found", path),
            }),
        }
    }

    async fn repository_info(&self, target: &RemoteTarget) -> Result<RepositoryInfo> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if let Some(error) = lock(&self.read_failures).pop_front() {
            return Err(error);
        }
        Ok(RepositoryInfo {
            full_name: format!("{}/{}", target.owner, target.repo),
            default_branch: Some(target.branch.clone()),
            private: false,
        })
    }
}
