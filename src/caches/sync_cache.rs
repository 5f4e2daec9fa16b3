//! In-memory cache of resolved collection values.
//!
//! Entries expire after a freshness window so a long-running process picks
//! up changes made by other clients. Each entry also records whether its
//! value is known to match the remote.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::collections::CollectionId;

pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(30);

// =============================================================================
// CacheEntry
// =============================================================================

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    fetched_at: Instant,
    /// The remote is known to hold `value`.
    synced: bool,
}

/// Observable state of a cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Empty,
    Fresh,
    Stale,
}

// =============================================================================
// SyncCache
// =============================================================================

pub struct SyncCache {
    entries: Mutex<HashMap<CollectionId, CacheEntry>>,
    window: Duration,
}

impl SyncCache {
    pub fn new(window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CollectionId, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn expired(&self, entry: &CacheEntry) -> bool {
        entry.fetched_at.elapsed() > self.window
    }

    /// The cached value, if present and fresh.
    pub fn get(&self, id: CollectionId) -> Option<Value> {
        let entries = self.lock();
        entries
            .get(&id)
            .filter(|entry| !self.expired(entry))
            .map(|entry| entry.value.clone())
    }

    pub fn state(&self, id: CollectionId) -> EntryState {
        match self.lock().get(&id) {
            None => EntryState::Empty,
            Some(entry) if self.expired(entry) => EntryState::Stale,
            Some(_) => EntryState::Fresh,
        }
    }

    /// True when an entry exists and has outlived the freshness window.
    pub fn is_expired(&self, id: CollectionId) -> bool {
        self.state(id) == EntryState::Stale
    }

    /// Store `value`, restarting its freshness window.
    pub fn put(&self, id: CollectionId, value: Value, synced: bool) {
        self.lock().insert(
            id,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
                synced,
            },
        );
    }

    /// Flag the entry as synced, provided it still holds `value`.
    ///
    /// A save that finished after a newer save replaced the entry must not
    /// mark the newer value as synced.
    pub fn mark_synced(&self, id: CollectionId, value: &Value) -> bool {
        match self.lock().get_mut(&id) {
            Some(entry) if entry.value == *value => {
                entry.synced = true;
                true
            }
            _ => false,
        }
    }

    /// Whether the cached value matches the remote; `None` if nothing is cached.
    pub fn is_synced(&self, id: CollectionId) -> Option<bool> {
        self.lock().get(&id).map(|entry| entry.synced)
    }

    pub fn invalidate(&self, id: CollectionId) {
        self.lock().remove(&id);
    }

    pub fn invalidate_all(&self) {
        self.lock().clear();
    }
}

impl Default for SyncCache {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_WINDOW)
    }
}
