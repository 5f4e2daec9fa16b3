//! In-memory caching of resolved collection values.

mod sync_cache;

pub use sync_cache::{EntryState, SyncCache, DEFAULT_FRESHNESS_WINDOW};
