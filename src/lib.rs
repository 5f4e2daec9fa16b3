//! folio-sync - Local-first collection storage for a photography portfolio.
//!
//! Collections (photos, notes, categories, folders and the profile) are kept
//! in a durable local mirror and pushed to a GitHub repository through the
//! Contents API when one is configured.

pub mod app;
pub mod backend;
pub mod caches;
pub mod cli;
pub mod collections;
pub mod config;
pub mod mirror;
pub mod repository;
pub mod store;

pub use backend::{ContentBackend, GithubBackend, MemoryBackend, RemoteError, Revision};
pub use collections::{Collection, CollectionId};
pub use mirror::{LmdbMirror, LocalMirror, MemoryMirror, StorageError};
pub use repository::{CollectionRepository, RepositoryError, SaveReport, SyncStatus};
pub use store::{RemoteConfig, RemoteFileStore};
