//! Durable local storage that every save lands in first.

mod lmdb_mirror;
mod local_mirror;
mod memory_mirror;

pub use lmdb_mirror::{LmdbMirror, DEFAULT_MAP_SIZE};
pub use local_mirror::{LocalMirror, Result, StorageError};
pub use memory_mirror::MemoryMirror;
