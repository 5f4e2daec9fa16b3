//! LMDB-based local mirror.
//!
//! Uses the heed crate to provide a persistent key-value store backed by LMDB.

use std::path::Path;

use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions, MdbError};

use super::local_mirror::{LocalMirror, Result, StorageError};

pub const DEFAULT_MAP_SIZE: usize = 64 * 1024 * 1024;

/// An LMDB-backed local mirror.
///
/// Every write is its own committed transaction, so a returned `Ok` means the
/// value is durable.
pub struct LmdbMirror {
    env: Env,
    db: Database<Str, Str>,
}

impl LmdbMirror {
    /// Open (or create) a mirror at the given directory.
    ///
    /// `map_size` bounds the total size of the store; writes beyond it fail
    /// with `StorageError::QuotaExceeded`.
    pub fn open(path: &Path, map_size: usize) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per directory by this process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(1)
                .open(path)
                .map_err(database_error)?
        };

        let mut wtxn = env.write_txn().map_err(database_error)?;
        let db: Database<Str, Str> = env
            .create_database(&mut wtxn, None)
            .map_err(database_error)?;
        wtxn.commit().map_err(database_error)?;

        Ok(Self { env, db })
    }

    fn try_read(&self, key: &str) -> heed::Result<Option<String>> {
        let rtxn = self.env.read_txn()?;
        let value = self.db.get(&rtxn, key)?.map(str::to_string);
        Ok(value)
    }
}

fn database_error(e: heed::Error) -> StorageError {
    StorageError::Database(e.to_string())
}

fn write_error(e: heed::Error, key: &str, size: usize) -> StorageError {
    match e {
        heed::Error::Mdb(MdbError::MapFull) => StorageError::QuotaExceeded {
            key: key.to_string(),
            size,
        },
        e => database_error(e),
    }
}

impl LocalMirror for LmdbMirror {
    fn read(&self, key: &str) -> Option<String> {
        match self.try_read(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "local mirror read failed, treating as absent");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| write_error(e, key, value.len()))?;
        self.db
            .put(&mut wtxn, key, value)
            .map_err(|e| write_error(e, key, value.len()))?;
        wtxn.commit().map_err(|e| write_error(e, key, value.len()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut wtxn = self.env.write_txn().map_err(database_error)?;
        self.db.delete(&mut wtxn, key).map_err(database_error)?;
        wtxn.commit().map_err(database_error)
    }
}

// =============================================================================
// Tests
// =============================================================================
