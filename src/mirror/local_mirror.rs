//! Local mirror trait and types.

use std::fmt;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when writing to the local mirror.
#[derive(Debug)]
pub enum StorageError {
    /// An I/O error occurred.
    Io(std::io::Error),
    /// Database error (e.g., from LMDB).
    Database(String),
    /// The write would exceed the store's capacity.
    QuotaExceeded { key: String, size: usize },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {}", e),
            StorageError::Database(msg) => write!(f, "database error: {}", msg),
            StorageError::QuotaExceeded { key, size } => {
                write!(f, "storage quota exceeded writing {} bytes to '{}'", size, key)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Database(_) | StorageError::QuotaExceeded { .. } => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Result type for local mirror writes.
pub type Result<T> = std::result::Result<T, StorageError>;

// =============================================================================
// LocalMirror Trait
// =============================================================================

/// Durable, synchronous key to string storage.
///
/// The mirror is the offline source of truth and receives every save before
/// any remote call is attempted. Reads never fail: an unreadable entry is
/// reported as absent.
pub trait LocalMirror: Send + Sync {
    /// Get the value stored under `key`.
    fn read(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
