//! Error types for repository operations.

use crate::backend::RemoteError;
use crate::collections::CodecError;
use crate::mirror::StorageError;

/// Error type for repository operations.
///
/// Collection saves only fail with `Storage` or `Codec`; remote failures
/// there are reported through [`super::SaveReport`]. Asset operations have
/// no local fallback and return `Remote` errors directly.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The mandatory local write failed.
    #[error("local storage error: {0}")]
    Storage(#[from] StorageError),

    /// Remote error.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// The value is not valid for the collection.
    #[error("invalid collection value: {0}")]
    Codec(#[from] CodecError),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
