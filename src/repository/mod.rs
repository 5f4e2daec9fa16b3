//! Collection reads and saves, asset uploads and the retry policy behind them.

mod assets;
mod collection_repository;
mod error;
mod retry;

pub use assets::{public_url, AssetPath, AssetVariant, UploadedAsset};
pub use collection_repository::{CollectionRepository, CollectionStatus, SaveReport, SyncStatus};
pub use error::{RepositoryError, Result};
pub use retry::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};
