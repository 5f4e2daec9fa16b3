//! Configuration types for folio-sync.
//!
//! This module defines the structures used to represent application configuration
//! as parsed from an INI-format config file.

use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Primitive Types
// =============================================================================

/// A byte size that can be parsed from strings like "100MB", "1GB", etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSize(pub u64);

/// A duration that can be parsed from strings like "30s", "1500ms", "2m".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationValue(pub Duration);

// =============================================================================
// Config Sections
// =============================================================================

/// [mirror] section - durable local storage.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub path: PathBuf,
    pub map_size: ByteSize,
}

/// [remote] section - content API connection settings.
///
/// Owner, repository and credential are not part of this file; they are
/// kept in the local mirror.
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub api_base: String,
    pub pages_base_url: Option<String>,
    pub read_timeout: DurationValue,
    pub write_timeout: DurationValue,
    pub user_agent: String,
}

/// [cache] section - in-memory collection cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub freshness_window: DurationValue,
}

/// [retry] section - remote write retries.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: DurationValue,
}

/// [log] section - log output.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` wins when set.
    pub filter: String,
    pub json: bool,
}

// =============================================================================
// Top-Level Config
// =============================================================================

/// Complete application configuration as parsed from config file.
#[derive(Debug, Clone)]
pub struct Config {
    pub mirror: MirrorConfig,
    pub remote: RemoteSettings,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub log: LogConfig,
}
