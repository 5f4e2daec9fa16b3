//! Configuration file reading and parsing.
//!
//! This module handles locating, reading, and parsing INI-format configuration files,
//! with support for layered overrides.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use configparser::ini::Ini;
use thiserror::Error;

use crate::backend::DEFAULT_API_BASE;
use crate::caches::DEFAULT_FRESHNESS_WINDOW;
use crate::mirror::DEFAULT_MAP_SIZE;
use crate::repository::{DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};
use crate::store::{DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT};

use super::{
    ByteSize, CacheConfig, Config, DurationValue, LogConfig, MirrorConfig, RemoteSettings,
    RetryConfig,
};

// =============================================================================
// Constants - Default Values
// =============================================================================

const DEFAULT_MIRROR_DIR: &str = ".folio-sync/mirror";
const FALLBACK_MIRROR_PATH: &str = "/tmp/folio-sync/mirror";
const DEFAULT_USER_AGENT: &str = "folio-sync";
const DEFAULT_LOG_FILTER: &str = "info";

const ENV_CONFIG_FILE: &str = "FOLIO_CONFIG_FILE";
const DEFAULT_CONFIG_FILENAME: &str = ".foliosync";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid byte size '{value}': {message}")]
    InvalidByteSize { value: String, message: String },

    #[error("invalid duration '{value}': {message}")]
    InvalidDuration { value: String, message: String },

    #[error("invalid integer '{value}': {source}")]
    InvalidInteger {
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("invalid boolean '{value}' for key '{key}'")]
    InvalidBoolean { key: String, value: String },

    #[error("invalid override key '{key}': {message}")]
    InvalidOverrideKey { key: String, message: String },
}

/// Result type for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// =============================================================================
// ConfigSource
// =============================================================================

/// Specifies how to locate and layer configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// Explicit config file path from CLI. If specified and doesn't exist, error.
    /// If None, fall back to FOLIO_CONFIG_FILE env var, then ~/.foliosync.
    pub config_file: Option<PathBuf>,

    /// Additional override config file (layered on top of base config).
    pub override_file: Option<PathBuf>,

    /// Individual key=value overrides (applied last).
    /// Keys use dot-notation: "mirror.path", "remote.read_timeout"
    pub overrides: Vec<(String, String)>,
}

// =============================================================================
// ByteSize / Duration Parsing
// =============================================================================

/// Split "100MB" into (100, "MB").
fn split_number(s: &str) -> Option<(u64, String)> {
    let num_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if num_end == 0 {
        return None;
    }
    let base = s[..num_end].parse().ok()?;
    Some((base, s[num_end..].trim().to_lowercase()))
}

impl ByteSize {
    /// Parse a byte size from a string like "100MB", "1GB", "500KB", or plain "1024".
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = |message: &str| ConfigError::InvalidByteSize {
            value: s.to_string(),
            message: message.to_string(),
        };
        if s.is_empty() {
            return Err(invalid("empty string"));
        }
        let (base, suffix) = split_number(s).ok_or_else(|| invalid("no numeric value"))?;

        let multiplier: u64 = match suffix.as_str() {
            "" | "b" => 1,
            "k" | "kb" => 1024,
            "m" | "mb" => 1024 * 1024,
            "g" | "gb" => 1024 * 1024 * 1024,
            _ => return Err(invalid(&format!("unknown suffix '{}'", suffix))),
        };

        Ok(ByteSize(base.saturating_mul(multiplier)))
    }
}

impl DurationValue {
    /// Parse a duration from "1500ms", "30s", "2m", or plain seconds "30".
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = |message: &str| ConfigError::InvalidDuration {
            value: s.to_string(),
            message: message.to_string(),
        };
        if s.is_empty() {
            return Err(invalid("empty string"));
        }
        let (base, suffix) = split_number(s).ok_or_else(|| invalid("no numeric value"))?;

        let duration = match suffix.as_str() {
            "ms" => Duration::from_millis(base),
            "" | "s" => Duration::from_secs(base),
            "m" | "min" => Duration::from_secs(base.saturating_mul(60)),
            _ => return Err(invalid(&format!("unknown unit '{}'", suffix))),
        };
        Ok(DurationValue(duration))
    }
}

fn parse_bool_value(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBoolean {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_u32_value(value: &str) -> Result<u32> {
    value.trim().parse().map_err(|e| ConfigError::InvalidInteger {
        value: value.to_string(),
        source: e,
    })
}

/// Expand a leading `~/` to the home directory.
fn expand_path(value: &str) -> PathBuf {
    match (value.strip_prefix("~/"), home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(value),
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

// =============================================================================
// Config File Resolution
// =============================================================================

/// Information about how the config file was resolved.
#[derive(Debug)]
pub struct ResolvedConfigFile {
    /// The path to the config file, if one was found.
    pub path: Option<PathBuf>,
    /// Warning message if env var pointed to nonexistent file.
    pub warning: Option<String>,
}

/// Resolve which config file to use based on the ConfigSource and environment.
fn resolve_config_file(source: &ConfigSource) -> Result<ResolvedConfigFile> {
    // If explicit path provided, it must exist
    if let Some(ref path) = source.config_file {
        if path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(path.clone()),
                warning: None,
            });
        } else {
            return Err(ConfigError::FileNotFound(path.clone()));
        }
    }

    if let Ok(env_path) = env::var(ENV_CONFIG_FILE) {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(path),
                warning: None,
            });
        } else {
            // Warn but continue with defaults
            return Ok(ResolvedConfigFile {
                path: None,
                warning: Some(format!(
                    "config file specified by {} does not exist: {}",
                    ENV_CONFIG_FILE, env_path
                )),
            });
        }
    }

    if let Some(home) = home_dir() {
        let default_path = home.join(DEFAULT_CONFIG_FILENAME);
        if default_path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(default_path),
                warning: None,
            });
        }
    }

    Ok(ResolvedConfigFile {
        path: None,
        warning: None,
    })
}

/// Get the user's home directory.
fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME").map(PathBuf::from)
}

// =============================================================================
// Default Config
// =============================================================================

fn default_mirror_path() -> PathBuf {
    home_dir()
        .map(|home| home.join(DEFAULT_MIRROR_DIR))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_MIRROR_PATH))
}

/// Create a Config with all default values.
fn default_config() -> Config {
    Config {
        mirror: MirrorConfig {
            path: default_mirror_path(),
            map_size: ByteSize(DEFAULT_MAP_SIZE as u64),
        },
        remote: RemoteSettings {
            api_base: DEFAULT_API_BASE.to_string(),
            pages_base_url: None,
            read_timeout: DurationValue(DEFAULT_READ_TIMEOUT),
            write_timeout: DurationValue(DEFAULT_WRITE_TIMEOUT),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        },
        cache: CacheConfig {
            freshness_window: DurationValue(DEFAULT_FRESHNESS_WINDOW),
        },
        retry: RetryConfig {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DurationValue(DEFAULT_BASE_DELAY),
        },
        log: LogConfig {
            filter: DEFAULT_LOG_FILTER.to_string(),
            json: false,
        },
    }
}

// =============================================================================
// Applying Values
// =============================================================================

/// Set `section.param` on the config. Shared by INI files and CLI overrides.
fn apply_value(config: &mut Config, section: &str, param: &str, value: &str) -> Result<()> {
    match (section, param) {
        ("mirror", "path") => config.mirror.path = expand_path(value.trim()),
        ("mirror", "map_size") => config.mirror.map_size = ByteSize::parse(value)?,

        ("remote", "api_base") => config.remote.api_base = value.trim().to_string(),
        ("remote", "pages_base_url") => config.remote.pages_base_url = optional(value),
        ("remote", "read_timeout") => config.remote.read_timeout = DurationValue::parse(value)?,
        ("remote", "write_timeout") => config.remote.write_timeout = DurationValue::parse(value)?,
        ("remote", "user_agent") => config.remote.user_agent = value.trim().to_string(),

        ("cache", "freshness_window") => {
            config.cache.freshness_window = DurationValue::parse(value)?
        }

        ("retry", "max_attempts") => config.retry.max_attempts = parse_u32_value(value)?,
        ("retry", "base_delay") => config.retry.base_delay = DurationValue::parse(value)?,

        ("log", "filter") => config.log.filter = value.trim().to_string(),
        ("log", "json") => config.log.json = parse_bool_value(param, value)?,

        _ => {
            return Err(ConfigError::InvalidOverrideKey {
                key: format!("{}.{}", section, param),
                message: "unknown parameter".to_string(),
            })
        }
    }
    Ok(())
}

/// Apply an INI file's contents to a Config, layering on top of existing values.
///
/// Unknown sections and keys are ignored so a newer config file still loads.
fn apply_ini_to_config(config: &mut Config, ini: &Ini) -> Result<()> {
    let map = ini.get_map_ref();
    for (section, values) in map {
        for (param, value) in values {
            let Some(value) = value else { continue };
            match apply_value(config, section, param, value) {
                Err(ConfigError::InvalidOverrideKey { key, .. }) => {
                    tracing::debug!(%key, "ignoring unknown config key");
                }
                other => other?,
            }
        }
    }
    Ok(())
}

/// Load and parse an INI file.
fn load_ini(path: &Path) -> Result<Ini> {
    let mut ini = Ini::new();
    ini.load(path).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e,
    })?;
    Ok(ini)
}

// =============================================================================
// Override Application
// =============================================================================

/// Apply a single key=value override to the config.
fn apply_override(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key.split_once('.') {
        Some((section, param)) => apply_value(config, section, param, value),
        None => Err(ConfigError::InvalidOverrideKey {
            key: key.to_string(),
            message: "unrecognized key format".to_string(),
        }),
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

/// Result of reading configuration, including any warnings.
#[derive(Debug)]
pub struct ConfigResult {
    /// The parsed configuration.
    pub config: Config,
    /// Any warnings generated during config loading.
    pub warnings: Vec<String>,
}

/// Read and parse configuration from the specified sources.
///
/// Configuration is layered in this order:
/// 1. Built-in defaults
/// 2. Base config file (from CLI, env var, or ~/.foliosync)
/// 3. Override config file (if specified)
/// 4. Individual overrides (applied last)
pub fn read_config(source: &ConfigSource) -> Result<ConfigResult> {
    let mut warnings = Vec::new();

    let mut config = default_config();

    let resolved = resolve_config_file(source)?;
    if let Some(warning) = resolved.warning {
        warnings.push(warning);
    }
    if let Some(ref path) = resolved.path {
        let ini = load_ini(path)?;
        apply_ini_to_config(&mut config, &ini)?;
    }

    if let Some(ref override_path) = source.override_file {
        if !override_path.exists() {
            return Err(ConfigError::FileNotFound(override_path.clone()));
        }
        let ini = load_ini(override_path)?;
        apply_ini_to_config(&mut config, &ini)?;
    }

    for (key, value) in &source.overrides {
        apply_override(&mut config, key, value)?;
    }

    Ok(ConfigResult { config, warnings })
}

// =============================================================================
// Tests
// =============================================================================
