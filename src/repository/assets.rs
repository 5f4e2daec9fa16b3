//! Remote paths and public URLs for uploaded images.

use std::fmt;

use chrono::Utc;

use crate::backend::{encode_path, Revision};

/// Which rendition of a photo an asset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetVariant {
    Original,
    Watermarked,
}

impl AssetVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetVariant::Original => "original",
            AssetVariant::Watermarked => "watermarked",
        }
    }
}

impl std::str::FromStr for AssetVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(AssetVariant::Original),
            "watermarked" => Ok(AssetVariant::Watermarked),
            other => Err(format!("unknown asset variant '{}'", other)),
        }
    }
}

// =============================================================================
// AssetPath
// =============================================================================

/// `images/{category}/{folder}/{variant}/{timestamp}_{index}_{file_name}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPath {
    category: String,
    folder: String,
    variant: AssetVariant,
    timestamp_ms: i64,
    index: u32,
    file_name: String,
}

impl AssetPath {
    /// Build a path stamped with the current time.
    pub fn new(
        category: &str,
        folder: &str,
        variant: AssetVariant,
        index: u32,
        file_name: &str,
    ) -> Self {
        Self {
            category: segment(category),
            folder: segment(folder),
            variant,
            timestamp_ms: Utc::now().timestamp_millis(),
            index,
            file_name: segment(file_name),
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn variant(&self) -> AssetVariant {
        self.variant
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "images/{}/{}/{}/{}_{}_{}",
            self.category,
            self.folder,
            self.variant.as_str(),
            self.timestamp_ms,
            self.index,
            self.file_name
        )
    }
}

/// Keep a user-supplied name inside a single path segment.
fn segment(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

// =============================================================================
// Public URLs
// =============================================================================

/// A stored asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub path: String,
    pub revision: Revision,
    /// Where the asset is publicly served, when a pages URL is known.
    pub url: Option<String>,
}

/// Public URL of `path` under `base_url`, encoding each segment.
pub fn public_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), encode_path(path))
}
