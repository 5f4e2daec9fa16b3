//! Records stored in the portfolio collections.
//!
//! Field names follow the JSON written by the site (camelCase). Fields this
//! crate does not know about are kept in `extra` so a round-trip never drops
//! data written by another client.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A gallery photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Unwatermarked image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
    /// Watermarked copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermarked_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Photo {
    pub fn new(id: impl Into<String>, title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category: category.into(),
            url: None,
            original_url: None,
            watermarked_url: None,
            upload_date: Some(now_rfc3339()),
            last_modified: None,
            file_name: None,
            extra: Map::new(),
        }
    }
}

/// A notebook entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Note {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = now_rfc3339();
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            created_at: Some(now.clone()),
            last_modified: Some(now),
            extra: Map::new(),
        }
    }
}

/// A user-defined gallery category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default = "visible")]
    pub guest_visible: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn visible() -> bool {
    true
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            guest_visible: true,
            extra: Map::new(),
        }
    }
}

/// A folder grouping photos within a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Folder {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            extra: Map::new(),
        }
    }
}

/// Contact handles shown on the about page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wechat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The "about me" profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutInfo {
    #[serde(default)]
    pub name: String,
    /// HTML fragment.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub contacts: Contacts,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AboutInfo {
    fn default() -> Self {
        Self {
            name: "Photographer".to_string(),
            description: "<p>An amateur photographer who loves capturing everyday moments and natural landscapes.</p>".to_string(),
            contacts: Contacts::default(),
            extra: Map::new(),
        }
    }
}
