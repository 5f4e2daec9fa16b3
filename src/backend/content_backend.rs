use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Revision token of a remote file (the git blob SHA on GitHub).
pub type Revision = String;

/// Addresses a single repository branch on the content host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub credential: String,
}

/// A file as it travels over the wire: content is base64 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireFile {
    pub path: String,
    pub content: String,
    pub revision: Revision,
}

/// Body of a create-or-update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutRequest {
    pub message: String,
    /// Base64-encoded file content.
    pub content: String,
    /// Required when updating an existing file; absent means "create".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<Revision>,
    pub branch: String,
}

/// Body of a delete request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteRequest {
    pub message: String,
    pub sha: Revision,
    pub branch: String,
}

/// Summary of the hosting repository, as returned by a connection check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub full_name: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub private: bool,
}

// =============================================================================
// Paths
// =============================================================================

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode each segment of a slash-separated path. Empty segments are dropped.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| percent_encode(segment.as_bytes(), URI_COMPONENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors from remote content operations.
///
/// Retry decisions are made on the variant, never on the message text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Owner, repository or credential is missing.
    #[error("remote store is not configured")]
    NotConfigured,

    /// Network failure or an unexpected status code.
    #[error("transport error{}: {message}", status_suffix(.status))]
    Transport { status: Option<u16>, message: String },

    /// The operation exceeded its time bound and was cancelled.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The expected revision did not match the current remote revision.
    #[error("revision conflict on {path}")]
    Conflict { path: String },

    /// The credential lacks the required scope.
    #[error("permission denied for {path}: {message}")]
    Permission { path: String, message: String },

    /// The host is temporarily unavailable.
    #[error("service unavailable (status {status})")]
    ServiceUnavailable { status: u16 },

    /// The remote returned content that could not be decoded.
    #[error("invalid content at {path}: {message}")]
    InvalidContent { path: String, message: String },

    /// A delete was requested without a revision token.
    #[error("refusing to delete {path} without a revision")]
    MissingRevision { path: String },
}

impl RemoteError {
    /// Map a non-success HTTP status to the error taxonomy.
    ///
    /// 404 is not handled here: reads turn it into `Ok(None)` before
    /// reaching this point, and for writes it is a plain transport error.
    pub fn from_status(status: u16, path: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            409 => RemoteError::Conflict {
                path: path.to_string(),
            },
            401 | 403 => RemoteError::Permission {
                path: path.to_string(),
                message,
            },
            502..=504 => RemoteError::ServiceUnavailable { status },
            _ => RemoteError::Transport {
                status: Some(status),
                message,
            },
        }
    }

    /// Whether a write that failed with this error may be retried after
    /// re-reading the revision.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteError::Conflict { .. } | RemoteError::ServiceUnavailable { .. }
        )
    }

    /// Whether this is a transport-level failure (timeouts included).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RemoteError::Transport { .. }
                | RemoteError::Timeout { .. }
                | RemoteError::ServiceUnavailable { .. }
        )
    }

    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Transport { status, .. } => *status,
            RemoteError::Conflict { .. } => Some(409),
            RemoteError::Permission { .. } => Some(403),
            RemoteError::ServiceUnavailable { status } => Some(*status),
            _ => None,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {})", s)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, RemoteError>;

// =============================================================================
// ContentBackend Trait
// =============================================================================

/// Wire-level access to a hosted content API.
///
/// Implementations are stateless with respect to the target: every call
/// names the owner/repo/branch and carries the credential. Content is
/// exchanged as base64 text; encoding decisions belong to the caller.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Fetch a file. Returns `Ok(None)` if the path does not exist.
    async fn get_file(&self, target: &RemoteTarget, path: &str) -> Result<Option<WireFile>>;

    /// Current revision of a file, without requiring its content to be
    /// inlined. Works for files too large to fetch with `get_file`.
    async fn get_revision(&self, target: &RemoteTarget, path: &str) -> Result<Option<Revision>>;

    /// Create or update a file, returning the stored file with its new revision.
    async fn put_file(&self, target: &RemoteTarget, path: &str, req: &PutRequest)
        -> Result<WireFile>;

    /// Delete a file at the given revision.
    async fn delete_file(&self, target: &RemoteTarget, path: &str, req: &DeleteRequest)
        -> Result<()>;

    /// Fetch repository metadata; used to verify target and credential.
    async fn repository_info(&self, target: &RemoteTarget) -> Result<RepositoryInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path_keeps_separators() {
        assert_eq!(
            encode_path("/images/n/f/original/1_0_what?.jpg"),
            "images/n/f/original/1_0_what%3F.jpg"
        );
        assert_eq!(encode_path("a#b/100%.png"), "a%23b/100%25.png");
        assert_eq!(encode_path("data/photos.json"), "data/photos.json");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            RemoteError::from_status(409, "data/a.json", "conflict"),
            RemoteError::Conflict {
                path: "data/a.json".to_string()
            }
        );
        assert!(matches!(
            RemoteError::from_status(403, "p", "forbidden"),
            RemoteError::Permission { .. }
        ));
        assert!(matches!(
            RemoteError::from_status(401, "p", "bad credentials"),
            RemoteError::Permission { .. }
        ));
        assert_eq!(
            RemoteError::from_status(503, "p", "down"),
            RemoteError::ServiceUnavailable { status: 503 }
        );
        assert_eq!(
            RemoteError::from_status(422, "p", "invalid"),
            RemoteError::Transport {
                status: Some(422),
                message: "invalid".to_string()
            }
        );
    }

    #[test]
    fn test_retry_classification() {
        assert!(RemoteError::Conflict { path: "p".into() }.is_retryable());
        assert!(RemoteError::ServiceUnavailable { status: 502 }.is_retryable());
        assert!(!RemoteError::Permission {
            path: "p".into(),
            message: String::new()
        }
        .is_retryable());

        let timeout = RemoteError::Timeout {
            operation: "read",
            after: Duration::from_secs(30),
        };
        assert!(timeout.is_transport());
        assert!(!timeout.is_retryable());
    }

    #[test]
    fn test_put_request_omits_missing_sha() {
        let req = PutRequest {
            message: "m".to_string(),
            content: "e30=".to_string(),
            sha: None,
            branch: "main".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("sha").is_none());
        assert_eq!(json["branch"], "main");
    }
}
