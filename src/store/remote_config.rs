use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::RemoteTarget;
use crate::mirror::{LocalMirror, StorageError};

/// Mirror key holding the persisted remote settings.
pub const SETTINGS_KEY: &str = "githubConfig";

pub const DEFAULT_BRANCH: &str = "main";

/// Where and as whom remote writes are made.
///
/// Persisted as JSON under [`SETTINGS_KEY`] in the local mirror; the
/// credential is stored under the `token` field.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(rename = "token", default)]
    pub credential: String,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
            credential: String::new(),
        }
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("credential", &if self.credential.is_empty() { "" } else { "***" })
            .finish()
    }
}

impl RemoteConfig {
    /// Create a config for the default branch.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: default_branch(),
            credential: credential.into(),
        }
    }

    /// Use a specific branch. A blank branch falls back to the default.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self.normalized()
    }

    /// Trim fields and restore the default branch if it is blank.
    pub fn normalized(mut self) -> Self {
        self.owner = self.owner.trim().to_string();
        self.repo = self.repo.trim().to_string();
        self.credential = self.credential.trim().to_string();
        self.branch = self.branch.trim().to_string();
        if self.branch.is_empty() {
            self.branch = default_branch();
        }
        self
    }

    /// True iff every field needed for a remote call is present.
    pub fn is_configured(&self) -> bool {
        !self.owner.is_empty()
            && !self.repo.is_empty()
            && !self.branch.is_empty()
            && !self.credential.is_empty()
    }

    /// The wire target for this config.
    pub fn target(&self) -> RemoteTarget {
        RemoteTarget {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            branch: self.branch.clone(),
            credential: self.credential.clone(),
        }
    }

    /// Load the persisted config. A missing or unreadable entry yields the default.
    pub fn load(mirror: &dyn LocalMirror) -> Self {
        let Some(raw) = mirror.read(SETTINGS_KEY) else {
            return Self::default();
        };
        match serde_json::from_str::<RemoteConfig>(&raw) {
            Ok(config) => config.normalized(),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable remote settings");
                Self::default()
            }
        }
    }

    /// Persist this config to the mirror.
    pub fn persist(&self, mirror: &dyn LocalMirror) -> Result<(), StorageError> {
        // Serializing a struct of strings cannot fail.
        let raw = serde_json::to_string(self).unwrap_or_default();
        mirror.write(SETTINGS_KEY, &raw)
    }
}
