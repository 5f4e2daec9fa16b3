use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::local_mirror::{LocalMirror, Result, StorageError};

/// An in-memory `LocalMirror`, intended primarily for testing.
///
/// An optional quota bounds the total bytes of keys and values, mimicking
/// the fixed storage budget of a browser profile.
#[derive(Default)]
pub struct MemoryMirror {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryMirror {
    /// Create a new empty mirror without a quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty mirror holding at most `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota: Some(quota),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LocalMirror for MemoryMirror {
    fn read(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries();
        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if others + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    size: value.len(),
                });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_remove() {
        let mirror = MemoryMirror::new();
        assert!(mirror.read("k").is_none());

        mirror.write("k", "v1").unwrap();
        mirror.write("k", "v2").unwrap();
        assert_eq!(mirror.read("k").as_deref(), Some("v2"));

        mirror.remove("k").unwrap();
        assert!(mirror.read("k").is_none());
    }

    #[test]
    fn test_quota_counts_replacement_once() {
        let mirror = MemoryMirror::with_quota(10);
        mirror.write("k", "12345").unwrap();
        // Replacing the same key only counts the new value
        mirror.write("k", "123456789").unwrap();

        let result = mirror.write("other", "123");
        assert!(matches!(result, Err(StorageError::QuotaExceeded { .. })));
        assert_eq!(mirror.read("k").as_deref(), Some("123456789"));
        assert!(mirror.read("other").is_none());
    }
}
