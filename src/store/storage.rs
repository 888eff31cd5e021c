//! Key-value storage capability and the in-memory backend

use std::collections::HashMap;

use crate::error::{Error, Result};

/// String-keyed, string-valued storage supplied by the host.
///
/// `set` replaces the whole value; readers never observe a partial write.
pub trait Storage {
    /// Probe whether the storage can currently be used
    fn is_available(&self) -> bool;

    /// Read a value, `None` if the key is absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value. Fails with [`Error::QuotaExceeded`] when there is no room.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key succeeds.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory storage with an optional size quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
    quota_bytes: Option<usize>,
    unavailable: bool,
}

impl MemoryStorage {
    /// Create an empty, unlimited storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty storage holding at most `quota_bytes` of values
    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Create a storage that fails every probe and operation
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Change the quota. Existing values are kept even if they exceed it.
    pub fn set_quota(&mut self, quota_bytes: Option<usize>) {
        self.quota_bytes = quota_bytes;
    }

    /// Total length of all stored values
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.values.values().map(String::len).sum()
    }

    /// Whether a key is present
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.unavailable {
            return Err(Error::StorageUnavailable);
        }
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.unavailable {
            return Err(Error::StorageUnavailable);
        }

        if let Some(quota) = self.quota_bytes {
            let replaced = self.values.get(key).map_or(0, String::len);
            let needed = self.used_bytes() - replaced + value.len();
            if needed > quota {
                return Err(Error::QuotaExceeded);
            }
        }

        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.unavailable {
            return Err(Error::StorageUnavailable);
        }
        self.values.remove(key);
        Ok(())
    }
}
