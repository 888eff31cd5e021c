//! File-backed storage: one JSON file per key inside a directory

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::storage::Storage;
use crate::error::{Error, Result};

const EXTENSION: &str = "json";

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileStorage {
    /// Create a storage rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quota_bytes: None,
        }
    }

    /// Limit the total size of stored values
    #[must_use]
    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{EXTENSION}"))
    }

    /// Total size of stored values, excluding `skip`
    fn used_bytes(&self, skip: &Path) -> Result<u64> {
        let mut used = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path == skip || !is_value_file(&path) {
                continue;
            }
            used += entry.metadata()?.len();
        }
        Ok(used)
    }
}

/// Value files are `<key>.json`; temporaries start with a dot.
fn is_value_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));
    !hidden && path.extension().is_some_and(|ext| ext == EXTENSION)
}

impl Storage for FileStorage {
    fn is_available(&self) -> bool {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            debug!("cannot create storage directory {:?}: {}", self.dir, e);
            return false;
        }
        fs::metadata(&self.dir).is_ok_and(|m| m.is_dir() && !m.permissions().readonly())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);

        if let Some(quota) = self.quota_bytes {
            let needed = self.used_bytes(&path)? + value.len() as u64;
            if needed > quota {
                return Err(Error::QuotaExceeded);
            }
        }

        // Write then rename so the old value stays intact on failure
        let tmp = self.dir.join(format!(".{key}.{EXTENSION}.tmp"));
        let written = fs::write(&tmp, value).and_then(|()| fs::rename(&tmp, &path));
        match written {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                if e.kind() == ErrorKind::StorageFull {
                    Err(Error::QuotaExceeded)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
