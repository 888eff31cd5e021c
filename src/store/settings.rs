//! Persisted application settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Layout version of the persisted data
pub const DATA_VERSION: u32 = 1;

/// Store self-description and migration bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Application version that last wrote the data
    pub version: String,

    /// When the backup slot was last written
    #[serde(default)]
    pub last_backup: Option<DateTime<Utc>>,

    /// Layout version of the persisted data
    #[serde(default)]
    pub data_version: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: crate::VERSION.to_string(),
            last_backup: None,
            data_version: DATA_VERSION,
        }
    }
}

impl AppSettings {
    /// Bring settings written by an older version up to date.
    ///
    /// Returns `true` if anything changed.
    pub fn upgrade(&mut self) -> bool {
        let mut changed = false;
        if self.data_version < DATA_VERSION {
            self.data_version = DATA_VERSION;
            changed = true;
        }
        if self.version != crate::VERSION {
            self.version = crate::VERSION.to_string();
            changed = true;
        }
        changed
    }
}
