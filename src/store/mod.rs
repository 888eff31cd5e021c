//! Local subject store
//!
//! Persists the subject collection and application settings to a key-value
//! [`Storage`]. Every write first copies the current collection into a backup
//! slot, so the backup always lags one generation behind and a corrupt
//! collection can be recovered from the previous write.
//!
//! Failures never escape as panics: reads degrade to an empty collection,
//! writes report failure to the caller.

mod file;
mod settings;
mod storage;
mod validate;

pub use file::FileStorage;
pub use settings::{AppSettings, DATA_VERSION};
pub use storage::{MemoryStorage, Storage};
pub use validate::{validate_record, validate_records, validate_subject};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::subject::Subject;

/// Logical key of the subject collection
pub const SUBJECTS_KEY: &str = "subjects";

/// Logical key of the backup slot
pub const BACKUP_KEY: &str = "subjects_backup";

/// Logical key of the application settings
pub const SETTINGS_KEY: &str = "settings";

/// How strictly stored records are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Shape, types, and counter/threshold invariants
    #[default]
    Strict,
    /// Shape and types only
    Lenient,
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Prefix for every stored key
    pub namespace: String,
    pub validation: ValidationMode,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            namespace: crate::APP_NAME.to_string(),
            validation: ValidationMode::Strict,
        }
    }
}

/// Contents of the backup slot
#[derive(Debug, Serialize, Deserialize)]
struct BackupRecord {
    subjects: Vec<Value>,
    timestamp: DateTime<Utc>,
    version: String,
}

/// Exported snapshot, re-importable with [`SubjectStore::import_snapshot`]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportSnapshot<'a> {
    subjects: &'a [Subject],
    settings: &'a AppSettings,
    export_date: DateTime<Utc>,
    version: &'static str,
}

/// Result of reading the raw collection
#[derive(Debug)]
enum ReadOutcome {
    Missing,
    Parsed(Vec<Value>),
    Malformed(String),
}

/// Validated persistence of subjects with one-level backup and recovery.
#[derive(Debug)]
pub struct SubjectStore<S: Storage> {
    storage: S,
    options: StoreOptions,
    settings: Option<AppSettings>,
}

impl<S: Storage> SubjectStore<S> {
    /// Create a store over `storage`. Nothing is read until first use.
    pub const fn new(storage: S, options: StoreOptions) -> Self {
        Self {
            storage,
            options,
            settings: None,
        }
    }

    /// Underlying storage
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Underlying storage, mutably
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn key(&self, name: &str) -> String {
        format!("{}_{}", self.options.namespace, name)
    }

    /// Load all valid subjects.
    ///
    /// Invalid records are dropped and the cleaned collection written back.
    /// A corrupt collection is replaced by the backup when one is readable.
    /// Returns an empty collection if nothing can be recovered.
    pub fn load(&mut self) -> Vec<Subject> {
        if !self.storage.is_available() {
            warn!("Storage unavailable, starting with no subjects");
            return Vec::new();
        }
        self.ensure_settings();

        match self.read_collection() {
            ReadOutcome::Missing => Vec::new(),
            ReadOutcome::Parsed(records) => {
                let read = records.len();
                let subjects = validate_records(records, self.options.validation);
                let dropped = read - subjects.len();
                if dropped > 0 {
                    warn!("Dropped {} invalid subject record(s)", dropped);
                    if let Err(e) = self.write_collection(&subjects) {
                        warn!("Failed to write cleaned subjects: {}", e);
                    }
                }
                subjects
            }
            ReadOutcome::Malformed(reason) => {
                warn!("Stored subjects are corrupt ({}), trying backup", reason);
                if let Some(subjects) = self.restore_from_backup() {
                    info!("Restored {} subject(s) from backup", subjects.len());
                    if let Err(e) = self.write_collection(&subjects) {
                        warn!("Failed to write restored subjects: {}", e);
                    }
                    subjects
                } else {
                    error!("No usable backup, starting with no subjects");
                    Vec::new()
                }
            }
        }
    }

    /// Save subjects, returning whether the write took effect.
    ///
    /// Callers must not treat the change as applied when this returns `false`.
    pub fn save(&mut self, subjects: &[Subject]) -> bool {
        match self.try_save(subjects) {
            Ok(_) => true,
            Err(e) => {
                error!("Failed to save subjects: {}", e);
                false
            }
        }
    }

    /// Save subjects, returning the number of records written.
    ///
    /// Invalid subjects are skipped. The current collection is copied to the
    /// backup slot first. If the write exceeds the storage quota, the backup
    /// is evicted and the write retried once.
    pub fn try_save(&mut self, subjects: &[Subject]) -> Result<usize> {
        if !self.storage.is_available() {
            return Err(Error::StorageUnavailable);
        }
        self.ensure_settings();

        let mode = self.options.validation;
        let valid: Vec<Subject> = subjects
            .iter()
            .filter(|subject| {
                let ok = validate_subject(subject, mode);
                if !ok {
                    warn!("Skipping invalid subject {} ({})", subject.id, subject.name);
                }
                ok
            })
            .cloned()
            .collect();

        self.rotate_backup();

        match self.write_collection(&valid) {
            Ok(()) => {}
            Err(Error::QuotaExceeded) => {
                warn!("Storage quota exceeded, evicting backup and retrying");
                self.evict_backup();
                self.write_collection(&valid)?;
            }
            Err(e) => return Err(e),
        }

        debug!("Saved {} subject(s)", valid.len());
        Ok(valid.len())
    }

    /// Read the backup slot, if it holds a usable collection.
    pub fn restore_from_backup(&self) -> Option<Vec<Subject>> {
        if !self.storage.is_available() {
            return None;
        }

        let raw = match self.storage.get(&self.key(BACKUP_KEY)) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No backup present");
                return None;
            }
            Err(e) => {
                warn!("Failed to read backup: {}", e);
                return None;
            }
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Backup is not valid JSON: {}", e);
                return None;
            }
        };

        let Some(Value::Array(records)) = value.get("subjects").cloned() else {
            warn!("Backup has no subjects array");
            return None;
        };

        Some(validate_records(records, self.options.validation))
    }

    /// Serialize subjects and settings as pretty JSON for manual backup.
    pub fn export_snapshot(&mut self) -> Result<String> {
        let subjects = self.load();
        let settings = self.settings();
        let snapshot = ExportSnapshot {
            subjects: &subjects,
            settings: &settings,
            export_date: Utc::now(),
            version: crate::VERSION,
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Import an exported snapshot, returning whether it was saved.
    pub fn import_snapshot(&mut self, text: &str) -> bool {
        match self.try_import(text) {
            Ok(count) => {
                info!("Imported {} subject(s)", count);
                true
            }
            Err(e) => {
                error!("Failed to import snapshot: {}", e);
                false
            }
        }
    }

    /// Import an exported snapshot, returning the number of subjects saved.
    ///
    /// The snapshot must be an object with a `subjects` array. Invalid
    /// records are skipped; the rest replace the stored collection.
    pub fn try_import(&mut self, text: &str) -> Result<usize> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::corrupt(format!("snapshot is not valid JSON: {e}")))?;

        let Some(Value::Array(records)) = value.get("subjects").cloned() else {
            return Err(Error::corrupt("snapshot has no subjects array"));
        };

        let read = records.len();
        let subjects = validate_records(records, self.options.validation);
        if subjects.len() < read {
            warn!(
                "Skipping {} invalid record(s) in snapshot",
                read - subjects.len()
            );
        }

        self.try_save(&subjects)
    }

    /// Remove subjects, backup, and settings.
    pub fn clear_all(&mut self) {
        for name in [SUBJECTS_KEY, BACKUP_KEY, SETTINGS_KEY] {
            let key = self.key(name);
            if let Err(e) = self.storage.remove(&key) {
                warn!("Failed to remove {}: {}", key, e);
            }
        }
        self.settings = None;
        info!("Cleared all stored data");
    }

    /// Current settings, initialized on first access.
    pub fn settings(&mut self) -> AppSettings {
        if self.storage.is_available() {
            self.ensure_settings();
        }
        self.settings.clone().unwrap_or_default()
    }

    fn read_collection(&self) -> ReadOutcome {
        let raw = match self.storage.get(&self.key(SUBJECTS_KEY)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return ReadOutcome::Missing,
            Err(e) => return ReadOutcome::Malformed(e.to_string()),
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(records)) => ReadOutcome::Parsed(records),
            Ok(_) => ReadOutcome::Malformed("top level is not an array".to_string()),
            Err(e) => ReadOutcome::Malformed(e.to_string()),
        }
    }

    fn write_collection(&mut self, subjects: &[Subject]) -> Result<()> {
        let payload = serde_json::to_string(subjects)?;
        let key = self.key(SUBJECTS_KEY);
        self.storage.set(&key, &payload)
    }

    /// Copy the current collection into the backup slot.
    fn rotate_backup(&mut self) {
        let subjects = match self.read_collection() {
            ReadOutcome::Parsed(records) => records,
            ReadOutcome::Missing => return,
            ReadOutcome::Malformed(reason) => {
                warn!("Not backing up corrupt subjects: {}", reason);
                return;
            }
        };

        let timestamp = Utc::now();
        let backup = BackupRecord {
            subjects,
            timestamp,
            version: crate::VERSION.to_string(),
        };
        let payload = match serde_json::to_string(&backup) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize backup: {}", e);
                return;
            }
        };

        let key = self.key(BACKUP_KEY);
        match self.storage.set(&key, &payload) {
            Ok(()) => {
                if let Some(settings) = self.settings.as_mut() {
                    settings.last_backup = Some(timestamp);
                }
                self.persist_settings();
            }
            Err(Error::QuotaExceeded) => {
                warn!("No room for a backup, evicting the old one");
                self.evict_backup();
            }
            Err(e) => warn!("Failed to write backup: {}", e),
        }
    }

    fn evict_backup(&mut self) {
        let key = self.key(BACKUP_KEY);
        if let Err(e) = self.storage.remove(&key) {
            warn!("Failed to evict backup: {}", e);
            return;
        }

        let had_backup = self
            .settings
            .as_mut()
            .is_some_and(|settings| settings.last_backup.take().is_some());
        if had_backup {
            self.persist_settings();
        }
    }

    fn ensure_settings(&mut self) {
        if self.settings.is_some() {
            return;
        }

        let (settings, dirty) = match self.storage.get(&self.key(SETTINGS_KEY)) {
            Ok(Some(raw)) => match serde_json::from_str::<AppSettings>(&raw) {
                Ok(mut settings) => {
                    let upgraded = settings.upgrade();
                    if upgraded {
                        info!("Upgraded settings to data version {}", DATA_VERSION);
                    }
                    (settings, upgraded)
                }
                Err(e) => {
                    warn!("Stored settings are corrupt ({}), using defaults", e);
                    (AppSettings::default(), true)
                }
            },
            Ok(None) => (AppSettings::default(), true),
            Err(e) => {
                warn!("Failed to read settings: {}", e);
                (AppSettings::default(), false)
            }
        };

        self.settings = Some(settings);
        if dirty {
            self.persist_settings();
        }
    }

    fn persist_settings(&mut self) {
        let key = self.key(SETTINGS_KEY);
        let Some(settings) = self.settings.as_ref() else {
            return;
        };

        let result = serde_json::to_string(settings)
            .map_err(Error::from)
            .and_then(|payload| self.storage.set(&key, &payload));
        if let Err(e) = result {
            warn!("Failed to persist settings: {}", e);
        }
    }
}
