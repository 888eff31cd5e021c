//! Configuration management for bunkmate

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::store::{StoreOptions, ValidationMode};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Local storage settings
    pub storage: StorageConfig,

    /// Subject limits enforced by the CLI
    pub limits: LimitsConfig,

    /// Attendance defaults
    pub attendance: AttendanceConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Data directory (default: ~/.local/share/bunkmate)
    pub data_dir: Option<PathBuf>,
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage directory (default: `<data_dir>/storage`)
    pub path: Option<String>,

    /// Prefix for every stored key (letters, digits, `-` and `_`)
    pub namespace: String,

    /// Maximum bytes of stored data (none = unlimited)
    pub quota_bytes: Option<u64>,

    /// Reject records that are well-typed but inconsistent
    /// (attended > total, threshold above 100, blank name)
    pub strict_validation: bool,
}

/// Limits on the subject collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum number of subjects (0 = unlimited)
    pub max_subjects: usize,
}

/// Attendance defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    /// Minimum attendance percentage used when none is given
    pub default_minimum: u8,
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            data_dir: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            namespace: "bunkmate".to_string(),
            quota_bytes: None,
            strict_validation: true,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_subjects: 2 }
    }
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            default_minimum: crate::subject::DEFAULT_MINIMUM_ATTENDANCE,
        }
    }
}

impl StorageConfig {
    /// Store options derived from this configuration
    #[must_use]
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            namespace: self.namespace.clone(),
            validation: if self.strict_validation {
                ValidationMode::Strict
            } else {
                ValidationMode::Lenient
            },
        }
    }
}

impl LimitsConfig {
    /// The subject cap, if any
    #[must_use]
    pub const fn subject_cap(&self) -> Option<usize> {
        if self.max_subjects == 0 {
            None
        } else {
            Some(self.max_subjects)
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::config("Could not determine config directory"))?;
        Ok(config_dir.join(crate::APP_NAME).join("config.toml"))
    }

    /// Get the data directory
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.general.data_dir {
            Ok(dir.clone())
        } else {
            let data_dir = dirs::data_local_dir()
                .ok_or_else(|| Error::config("Could not determine data directory"))?;
            Ok(data_dir.join(crate::APP_NAME))
        }
    }

    /// Get the storage directory
    pub fn storage_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.storage.path {
            return Ok(PathBuf::from(path));
        }
        Ok(self.data_dir()?.join("storage"))
    }

    /// Validate configuration values.
    ///
    /// Call this after loading to ensure all values are within acceptable ranges.
    pub fn validate(&self) -> Result<()> {
        if self.attendance.default_minimum > 100 {
            return Err(Error::config(format!(
                "default_minimum must be between 0 and 100, got {}",
                self.attendance.default_minimum
            )));
        }

        if self.storage.namespace.trim().is_empty() {
            return Err(Error::config("storage namespace must not be empty"));
        }

        // Stored keys become file names
        let namespace_ok = self
            .storage
            .namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !namespace_ok {
            return Err(Error::config(format!(
                "storage namespace may only contain letters, digits, '-' and '_', got '{}'",
                self.storage.namespace
            )));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "log_level must be one of {:?}, got '{}'",
                valid_levels, self.general.log_level
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.limits.subject_cap(), Some(2));
        assert_eq!(config.attendance.default_minimum, 75);
        assert_eq!(
            config.storage.store_options().validation,
            ValidationMode::Strict
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [limits]
            max_subjects = 0

            [storage]
            strict_validation = false
            "#,
        )
        .unwrap();

        assert_eq!(config.limits.subject_cap(), None);
        assert_eq!(config.storage.namespace, "bunkmate");
        assert_eq!(
            config.storage.store_options().validation,
            ValidationMode::Lenient
        );
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.attendance.default_minimum = 120;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.general.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.namespace = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_namespace_is_file_name_safe() {
        for bad in ["term/2", "..", "a.b", r"x\y", "../up", "with space"] {
            let mut config = Config::default();
            config.storage.namespace = bad.to_string();
            assert!(
                matches!(config.validate(), Err(Error::Config(_))),
                "namespace {bad:?} should be rejected"
            );
        }

        let mut config = Config::default();
        config.storage.namespace = "term-2_b".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_storage_path_override() {
        let mut config = Config::default();
        config.storage.path = Some("/tmp/bunkmate-test".to_string());
        assert_eq!(
            config.storage_path().unwrap(),
            PathBuf::from("/tmp/bunkmate-test")
        );

        config.storage.path = None;
        config.general.data_dir = Some(PathBuf::from("/tmp/data"));
        assert_eq!(
            config.storage_path().unwrap(),
            PathBuf::from("/tmp/data/storage")
        );
    }
}
