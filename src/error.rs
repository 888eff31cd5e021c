//! Error types for bunkmate

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage is unavailable")]
    StorageUnavailable,

    #[error("Storage quota exceeded")]
    QuotaExceeded,

    #[error("Corrupt data: {0}")]
    CorruptData(String),

    #[error("Invalid subject: {0}")]
    InvalidSubject(String),

    #[error("No subject matches '{0}'")]
    SubjectNotFound(String),

    #[error("Subject limit reached ({0} subjects)")]
    LimitReached(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a corrupt data error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptData(msg.into())
    }

    /// Create an invalid subject error
    pub fn invalid_subject(msg: impl Into<String>) -> Self {
        Self::InvalidSubject(msg.into())
    }
}
