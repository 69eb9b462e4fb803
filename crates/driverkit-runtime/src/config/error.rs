//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading host settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// An explicitly requested settings file does not exist.
    #[error("Settings file not found: {0}")]
    FileNotFound(PathBuf),

    /// The settings file has an extension no enabled format handles.
    #[error("Unsupported or disabled settings file format: .{0}")]
    UnsupportedFormat(String),

    /// The merged sources could not be deserialized.
    #[error("Failed to extract settings: {0}")]
    Extract(#[from] Box<figment::Error>),
}

impl From<figment::Error> for SettingsError {
    fn from(err: figment::Error) -> Self {
        Self::Extract(Box::new(err))
    }
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;
