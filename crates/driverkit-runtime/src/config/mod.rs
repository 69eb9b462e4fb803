//! Host settings.
//!
//! Settings describe how the host itself runs (interpreter, section override,
//! extra search directories, naming preset, logging).  They are unrelated to
//! the INI files handed to plugins, which [`crate::ini_file`] reads.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{SettingsError, SettingsResult};
pub use loader::{SETTINGS_ENV_PREFIX, SettingsLoader, load_settings};
pub use schema::{
    DriverkitConfig, HostConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, Preset,
};
