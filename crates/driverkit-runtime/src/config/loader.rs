//! Settings loader using figment.
//!
//! # Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. `driverkit.toml` (feature `toml-config`), or an explicit file
//! 3. Environment variables (`DRIVERKIT_*`)
//! 4. Programmatic overrides
//!
//! Files are searched in the current directory, then in
//! `{config_dir}/driverkit`; the first one found is used.
//!
//! # Environment variable mapping
//!
//! `__` separates nesting levels:
//!
//! - `DRIVERKIT_HOST__PRESET=metadata-db` → `host.preset = "metadata-db"`
//! - `DRIVERKIT_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//!
//! # Example
//!
//! ```rust,ignore
//! use driverkit_runtime::config::SettingsLoader;
//!
//! let settings = SettingsLoader::new()
//!     .file("./driverkit.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace};

use super::error::{SettingsError, SettingsResult};
use super::schema::DriverkitConfig;

/// Prefix of settings environment variables.
pub const SETTINGS_ENV_PREFIX: &str = "DRIVERKIT_";

#[cfg(feature = "toml-config")]
const SETTINGS_FILE_NAME: &str = "driverkit.toml";

/// Layered settings loader.
pub struct SettingsLoader {
    figment: Figment,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    settings_file: Option<PathBuf>,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    /// Creates a loader that searches the default locations and reads the
    /// environment.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            settings_file: None,
        }
    }

    /// Adds a directory to search for settings files.
    ///
    /// Once any path is added the default locations are no longer searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this settings file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.settings_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables `DRIVERKIT_*` variables (default).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Ignores `DRIVERKIT_*` variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges settings on top of every other source.
    pub fn merge(mut self, settings: DriverkitConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(settings));
        self
    }

    /// Loads the settings.
    pub fn load(self) -> SettingsResult<DriverkitConfig> {
        let figment = self.build_figment()?;
        let settings: DriverkitConfig = figment.extract()?;

        debug!(
            preset = ?settings.host.preset,
            interpreter = %settings.host.interpreter,
            logging_level = %settings.logging.level,
            "Settings loaded"
        );
        Ok(settings)
    }

    fn build_figment(mut self) -> SettingsResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(DriverkitConfig::default()));

        if let Some(path) = self.settings_file.take() {
            if !path.exists() {
                return Err(SettingsError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading settings file");
            figment = merge_settings_file(figment, &path)?;
        } else {
            figment = self.search_settings_file(figment);
        }

        if self.load_env {
            trace!(prefix = SETTINGS_ENV_PREFIX, "Loading settings from environment");
            figment = figment.merge(Env::prefixed(SETTINGS_ENV_PREFIX).split("__"));
        }

        let overrides = std::mem::take(&mut self.figment);
        Ok(figment.merge(overrides))
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("driverkit"));
        }
        paths
    }

    #[cfg(feature = "toml-config")]
    fn search_settings_file(&self, figment: Figment) -> Figment {
        for dir in self.resolve_search_paths() {
            let path = dir.join(SETTINGS_FILE_NAME);
            if path.is_file() {
                info!(path = %path.display(), "Loading settings file");
                return figment.merge(Toml::file(path));
            }
        }
        debug!("No settings file found, using defaults");
        figment
    }

    #[cfg(not(feature = "toml-config"))]
    fn search_settings_file(&self, figment: Figment) -> Figment {
        trace!(paths = ?self.resolve_search_paths(), "No settings format enabled");
        figment
    }
}

/// Merges one settings file, dispatching on its extension.
fn merge_settings_file(figment: Figment, path: &Path) -> SettingsResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        _ => Err(SettingsError::UnsupportedFormat(ext.to_owned())),
    }
}

/// Loads settings from the default locations and the environment.
pub fn load_settings() -> SettingsResult<DriverkitConfig> {
    SettingsLoader::new().load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogLevel, Preset};

    #[test]
    fn defaults_without_sources() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();
        assert_eq!(settings, DriverkitConfig::default());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = SettingsLoader::new()
            .file("/nonexistent/driverkit.toml")
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, SettingsError::FileNotFound(_)));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("driverkit.cfg");
        std::fs::write(&path, "").unwrap();

        let err = SettingsLoader::new()
            .file(&path)
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, SettingsError::UnsupportedFormat(ext) if ext == "cfg"));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn reads_toml_from_search_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("driverkit.toml"),
            r#"
[host]
preset = "metadata-db"
section = "custom-section"
search_paths = ["/opt/plugins"]

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let settings = SettingsLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();
        assert_eq!(settings.host.preset, Preset::MetadataDb);
        assert_eq!(settings.host.section.as_deref(), Some("custom-section"));
        assert_eq!(settings.host.search_paths, [PathBuf::from("/opt/plugins")]);
        assert_eq!(settings.host.interpreter, "python3");
        assert_eq!(settings.logging.level, LogLevel::Debug);
    }

    #[test]
    fn programmatic_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        let mut overrides = DriverkitConfig::default();
        overrides.host.interpreter = "python3.12".into();

        let settings = SettingsLoader::new()
            .search_path(dir.path())
            .without_env()
            .merge(overrides)
            .load()
            .unwrap();
        assert_eq!(settings.host.interpreter, "python3.12");
    }
}
