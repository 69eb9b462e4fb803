//! Settings schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use driverkit_core::NamingPolicy;
use serde::{Deserialize, Serialize};

use crate::site::DEFAULT_INTERPRETER;

/// Root settings structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverkitConfig {
    /// How plugins are located.
    #[serde(default)]
    pub host: HostConfig,

    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Built-in naming policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// `{root}/metadata_driver_{family}/{type}_plugin.py`, default family `onprem`.
    #[default]
    DriverInterface,
    /// `{root}/metadata_driver_{family}/plugin.py`, family from `MODULE`.
    MetadataDb,
}

impl Preset {
    /// The naming policy this preset stands for.
    pub fn policy(self) -> NamingPolicy {
        match self {
            Self::DriverInterface => NamingPolicy::driver_interface(),
            Self::MetadataDb => NamingPolicy::metadata_db(),
        }
    }
}

/// Plugin host settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Naming policy preset.
    #[serde(default)]
    pub preset: Preset,

    /// Interpreter command probed for its installation layout.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Overrides the preset's config section.
    #[serde(default)]
    pub section: Option<String>,

    /// Overrides the preset's plugin file template (`{type}` is substituted).
    #[serde(default)]
    pub file_template: Option<String>,

    /// Directories searched after the interpreter's own search path.
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            preset: Preset::default(),
            interpreter: default_interpreter(),
            section: None,
            file_template: None,
            search_paths: Vec::new(),
        }
    }
}

impl HostConfig {
    /// The naming policy with every override applied.
    pub fn policy(&self) -> NamingPolicy {
        let mut policy = self.preset.policy();
        if let Some(section) = &self.section {
            policy = policy.with_section(section);
        }
        if let Some(template) = &self.file_template {
            policy = policy.with_file_template(template);
        }
        policy
    }
}

fn default_interpreter() -> String {
    DEFAULT_INTERPRETER.to_string()
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lowercase name, as used in filter directives.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` otherwise.
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
    File,
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, used with `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-target levels, e.g. `driverkit_runtime = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file names and line numbers.
    #[serde(default)]
    pub file_location: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DriverkitConfig::default();
        assert_eq!(config.host.preset, Preset::DriverInterface);
        assert_eq!(config.host.interpreter, "python3");
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.output, LogOutput::Stderr);
    }

    #[test]
    fn host_overrides_apply_to_policy() {
        let host = HostConfig {
            preset: Preset::MetadataDb,
            section: Some("custom".into()),
            file_template: Some("{type}_driver.py".into()),
            ..Default::default()
        };
        let policy = host.policy();
        assert_eq!(policy.section, "custom");
        assert_eq!(policy.file_name("metadata"), "metadata_driver.py");
        assert_eq!(policy.default_family, "elasticsearch");
    }

    #[test]
    fn deserializes_kebab_case_preset() {
        let host: HostConfig =
            serde_json::from_str(r#"{"preset": "metadata-db", "search_paths": ["/opt/plugins"]}"#)
                .unwrap();
        assert_eq!(host.preset, Preset::MetadataDb);
        assert_eq!(host.interpreter, "python3");
        assert_eq!(host.search_paths, [PathBuf::from("/opt/plugins")]);
    }
}
