//! Environment snapshot and value precedence.
//!
//! Resolution never reads the process environment directly.  Callers capture
//! an [`Environment`] once (or build one by hand in tests) and pass it down,
//! which keeps every resolution step a pure function of its inputs.
//!
//! Values are kept as captured.  Path variables (`CONFIG_PATH`,
//! `VIRTUAL_ENV`) are used as raw OS strings, so a non-Unicode path still
//! works; string lookups through [`Environment::get`] treat a non-Unicode
//! value as unset and log a warning.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use driverkit_core::ConfigMapping;
use tracing::{debug, warn};

/// Overrides the config file path given by the caller.
pub const CONFIG_PATH_VAR: &str = "CONFIG_PATH";

/// Root of the active virtual environment.
pub const VIRTUAL_ENV_VAR: &str = "VIRTUAL_ENV";

/// Immutable snapshot of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, OsString>,
}

impl Environment {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the current process environment.
    ///
    /// Variables whose name is not valid Unicode are skipped.
    pub fn capture() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    /// Builds a snapshot from raw name/value pairs.
    pub fn from_os_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        let vars = vars
            .into_iter()
            .filter_map(|(name, value)| match name.into_string() {
                Ok(name) => Some((name, value)),
                Err(name) => {
                    debug!(name = ?name, "Skipping environment variable with non-Unicode name");
                    None
                }
            })
            .collect();
        Self { vars }
    }

    /// Returns a copy with `name` set to `value`.
    pub fn with(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_os(name, OsString::from(value.into()))
    }

    /// Returns a copy with `name` set to a raw OS string.
    pub fn with_os(mut self, name: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Returns a copy with `name` removed.
    pub fn without(mut self, name: &str) -> Self {
        self.vars.remove(name);
        self
    }

    /// Raw value of `name` if it is set and non-empty.
    pub fn get_os(&self, name: &str) -> Option<&OsStr> {
        self.vars
            .get(name)
            .map(OsString::as_os_str)
            .filter(|v| !v.is_empty())
    }

    /// Value of `name` if it is set, non-empty and valid Unicode.
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = self.get_os(name)?;
        let text = value.to_str();
        if text.is_none() {
            warn!(name, value = ?value, "Ignoring environment variable with non-Unicode value");
        }
        text
    }

    /// `CONFIG_PATH`, if set.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.get_os(CONFIG_PATH_VAR).map(PathBuf::from)
    }

    /// `VIRTUAL_ENV`, if set.
    pub fn virtual_env(&self) -> Option<PathBuf> {
        self.get_os(VIRTUAL_ENV_VAR).map(PathBuf::from)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), OsString::from(v.into())))
                .collect(),
        }
    }
}

/// Resolves a named value: environment variable, then config, then default.
///
/// - `env_var` wins if it is set and non-empty.
/// - Otherwise `config[key]` wins if the mapping holds a readable value.
/// - Otherwise `default` is returned.
pub fn resolve_value(
    key: &str,
    env_var: &str,
    default: &str,
    config: Option<&ConfigMapping>,
    env: &Environment,
) -> String {
    env.get(env_var)
        .or_else(|| config.and_then(|c| c.get(key)))
        .unwrap_or(default)
        .to_owned()
}
