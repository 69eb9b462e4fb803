//! Installation layout of the plugin interpreter.
//!
//! Plugins are installed the way the interpreter installs packages: under its
//! pure-library directory, or under any directory on its module search path.
//! [`SiteLayout`] captures those locations once so that path resolution does
//! not have to consult the interpreter again.

use std::path::PathBuf;
use std::process::Command;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Interpreter command used when none is configured.
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Prints the layout as one JSON object.  Empty `sys.path` entries mean the
/// current directory.
const PROBE_SCRIPT: &str = "import json, sys, sysconfig; print(json.dumps({\
'purelib': sysconfig.get_path('purelib'), \
'search_path': [p or '.' for p in sys.path], \
'minor_version': sys.version_info[1]}))";

/// Errors raised while probing the interpreter.
#[derive(Debug, Error)]
pub enum SiteError {
    /// The interpreter executable was not found on `PATH`.
    #[error("interpreter '{name}' not found: {source}")]
    InterpreterNotFound {
        /// Configured interpreter command.
        name: String,
        /// Lookup error.
        #[source]
        source: which::Error,
    },

    /// The interpreter could not be started.
    #[error("failed to run interpreter: {0}")]
    Spawn(#[from] std::io::Error),

    /// The probe script exited unsuccessfully.
    #[error("interpreter probe failed ({status}): {stderr}")]
    ProbeFailed {
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The probe output was not the expected JSON.
    #[error("malformed interpreter probe output: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Where the interpreter looks for installed packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteLayout {
    /// Canonical pure-library installation directory.
    pub purelib: PathBuf,
    /// Module search path, in lookup order.
    pub search_path: Vec<PathBuf>,
    /// Minor version of the interpreter (`3.{minor}`).
    pub minor_version: u32,
}

impl SiteLayout {
    /// Creates a layout from explicit parts.
    pub fn new(
        purelib: impl Into<PathBuf>,
        search_path: impl IntoIterator<Item = PathBuf>,
        minor_version: u32,
    ) -> Self {
        Self {
            purelib: purelib.into(),
            search_path: search_path.into_iter().collect(),
            minor_version,
        }
    }

    /// Appends a directory to the search path.
    pub fn with_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_path.push(dir.into());
        self
    }

    /// Queries `interpreter` for its layout.
    pub fn probe(interpreter: &str) -> Result<Self, SiteError> {
        let program = which::which(interpreter).map_err(|source| SiteError::InterpreterNotFound {
            name: interpreter.to_owned(),
            source,
        })?;

        let output = Command::new(&program).arg("-c").arg(PROBE_SCRIPT).output()?;
        if !output.status.success() {
            return Err(SiteError::ProbeFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        let layout: Self = serde_json::from_slice(&output.stdout)?;
        debug!(
            interpreter = %program.display(),
            purelib = %layout.purelib.display(),
            search_path = layout.search_path.len(),
            minor = layout.minor_version,
            "Probed interpreter layout"
        );
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_probe_output() {
        let json = r#"{"purelib": "/usr/lib/python3.11/site-packages",
                       "search_path": [".", "/usr/lib/python311.zip"],
                       "minor_version": 11}"#;
        let layout: SiteLayout = serde_json::from_str(json).unwrap();
        assert_eq!(layout.minor_version, 11);
        assert_eq!(layout.search_path[0], PathBuf::from("."));
    }

    #[test]
    fn missing_interpreter_is_reported() {
        let err = SiteLayout::probe("driverkit-no-such-interpreter").unwrap_err();
        assert!(matches!(err, SiteError::InterpreterNotFound { .. }));
    }

    #[test]
    fn search_path_builder_appends() {
        let layout = SiteLayout::new("/purelib", [PathBuf::from("/a")], 12).with_search_path("/b");
        assert_eq!(layout.search_path, [PathBuf::from("/a"), PathBuf::from("/b")]);
    }
}
