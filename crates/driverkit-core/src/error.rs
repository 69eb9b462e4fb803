//! Unified error types for driverkit.
//!
//! Two kinds of failure leave the facility:
//!
//! - [`DriverError::Configuration`] covers everything structural about the
//!   configuration sources (unreadable config file, missing section, unusable
//!   driver or family name).  It never carries the underlying cause; callers
//!   get one stable message and the cause is logged where it was observed.
//! - [`DriverError::Load`] wraps a [`LoadError`] raised while turning a
//!   resolved path into a live plugin.
//!
//! Per-option read failures inside a config section are not errors at all:
//! they are recorded as `None` in the [`ConfigMapping`](crate::ConfigMapping).

use std::path::PathBuf;

use thiserror::Error;

/// User-facing message carried by every configuration error.
pub const INVALID_CONFIG_MESSAGE: &str = "you should provide a valid config";

// =============================================================================
// Load Errors
// =============================================================================

/// Errors that can occur while loading a resolved plugin unit.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No file exists at the resolved path.
    #[error("plugin unit not found: {}", path.display())]
    NotFound {
        /// The path that was tried last.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("failed to read plugin unit {}: {source}", path.display())]
    Unreadable {
        /// The resolved path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The unit does not export a `Plugin` entry point.
    #[error("unit '{unit}' does not export a `{symbol}` entry point")]
    MissingEntryPoint {
        /// Synthetic unit name (e.g. `metadata_plugin.py`).
        unit: String,
        /// The symbol that was looked up.
        symbol: &'static str,
    },

    /// The unit's entry point serves a different driver type or family.
    #[error("unit '{unit}' exports a plugin for '{found}', expected '{expected}'")]
    Mismatched {
        /// Synthetic unit name.
        unit: String,
        /// Requested `driver_type/family`.
        expected: String,
        /// `driver_type/family` of the exported entry.
        found: String,
    },

    /// The unit was built against an incompatible plugin API.
    #[error("unit '{unit}' targets plugin API {found:#x}, host provides {expected:#x}")]
    Incompatible {
        /// Synthetic unit name.
        unit: String,
        /// API version the unit was compiled against.
        found: u32,
        /// API version of the host.
        expected: u32,
    },

    /// Error raised by the native dynamic-load mechanism, passed through as is.
    #[error(transparent)]
    Native(Box<dyn std::error::Error + Send + Sync + 'static>),
}

// =============================================================================
// Driver Errors
// =============================================================================

/// Top-level error returned by resolution and loading.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A configuration source is structurally invalid.
    #[error("{}", INVALID_CONFIG_MESSAGE)]
    Configuration,

    /// The resolved unit could not be loaded or instantiated.
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl DriverError {
    /// Returns `true` for [`DriverError::Configuration`].
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration)
    }

    /// Returns the inner [`LoadError`], if any.
    pub fn as_load(&self) -> Option<&LoadError> {
        match self {
            Self::Load(e) => Some(e),
            Self::Configuration => None,
        }
    }
}

/// Result type for driverkit operations.
pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_has_fixed_message() {
        assert_eq!(
            DriverError::Configuration.to_string(),
            "you should provide a valid config"
        );
    }

    #[test]
    fn load_error_is_transparent() {
        let err = DriverError::from(LoadError::NotFound {
            path: PathBuf::from("/nowhere/plugin.py"),
        });
        assert_eq!(err.to_string(), "plugin unit not found: /nowhere/plugin.py");
        assert!(!err.is_configuration());
        assert!(matches!(err.as_load(), Some(LoadError::NotFound { .. })));
    }

    #[test]
    fn mismatched_entry_names_both_sides() {
        let err = LoadError::Mismatched {
            unit: "metadata_plugin.so".into(),
            expected: "metadata/onprem".into(),
            found: "metadata/azure".into(),
        };
        assert_eq!(
            err.to_string(),
            "unit 'metadata_plugin.so' exports a plugin for 'metadata/azure', expected 'metadata/onprem'"
        );
    }
}
