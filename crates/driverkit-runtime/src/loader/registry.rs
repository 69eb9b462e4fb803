//! Unit loader backed by a [`PluginRegistry`].

use std::fs::File;
use std::io::ErrorKind;
use std::sync::Arc;

use driverkit_core::{ENTRY_POINT_SYMBOL, LoadError, PluginRegistry};
use tracing::trace;

use super::{LoadedUnit, UnitLoader, UnitRequest};

/// Loads units whose code is registered in-process.
///
/// The resolved file must exist and be readable: it is the installation
/// marker of the family.  The entry point is the registry entry for the
/// request's *(driver type, family)*.
#[derive(Debug, Clone)]
pub struct RegistryLoader {
    registry: Arc<PluginRegistry>,
}

impl RegistryLoader {
    /// Creates a loader over `registry`.
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    /// Creates a loader over the process-wide registry.
    pub fn global() -> Self {
        Self::new(PluginRegistry::global())
    }

    /// The backing registry.
    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }
}

impl Default for RegistryLoader {
    fn default() -> Self {
        Self::global()
    }
}

impl UnitLoader for RegistryLoader {
    fn load(&self, request: &UnitRequest<'_>) -> Result<LoadedUnit, LoadError> {
        let path = request.path;
        let file = File::open(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => LoadError::NotFound {
                path: path.to_path_buf(),
            },
            _ => LoadError::Unreadable {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let metadata = file.metadata().map_err(|source| LoadError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(LoadError::Unreadable {
                path: path.to_path_buf(),
                source: std::io::Error::other("not a regular file"),
            });
        }
        trace!(unit = request.name, path = %path.display(), "Opened unit marker");

        let entry = self
            .registry
            .get(request.driver_type, request.family)
            .ok_or_else(|| LoadError::MissingEntryPoint {
                unit: request.name.to_owned(),
                symbol: ENTRY_POINT_SYMBOL,
            })?;
        Ok(LoadedUnit::new(request.name, path, entry))
    }
}
