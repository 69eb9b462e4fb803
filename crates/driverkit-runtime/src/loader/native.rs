//! Unit loader for shared libraries.

use std::sync::Arc;

use driverkit_core::{ENTRY_POINT_SYMBOL, LoadError, PluginEntry};
use libloading::{Library, Symbol};
use tracing::debug;

use super::{LoadedUnit, UnitLoader, UnitRequest, check_entry};

/// Loads units that are shared libraries exporting a `Plugin` static.
///
/// Plugin crates export the symbol with
/// [`export_plugin!`](driverkit_core::export_plugin).  Every load maps the
/// library again; the mapping stays alive as long as any plugin built from it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLoader;

impl NativeLoader {
    /// Creates a native loader.
    pub fn new() -> Self {
        Self
    }
}

impl UnitLoader for NativeLoader {
    fn load(&self, request: &UnitRequest<'_>) -> Result<LoadedUnit, LoadError> {
        let path = request.path;
        if !path.exists() {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
            });
        }

        // SAFETY: loading a library runs its initialisers. Plugin files are
        // trusted installations found on the configured search path.
        let library = unsafe { Library::new(path) }.map_err(|e| LoadError::Native(Box::new(e)))?;

        let symbol_name = format!("{ENTRY_POINT_SYMBOL}\0");
        // SAFETY: `Plugin` is exported by `export_plugin!` as a `PluginEntry`
        // static; the copy below is taken while the library is mapped.
        let entry: PluginEntry = unsafe {
            let symbol: Symbol<*const PluginEntry> =
                library.get(symbol_name.as_bytes()).map_err(|_| {
                    LoadError::MissingEntryPoint {
                        unit: request.name.to_owned(),
                        symbol: ENTRY_POINT_SYMBOL,
                    }
                })?;
            **symbol
        };
        check_entry(request, &entry)?;

        debug!(
            unit = request.name,
            path = %path.display(),
            api_version = entry.api_version,
            "Mapped native plugin library"
        );
        Ok(LoadedUnit::new(request.name, path, entry).with_guard(Arc::new(library)))
    }
}
