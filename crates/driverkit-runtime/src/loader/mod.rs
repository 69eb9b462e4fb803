//! Turning a resolved path into a live plugin.
//!
//! A [`UnitLoader`] loads the unit at a resolved path and hands back its
//! `Plugin` entry point as a [`LoadedUnit`].  [`PluginLoader`] drives the whole
//! sequence: family selection, path resolution, unit loading, compatibility
//! check and construction.
//!
//! Two unit loaders exist:
//!
//! - [`RegistryLoader`]: the plugin file marks the installation, the code is
//!   linked into the process and found in a [`PluginRegistry`](driverkit_core::PluginRegistry).
//! - `NativeLoader` (feature `dylib`): the plugin file is a shared library
//!   exporting `Plugin`.

#[cfg(feature = "dylib")]
pub mod native;
pub mod registry;

use std::any::Any;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use driverkit_core::{
    ConfigMapping, DRIVERKIT_PLUGIN_API_VERSION, DriverResult, LoadError, Plugin, PluginEntry,
};
use tracing::{debug, info, warn};

use crate::resolve::PathResolver;

#[cfg(feature = "dylib")]
pub use native::NativeLoader;
pub use registry::RegistryLoader;

/// What a [`UnitLoader`] is asked to load.
#[derive(Debug, Clone, Copy)]
pub struct UnitRequest<'a> {
    /// Synthetic unit name (the rendered file name).
    pub name: &'a str,
    /// Resolved path of the unit.
    pub path: &'a Path,
    /// Driver type being loaded.
    pub driver_type: &'a str,
    /// Family being loaded.
    pub family: &'a str,
}

/// Keeps the backing storage of a unit (e.g. a shared library) mapped.
pub type UnitGuard = Arc<dyn Any + Send + Sync>;

/// A loaded unit and its exported entry point.
#[derive(Debug)]
pub struct LoadedUnit {
    name: String,
    path: PathBuf,
    entry: PluginEntry,
    guard: Option<UnitGuard>,
}

impl LoadedUnit {
    /// Creates a unit whose code lives in the host process.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, entry: PluginEntry) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            entry,
            guard: None,
        }
    }

    /// Attaches storage that must outlive every instance built from this unit.
    pub fn with_guard(mut self, guard: UnitGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// The exported entry point.
    pub fn entry(&self) -> &PluginEntry {
        &self.entry
    }

    /// Synthetic unit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path the unit was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Loads the unit at a resolved path.
pub trait UnitLoader: Send + Sync {
    /// Loads the unit described by `request`.
    ///
    /// Fails with [`LoadError::NotFound`] if nothing exists at the path,
    /// [`LoadError::Unreadable`] / [`LoadError::Native`] if it cannot be
    /// loaded, [`LoadError::MissingEntryPoint`] if it exports no `Plugin`, and
    /// [`LoadError::Mismatched`] if its `Plugin` serves another driver type or
    /// family.
    fn load(&self, request: &UnitRequest<'_>) -> Result<LoadedUnit, LoadError>;
}

/// Fails with [`LoadError::Mismatched`] unless `entry` serves the requested
/// driver type and family.
pub fn check_entry(request: &UnitRequest<'_>, entry: &PluginEntry) -> Result<(), LoadError> {
    if entry.matches(request.driver_type, request.family) {
        return Ok(());
    }
    warn!(
        unit = request.name,
        path = %request.path.display(),
        expected_driver = request.driver_type,
        expected_family = request.family,
        found_driver = entry.driver_type,
        found_family = entry.family,
        "Unit exports a plugin for another driver"
    );
    Err(LoadError::Mismatched {
        unit: request.name.to_owned(),
        expected: format!("{}/{}", request.driver_type, request.family),
        found: format!("{}/{}", entry.driver_type, entry.family),
    })
}

impl<T: UnitLoader + ?Sized> UnitLoader for Arc<T> {
    fn load(&self, request: &UnitRequest<'_>) -> Result<LoadedUnit, LoadError> {
        (**self).load(request)
    }
}

/// A constructed plugin together with where it came from.
///
/// Dereferences to `dyn Plugin`.
pub struct LoadedPlugin {
    // Declared first so the instance drops before the unit guard.
    instance: Box<dyn Plugin>,
    driver_type: String,
    family: String,
    unit_name: String,
    path: PathBuf,
    _guard: Option<UnitGuard>,
}

impl LoadedPlugin {
    /// The plugin instance.
    pub fn plugin(&self) -> &dyn Plugin {
        self.instance.as_ref()
    }

    /// Returns the concrete plugin if it is of type `T`.
    pub fn downcast_ref<T: Plugin>(&self) -> Option<&T> {
        self.plugin().downcast_ref::<T>()
    }

    /// Driver type that was loaded.
    pub fn driver_type(&self) -> &str {
        &self.driver_type
    }

    /// Family that was loaded.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Synthetic unit name.
    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    /// Path the unit was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Deref for LoadedPlugin {
    type Target = dyn Plugin;

    fn deref(&self) -> &Self::Target {
        self.plugin()
    }
}

impl std::fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("name", &self.instance.name())
            .field("driver_type", &self.driver_type)
            .field("family", &self.family)
            .field("unit_name", &self.unit_name)
            .field("path", &self.path)
            .finish()
    }
}

/// Resolves, loads and constructs plugins.
pub struct PluginLoader<'a> {
    resolver: PathResolver<'a>,
    units: &'a dyn UnitLoader,
}

impl<'a> PluginLoader<'a> {
    /// Creates a loader from a resolver and a unit loader.
    pub fn new(resolver: PathResolver<'a>, units: &'a dyn UnitLoader) -> Self {
        Self { resolver, units }
    }

    /// Loads one plugin instance.
    ///
    /// `family` falls back to the policy default; policies with a family
    /// override consult it first.  `config` is handed to the constructor
    /// unchanged.  Every call runs the constructor again.
    pub fn load(
        &self,
        driver_type: &str,
        family: Option<&str>,
        config: Option<ConfigMapping>,
    ) -> DriverResult<LoadedPlugin> {
        let family = self.resolver.resolve_family(family, config.as_ref());
        let path = self.resolver.resolve(driver_type, &family, config.as_ref())?;
        let unit_name = self.resolver.policy().file_name(driver_type);

        let request = UnitRequest {
            name: &unit_name,
            path: &path,
            driver_type,
            family: &family,
        };
        let unit = self.units.load(&request)?;

        let entry = *unit.entry();
        check_entry(&request, &entry)?;
        if !entry.is_compatible() {
            return Err(LoadError::Incompatible {
                unit: unit_name,
                found: entry.api_version,
                expected: DRIVERKIT_PLUGIN_API_VERSION,
            }
            .into());
        }

        debug!(unit = %unit_name, has_config = config.is_some(), "Constructing plugin");
        let instance = entry.instantiate(config);
        info!(
            plugin = instance.name(),
            driver_type,
            family = %family,
            path = %path.display(),
            "Plugin loaded"
        );

        Ok(LoadedPlugin {
            instance,
            driver_type: driver_type.to_owned(),
            family,
            unit_name,
            path,
            _guard: unit.guard,
        })
    }
}

#[cfg(test)]
mod tests {
    use driverkit_core::NamingPolicy;

    use super::*;
    use crate::env::Environment;
    use crate::site::SiteLayout;

    struct Stub;

    impl Plugin for Stub {}

    fn stub(_: Option<ConfigMapping>) -> Box<dyn Plugin> {
        Box::new(Stub)
    }

    /// Hands back the same entry for every request, like a library that
    /// exports whatever it was built with.
    struct FixedEntry(PluginEntry);

    impl UnitLoader for FixedEntry {
        fn load(&self, request: &UnitRequest<'_>) -> Result<LoadedUnit, LoadError> {
            Ok(LoadedUnit::new(request.name, request.path, self.0))
        }
    }

    fn start(units: &dyn UnitLoader, family: &str) -> DriverResult<LoadedPlugin> {
        let policy = NamingPolicy::driver_interface();
        let site = SiteLayout::new("/nonexistent/purelib", [], 11);
        let env = Environment::new();
        let config: ConfigMapping = [(driverkit_core::MODULE_PATH_KEY, "/opt/drivers")]
            .into_iter()
            .collect();
        PluginLoader::new(PathResolver::new(&policy, &site, &env), units).load(
            "metadata",
            Some(family),
            Some(config),
        )
    }

    #[test]
    fn entry_for_another_family_is_rejected() {
        let units = FixedEntry(PluginEntry::new("metadata", "azure", stub));

        let err = start(&units, "onprem").unwrap_err();
        assert!(matches!(
            err.as_load(),
            Some(LoadError::Mismatched { unit, expected, found })
                if unit == "metadata_plugin.py"
                    && expected == "metadata/onprem"
                    && found == "metadata/azure"
        ));
    }

    #[test]
    fn entry_for_another_driver_type_is_rejected() {
        let request = UnitRequest {
            name: "metadata_plugin.so",
            path: Path::new("/opt/drivers/metadata_plugin.so"),
            driver_type: "metadata",
            family: "onprem",
        };
        let other = PluginEntry::new("metadatadb", "onprem", stub);
        assert!(matches!(
            check_entry(&request, &other),
            Err(LoadError::Mismatched { .. })
        ));
        let same = PluginEntry::new("metadata", "onprem", stub);
        assert!(check_entry(&request, &same).is_ok());
    }

    #[test]
    fn matching_entry_is_constructed() {
        let units = FixedEntry(PluginEntry::new("metadata", "onprem", stub));

        let plugin = start(&units, "onprem").unwrap();
        assert!(plugin.downcast_ref::<Stub>().is_some());
        assert_eq!(plugin.family(), "onprem");
        assert_eq!(plugin.path(), Path::new("/opt/drivers/metadata_plugin.py"));
    }
}
