//! Plugin entry: the static, `Copy` handle to a plugin constructor.

use linkme::distributed_slice;

use super::Plugin;
use crate::mapping::ConfigMapping;

// ─── API versioning ─────────────────────────────────────────────────────────────────────────────

/// Current driverkit plugin API version (1.0).
pub const DRIVERKIT_PLUGIN_API_VERSION: u32 = 0x0001_0000;

/// Name of the entry point every plugin unit exports.
pub const ENTRY_POINT_SYMBOL: &str = "Plugin";

/// Constructor of a plugin instance.
///
/// Receives the parsed config mapping, or `None` when no config file was used.
pub type PluginFactory = fn(Option<ConfigMapping>) -> Box<dyn Plugin>;

// ─── PluginEntry ──────────────────────────────────────────────────────────────

/// A static, `Copy` entry that identifies and constructs a plugin.
///
/// # Memory layout
///
/// `PluginEntry` is `#[repr(C)]` because native units export it as a symbol.
/// Fields **must not be reordered**.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PluginEntry {
    /// Plugin API version this entry was compiled against.
    pub api_version: u32,

    /// Driver type this plugin implements (e.g. `"metadata"`).
    pub driver_type: &'static str,

    /// Implementation family within the driver type (e.g. `"onprem"`).
    pub family: &'static str,

    /// Factory function that creates the live plugin.
    pub create: PluginFactory,
}

impl PluginEntry {
    /// Creates an entry stamped with the current API version.
    pub const fn new(
        driver_type: &'static str,
        family: &'static str,
        create: PluginFactory,
    ) -> Self {
        Self {
            api_version: DRIVERKIT_PLUGIN_API_VERSION,
            driver_type,
            family,
            create,
        }
    }

    /// Returns `true` if this entry's API version is compatible with the host.
    ///
    /// The major part must match exactly; the entry's minor part must be
    /// ≤ the host's minor part.
    pub fn is_compatible(&self) -> bool {
        let host_major = DRIVERKIT_PLUGIN_API_VERSION >> 16;
        let entry_major = self.api_version >> 16;
        let entry_minor = self.api_version & 0xFFFF;
        let host_minor = DRIVERKIT_PLUGIN_API_VERSION & 0xFFFF;
        entry_major == host_major && entry_minor <= host_minor
    }

    /// Returns `true` if this entry serves `driver_type` / `family`.
    pub fn matches(&self, driver_type: &str, family: &str) -> bool {
        self.driver_type == driver_type && self.family == family
    }

    /// Runs the factory.
    ///
    /// Every call constructs a new, independent instance.
    #[inline]
    pub fn instantiate(&self, config: Option<ConfigMapping>) -> Box<dyn Plugin> {
        (self.create)(config)
    }
}

// ─── Link-time registry ───────────────────────────────────────────────────────

/// Entries contributed by `#[register_plugin]` across all linked crates.
#[distributed_slice]
pub static PLUGIN_ENTRIES: [PluginEntry];

/// Exports a plugin entry from a native (`cdylib`) unit.
///
/// The entry is exported under the unmangled symbol `Plugin`, which is what
/// the native unit loader looks up.  Host and unit must be built with the same
/// toolchain.
///
/// ```rust,ignore
/// driverkit::export_plugin!("metadata", "onprem", OnPrem::new);
/// ```
#[macro_export]
macro_rules! export_plugin {
    ($driver:expr, $family:expr, $ctor:path $(,)?) => {
        #[unsafe(export_name = "Plugin")]
        pub static __DRIVERKIT_PLUGIN_ENTRY: $crate::PluginEntry =
            $crate::PluginEntry::new($driver, $family, |config| {
                ::std::boxed::Box::new($ctor(config))
            });
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(Option<ConfigMapping>);

    impl Plugin for Echo {}

    fn create(config: Option<ConfigMapping>) -> Box<dyn Plugin> {
        Box::new(Echo(config))
    }

    #[test]
    fn current_version_is_compatible() {
        let entry = PluginEntry::new("metadata", "onprem", create);
        assert!(entry.is_compatible());
        assert!(entry.matches("metadata", "onprem"));
        assert!(!entry.matches("metadata", "elasticsearch"));
    }

    #[test]
    fn major_mismatch_is_incompatible() {
        let mut entry = PluginEntry::new("metadata", "onprem", create);
        entry.api_version = 0x0002_0000;
        assert!(!entry.is_compatible());

        entry.api_version = DRIVERKIT_PLUGIN_API_VERSION + 1;
        assert!(!entry.is_compatible());
    }

    #[test]
    fn instantiate_passes_config_through() {
        let entry = PluginEntry::new("metadata", "onprem", create);
        let config: ConfigMapping = [("module", "onprem")].into_iter().collect();

        let plugin = entry.instantiate(Some(config.clone()));
        let echo = plugin.downcast_ref::<Echo>().unwrap();
        assert_eq!(echo.0.as_ref(), Some(&config));
    }
}
