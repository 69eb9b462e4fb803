//! Plugin contract and registration.
//!
//! # Architecture
//!
//! A plugin is any type implementing [`Plugin`].  The host never names the
//! concrete type: it looks up a [`PluginEntry`] keyed by
//! *(driver type, family)* and calls its factory with the parsed
//! [`ConfigMapping`](crate::ConfigMapping) (or `None` when no config file was
//! used).
//!
//! Entries reach the host in one of three ways:
//!
//! - **Link time**: `#[register_plugin(driver = "...", family = "...")]` on a
//!   constructor function appends the entry to [`PLUGIN_ENTRIES`].
//! - **Init time**: [`PluginRegistry::register`] on a shared registry.
//! - **Native units**: a shared library declares [`export_plugin!`], which
//!   exports the entry under the symbol `Plugin`.
//!
//! ```rust,ignore
//! use driverkit::prelude::*;
//!
//! pub struct OnPrem { config: Option<ConfigMapping> }
//!
//! impl Plugin for OnPrem {}
//!
//! #[register_plugin(driver = "metadata", family = "onprem")]
//! fn create(config: Option<ConfigMapping>) -> OnPrem {
//!     OnPrem { config }
//! }
//! ```

pub mod entry;
pub mod registry;

use std::any::Any;

pub use entry::{
    DRIVERKIT_PLUGIN_API_VERSION, ENTRY_POINT_SYMBOL, PLUGIN_ENTRIES, PluginEntry, PluginFactory,
};
pub use registry::PluginRegistry;

/// Object-safe access to [`Any`] for plugin trait objects.
pub trait AsAny {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A resolved, instantiated driver.
///
/// The host has no visibility into a plugin beyond this trait; callers that
/// know the concrete type use `<dyn Plugin>::downcast_ref`.
pub trait Plugin: AsAny + Send + Sync + 'static {
    /// Human-readable name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl dyn Plugin {
    /// Returns the concrete plugin if it is of type `T`.
    pub fn downcast_ref<T: Plugin>(&self) -> Option<&T> {
        AsAny::as_any(self).downcast_ref::<T>()
    }

    /// Returns `true` if the concrete plugin is of type `T`.
    pub fn is<T: Plugin>(&self) -> bool {
        AsAny::as_any(self).is::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    impl Plugin for Marker {}

    struct Named;

    impl Plugin for Named {
        fn name(&self) -> &str {
            "named"
        }
    }

    #[test]
    fn downcast_through_trait_object() {
        let plugin: Box<dyn Plugin> = Box::new(Marker);
        assert!(plugin.is::<Marker>());
        assert!(plugin.downcast_ref::<Named>().is_none());
        assert!(plugin.name().ends_with("Marker"));
    }

    struct Counter(u32);

    impl Plugin for Counter {}

    fn concrete<T: Plugin>(plugin: &dyn Plugin) -> Option<&T> {
        plugin.downcast_ref::<T>()
    }

    #[test]
    fn generic_downcast_reaches_concrete_state() {
        let plugin: Box<dyn Plugin> = Box::new(Counter(7));
        assert_eq!(concrete::<Counter>(plugin.as_ref()).map(|c| c.0), Some(7));
        assert!(concrete::<Marker>(plugin.as_ref()).is_none());
    }

    #[test]
    fn name_can_be_overridden() {
        let plugin: Box<dyn Plugin> = Box::new(Named);
        assert_eq!(plugin.name(), "named");
    }
}
