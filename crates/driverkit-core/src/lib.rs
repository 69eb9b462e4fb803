//! # driverkit core
//!
//! Shared building blocks of the driverkit plugin facility:
//!
//! - **Errors**: [`DriverError`] / [`LoadError`] and the fixed configuration
//!   error message.
//! - **Config mapping**: [`ConfigMapping`], the flat option map handed to
//!   plugins.
//! - **Plugin contract**: the [`Plugin`] trait, [`PluginEntry`] constructors
//!   and the [`PluginRegistry`] that maps *(driver type, family)* to them.
//! - **Naming policy**: [`NamingPolicy`], the file-name template, family
//!   default and override rules of one driver facility.
//!
//! Resolution, config-file reading and loading live in `driverkit-runtime`.

pub mod error;
pub mod mapping;
pub mod naming;
pub mod plugin;

pub use error::{DriverError, DriverResult, INVALID_CONFIG_MESSAGE, LoadError};
pub use mapping::ConfigMapping;
pub use naming::{FamilyOverride, MODULE_PATH_KEY, NamingPolicy};
pub use plugin::{
    AsAny, DRIVERKIT_PLUGIN_API_VERSION, ENTRY_POINT_SYMBOL, PLUGIN_ENTRIES, Plugin, PluginEntry,
    PluginFactory, PluginRegistry,
};

#[doc(hidden)]
pub use linkme;

/// Prelude for common imports.
pub mod prelude {
    pub use super::{ConfigMapping, DriverError, DriverResult, LoadError, Plugin, PluginEntry};
}
