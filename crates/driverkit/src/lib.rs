//! # Driverkit
//!
//! Config-driven discovery and loading of storage driver plugins.
//!
//! A driver is addressed by a *driver type* (`metadata`, `metadatadb`, ...)
//! and a *family* (`onprem`, `elasticsearch`, ...).  The family's package is
//! installed as `metadata_driver_{family}/` somewhere the interpreter looks
//! for packages; driverkit finds the plugin file there, reads the driver's
//! section of an INI config file and constructs the plugin with it.
//!
//! ```text
//! config.ini ──▶ load_section ──▶ ConfigMapping ─┐
//!                                                ├──▶ PluginLoader ──▶ Box<dyn Plugin>
//! (type, family) ──▶ PathResolver ──▶ file ──────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use driverkit::prelude::*;
//!
//! #[register_plugin(driver = "metadata", family = "onprem")]
//! fn onprem(config: Option<ConfigMapping>) -> OnPrem {
//!     OnPrem::new(config)
//! }
//!
//! fn main() -> DriverResult<()> {
//!     let host = PluginHost::builder().build()?;
//!     let plugin = host.start_plugin("metadata", None, Some("driver.ini".as_ref()))?;
//!     let onprem = plugin.downcast_ref::<OnPrem>();
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: host settings from `driverkit.toml`
//! - `json-log`: JSON log output
//! - `dylib`: load plugins from shared libraries

pub use driverkit_core as core;
pub use driverkit_macros as macros;
pub use driverkit_runtime as runtime;

pub use driverkit_core::export_plugin;
pub use driverkit_macros::register_plugin;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use driverkit::prelude::*;
/// ```
pub mod prelude {
    pub use driverkit_core::{
        ConfigMapping, DriverError, DriverResult, LoadError, NamingPolicy, Plugin, PluginEntry,
        PluginRegistry,
    };
    pub use driverkit_macros::register_plugin;
    pub use driverkit_runtime::{
        Environment, LoadedPlugin, PluginHost, SiteLayout, config::DriverkitConfig, logging,
    };
}
