//! Driverkit runtime: from config file to plugin instance.
//!
//! This crate provides:
//! - INI config section loading ([`ini_file::load_section`])
//! - Value precedence between environment, config and defaults ([`resolve_value`])
//! - Plugin file resolution across installation locations ([`PathResolver`])
//! - Unit loading and construction ([`PluginLoader`], [`UnitLoader`])
//! - The [`PluginHost`] facade tying them together
//! - Host settings ([`config`]) and logging setup ([`logging`])
//!
//! # Feature flags
//!
//! - `toml-config` *(default)*: read host settings from `driverkit.toml`
//! - `json-log`: JSON log lines
//! - `dylib`: load plugin units from shared libraries (`NativeLoader`)
//!
//! ```rust,ignore
//! use driverkit_runtime::{PluginHost, config::load_settings, logging};
//!
//! let settings = load_settings()?;
//! logging::init_from_config(&settings.logging);
//!
//! let host = PluginHost::from_settings(&settings.host).build()?;
//! let plugin = host.start_plugin("metadata", Some("onprem"), None)?;
//! ```

pub mod config;
pub mod env;
pub mod host;
pub mod ini_file;
pub mod loader;
pub mod logging;
pub mod resolve;
pub mod site;

pub use config::{DriverkitConfig, SettingsError, SettingsLoader, SettingsResult};
pub use env::{CONFIG_PATH_VAR, Environment, VIRTUAL_ENV_VAR, resolve_value};
pub use host::{PluginHost, PluginHostBuilder, start_plugin};
pub use ini_file::{DEFAULT_SECTION, load_section, load_section_str};
#[cfg(feature = "dylib")]
pub use loader::NativeLoader;
pub use loader::{LoadedPlugin, LoadedUnit, PluginLoader, RegistryLoader, UnitLoader, UnitRequest};
pub use logging::LoggingBuilder;
pub use resolve::PathResolver;
pub use site::{DEFAULT_INTERPRETER, SiteError, SiteLayout};

pub use tracing;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use super::{Environment, LoadedPlugin, PluginHost, SiteLayout};
    pub use tracing::{debug, error, info, trace, warn};
}
