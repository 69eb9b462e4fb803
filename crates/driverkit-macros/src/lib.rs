//! Procedural macros for driverkit.
//!
//! - `#[register_plugin(driver = "...", family = "...")]` - registers a plugin
//!   constructor in the link-time plugin registry.
//!
//! ```rust,ignore
//! use driverkit_core::{ConfigMapping, Plugin};
//! use driverkit_macros::register_plugin;
//!
//! pub struct OnPrem {
//!     config: Option<ConfigMapping>,
//! }
//!
//! impl Plugin for OnPrem {}
//!
//! #[register_plugin(driver = "metadata", family = "onprem")]
//! fn create(config: Option<ConfigMapping>) -> OnPrem {
//!     OnPrem { config }
//! }
//! ```

mod register;

use proc_macro::TokenStream;

/// Registers a plugin constructor for a *(driver type, family)* key.
///
/// The function must take a single `Option<ConfigMapping>` and return a type
/// implementing `Plugin`.  It is called once per load, so every load yields a
/// fresh instance.
#[proc_macro_attribute]
pub fn register_plugin(attr: TokenStream, item: TokenStream) -> TokenStream {
    register::register_plugin(attr, item)
}
