//! Registry of plugin entries keyed by *(driver type, family)*.

use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::entry::{PLUGIN_ENTRIES, PluginEntry};

static GLOBAL: LazyLock<Arc<PluginRegistry>> =
    LazyLock::new(|| Arc::new(PluginRegistry::collect_all()));

/// Lookup table from *(driver type, family)* to a [`PluginEntry`].
///
/// The registry is read on every load and written only while the process sets
/// itself up, so a single `RwLock` guards the entry list.
#[derive(Default)]
pub struct PluginRegistry {
    entries: RwLock<Vec<PluginEntry>>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from every entry registered via `#[register_plugin]`.
    ///
    /// If several entries claim the same key a warning is emitted and the
    /// **first** one wins.
    pub fn collect_all() -> Self {
        let mut entries: Vec<PluginEntry> = Vec::with_capacity(PLUGIN_ENTRIES.len());
        for entry in PLUGIN_ENTRIES.iter() {
            if entries
                .iter()
                .any(|e| e.matches(entry.driver_type, entry.family))
            {
                warn!(
                    driver_type = entry.driver_type,
                    family = entry.family,
                    "Multiple plugins registered for the same key, using first"
                );
                continue;
            }
            entries.push(*entry);
        }
        debug!(count = entries.len(), "Collected link-time plugin entries");
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// The process-wide registry, built from link-time entries on first use.
    pub fn global() -> Arc<PluginRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Adds an entry, replacing and returning any entry with the same key.
    pub fn register(&self, entry: PluginEntry) -> Option<PluginEntry> {
        let mut entries = self.entries.write();
        match entries
            .iter_mut()
            .find(|e| e.matches(entry.driver_type, entry.family))
        {
            Some(slot) => {
                warn!(
                    driver_type = entry.driver_type,
                    family = entry.family,
                    "Replacing registered plugin"
                );
                Some(std::mem::replace(slot, entry))
            }
            None => {
                entries.push(entry);
                None
            }
        }
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(self, entry: PluginEntry) -> Self {
        self.register(entry);
        self
    }

    /// Looks up the entry serving `driver_type` / `family`.
    pub fn get(&self, driver_type: &str, family: &str) -> Option<PluginEntry> {
        self.entries
            .read()
            .iter()
            .find(|e| e.matches(driver_type, family))
            .copied()
    }

    /// Returns `true` if an entry serves `driver_type` / `family`.
    pub fn contains(&self, driver_type: &str, family: &str) -> bool {
        self.get(driver_type, family).is_some()
    }

    /// Registered keys, in registration order.
    pub fn keys(&self) -> Vec<(&'static str, &'static str)> {
        self.entries
            .read()
            .iter()
            .map(|e| (e.driver_type, e.family))
            .collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ConfigMapping;
    use crate::plugin::Plugin;

    struct First;
    impl Plugin for First {}

    struct Second;
    impl Plugin for Second {}

    fn first(_: Option<ConfigMapping>) -> Box<dyn Plugin> {
        Box::new(First)
    }

    fn second(_: Option<ConfigMapping>) -> Box<dyn Plugin> {
        Box::new(Second)
    }

    #[test]
    fn lookup_by_type_and_family() {
        let registry = PluginRegistry::new()
            .with(PluginEntry::new("metadata", "onprem", first))
            .with(PluginEntry::new("metadata", "elasticsearch", second));

        assert_eq!(registry.len(), 2);
        let entry = registry.get("metadata", "elasticsearch").unwrap();
        assert!(entry.instantiate(None).is::<Second>());
        assert!(registry.get("storage", "onprem").is_none());
    }

    #[test]
    fn register_replaces_same_key() {
        let registry = PluginRegistry::new();
        assert!(
            registry
                .register(PluginEntry::new("metadata", "onprem", first))
                .is_none()
        );

        let previous = registry
            .register(PluginEntry::new("metadata", "onprem", second))
            .unwrap();
        assert!(previous.instantiate(None).is::<First>());
        assert_eq!(registry.len(), 1);
        assert!(
            registry
                .get("metadata", "onprem")
                .unwrap()
                .instantiate(None)
                .is::<Second>()
        );
    }
}
