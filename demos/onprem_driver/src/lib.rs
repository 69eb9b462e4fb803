//! Example driver plugins.
//!
//! Two families are provided:
//!
//! - `metadata` / `onprem`: a metadata driver talking to an on-premise
//!   service, installed as `metadata_driver_onprem/metadata_plugin.py`.
//! - `metadatadb` / `elasticsearch`: a metadata-db driver, installed as
//!   `metadata_driver_elasticsearch/plugin.py`.
//!
//! Both register themselves at link time; the `metadata` driver is also the
//! entry point exported when this crate is built as a shared library.

use driverkit_core::{ConfigMapping, Plugin};
use driverkit_macros::register_plugin;
use tracing::{debug, warn};

/// Endpoint used when the config does not name one.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000";

/// Metadata driver for on-premise deployments.
#[derive(Debug)]
pub struct OnPremMetadata {
    endpoint: String,
    config: Option<ConfigMapping>,
}

impl OnPremMetadata {
    pub fn new(config: Option<ConfigMapping>) -> Self {
        let endpoint = config
            .as_ref()
            .and_then(|c| c.get("endpoint"))
            .unwrap_or(DEFAULT_ENDPOINT)
            .to_owned();
        debug!(endpoint = %endpoint, "On-premise metadata driver created");
        Self { endpoint, config }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The config the driver was started with.
    pub fn config(&self) -> Option<&ConfigMapping> {
        self.config.as_ref()
    }
}

impl Plugin for OnPremMetadata {
    fn name(&self) -> &str {
        "onprem-metadata"
    }
}

#[register_plugin(driver = "metadata", family = "onprem")]
fn onprem_metadata(config: Option<ConfigMapping>) -> OnPremMetadata {
    OnPremMetadata::new(config)
}

driverkit_core::export_plugin!("metadata", "onprem", OnPremMetadata::new);

/// Metadata-db driver backed by Elasticsearch.
#[derive(Debug)]
pub struct ElasticsearchDb {
    hosts: Vec<String>,
    index: Option<String>,
}

impl ElasticsearchDb {
    pub fn new(config: Option<ConfigMapping>) -> Self {
        let Some(config) = config else {
            warn!("Elasticsearch driver started without config, using defaults");
            return Self {
                hosts: vec![DEFAULT_ENDPOINT.to_owned()],
                index: None,
            };
        };
        let hosts = config
            .get("db.hostname")
            .map(|list| list.split(',').map(|h| h.trim().to_owned()).collect())
            .unwrap_or_else(|| vec![DEFAULT_ENDPOINT.to_owned()]);
        Self {
            hosts,
            index: config.get("db.index").map(str::to_owned),
        }
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }
}

impl Plugin for ElasticsearchDb {
    fn name(&self) -> &str {
        "elasticsearch-db"
    }
}

#[register_plugin(driver = "metadatadb", family = "elasticsearch")]
fn elasticsearch_db(config: Option<ConfigMapping>) -> ElasticsearchDb {
    ElasticsearchDb::new(config)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use driverkit_core::{NamingPolicy, PluginRegistry};
    use driverkit_runtime::{Environment, PluginHost, SiteLayout};

    use super::*;

    fn install(root: &Path, relative: &Path) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn both_families_register_at_link_time() {
        let registry = PluginRegistry::global();
        assert!(registry.contains("metadata", "onprem"));
        assert!(registry.contains("metadatadb", "elasticsearch"));
    }

    #[test]
    fn onprem_reads_endpoint() {
        let config: ConfigMapping = [("endpoint", "http://metadata:5000")].into_iter().collect();
        assert_eq!(OnPremMetadata::new(Some(config)).endpoint(), "http://metadata:5000");
        assert_eq!(OnPremMetadata::new(None).endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn elasticsearch_splits_hosts() {
        let config: ConfigMapping = [("db.hostname", "es1:9200, es2:9200"), ("db.index", "assets")]
            .into_iter()
            .collect();
        let db = ElasticsearchDb::new(Some(config));
        assert_eq!(db.hosts(), ["es1:9200", "es2:9200"]);
        assert_eq!(db.index(), Some("assets"));
    }

    #[test]
    fn starts_through_host() {
        let root = tempfile::tempdir().unwrap();
        let policy = NamingPolicy::metadata_db();
        install(root.path(), &policy.relative_path("metadatadb", "elasticsearch"));
        let ini = root.path().join("db.ini");
        std::fs::write(&ini, "[metadatadb-driver]\ndb.index = ocean\n").unwrap();

        let host = PluginHost::builder()
            .policy(policy)
            .site(SiteLayout::new(root.path(), [], 11))
            .env(Environment::new())
            .build()
            .unwrap();
        let plugin = host.start_plugin("metadatadb", None, Some(&ini)).unwrap();

        assert_eq!(plugin.name(), "elasticsearch-db");
        assert_eq!(plugin.downcast_ref::<ElasticsearchDb>().unwrap().index(), Some("ocean"));
    }
}
