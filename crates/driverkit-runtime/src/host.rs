//! The plugin host: one entry point from config file to plugin instance.
//!
//! ```rust,ignore
//! use driverkit_runtime::PluginHost;
//!
//! let host = PluginHost::builder().build()?;
//! let plugin = host.start_plugin("metadata", None, Some("driver.ini".as_ref()))?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use driverkit_core::{ConfigMapping, DriverError, DriverResult, NamingPolicy};
use tracing::{debug, error, info};

use crate::config::HostConfig;
use crate::env::Environment;
use crate::ini_file;
use crate::loader::{LoadedPlugin, PluginLoader, RegistryLoader, UnitLoader};
use crate::resolve::PathResolver;
use crate::site::{DEFAULT_INTERPRETER, SiteLayout};

/// Resolves and starts plugins for one naming policy.
///
/// A host holds no per-plugin state: every call re-reads the config file and
/// constructs a fresh instance.
pub struct PluginHost {
    policy: NamingPolicy,
    site: SiteLayout,
    env: Environment,
    units: Arc<dyn UnitLoader>,
}

impl PluginHost {
    /// Starts building a host.
    pub fn builder() -> PluginHostBuilder {
        PluginHostBuilder::default()
    }

    /// Starts building a host from settings.
    pub fn from_settings(settings: &HostConfig) -> PluginHostBuilder {
        let mut builder = Self::builder()
            .policy(settings.policy())
            .interpreter(&settings.interpreter);
        for dir in &settings.search_paths {
            builder = builder.search_path(dir);
        }
        builder
    }

    pub fn policy(&self) -> &NamingPolicy {
        &self.policy
    }

    pub fn site(&self) -> &SiteLayout {
        &self.site
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(&self.policy, &self.site, &self.env)
    }

    /// Reads the config file and starts a plugin.
    ///
    /// `CONFIG_PATH` takes precedence over `config_path`.  With a config file
    /// the policy's section is loaded and handed to the plugin; without one
    /// the plugin receives `None`.
    pub fn start_plugin(
        &self,
        driver_type: &str,
        family: Option<&str>,
        config_path: Option<&Path>,
    ) -> DriverResult<LoadedPlugin> {
        let config = match self.config_source(config_path) {
            Some(path) => Some(self.load_config(&path)?),
            None => {
                debug!(driver_type, "No config file, starting plugin without config");
                None
            }
        };
        self.load_plugin(driver_type, family, config)
    }

    /// Starts a plugin with an already loaded config mapping.
    pub fn load_plugin(
        &self,
        driver_type: &str,
        family: Option<&str>,
        config: Option<ConfigMapping>,
    ) -> DriverResult<LoadedPlugin> {
        PluginLoader::new(self.resolver(), self.units.as_ref()).load(driver_type, family, config)
    }

    /// Resolves the plugin file without loading it.
    pub fn resolve_path(
        &self,
        driver_type: &str,
        family: Option<&str>,
        config: Option<&ConfigMapping>,
    ) -> DriverResult<PathBuf> {
        let resolver = self.resolver();
        let family = resolver.resolve_family(family, config);
        resolver.resolve(driver_type, &family, config)
    }

    /// Loads the policy's section from the INI file at `path`.
    pub fn load_config(&self, path: &Path) -> DriverResult<ConfigMapping> {
        ini_file::load_section(path, &self.policy.section)
    }

    /// The config file a start would read: `CONFIG_PATH`, else `explicit`.
    pub fn config_source(&self, explicit: Option<&Path>) -> Option<PathBuf> {
        self.env
            .config_path()
            .or_else(|| explicit.map(Path::to_path_buf))
    }
}

impl std::fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHost")
            .field("policy", &self.policy)
            .field("site", &self.site)
            .finish_non_exhaustive()
    }
}

/// Builder for [`PluginHost`].
///
/// Anything left unset is taken from the process: the environment is
/// captured, the site layout is probed from the interpreter, and plugins come
/// from the global registry.
#[derive(Default)]
pub struct PluginHostBuilder {
    policy: Option<NamingPolicy>,
    section: Option<String>,
    site: Option<SiteLayout>,
    interpreter: Option<String>,
    search_paths: Vec<PathBuf>,
    env: Option<Environment>,
    units: Option<Arc<dyn UnitLoader>>,
}

impl PluginHostBuilder {
    pub fn policy(mut self, policy: NamingPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Overrides the policy's config section.
    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Uses an explicit site layout instead of probing.
    pub fn site(mut self, site: SiteLayout) -> Self {
        self.site = Some(site);
        self
    }

    /// Interpreter to probe when no site layout is given.
    pub fn interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = Some(interpreter.into());
        self
    }

    /// Appends a directory to the search path.
    pub fn search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    /// Uses an explicit environment snapshot.
    pub fn env(mut self, env: Environment) -> Self {
        self.env = Some(env);
        self
    }

    /// Uses `units` to load resolved plugin files.
    pub fn units(mut self, units: impl UnitLoader + 'static) -> Self {
        self.units = Some(Arc::new(units));
        self
    }

    /// Builds the host.
    ///
    /// Fails with [`DriverError::Configuration`] if the interpreter has to be
    /// probed and cannot be.
    pub fn build(self) -> DriverResult<PluginHost> {
        let mut policy = self.policy.unwrap_or_default();
        if let Some(section) = self.section {
            policy = policy.with_section(section);
        }

        let site = match self.site {
            Some(site) => site,
            None => {
                let interpreter = self.interpreter.as_deref().unwrap_or(DEFAULT_INTERPRETER);
                SiteLayout::probe(interpreter).map_err(|e| {
                    error!(interpreter, error = %e, "Failed to probe interpreter layout");
                    DriverError::Configuration
                })?
            }
        };
        let site = self
            .search_paths
            .into_iter()
            .fold(site, SiteLayout::with_search_path);

        let env = self.env.unwrap_or_else(Environment::capture);
        let units: Arc<dyn UnitLoader> = match self.units {
            Some(units) => units,
            None => Arc::new(RegistryLoader::global()),
        };

        info!(
            section = %policy.section,
            purelib = %site.purelib.display(),
            search_path = site.search_path.len(),
            "Plugin host ready"
        );
        Ok(PluginHost {
            policy,
            site,
            env,
            units,
        })
    }
}

/// Starts a plugin with a default host built from the process environment.
pub fn start_plugin(
    driver_type: &str,
    family: Option<&str>,
    config_path: Option<&Path>,
) -> DriverResult<LoadedPlugin> {
    PluginHost::builder()
        .build()?
        .start_plugin(driver_type, family, config_path)
}

#[cfg(test)]
mod tests {
    use driverkit_core::{Plugin, PluginEntry, PluginRegistry};

    use super::*;
    use crate::env::CONFIG_PATH_VAR;

    struct Recorder {
        config: Option<ConfigMapping>,
    }

    impl Plugin for Recorder {}

    fn test_host(root: &Path, env: Environment) -> PluginHost {
        let registry = PluginRegistry::new().with(PluginEntry::new("metadata", "onprem", |config| {
            Box::new(Recorder { config })
        }));
        PluginHost::builder()
            .site(SiteLayout::new(root, [], 11))
            .env(env)
            .units(RegistryLoader::new(Arc::new(registry)))
            .build()
            .unwrap()
    }

    fn install(root: &Path) {
        let dir = root.join("metadata_driver_onprem");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("metadata_plugin.py"), "").unwrap();
    }

    #[test]
    fn config_path_variable_wins() {
        let host = test_host(
            Path::new("/nonexistent"),
            Environment::new().with(CONFIG_PATH_VAR, "/env.ini"),
        );
        assert_eq!(
            host.config_source(Some(Path::new("/explicit.ini"))),
            Some(PathBuf::from("/env.ini"))
        );

        let host_without = test_host(Path::new("/nonexistent"), Environment::new());
        assert_eq!(
            host_without.config_source(Some(Path::new("/explicit.ini"))),
            Some(PathBuf::from("/explicit.ini"))
        );
        assert_eq!(host_without.config_source(None), None);
    }

    #[test]
    fn starts_without_config() {
        let root = tempfile::tempdir().unwrap();
        install(root.path());
        let host = test_host(root.path(), Environment::new());

        let plugin = host.start_plugin("metadata", None, None).unwrap();
        assert_eq!(plugin.family(), "onprem");
        assert!(plugin.downcast_ref::<Recorder>().unwrap().config.is_none());
    }

    #[test]
    fn starts_with_section_from_file() {
        let root = tempfile::tempdir().unwrap();
        install(root.path());
        let ini = root.path().join("driver.ini");
        std::fs::write(&ini, "[metadata-driver]\nendpoint = http://localhost\n").unwrap();
        let host = test_host(root.path(), Environment::new());

        let plugin = host.start_plugin("metadata", None, Some(&ini)).unwrap();
        let config = plugin.downcast_ref::<Recorder>().unwrap().config.as_ref().unwrap();
        assert_eq!(config.get("endpoint"), Some("http://localhost"));
    }

    #[test]
    fn missing_config_file_is_a_configuration_error() {
        let root = tempfile::tempdir().unwrap();
        install(root.path());
        let host = test_host(root.path(), Environment::new());

        let err = host
            .start_plugin("metadata", None, Some(Path::new("/nonexistent/driver.ini")))
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "you should provide a valid config");
    }

    #[test]
    fn resolve_path_does_not_load() {
        let root = tempfile::tempdir().unwrap();
        install(root.path());
        let host = test_host(root.path(), Environment::new());

        let path = host.resolve_path("metadata", None, None).unwrap();
        assert_eq!(path, root.path().join("metadata_driver_onprem/metadata_plugin.py"));
    }

    #[test]
    fn section_override_applies() {
        let host = PluginHost::builder()
            .section("custom")
            .site(SiteLayout::new("/nonexistent", [], 11))
            .env(Environment::new())
            .build()
            .unwrap();
        assert_eq!(host.policy().section, "custom");
    }

    #[test]
    fn unknown_interpreter_is_a_configuration_error() {
        let err = PluginHost::builder()
            .interpreter("driverkit-no-such-interpreter")
            .env(Environment::new())
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
