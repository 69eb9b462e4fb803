//! Plugin path resolution.
//!
//! # Resolution order
//!
//! 1. **Explicit override**: `module.path` in the config mapping.  The result
//!    is `{module.path}/{file}` and is returned without an existence check.
//!    An empty (or blank) `module.path` counts as absent, like an unset
//!    environment variable, and resolution moves on to the next tier.
//! 2. **Virtual environment** (policies with `virtualenv_convention` only):
//!    `{VIRTUAL_ENV}/lib/python3.{minor}/site-packages/{package}/{file}`,
//!    also unchecked.
//! 3. **Installed library**: `{purelib}/{package}/{file}` if it exists.
//! 4. **Search path**: `{dir}/{package}/{file}` for every search-path
//!    directory in order; the first existing candidate wins.
//!
//! When every checked candidate is missing, resolution fails with
//! [`LoadError::NotFound`] naming the last candidate tried.

use std::path::{Path, PathBuf};

use driverkit_core::{
    ConfigMapping, DriverError, DriverResult, LoadError, MODULE_PATH_KEY, NamingPolicy,
};
use tracing::{debug, error, trace};

use crate::env::{Environment, resolve_value};
use crate::site::SiteLayout;

/// Computes plugin file locations for one naming policy.
///
/// A resolver only borrows its inputs; it reads the filesystem for existence
/// checks and nothing else.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    policy: &'a NamingPolicy,
    site: &'a SiteLayout,
    env: &'a Environment,
}

impl<'a> PathResolver<'a> {
    /// Creates a resolver over explicit inputs.
    pub fn new(policy: &'a NamingPolicy, site: &'a SiteLayout, env: &'a Environment) -> Self {
        Self { policy, site, env }
    }

    /// The naming policy in use.
    pub fn policy(&self) -> &'a NamingPolicy {
        self.policy
    }

    /// Picks the family name for a load.
    ///
    /// The caller's family (or the policy default) is the fallback; a policy
    /// with a family override lets its environment variable and then its
    /// config key take precedence.
    pub fn resolve_family(
        &self,
        requested: Option<&str>,
        config: Option<&ConfigMapping>,
    ) -> String {
        let fallback = requested.unwrap_or(&self.policy.default_family);
        match &self.policy.family_override {
            Some(over) => {
                resolve_value(&over.config_key, &over.env_var, fallback, config, self.env)
            }
            None => fallback.to_owned(),
        }
    }

    /// Resolves the plugin file for `driver_type` / `family`.
    pub fn resolve(
        &self,
        driver_type: &str,
        family: &str,
        config: Option<&ConfigMapping>,
    ) -> DriverResult<PathBuf> {
        validate_name("driver type", driver_type)?;
        let file_name = self.policy.file_name(driver_type);

        let explicit = config
            .and_then(|c| c.get(MODULE_PATH_KEY))
            .filter(|dir| !dir.trim().is_empty());
        if let Some(dir) = explicit {
            let path = Path::new(dir).join(&file_name);
            debug!(path = %path.display(), "Using explicit module path");
            return Ok(path);
        }

        validate_name("family", family)?;
        let relative = self.policy.relative_path(driver_type, family);

        if self.policy.virtualenv_convention
            && let Some(venv) = self.env.virtual_env()
        {
            let path = venv
                .join("lib")
                .join(format!("python3.{}", self.site.minor_version))
                .join("site-packages")
                .join(&relative);
            debug!(path = %path.display(), "Using virtual environment convention");
            return Ok(path);
        }

        let mut candidate = self.site.purelib.join(&relative);
        trace!(path = %candidate.display(), "Checking installed library");
        if candidate.is_file() {
            debug!(path = %candidate.display(), "Found plugin in installed library");
            return Ok(candidate);
        }

        for dir in &self.site.search_path {
            candidate = dir.join(&relative);
            trace!(path = %candidate.display(), "Checking search path");
            if candidate.is_file() {
                debug!(path = %candidate.display(), "Found plugin on search path");
                return Ok(candidate);
            }
        }

        error!(path = %candidate.display(), "Cannot find module");
        Err(LoadError::NotFound { path: candidate }.into())
    }
}

/// Rejects names that would escape the package layout.
fn validate_name(what: &str, name: &str) -> DriverResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        error!(kind = what, name, "Invalid name for plugin resolution");
        return Err(DriverError::Configuration);
    }
    Ok(())
}
