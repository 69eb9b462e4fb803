//! Naming policies of the driver facilities.
//!
//! Both facilities share one resolution skeleton and differ only in how plugin
//! files are named, which family they default to and whether the family can be
//! overridden from config or the environment.

use std::path::PathBuf;

/// Config key holding an explicit plugin directory.
pub const MODULE_PATH_KEY: &str = "module.path";

/// Placeholder substituted with the driver type in file templates.
pub const TYPE_PLACEHOLDER: &str = "{type}";

/// Where the family name may be overridden, highest precedence first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyOverride {
    /// Environment variable consulted first.
    pub env_var: String,
    /// Config key consulted second.
    pub config_key: String,
}

/// File naming and family rules of one driver facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPolicy {
    /// Plugin file name; `{type}` is replaced by the driver type.
    pub file_template: String,
    /// Prefix of the per-family package directory.
    pub package_prefix: String,
    /// Family used when neither the caller nor an override names one.
    pub default_family: String,
    /// Optional env/config override of the family name.
    pub family_override: Option<FamilyOverride>,
    /// Whether `VIRTUAL_ENV` selects the plugin location directly.
    pub virtualenv_convention: bool,
    /// INI section holding the plugin options.
    pub section: String,
}

impl NamingPolicy {
    /// The generic driver facility: `metadata_driver_{family}/{type}_plugin.py`,
    /// family defaults to `onprem`.
    pub fn driver_interface() -> Self {
        Self {
            file_template: "{type}_plugin.py".into(),
            package_prefix: "metadata_driver_".into(),
            default_family: "onprem".into(),
            family_override: None,
            virtualenv_convention: false,
            section: "metadata-driver".into(),
        }
    }

    /// The metadata-db facility: `metadata_driver_{family}/plugin.py`, family
    /// taken from `MODULE` / `module` and defaulting to `elasticsearch`.
    pub fn metadata_db() -> Self {
        Self {
            file_template: "plugin.py".into(),
            package_prefix: "metadata_driver_".into(),
            default_family: "elasticsearch".into(),
            family_override: Some(FamilyOverride {
                env_var: "MODULE".into(),
                config_key: "module".into(),
            }),
            virtualenv_convention: true,
            section: "metadatadb-driver".into(),
        }
    }

    /// Sets the file template.
    pub fn with_file_template(mut self, template: impl Into<String>) -> Self {
        self.file_template = template.into();
        self
    }

    /// Sets the INI section name.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    /// Sets the default family.
    pub fn with_default_family(mut self, family: impl Into<String>) -> Self {
        self.default_family = family.into();
        self
    }

    /// Plugin file name for `driver_type`; doubles as the synthetic unit name.
    pub fn file_name(&self, driver_type: &str) -> String {
        self.file_template.replace(TYPE_PLACEHOLDER, driver_type)
    }

    /// Package directory name for `family`.
    pub fn package_dir(&self, family: &str) -> String {
        format!("{}{family}", self.package_prefix)
    }

    /// `{package_dir}/{file_name}`, relative to an installation root.
    pub fn relative_path(&self, driver_type: &str, family: &str) -> PathBuf {
        PathBuf::from(self.package_dir(family)).join(self.file_name(driver_type))
    }
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self::driver_interface()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_policy_names_files_by_type() {
        let policy = NamingPolicy::driver_interface();
        assert_eq!(policy.file_name("metadata"), "metadata_plugin.py");
        assert_eq!(
            policy.relative_path("metadata", "onprem"),
            PathBuf::from("metadata_driver_onprem/metadata_plugin.py")
        );
    }

    #[test]
    fn metadata_db_policy_ignores_type() {
        let policy = NamingPolicy::metadata_db();
        assert_eq!(policy.file_name("metadatadb"), "plugin.py");
        assert_eq!(
            policy.relative_path("metadatadb", "mongodb"),
            PathBuf::from("metadata_driver_mongodb/plugin.py")
        );
        assert!(policy.virtualenv_convention);
        assert_eq!(policy.default_family, "elasticsearch");
    }
}
