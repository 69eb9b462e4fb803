//! INI config section loading.
//!
//! [`load_section`] reads one section of an INI file into a
//! [`ConfigMapping`].  The section itself must exist; individual options are
//! read independently, so one unreadable option (see [`interpolate`]) is
//! recorded as `None` and logged without affecting the others.
//!
//! Option names are lower-cased.  Options of the `DEFAULT` section are visible
//! in every section unless the section sets them itself.
//!
//! Indented lines continue the value above them; the pieces are joined with
//! `\n`.  The file is rejected as a whole if it has a line that is neither a
//! header nor an option, a section header that appears twice, an option
//! repeated within one section, or options before the first header.

pub mod interpolate;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use driverkit_core::{ConfigMapping, DriverError, DriverResult};
use ini::{Ini, ParseOption};
use tracing::{debug, error};

pub use interpolate::{InterpolationError, MAX_INTERPOLATION_DEPTH};

/// Section whose options every other section inherits.
pub const DEFAULT_SECTION: &str = "DEFAULT";

fn parse_option() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        enabled_indented_mutiline_value: true,
        ..ParseOption::default()
    }
}

/// Loads `section` of the INI file at `path`.
///
/// Fails with [`DriverError::Configuration`] if the file cannot be read or
/// parsed, is malformed (see the module docs), or if the section does not
/// exist.
pub fn load_section(path: &Path, section: &str) -> DriverResult<ConfigMapping> {
    let ini = Ini::load_from_file_opt(path, parse_option()).map_err(|e| {
        error!(path = %path.display(), error = %e, "Failed to read config file");
        DriverError::Configuration
    })?;
    debug!(path = %path.display(), section, "Loaded config file");
    section_mapping(&ini, section)
}

/// Loads `section` from INI source text.
pub fn load_section_str(source: &str, section: &str) -> DriverResult<ConfigMapping> {
    let ini = Ini::load_from_str_opt(source, parse_option()).map_err(|e| {
        error!(error = %e, "Failed to parse config source");
        DriverError::Configuration
    })?;
    section_mapping(&ini, section)
}

/// Rejects layouts the parser accepts but that have no single meaning.
fn check_layout(ini: &Ini) -> Result<(), String> {
    let mut sections = BTreeSet::new();
    for (name, props) in ini.iter() {
        let Some(name) = name else {
            if let Some((key, _)) = props.iter().next() {
                return Err(format!("option {key:?} appears before any section header"));
            }
            continue;
        };
        if !sections.insert(name) {
            return Err(format!("section {name:?} appears more than once"));
        }
        let mut keys = BTreeSet::new();
        for (key, _) in props.iter() {
            // A line without `=` or `:` runs into the next option's name.
            if key.contains(['\n', '\r']) || key.trim().is_empty() {
                return Err(format!("line without a value in section {name:?}: {key:?}"));
            }
            if !keys.insert(key.to_lowercase()) {
                return Err(format!("option {key:?} appears more than once in section {name:?}"));
            }
        }
    }
    Ok(())
}

fn section_mapping(ini: &Ini, section: &str) -> DriverResult<ConfigMapping> {
    check_layout(ini).map_err(|reason| {
        error!(reason = %reason, "Malformed config file");
        DriverError::Configuration
    })?;

    let props = (section != DEFAULT_SECTION)
        .then(|| ini.section(Some(section)))
        .flatten()
        .ok_or_else(|| {
            error!(section, "Config section not found");
            DriverError::Configuration
        })?;

    let mut raw: BTreeMap<String, String> = BTreeMap::new();
    if let Some(defaults) = ini.section(Some(DEFAULT_SECTION)) {
        for (key, value) in defaults.iter() {
            raw.insert(key.to_lowercase(), value.to_owned());
        }
    }
    for (key, value) in props.iter() {
        raw.insert(key.to_lowercase(), value.to_owned());
    }

    let mut mapping = ConfigMapping::new();
    for option in raw.keys() {
        match interpolate::expand(option, &raw) {
            Ok(value) => {
                mapping.insert(option.as_str(), Some(value));
            }
            Err(e) => {
                error!(option = %option, error = %e, "Exception on config option");
                mapping.insert(option.as_str(), None);
            }
        }
    }
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
[DEFAULT]
root = /opt/drivers
timeout = 30

[metadata-driver]
Module = onprem
module.path = %(root)s/onprem
url = http://%(host)s/api
ratio = 50%
timeout = 60
";

    #[test]
    fn key_set_survives_bad_options() {
        let mapping = load_section_str(SOURCE, "metadata-driver").unwrap();
        assert_eq!(
            mapping.keys().collect::<Vec<_>>(),
            ["module", "module.path", "ratio", "root", "timeout", "url"]
        );
        assert_eq!(mapping.entry("url"), Some(&None));
        assert_eq!(mapping.entry("ratio"), Some(&None));
    }

    #[test]
    fn values_are_interpolated_and_defaults_inherited() {
        let mapping = load_section_str(SOURCE, "metadata-driver").unwrap();
        assert_eq!(mapping.get("module"), Some("onprem"));
        assert_eq!(mapping.get("module.path"), Some("/opt/drivers/onprem"));
        assert_eq!(mapping.get("root"), Some("/opt/drivers"));
        assert_eq!(mapping.get("timeout"), Some("60"));
    }

    #[test]
    fn missing_section_is_a_configuration_error() {
        let err = load_section_str(SOURCE, "other").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn default_section_cannot_be_selected() {
        let err = load_section_str(SOURCE, DEFAULT_SECTION).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let path = Path::new("/nonexistent/driver.ini");
        let err = load_section(path, "metadata-driver").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("driver.ini");
        std::fs::write(&path, SOURCE).unwrap();

        let mapping = load_section(&path, "metadata-driver").unwrap();
        assert_eq!(mapping.len(), 6);
    }

    #[test]
    fn indented_lines_continue_the_value() {
        let mapping = load_section_str("[s]\nkey = first\n  second\nother = x\n", "s").unwrap();
        assert_eq!(mapping.keys().collect::<Vec<_>>(), ["key", "other"]);
        assert_eq!(mapping.get("key"), Some("first\nsecond"));
        assert_eq!(mapping.get("other"), Some("x"));
    }

    #[test]
    fn bare_key_is_a_configuration_error() {
        let err = load_section_str("[s]\nflag\nother = x\n", "s").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn repeated_section_is_a_configuration_error() {
        let err = load_section_str("[s]\na = 1\n[s]\nb = 2\n", "s").unwrap_err();
        assert!(err.is_configuration());

        // Also when the repeated section is not the one being read.
        let err = load_section_str("[s]\na = 1\n[t]\nc = 3\n[t]\nd = 4\n", "s").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn repeated_option_is_a_configuration_error() {
        let err = load_section_str("[s]\nhost = a\nHost = b\n", "s").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn options_before_first_header_are_a_configuration_error() {
        let err = load_section_str("stray = 1\n[s]\na = 1\n", "s").unwrap_err();
        assert!(err.is_configuration());
    }
}
