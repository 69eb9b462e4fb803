//! `%(name)s` value interpolation.
//!
//! - `%(name)s` expands to the value of option `name` (case-insensitive) of
//!   the same section, `DEFAULT` included.  Expansion is recursive.
//! - `%%` is a literal `%`.
//! - Any other `%` is a syntax error.

use std::collections::BTreeMap;

use thiserror::Error;

/// Maximum nesting of `%(name)s` references.
pub const MAX_INTERPOLATION_DEPTH: usize = 10;

/// Why a single option value could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpolationError {
    /// A `%(name)s` reference names an option that does not exist.
    #[error("option '{option}' references missing option '{reference}'")]
    MissingReference {
        /// Option being read.
        option: String,
        /// Name that could not be found.
        reference: String,
    },

    /// A `%` is not followed by `%` or a well-formed `(name)s`.
    #[error("bad interpolation syntax in option '{option}' near '{fragment}'")]
    Syntax {
        /// Option being read.
        option: String,
        /// Remainder of the value starting at the offending `%`.
        fragment: String,
    },

    /// References nest deeper than [`MAX_INTERPOLATION_DEPTH`].
    #[error("interpolation of option '{option}' exceeds depth {MAX_INTERPOLATION_DEPTH}")]
    TooDeep {
        /// Option being read.
        option: String,
    },
}

/// Expands the raw value of `option` against `values`.
///
/// `values` maps lowercase option names to raw (unexpanded) values.
pub fn expand(
    option: &str,
    values: &BTreeMap<String, String>,
) -> Result<String, InterpolationError> {
    let raw = values.get(option).map(String::as_str).unwrap_or_default();
    let mut out = String::with_capacity(raw.len());
    expand_into(option, raw, values, &mut out, 1)?;
    Ok(out)
}

fn expand_into(
    option: &str,
    mut rest: &str,
    values: &BTreeMap<String, String>,
    out: &mut String,
    depth: usize,
) -> Result<(), InterpolationError> {
    if depth > MAX_INTERPOLATION_DEPTH {
        return Err(InterpolationError::TooDeep {
            option: option.to_owned(),
        });
    }

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some(tail) = rest.strip_prefix("%%") {
            out.push('%');
            rest = tail;
            continue;
        }

        let reference = rest
            .strip_prefix("%(")
            .and_then(|r| r.split_once(')'))
            .filter(|(name, tail)| !name.is_empty() && tail.starts_with('s'));
        let Some((name, tail)) = reference else {
            return Err(InterpolationError::Syntax {
                option: option.to_owned(),
                fragment: rest.to_owned(),
            });
        };

        let name = name.to_lowercase();
        let value = values
            .get(&name)
            .ok_or_else(|| InterpolationError::MissingReference {
                option: option.to_owned(),
                reference: name.clone(),
            })?;
        if value.contains('%') {
            expand_into(option, value, values, out, depth + 1)?;
        } else {
            out.push_str(value);
        }
        rest = &tail[1..];
    }

    out.push_str(rest);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn plain_values_pass_through() {
        let v = values(&[("host", "localhost")]);
        assert_eq!(expand("host", &v).unwrap(), "localhost");
    }

    #[test]
    fn references_expand_recursively() {
        let v = values(&[
            ("root", "/opt"),
            ("base", "%(root)s/drivers"),
            ("module.path", "%(BASE)s/onprem"),
        ]);
        assert_eq!(expand("module.path", &v).unwrap(), "/opt/drivers/onprem");
    }

    #[test]
    fn double_percent_is_literal() {
        let v = values(&[("ratio", "50%%")]);
        assert_eq!(expand("ratio", &v).unwrap(), "50%");
    }

    #[test]
    fn missing_reference_fails() {
        let v = values(&[("url", "http://%(host)s")]);
        assert_eq!(
            expand("url", &v).unwrap_err(),
            InterpolationError::MissingReference {
                option: "url".into(),
                reference: "host".into(),
            }
        );
    }

    #[test]
    fn stray_percent_fails() {
        let v = values(&[("ratio", "50%"), ("bad", "%(name)d")]);
        assert!(matches!(
            expand("ratio", &v),
            Err(InterpolationError::Syntax { .. })
        ));
        assert!(matches!(
            expand("bad", &v),
            Err(InterpolationError::Syntax { .. })
        ));
    }

    #[test]
    fn self_reference_is_too_deep() {
        let v = values(&[("loop", "%(loop)s")]);
        assert_eq!(
            expand("loop", &v).unwrap_err(),
            InterpolationError::TooDeep {
                option: "loop".into()
            }
        );
    }
}
