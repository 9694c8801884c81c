//! Distinguished name helpers for Active Directory style DNs.
//!
//! Parsing here is narrow: a DN is a comma-separated list of `Attr=Value` components, most
//! specific first (`CN=Jane Doe,OU=Engineering,DC=corp,DC=example`), and the `CN=`/`OU=`
//! prefixes are matched exactly as Active Directory writes them. [`validate`] alone treats
//! `\,` as part of a value so a configured base DN such as `OU=Doe\, Inc,DC=corp` is accepted.

use thiserror::Error;

use ldapq_core::Error as CoreError;

/// Prefix of a common name component.
pub const CN_PREFIX: &str = "CN=";
/// Prefix of an organizational unit component.
pub const OU_PREFIX: &str = "OU=";

/// Errors reported by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistinguishedNameError {
    /// The distinguished name was empty.
    #[error("distinguished name cannot be empty")]
    Empty,
    /// A component was empty or lacked an `=`.
    #[error("invalid distinguished name component: {0}")]
    InvalidComponent(String),
    /// A component was missing the attribute name to the left of the `=`.
    #[error("distinguished name component missing attribute: {0}")]
    MissingAttribute(String),
    /// A component was missing the value to the right of the `=`.
    #[error("distinguished name component missing value for attribute {0}")]
    MissingValue(String),
    /// The distinguished name ended with an escape character.
    #[error("distinguished name contains an unterminated escape sequence")]
    UnterminatedEscape,
}

impl From<DistinguishedNameError> for CoreError {
    fn from(err: DistinguishedNameError) -> Self {
        CoreError::ConfigError(err.to_string())
    }
}

/// Returns the common name of a DN whose first component is `CN=...`.
///
/// `CN=Admins,OU=Groups,DC=corp` yields `Admins`; a DN that does not start with `CN=` yields
/// `None`. The value runs up to the first comma.
#[must_use]
pub fn common_name(dn: &str) -> Option<&str> {
    dn.strip_prefix(CN_PREFIX)?.split(',').next()
}

/// Scans comma-separated components left to right and returns the remainder of the first one
/// that starts with `prefix`.
#[must_use]
pub fn first_value_with_prefix<'a>(dn: &'a str, prefix: &str) -> Option<&'a str> {
    dn.split(',')
        .find_map(|component| component.strip_prefix(prefix))
}

/// Checks that `dn` is a well formed list of `Attr=Value` components.
///
/// # Errors
///
/// Returns [`DistinguishedNameError`] describing the first malformed piece.
pub fn validate(dn: &str) -> Result<(), DistinguishedNameError> {
    let dn = dn.trim();
    if dn.is_empty() {
        return Err(DistinguishedNameError::Empty);
    }
    if ends_with_lone_escape(dn) {
        return Err(DistinguishedNameError::UnterminatedEscape);
    }

    for component in split_unescaped(dn) {
        if component.is_empty() {
            return Err(DistinguishedNameError::InvalidComponent(dn.to_string()));
        }
        let (attribute, value) = component
            .split_once('=')
            .ok_or_else(|| DistinguishedNameError::InvalidComponent(component.to_string()))?;
        if attribute.trim().is_empty() {
            return Err(DistinguishedNameError::MissingAttribute(component.to_string()));
        }
        if value.trim().is_empty() {
            return Err(DistinguishedNameError::MissingValue(
                attribute.trim().to_string(),
            ));
        }
    }

    Ok(())
}

/// Splits on commas not preceded by an escaping backslash.
fn split_unescaped(dn: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escape = false;

    for (idx, ch) in dn.char_indices() {
        if escape {
            escape = false;
        } else if ch == '\\' {
            escape = true;
        } else if ch == ',' {
            parts.push(dn[start..idx].trim());
            start = idx + 1;
        }
    }

    parts.push(dn[start..].trim());
    parts
}

fn ends_with_lone_escape(value: &str) -> bool {
    let trailing = value.chars().rev().take_while(|ch| *ch == '\\').count();
    trailing % 2 == 1
}
