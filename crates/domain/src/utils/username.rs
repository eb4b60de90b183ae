//! Username extraction from subject attributes

use std::collections::BTreeMap;

use crate::constants::{DEFAULT_USERNAME_ATTRIBUTE, MIN_DISPLAY_USERNAME_LEN};
use crate::errors::{GrouperError, Result};

/// Extract the login name from a subject attribute mapping.
///
/// Reads the `uid` attribute. No network call is made.
///
/// # Errors
///
/// Returns `GrouperError::Attribute` when `uid` is absent or blank.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use grouper_domain::extract_username;
///
/// let attrs = BTreeMap::from([("uid".to_string(), "jdoe".to_string())]);
/// assert_eq!(extract_username(&attrs).unwrap(), "jdoe");
/// assert!(extract_username(&BTreeMap::new()).is_err());
/// ```
pub fn extract_username(attributes: &BTreeMap<String, String>) -> Result<String> {
    extract_username_with(attributes, DEFAULT_USERNAME_ATTRIBUTE)
}

/// Same as [`extract_username`] with a configurable attribute key.
///
/// # Errors
///
/// Returns `GrouperError::Attribute` when `key` is absent or blank.
pub fn extract_username_with(attributes: &BTreeMap<String, String>, key: &str) -> Result<String> {
    attributes
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GrouperError::Attribute(format!("subject attribute '{key}' is missing")))
}

/// Parse the login out of a `Display Name (login)` description.
///
/// Returns `None` when there is no parenthesised part or it is shorter than
/// three characters.
///
/// ```
/// use grouper_domain::parse_display_username;
///
/// assert_eq!(parse_display_username("Eileen Dover (edover02)"), Some("edover02".to_string()));
/// assert_eq!(parse_display_username("No login here"), None);
/// ```
#[must_use]
pub fn parse_display_username(description: &str) -> Option<String> {
    let open = description.find('(')?;
    let close = open + description[open..].find(')')?;
    let candidate = description[open + 1..close].trim();
    (candidate.len() >= MIN_DISPLAY_USERNAME_LEN).then(|| candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn test_extracts_uid() {
        assert_eq!(extract_username(&attrs(&[("uid", "jdoe")])).unwrap(), "jdoe");
    }

    #[test]
    fn test_missing_uid_is_attribute_error() {
        let err = extract_username(&attrs(&[("mail", "jdoe@example.edu")])).unwrap_err();
        assert!(matches!(err, GrouperError::Attribute(_)));
    }

    #[test]
    fn test_blank_uid_is_attribute_error() {
        let err = extract_username(&attrs(&[("uid", "   ")])).unwrap_err();
        assert!(matches!(err, GrouperError::Attribute(_)));
    }

    #[test]
    fn test_custom_key() {
        let found = extract_username_with(&attrs(&[("login", "asmith")]), "login").unwrap();
        assert_eq!(found, "asmith");
    }

    #[test]
    fn test_parse_display_username() {
        assert_eq!(parse_display_username("Eileen Dover (edover02)"), Some("edover02".into()));
        assert_eq!(parse_display_username("Short (ab)"), None);
        assert_eq!(parse_display_username("Unclosed (paren"), None);
        assert_eq!(parse_display_username(") backwards ("), None);
    }
}
