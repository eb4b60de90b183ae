//! Member types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::DESCRIPTION_ATTRIBUTE;
use crate::utils::username::{extract_username_with, parse_display_username};

/// A subject returned by member or subject lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    pub subject_id: String,
    /// Login derived from `attributes`
    pub username: String,
    pub attributes: BTreeMap<String, String>,
}

impl MemberDescriptor {
    /// Build a descriptor, deriving the username.
    ///
    /// The username comes from `username_attribute` when present, then from
    /// the `Display Name (login)` convention in the description attribute,
    /// and finally falls back to the subject id.
    pub fn from_attributes(
        subject_id: impl Into<String>,
        attributes: BTreeMap<String, String>,
        username_attribute: &str,
    ) -> Self {
        let subject_id = subject_id.into();
        let username = extract_username_with(&attributes, username_attribute)
            .ok()
            .or_else(|| {
                attributes.get(DESCRIPTION_ATTRIBUTE).and_then(|d| parse_display_username(d))
            })
            .unwrap_or_else(|| subject_id.clone());

        Self { subject_id, username, attributes }
    }
}
