//! Configuration management
//!
//! [`GrouperConfig`] is resolved once when a client is constructed. Explicit
//! values supplied through [`ConfigOverrides`] take precedence over
//! environment defaults; nothing is looked up again at call time.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_REFRESH_MARGIN_SECS, DEFAULT_TOKEN_VALIDITY_SECS,
    DEFAULT_USERNAME_ATTRIBUTE, DESCRIPTION_ATTRIBUTE, ENV_API_URL, ENV_DEFAULT_STEM,
    ENV_ENTITY_ID, ENV_KEY_PATH,
};
use crate::errors::{GrouperError, Result};

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrouperConfig {
    /// Base URL of the Grouper web services, e.g.
    /// `https://grouper.example.edu/grouper-ws/servicesRest/v2_6_000/`
    pub api_url: String,
    /// Entity id registered with Grouper for JWT authentication
    pub entity_id: String,
    /// Path to the PEM-encoded RSA private key
    pub key_path: PathBuf,
    /// Stem used when a group name or stem is not fully qualified
    pub default_stem: String,
    #[serde(default = "default_token_validity_secs")]
    pub token_validity_secs: u64,
    #[serde(default = "default_token_refresh_margin_secs")]
    pub token_refresh_margin_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_verify_certs")]
    pub verify_certs: bool,
    /// Subject attributes requested from Grouper with member/subject lookups
    #[serde(default = "default_subject_attribute_names")]
    pub subject_attribute_names: Vec<String>,
    /// Attribute holding the login name of a subject
    #[serde(default = "default_username_attribute")]
    pub username_attribute: String,
}

fn default_token_validity_secs() -> u64 {
    DEFAULT_TOKEN_VALIDITY_SECS
}

fn default_token_refresh_margin_secs() -> u64 {
    DEFAULT_TOKEN_REFRESH_MARGIN_SECS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_verify_certs() -> bool {
    true
}

fn default_subject_attribute_names() -> Vec<String> {
    vec![DEFAULT_USERNAME_ATTRIBUTE.to_string(), DESCRIPTION_ATTRIBUTE.to_string()]
}

fn default_username_attribute() -> String {
    DEFAULT_USERNAME_ATTRIBUTE.to_string()
}

impl GrouperConfig {
    /// Start an explicit configuration.
    pub fn builder() -> ConfigOverrides {
        ConfigOverrides::default()
    }

    /// Check the invariants that do not need URL parsing.
    ///
    /// # Errors
    /// Returns `GrouperError::Config` describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(GrouperError::Config("api_url must not be empty".into()));
        }
        if self.entity_id.trim().is_empty() {
            return Err(GrouperError::Config("entity_id must not be empty".into()));
        }
        if self.default_stem.trim().is_empty() {
            return Err(GrouperError::Config("default_stem must not be empty".into()));
        }
        if self.token_validity_secs <= self.token_refresh_margin_secs {
            return Err(GrouperError::Config(format!(
                "token_validity_secs ({}) must exceed token_refresh_margin_secs ({})",
                self.token_validity_secs, self.token_refresh_margin_secs
            )));
        }
        if self.username_attribute.trim().is_empty() {
            return Err(GrouperError::Config("username_attribute must not be empty".into()));
        }
        Ok(())
    }

    /// `api_url` with a trailing slash so relative endpoints join beneath it.
    pub fn normalized_api_url(&self) -> String {
        if self.api_url.ends_with('/') {
            self.api_url.clone()
        } else {
            format!("{}/", self.api_url)
        }
    }
}

/// Partially specified configuration.
///
/// Used both as the explicit-argument builder and as the carrier for values
/// read from the environment; [`ConfigOverrides::or`] merges the two with
/// the receiver winning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub entity_id: Option<String>,
    pub key_path: Option<PathBuf>,
    pub default_stem: Option<String>,
    pub token_validity_secs: Option<u64>,
    pub token_refresh_margin_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub verify_certs: Option<bool>,
    pub subject_attribute_names: Option<Vec<String>>,
    pub username_attribute: Option<String>,
}

impl ConfigOverrides {
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    pub fn default_stem(mut self, stem: impl Into<String>) -> Self {
        self.default_stem = Some(stem.into());
        self
    }

    pub fn token_validity_secs(mut self, secs: u64) -> Self {
        self.token_validity_secs = Some(secs);
        self
    }

    pub fn token_refresh_margin_secs(mut self, secs: u64) -> Self {
        self.token_refresh_margin_secs = Some(secs);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn verify_certs(mut self, verify: bool) -> Self {
        self.verify_certs = Some(verify);
        self
    }

    pub fn subject_attribute_names(mut self, names: Vec<String>) -> Self {
        self.subject_attribute_names = Some(names);
        self
    }

    pub fn username_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.username_attribute = Some(attribute.into());
        self
    }

    /// Fill every unset field from `fallback`.
    #[must_use]
    pub fn or(self, fallback: ConfigOverrides) -> Self {
        Self {
            api_url: self.api_url.or(fallback.api_url),
            entity_id: self.entity_id.or(fallback.entity_id),
            key_path: self.key_path.or(fallback.key_path),
            default_stem: self.default_stem.or(fallback.default_stem),
            token_validity_secs: self.token_validity_secs.or(fallback.token_validity_secs),
            token_refresh_margin_secs: self
                .token_refresh_margin_secs
                .or(fallback.token_refresh_margin_secs),
            timeout_secs: self.timeout_secs.or(fallback.timeout_secs),
            verify_certs: self.verify_certs.or(fallback.verify_certs),
            subject_attribute_names: self
                .subject_attribute_names
                .or(fallback.subject_attribute_names),
            username_attribute: self.username_attribute.or(fallback.username_attribute),
        }
    }

    /// Build and validate the final configuration.
    ///
    /// # Errors
    /// Returns `GrouperError::Config` naming every missing required value
    /// (by its environment variable), or the first violated invariant.
    pub fn build(self) -> Result<GrouperConfig> {
        let mut missing = Vec::new();
        if self.api_url.is_none() {
            missing.push(ENV_API_URL);
        }
        if self.entity_id.is_none() {
            missing.push(ENV_ENTITY_ID);
        }
        if self.key_path.is_none() {
            missing.push(ENV_KEY_PATH);
        }
        if self.default_stem.is_none() {
            missing.push(ENV_DEFAULT_STEM);
        }

        let (Some(api_url), Some(entity_id), Some(key_path), Some(default_stem)) =
            (self.api_url, self.entity_id, self.key_path, self.default_stem)
        else {
            return Err(GrouperError::Config(format!(
                "api_url, entity_id, key_path and default_stem are required; missing: {}",
                missing.join(", ")
            )));
        };

        let config = GrouperConfig {
            api_url,
            entity_id,
            key_path,
            default_stem,
            token_validity_secs: self
                .token_validity_secs
                .unwrap_or(DEFAULT_TOKEN_VALIDITY_SECS),
            token_refresh_margin_secs: self
                .token_refresh_margin_secs
                .unwrap_or(DEFAULT_TOKEN_REFRESH_MARGIN_SECS),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            verify_certs: self.verify_certs.unwrap_or(true),
            subject_attribute_names: self
                .subject_attribute_names
                .unwrap_or_else(default_subject_attribute_names),
            username_attribute: self.username_attribute.unwrap_or_else(default_username_attribute),
        };

        config.validate()?;
        Ok(config)
    }
}
