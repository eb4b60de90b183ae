//! Client constants
//!
//! Centralized location for protocol and configuration constants.

// Environment variables
pub const ENV_API_URL: &str = "GROUPER_API_URL";
pub const ENV_ENTITY_ID: &str = "GROUPER_ENTITY_ID";
pub const ENV_KEY_PATH: &str = "GROUPER_KEY_PATH";
pub const ENV_DEFAULT_STEM: &str = "GROUPER_HPC_STEM";
pub const ENV_TOKEN_VALIDITY_SECS: &str = "GROUPER_TOKEN_VALIDITY_SECS";
pub const ENV_TIMEOUT_SECS: &str = "GROUPER_TIMEOUT_SECS";
pub const ENV_VERIFY_CERTS: &str = "VERIFY_CERTS";

// Token policy
pub const DEFAULT_TOKEN_VALIDITY_SECS: u64 = 60;
pub const DEFAULT_TOKEN_REFRESH_MARGIN_SECS: u64 = 5;
/// Grouper resolves the signing entity from this credential prefix.
pub const JWT_USER_PREFIX: &str = "jwtUser_";

// Transport
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// Subject attributes
pub const DEFAULT_USERNAME_ATTRIBUTE: &str = "uid";
pub const DESCRIPTION_ATTRIBUTE: &str = "description";
/// Parenthesised logins shorter than this are treated as noise.
pub const MIN_DISPLAY_USERNAME_LEN: usize = 3;

// Group queries
pub const STEM_SEPARATOR: char = ':';
pub const DEFAULT_PAGE_NUMBER: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10_000;

// Endpoints, relative to the configured api_url
pub const GROUPS_ENDPOINT: &str = "groups";
pub const SUBJECTS_ENDPOINT: &str = "subjects";
