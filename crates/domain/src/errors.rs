//! Error types used throughout the client

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categories of client errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrouperErrorCategory {
    /// Key loading or JWT signing failed - fatal, no credential available
    Signing,
    /// Token rejected by the server (401, 403)
    Authentication,
    /// 5xx, malformed response or unclassified failure
    Service,
    /// Expected field missing from parsed data
    Attribute,
    /// Invalid or missing configuration
    Config,
    /// Transport failure before a response was received
    Network,
    /// Caller supplied an unusable argument
    InvalidInput,
}

/// Main error type for the Grouper client
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum GrouperError {
    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Missing attribute: {0}")]
    Attribute(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GrouperError {
    /// Get the error category for this error
    pub fn category(&self) -> GrouperErrorCategory {
        match self {
            Self::Signing(_) => GrouperErrorCategory::Signing,
            Self::Authentication(_) => GrouperErrorCategory::Authentication,
            Self::Service(_) => GrouperErrorCategory::Service,
            Self::Attribute(_) => GrouperErrorCategory::Attribute,
            Self::Config(_) => GrouperErrorCategory::Config,
            Self::Network(_) => GrouperErrorCategory::Network,
            Self::InvalidInput(_) => GrouperErrorCategory::InvalidInput,
        }
    }

    /// Stable label suitable for structured logging.
    pub fn label(&self) -> &'static str {
        match self.category() {
            GrouperErrorCategory::Signing => "signing",
            GrouperErrorCategory::Authentication => "authentication",
            GrouperErrorCategory::Service => "service",
            GrouperErrorCategory::Attribute => "attribute",
            GrouperErrorCategory::Config => "config",
            GrouperErrorCategory::Network => "network",
            GrouperErrorCategory::InvalidInput => "invalid_input",
        }
    }

    /// Whether a caller could reasonably retry the operation.
    ///
    /// The client itself never retries; this only informs caller policy.
    /// A rejected token points at configuration, so it is not retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), GrouperErrorCategory::Service | GrouperErrorCategory::Network)
    }
}

/// Result type alias for Grouper operations
pub type Result<T> = std::result::Result<T, GrouperError>;
