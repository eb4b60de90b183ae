//! Conversions from external infrastructure errors into domain errors.

use std::io::Error as IoError;

use grouper_domain::GrouperError;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use url::ParseError as UrlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub GrouperError);

impl From<InfraError> for GrouperError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<GrouperError> for InfraError {
    fn from(value: GrouperError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoGrouperError {
    fn into_grouper(self) -> GrouperError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → GrouperError */
/* -------------------------------------------------------------------------- */

impl IntoGrouperError for HttpError {
    fn into_grouper(self) -> GrouperError {
        if self.is_timeout() {
            return GrouperError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return GrouperError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return GrouperError::Config(format!("invalid HTTP client setup: {self}"));
        }

        if self.is_decode() {
            return GrouperError::Service(format!("malformed response body: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => GrouperError::Authentication(message),
                _ => GrouperError::Service(message),
            };
        }

        GrouperError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_grouper())
    }
}

/* -------------------------------------------------------------------------- */
/* jsonwebtoken::Error → GrouperError */
/* -------------------------------------------------------------------------- */

impl IntoGrouperError for JwtError {
    fn into_grouper(self) -> GrouperError {
        match self.kind() {
            JwtErrorKind::InvalidRsaKey(reason) => {
                GrouperError::Signing(format!("private key is not a usable RSA key: {reason}"))
            }
            JwtErrorKind::InvalidKeyFormat => {
                GrouperError::Signing("private key is not valid PEM".into())
            }
            JwtErrorKind::InvalidAlgorithm | JwtErrorKind::InvalidAlgorithmName => {
                GrouperError::Signing("signing algorithm not supported for this key".into())
            }
            _ => GrouperError::Signing(format!("JWT signing failed: {self}")),
        }
    }
}

impl From<JwtError> for InfraError {
    fn from(value: JwtError) -> Self {
        InfraError(value.into_grouper())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json / url → GrouperError */
/* -------------------------------------------------------------------------- */

impl IntoGrouperError for JsonError {
    fn into_grouper(self) -> GrouperError {
        GrouperError::Service(format!("malformed JSON: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_grouper())
    }
}

impl IntoGrouperError for UrlError {
    fn into_grouper(self) -> GrouperError {
        GrouperError::Config(format!("invalid URL: {self}"))
    }
}

impl From<UrlError> for InfraError {
    fn from(value: UrlError) -> Self {
        InfraError(value.into_grouper())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → GrouperError */
/* -------------------------------------------------------------------------- */

impl IntoGrouperError for IoError {
    fn into_grouper(self) -> GrouperError {
        GrouperError::Config(format!("I/O error ({}): {self}", self.kind()))
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_grouper())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
