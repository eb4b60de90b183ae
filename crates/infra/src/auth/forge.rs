//! JWT assertion minting
//!
//! Grouper authenticates web-service callers with a JWT they sign
//! themselves. The entity registers a public key with Grouper; every
//! request then carries `Bearer jwtUser_<entityId>_<jwt>`.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use grouper_domain::constants::JWT_USER_PREFIX;
use grouper_domain::{GrouperError, Result};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::InfraError;

/// Claims carried by every assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// A signed, short-lived credential.
///
/// Tokens are replaced wholesale when they expire, never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    assertion: String,
    credential: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Token {
    /// Raw signed JWT.
    pub fn assertion(&self) -> &str {
        &self.assertion
    }

    /// Value placed after `Bearer ` in the `Authorization` header.
    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True when `now + margin` has reached `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        let margin = chrono::Duration::from_std(margin).unwrap_or(chrono::Duration::MAX);
        now.checked_add_signed(margin).map_or(true, |deadline| deadline >= self.expires_at)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("credential", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Builds and signs assertions for one entity.
///
/// The key is parsed once at construction; minting has no side effects
/// and caches nothing.
pub struct TokenForge {
    entity_id: String,
    key: EncodingKey,
    header: Header,
}

impl TokenForge {
    /// Create a forge from PEM-encoded RSA private key bytes.
    ///
    /// # Errors
    /// Returns `GrouperError::Signing` if the key cannot be parsed.
    pub fn from_pem(entity_id: impl Into<String>, pem: &[u8]) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(pem).map_err(|err| {
            let infra: InfraError = err.into();
            GrouperError::from(infra)
        })?;

        Ok(Self { entity_id: entity_id.into(), key, header: Header::new(Algorithm::RS256) })
    }

    /// Create a forge from a PEM key file.
    ///
    /// # Errors
    /// Returns `GrouperError::Signing` if the file cannot be read or parsed.
    pub fn from_pem_file(entity_id: impl Into<String>, path: &Path) -> Result<Self> {
        let pem = std::fs::read(path).map_err(|err| {
            GrouperError::Signing(format!(
                "failed to read private key {}: {err}",
                path.display()
            ))
        })?;
        Self::from_pem(entity_id, &pem)
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Mint a token valid for `validity` from the current time.
    ///
    /// # Errors
    /// Returns `GrouperError::Signing` if signing fails.
    pub fn mint(&self, validity: Duration) -> Result<Token> {
        self.mint_at(Utc::now(), validity)
    }

    /// Mint a token as if the current time were `now`.
    ///
    /// # Errors
    /// Returns `GrouperError::Signing` if signing fails or the window
    /// overflows the representable time range.
    pub fn mint_at(&self, now: DateTime<Utc>, validity: Duration) -> Result<Token> {
        let window = chrono::Duration::from_std(validity)
            .map_err(|_| GrouperError::Signing("token validity window is too large".into()))?;
        // JWT times are whole seconds; the cached window must match the signed one.
        let issued_at = now.trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(window)
            .ok_or_else(|| GrouperError::Signing("token expiry overflows".into()))?
            .trunc_subsecs(0);

        let claims = Claims {
            iss: self.entity_id.clone(),
            sub: self.entity_id.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let assertion = jsonwebtoken::encode(&self.header, &claims, &self.key).map_err(|err| {
            let infra: InfraError = err.into();
            GrouperError::from(infra)
        })?;

        debug!(entity_id = %self.entity_id, exp = claims.exp, "minted JWT assertion");

        Ok(Token {
            credential: format!("{JWT_USER_PREFIX}{}_{assertion}", self.entity_id),
            assertion,
            issued_at,
            expires_at,
        })
    }
}

impl fmt::Debug for TokenForge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenForge").field("entity_id", &self.entity_id).finish_non_exhaustive()
    }
}
