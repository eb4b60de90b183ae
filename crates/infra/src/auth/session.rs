//! Lazily minted, cached bearer token
//!
//! State machine: `NoToken --mint--> Valid --expiry--> Expired --mint--> Valid`.
//! A token within the refresh margin of its expiry counts as expired so it
//! cannot lapse mid-request. Nothing persists across process restarts.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use grouper_domain::{GrouperConfig, Result};
use parking_lot::Mutex;
use tracing::{debug, info};

use super::clock::{Clock, SystemClock};
use super::forge::{Token, TokenForge};
use super::AccessTokenProvider;

/// Observable session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoToken,
    Valid,
    Expired,
}

/// Holds at most one live token and mints a replacement on demand.
pub struct AuthSession {
    forge: TokenForge,
    validity: Duration,
    refresh_margin: Duration,
    clock: Arc<dyn Clock>,
    current: Mutex<Option<Token>>,
    mints: AtomicU64,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("entity_id", &self.forge.entity_id())
            .field("validity", &self.validity)
            .field("refresh_margin", &self.refresh_margin)
            .field("mints", &self.mint_count())
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    pub fn new(forge: TokenForge, validity: Duration, refresh_margin: Duration) -> Self {
        Self::with_clock(forge, validity, refresh_margin, Arc::new(SystemClock))
    }

    /// Create a session driven by an explicit clock (tests).
    pub fn with_clock(
        forge: TokenForge,
        validity: Duration,
        refresh_margin: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { forge, validity, refresh_margin, clock, current: Mutex::new(None), mints: AtomicU64::new(0) }
    }

    /// Build the forge from the configured key file and wrap it in a session.
    ///
    /// # Errors
    /// Returns `GrouperError::Signing` if the key cannot be loaded.
    pub fn from_config(config: &GrouperConfig) -> Result<Self> {
        let forge = TokenForge::from_pem_file(config.entity_id.clone(), &config.key_path)?;
        Ok(Self::new(
            forge,
            Duration::from_secs(config.token_validity_secs),
            Duration::from_secs(config.token_refresh_margin_secs),
        ))
    }

    /// Return a token that will not expire within the refresh margin,
    /// minting a new one when there is none or the current one is stale.
    ///
    /// The check and the replacement happen under one lock, so concurrent
    /// callers never mint twice for the same expiry.
    ///
    /// # Errors
    /// Returns `GrouperError::Signing` if minting fails; the previous token
    /// (if any) is discarded either way.
    pub fn current_token(&self) -> Result<Token> {
        let now = self.clock.now();
        let mut slot = self.current.lock();

        if let Some(token) = slot.as_ref() {
            if !token.is_expired_at(now, self.refresh_margin) {
                return Ok(token.clone());
            }
            debug!(expires_at = %token.expires_at(), "cached token expired, minting replacement");
        }

        *slot = None;
        let token = self.forge.mint_at(now, self.validity)?;
        let total = self.mints.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            entity_id = %self.forge.entity_id(),
            expires_at = %token.expires_at(),
            mints = total,
            "minted Grouper token"
        );

        *slot = Some(token.clone());
        Ok(token)
    }

    pub fn state(&self) -> SessionState {
        let now = self.clock.now();
        match self.current.lock().as_ref() {
            None => SessionState::NoToken,
            Some(token) if token.is_expired_at(now, self.refresh_margin) => SessionState::Expired,
            Some(_) => SessionState::Valid,
        }
    }

    /// Drop the cached token; the next call mints a fresh one.
    pub fn invalidate(&self) {
        *self.current.lock() = None;
    }

    /// Number of tokens minted over the session's lifetime.
    pub fn mint_count(&self) -> u64 {
        self.mints.load(Ordering::Relaxed)
    }

    pub fn entity_id(&self) -> &str {
        self.forge.entity_id()
    }
}

#[async_trait]
impl AccessTokenProvider for AuthSession {
    async fn access_token(&self) -> Result<String> {
        self.current_token().map(|token| token.credential().to_string())
    }
}
