//! Grouper authentication
//!
//! [`TokenForge`] signs short-lived JWT assertions from the entity's RSA key;
//! [`AuthSession`] caches the current one and mints a replacement when it
//! nears expiry. The request layer only sees the [`AccessTokenProvider`]
//! seam, so tests can substitute a fixed credential.

pub mod clock;
pub mod forge;
pub mod session;

use async_trait::async_trait;
use grouper_domain::Result;

pub use clock::{Clock, MockClock, SystemClock};
pub use forge::{Claims, Token, TokenForge};
pub use session::{AuthSession, SessionState};

/// Trait for providing bearer credentials
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get a credential that is valid for at least the next request.
    async fn access_token(&self) -> Result<String>;
}
