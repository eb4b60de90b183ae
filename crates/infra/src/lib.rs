//! # Grouper Infrastructure
//!
//! I/O side of the Grouper client.
//!
//! This crate contains:
//! - JWT minting and the cached token session (`auth`)
//! - HTTP transport and the authenticated request gateway (`http`, `api`)
//! - The Grouper web-service client (`integrations::grouper`)
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Depends on `grouper-domain` for values, errors and configuration
//! - Contains all "impure" code (network, filesystem, clock)
//!
//! ```no_run
//! use grouper_infra::{config, GrouperClient};
//!
//! # async fn run() -> grouper_domain::Result<()> {
//! let client = GrouperClient::from_config(config::load()?)?;
//! if !client.group_exists("admins").await? {
//!     client.create_group("admins", Some("Admins"), None).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod observability;

// Re-export commonly used items
pub use api::{GatewayResponse, RequestGateway};
pub use auth::{AccessTokenProvider, AuthSession, Token, TokenForge};
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::grouper::GrouperClient;
