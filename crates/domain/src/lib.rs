//! # Grouper Domain
//!
//! Domain types and models for the Grouper web-service client.
//!
//! This crate contains:
//! - Group, member and membership value objects
//! - Domain error types and Result definitions
//! - Client configuration structure
//! - Protocol constants and pure helpers (username extraction)
//!
//! ## Architecture
//! - No dependencies on other Grouper crates
//! - No I/O; every type here is reconstructed per response

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::username::{extract_username, parse_display_username};
