//! Grouper group-management web services
//!
//! [`GrouperClient`] exposes group, membership and subject operations over
//! Grouper's v2 JSON API. Wire bodies live in `types` and never leave this
//! module; callers only see domain values.

pub mod client;
mod types;

pub use client::GrouperClient;
