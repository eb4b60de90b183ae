//! Domain types and models
//!
//! Read-only projections of Grouper responses. They carry no identity
//! beyond what the server reports and are rebuilt for every response.

pub mod group;
pub mod member;
pub mod membership;

pub use group::{GroupDescriptor, Page};
pub use member::MemberDescriptor;
pub use membership::{MembershipResult, ResultCode};
