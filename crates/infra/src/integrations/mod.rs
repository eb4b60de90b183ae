//! External service integrations

pub mod grouper;
