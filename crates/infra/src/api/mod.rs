//! Authenticated request layer

pub mod gateway;

pub use gateway::{GatewayResponse, RequestGateway};
