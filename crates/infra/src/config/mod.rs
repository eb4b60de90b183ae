//! Configuration loading
//!
//! Resolves [`grouper_domain::GrouperConfig`] from explicit arguments,
//! environment variables and config files.

pub mod loader;

// Re-export commonly used items
pub use loader::{
    env_overrides, load, load_from_env, load_from_file, probe_config_paths, resolve,
    validate_api_url,
};
