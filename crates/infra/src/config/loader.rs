//! Configuration loader
//!
//! Resolves a [`GrouperConfig`] from explicit arguments, environment
//! variables or a config file.
//!
//! ## Precedence
//! Explicit argument > environment variable. [`load`] uses the environment
//! when it is complete and otherwise falls back to a config file.
//!
//! ## Environment Variables
//! - `GROUPER_API_URL`: Base URL of the Grouper web services (required)
//! - `GROUPER_ENTITY_ID`: Entity the JWT is issued for (required)
//! - `GROUPER_KEY_PATH`: PEM private key of the entity (required)
//! - `GROUPER_HPC_STEM`: Stem that bare group names live under (required)
//! - `GROUPER_TOKEN_VALIDITY_SECS`: Token lifetime in seconds
//! - `GROUPER_TIMEOUT_SECS`: Request timeout in seconds
//! - `VERIFY_CERTS`: Verify TLS certificates (true/false)
//!
//! ## File Locations
//! When no path is given the loader probes, in order:
//! 1. `./grouper.json` or `./grouper.toml`
//! 2. `./config.json` or `./config.toml`
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use grouper_domain::constants::{
    ENV_API_URL, ENV_DEFAULT_STEM, ENV_ENTITY_ID, ENV_KEY_PATH, ENV_TIMEOUT_SECS,
    ENV_TOKEN_VALIDITY_SECS, ENV_VERIFY_CERTS,
};
use grouper_domain::{ConfigOverrides, GrouperConfig, GrouperError, Result};
use url::Url;

use crate::errors::InfraError;

const CONFIG_FILE_NAMES: [&str; 4] = ["grouper.json", "grouper.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `GrouperError::Config` if neither source yields a valid
/// configuration.
pub fn load() -> Result<GrouperConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables alone.
///
/// # Errors
/// Returns `GrouperError::Config` naming every missing required variable,
/// or describing an unparsable or invalid value.
pub fn load_from_env() -> Result<GrouperConfig> {
    finish(env_overrides()?.build()?)
}

/// Merge explicit arguments over the environment.
///
/// Any field set in `explicit` wins; the rest come from environment
/// variables or their defaults.
///
/// # Errors
/// Returns `GrouperError::Config` if required values are still missing
/// after merging, or the result is invalid.
pub fn resolve(explicit: ConfigOverrides) -> Result<GrouperConfig> {
    let fallback = env_fallback(&explicit)?;
    finish(explicit.or(fallback).build()?)
}

/// Read the optional and required environment variables into overrides.
///
/// # Errors
/// Returns `GrouperError::Config` if a numeric variable does not parse.
pub fn env_overrides() -> Result<ConfigOverrides> {
    env_fallback(&ConfigOverrides::default())
}

/// Environment values for the fields `explicit` leaves unset. Variables
/// shadowed by an explicit value are never read, so a malformed one
/// cannot fail the merge.
fn env_fallback(explicit: &ConfigOverrides) -> Result<ConfigOverrides> {
    Ok(ConfigOverrides {
        api_url: env_var(ENV_API_URL),
        entity_id: env_var(ENV_ENTITY_ID),
        key_path: env_var(ENV_KEY_PATH).map(PathBuf::from),
        default_stem: env_var(ENV_DEFAULT_STEM),
        token_validity_secs: match explicit.token_validity_secs {
            Some(_) => None,
            None => env_parse(ENV_TOKEN_VALIDITY_SECS)?,
        },
        timeout_secs: match explicit.timeout_secs {
            Some(_) => None,
            None => env_parse(ENV_TIMEOUT_SECS)?,
        },
        verify_certs: env_bool(ENV_VERIFY_CERTS),
        ..ConfigOverrides::default()
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. JSON and TOML are
/// supported (detected by file extension).
///
/// # Errors
/// Returns `GrouperError::Config` if the file is missing, unreadable,
/// malformed or describes an invalid configuration.
pub fn load_from_file(path: Option<PathBuf>) -> Result<GrouperConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(GrouperError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            GrouperError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(|e| {
        let infra: InfraError = e.into();
        GrouperError::from(infra)
    })?;

    finish(parse_config(&contents, &config_path)?)
}

/// Probe the standard locations for a configuration file.
///
/// Returns the first file found, or `None`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Check that `api_url` is an absolute URL Grouper can be reached at.
///
/// `https` is required; plain `http` is accepted only for loopback hosts
/// so local test servers work.
///
/// # Errors
/// Returns `GrouperError::Config` describing the problem.
pub fn validate_api_url(api_url: &str) -> Result<Url> {
    let url = Url::parse(api_url)
        .map_err(|e| GrouperError::Config(format!("Invalid api_url {api_url:?}: {e}")))?;

    match url.scheme() {
        "https" => Ok(url),
        "http" if is_loopback(&url) => Ok(url),
        "http" => Err(GrouperError::Config(format!(
            "api_url must use https (http is only allowed for loopback hosts): {api_url}"
        ))),
        other => Err(GrouperError::Config(format!("Unsupported api_url scheme {other:?}"))),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

fn finish(config: GrouperConfig) -> Result<GrouperConfig> {
    config.validate()?;
    validate_api_url(&config.api_url)?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<GrouperConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| GrouperError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| GrouperError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(GrouperError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Non-empty environment variable.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| GrouperError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`, `true`, `yes`, `on` (case-insensitive) as true; anything
/// else that is set counts as false.
fn env_bool(key: &str) -> Option<bool> {
    env_var(key).map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use once_cell::sync::Lazy;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 7] = [
        ENV_API_URL,
        ENV_ENTITY_ID,
        ENV_KEY_PATH,
        ENV_DEFAULT_STEM,
        ENV_TOKEN_VALIDITY_SECS,
        ENV_TIMEOUT_SECS,
        ENV_VERIFY_CERTS,
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    fn set_required_env() {
        std::env::set_var(ENV_API_URL, "https://grouper.example.edu/grouper-ws/servicesRest/json/v2_5_000");
        std::env::set_var(ENV_ENTITY_ID, "deploy-bot");
        std::env::set_var(ENV_KEY_PATH, "/etc/grouper/key.pem");
        std::env::set_var(ENV_DEFAULT_STEM, "RTGID:app:Deploy");
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for value in ["1", "true", "YES", "on"] {
            std::env::set_var("GROUPER_TEST_BOOL", value);
            assert_eq!(env_bool("GROUPER_TEST_BOOL"), Some(true), "{value}");
        }
        for value in ["0", "false", "no", "off"] {
            std::env::set_var("GROUPER_TEST_BOOL", value);
            assert_eq!(env_bool("GROUPER_TEST_BOOL"), Some(false), "{value}");
        }

        std::env::remove_var("GROUPER_TEST_BOOL");
        assert_eq!(env_bool("GROUPER_TEST_BOOL"), None);
    }

    #[test]
    fn test_resolve_explicit_value_shadows_malformed_env() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required_env();
        std::env::set_var(ENV_TIMEOUT_SECS, "soon");

        let shadowed = resolve(ConfigOverrides::default().timeout_secs(10));
        let unshadowed = resolve(ConfigOverrides::default());
        clear_env();

        assert_eq!(shadowed.expect("explicit timeout should win").timeout_secs, 10);
        assert!(matches!(
            unshadowed,
            Err(GrouperError::Config(msg)) if msg.contains(ENV_TIMEOUT_SECS)
        ));
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required_env();
        std::env::set_var(ENV_TOKEN_VALIDITY_SECS, "120");
        std::env::set_var(ENV_VERIFY_CERTS, "false");

        let result = load_from_env();
        clear_env();

        let config = result.expect("should load config from env vars");
        assert_eq!(config.entity_id, "deploy-bot");
        assert_eq!(config.key_path, PathBuf::from("/etc/grouper/key.pem"));
        assert_eq!(config.default_stem, "RTGID:app:Deploy");
        assert_eq!(config.token_validity_secs, 120);
        assert_eq!(config.timeout_secs, 30);
        assert!(!config.verify_certs);
    }

    #[test]
    fn test_load_from_env_names_every_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var(ENV_API_URL, "https://grouper.example.edu/ws/");

        let result = load_from_env();
        clear_env();

        let err = result.unwrap_err();
        let GrouperError::Config(message) = err else {
            panic!("expected config error, got {err:?}");
        };
        assert!(message.contains(ENV_ENTITY_ID));
        assert!(message.contains(ENV_KEY_PATH));
        assert!(message.contains(ENV_DEFAULT_STEM));
        assert!(!message.contains(ENV_API_URL));
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required_env();
        std::env::set_var(ENV_TIMEOUT_SECS, "soon");

        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(GrouperError::Config(msg)) if msg.contains(ENV_TIMEOUT_SECS)));
    }

    #[test]
    fn test_explicit_arguments_override_environment() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required_env();

        let result = resolve(
            GrouperConfig::builder().default_stem("Other:stem").entity_id("explicit-bot"),
        );
        clear_env();

        let config = result.expect("should resolve");
        assert_eq!(config.default_stem, "Other:stem");
        assert_eq!(config.entity_id, "explicit-bot");
        assert_eq!(config.key_path, PathBuf::from("/etc/grouper/key.pem"));
    }

    #[test]
    fn test_resolve_rejects_plain_http() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let result = resolve(
            GrouperConfig::builder()
                .api_url("http://grouper.example.edu/ws")
                .entity_id("bot")
                .key_path("/tmp/key.pem")
                .default_stem("a:b"),
        );

        assert!(matches!(result, Err(GrouperError::Config(msg)) if msg.contains("https")));
    }

    #[test]
    fn test_validate_api_url() {
        assert!(validate_api_url("https://grouper.example.edu/ws/").is_ok());
        assert!(validate_api_url("http://localhost:8080/ws/").is_ok());
        assert!(validate_api_url("http://127.0.0.1:9000/").is_ok());
        assert!(validate_api_url("http://[::1]:9000/").is_ok());
        assert!(validate_api_url("http://grouper.example.edu/ws/").is_err());
        assert!(validate_api_url("ftp://grouper.example.edu/").is_err());
        assert!(validate_api_url("grouper.example.edu/ws").is_err());
    }

    #[test]
    fn test_load_from_file_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grouper.json");
        std::fs::write(
            &path,
            r#"{
                "api_url": "https://grouper.example.edu/ws/",
                "entity_id": "deploy-bot",
                "key_path": "/etc/grouper/key.pem",
                "default_stem": "RTGID:app:Deploy",
                "timeout_secs": 10
            }"#,
        )
        .unwrap();

        let config = load_from_file(Some(path)).expect("should load config from JSON file");
        assert_eq!(config.entity_id, "deploy-bot");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.token_validity_secs, 60);
        assert_eq!(config.username_attribute, "uid");
    }

    #[test]
    fn test_load_from_file_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grouper.toml");
        std::fs::write(
            &path,
            r#"
api_url = "https://grouper.example.edu/ws"
entity_id = "deploy-bot"
key_path = "/etc/grouper/key.pem"
default_stem = "RTGID:app:Deploy"
verify_certs = false
subject_attribute_names = ["login", "description"]
username_attribute = "login"
"#,
        )
        .unwrap();

        let config = load_from_file(Some(path)).expect("should load config from TOML file");
        assert!(!config.verify_certs);
        assert_eq!(config.username_attribute, "login");
        assert_eq!(config.normalized_api_url(), "https://grouper.example.edu/ws/");
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/grouper.json")));
        assert!(matches!(result, Err(GrouperError::Config(_))));
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grouper.json");
        std::fs::write(&path, r#"{ "api_url": "#).unwrap();

        let result = load_from_file(Some(path));
        assert!(matches!(result, Err(GrouperError::Config(msg)) if msg.contains("JSON")));
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("api_url: x", Path::new("grouper.yaml"));
        assert!(matches!(result, Err(GrouperError::Config(msg)) if msg.contains("yaml")));
    }
}
