//! Configuration precedence and member projection through the public API

use std::collections::BTreeMap;

use grouper_domain::constants::{ENV_DEFAULT_STEM, ENV_KEY_PATH};
use grouper_domain::{ConfigOverrides, GrouperConfig, GrouperError, MemberDescriptor};

fn from_env() -> ConfigOverrides {
    ConfigOverrides::default()
        .api_url("https://env.example.edu/grouper-ws/servicesRest/v2_6_000")
        .entity_id("env-entity")
        .key_path("/etc/grouper/env.pem")
        .default_stem("Env:stem")
        .timeout_secs(45)
}

#[test]
fn explicit_values_win_over_environment() {
    let config = GrouperConfig::builder()
        .entity_id("deploy-bot")
        .default_stem("RTGID:app:Deploy")
        .or(from_env())
        .build()
        .unwrap();

    assert_eq!(config.entity_id, "deploy-bot");
    assert_eq!(config.default_stem, "RTGID:app:Deploy");
    assert_eq!(config.api_url, "https://env.example.edu/grouper-ws/servicesRest/v2_6_000");
    assert_eq!(config.timeout_secs, 45);
    assert_eq!(
        config.normalized_api_url(),
        "https://env.example.edu/grouper-ws/servicesRest/v2_6_000/"
    );
}

#[test]
fn missing_identity_names_environment_variables() {
    let err = GrouperConfig::builder()
        .api_url("https://grouper.example.edu/")
        .entity_id("deploy-bot")
        .build()
        .unwrap_err();

    match err {
        GrouperError::Config(msg) => {
            assert!(msg.contains(ENV_KEY_PATH));
            assert!(msg.contains(ENV_DEFAULT_STEM));
        }
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn refresh_margin_must_be_shorter_than_validity() {
    let err = from_env().token_validity_secs(5).token_refresh_margin_secs(5).build().unwrap_err();
    assert!(matches!(err, GrouperError::Config(msg) if msg.contains("token_validity_secs")));
}

#[test]
fn member_projection_prefers_configured_attribute() {
    let attributes = BTreeMap::from([
        ("mail".to_string(), "jane@example.edu".to_string()),
        ("description".to_string(), "Jane Doe (jdoe)".to_string()),
    ]);

    let by_mail = MemberDescriptor::from_attributes("10001", attributes.clone(), "mail");
    assert_eq!(by_mail.username, "jane@example.edu");

    let by_uid = MemberDescriptor::from_attributes("10001", attributes, "uid");
    assert_eq!(by_uid.username, "jdoe");
}
