#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use grouper_infra::auth::{AuthSession, MockClock, TokenForge};
use grouper_infra::{GrouperClient, HttpClient, RequestGateway};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const ENTITY_ID: &str = "deploy-bot";
pub const STEM: &str = "RTGID:app:Deploy";

pub fn private_key_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/test_rsa_private.pem")
}

pub fn public_key_pem() -> Vec<u8> {
    std::fs::read(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/test_rsa_public.pem"))
        .expect("public key fixture should exist")
}

pub fn fixed_clock() -> MockClock {
    MockClock::starting_at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
}

/// Session signing with the fixture key, 60s tokens, 5s refresh margin.
pub fn session(clock: &MockClock) -> Arc<AuthSession> {
    let forge = TokenForge::from_pem_file(ENTITY_ID, &private_key_path())
        .expect("fixture key should load");
    Arc::new(AuthSession::with_clock(
        forge,
        Duration::from_secs(60),
        Duration::from_secs(5),
        Arc::new(clock.clone()),
    ))
}

pub fn client(server: &MockServer, session: Arc<AuthSession>) -> GrouperClient {
    let http = HttpClient::builder().system_proxy(false).build().expect("http client should build");
    let gateway =
        RequestGateway::new(&server.uri(), http, session).expect("gateway should build");
    GrouperClient::with_gateway(gateway, STEM)
}

pub fn group_json(name: &str, uuid: &str) -> Value {
    let extension = name.rsplit(':').next().unwrap_or(name);
    json!({
        "name": name,
        "displayName": name,
        "uuid": uuid,
        "extension": extension,
        "typeOfGroup": "group"
    })
}

pub fn find_groups_response(groups: Vec<Value>) -> Value {
    json!({
        "WsFindGroupsResults": {
            "resultMetadata": {"resultCode": "SUCCESS", "success": "T"},
            "groupResults": groups
        }
    })
}

pub fn member_change_response(root: &str, outcomes: &[(&str, &str, bool)]) -> Value {
    let results: Vec<Value> = outcomes
        .iter()
        .map(|(subject, code, success)| {
            json!({
                "resultMetadata": {"resultCode": code, "success": if *success { "T" } else { "F" }},
                "wsSubject": {"identifierLookup": subject, "resultCode": "SUCCESS", "id": format!("id-{subject}")}
            })
        })
        .collect();
    json!({
        root: {
            "resultMetadata": {"resultCode": "SUCCESS", "success": "T"},
            "results": results
        }
    })
}

pub fn group_change_response(root: &str, code: &str, success: bool, group: Option<Value>) -> Value {
    let mut result = json!({
        "resultMetadata": {"resultCode": code, "success": if success { "T" } else { "F" }}
    });
    if let Some(group) = group {
        result["wsGroup"] = group;
    }
    json!({
        root: {
            "resultMetadata": {"resultCode": "SUCCESS", "success": "T"},
            "results": [result]
        }
    })
}
