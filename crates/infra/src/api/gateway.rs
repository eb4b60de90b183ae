//! Single chokepoint for authenticated Grouper calls
//!
//! Every domain operation funnels through [`RequestGateway::call`], which
//! attaches the current bearer credential and classifies the response:
//!
//! | Response | Outcome |
//! |---|---|
//! | 2xx, well-formed JSON | [`GatewayResponse::Body`] |
//! | 2xx, root `resultMetadata.resultCode` ends in `NOT_FOUND` | [`GatewayResponse::NotFound`] |
//! | 404 | [`GatewayResponse::NotFound`] |
//! | 401 / 403 | `GrouperError::Authentication` |
//! | other 4xx, 5xx, empty or malformed body | `GrouperError::Service` |
//!
//! Nothing here retries; a rejected credential is a configuration problem,
//! not a stale token, because the session refreshes ahead of expiry.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use grouper_domain::{GrouperError, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::auth::AccessTokenProvider;
use crate::errors::InfraError;
use crate::http::HttpClient;

const BODY_SNIPPET_CHARS: usize = 512;

/// Classified outcome of a successful round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayResponse {
    Body(Value),
    NotFound,
}

impl GatewayResponse {
    pub fn into_body(self) -> Option<Value> {
        match self {
            Self::Body(value) => Some(value),
            Self::NotFound => None,
        }
    }
}

/// Authenticated JSON gateway bound to one Grouper base URL.
pub struct RequestGateway {
    http: HttpClient,
    base_url: Url,
    auth: Arc<dyn AccessTokenProvider>,
}

impl fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestGateway")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RequestGateway {
    /// Create a gateway rooted at `base_url`.
    ///
    /// A trailing `/` is appended when missing so relative endpoints
    /// resolve beneath the base path instead of replacing its last segment.
    ///
    /// # Errors
    /// Returns `GrouperError::Config` if `base_url` is not an absolute URL.
    pub fn new(
        base_url: &str,
        http: HttpClient,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self> {
        let normalized =
            if base_url.ends_with('/') { base_url.to_string() } else { format!("{base_url}/") };
        let base_url = Url::parse(&normalized).map_err(|err| {
            let infra: InfraError = err.into();
            GrouperError::from(infra)
        })?;

        if base_url.cannot_be_a_base() {
            return Err(GrouperError::Config(format!("{base_url} cannot be used as a base URL")));
        }

        Ok(Self { http, base_url, auth })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send an authenticated request and classify the response.
    ///
    /// # Errors
    /// - `GrouperError::Signing` if no credential can be produced
    /// - `GrouperError::Authentication` on 401/403
    /// - `GrouperError::Service` on other non-2xx statuses or an unusable body
    /// - `GrouperError::Network` if the transport fails
    #[instrument(skip(self, body), fields(method = %method, endpoint = %endpoint))]
    pub async fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<GatewayResponse> {
        let url = self.endpoint_url(endpoint)?;
        let credential = self.auth.access_token().await?;

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(AUTHORIZATION, format!("Bearer {credential}"));
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").json(body);
        }

        let started = Instant::now();
        let response = self.http.send(request).await?;
        let status = response.status();
        let text = response.text().await.map_err(|err| {
            let infra: InfraError = err.into();
            GrouperError::from(infra)
        })?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        debug!(%status, elapsed_ms, bytes = text.len(), "Grouper responded");

        if status == StatusCode::NOT_FOUND {
            return Ok(GatewayResponse::NotFound);
        }

        if !status.is_success() {
            let err = map_status_error(status, &url, &text);
            warn!(%status, error = %err, "Grouper request failed");
            return Err(err);
        }

        if text.trim().is_empty() {
            return Err(GrouperError::Service(format!("{url} returned {status} with an empty body")));
        }

        let value: Value = serde_json::from_str(&text).map_err(|err| {
            let infra: InfraError = err.into();
            GrouperError::from(infra)
        })?;

        if let Some(code) = embedded_not_found(&value) {
            debug!(result_code = code, "embedded not-found result");
            return Ok(GatewayResponse::NotFound);
        }

        Ok(GatewayResponse::Body(value))
    }

    /// Like [`call`](Self::call) but decodes the body into `R`; absent
    /// resources become `None`.
    ///
    /// # Errors
    /// Same as [`call`](Self::call), plus `GrouperError::Service` when the
    /// body does not match `R`.
    pub async fn call_json<R: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Option<R>> {
        match self.call(method, endpoint, body).await? {
            GatewayResponse::NotFound => Ok(None),
            GatewayResponse::Body(value) => serde_json::from_value(value).map(Some).map_err(|err| {
                GrouperError::Service(format!("unexpected response shape from {endpoint}: {err}"))
            }),
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        self.base_url.join(endpoint.trim_start_matches('/')).map_err(|err| {
            GrouperError::InvalidInput(format!("invalid endpoint {endpoint:?}: {err}"))
        })
    }
}

fn map_status_error(status: StatusCode, url: &Url, body: &str) -> GrouperError {
    let snippet: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
    let message = if snippet.is_empty() {
        format!("{url} returned status {status}")
    } else {
        format!("{url} returned status {status}: {snippet}")
    };

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        GrouperError::Authentication(message)
    } else {
        GrouperError::Service(message)
    }
}

/// Grouper wraps every response in a single root object such as
/// `WsFindGroupsResults`; a not-found outcome shows up in its
/// `resultMetadata.resultCode`.
fn embedded_not_found(value: &Value) -> Option<&str> {
    let root = value.as_object()?.values().next()?;
    let code = root.get("resultMetadata")?.get("resultCode")?.as_str()?;
    code.ends_with("NOT_FOUND").then_some(code)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn direct_http() -> HttpClient {
        HttpClient::builder().system_proxy(false).build().unwrap()
    }

    #[derive(Clone)]
    struct MockAuthProvider {
        token: String,
    }

    #[async_trait]
    impl AccessTokenProvider for MockAuthProvider {
        async fn access_token(&self) -> Result<String> {
            Ok(self.token.clone())
        }
    }

    struct FailingAuthProvider;

    #[async_trait]
    impl AccessTokenProvider for FailingAuthProvider {
        async fn access_token(&self) -> Result<String> {
            Err(GrouperError::Signing("key unavailable".into()))
        }
    }

    fn gateway(server: &MockServer) -> RequestGateway {
        let auth = Arc::new(MockAuthProvider { token: "jwtUser_bot_abc".to_string() });
        RequestGateway::new(
            &format!("{}/grouper-ws/servicesRest/json/v2_5_000", server.uri()),
            direct_http(),
            auth,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn attaches_bearer_and_returns_body() {
        let server = MockServer::start().await;
        let body = json!({"WsRestFindGroupsRequest": {"wsQueryFilter": {}}});

        Mock::given(method("POST"))
            .and(path("/grouper-ws/servicesRest/json/v2_5_000/groups"))
            .and(header("Authorization", "Bearer jwtUser_bot_abc"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(body.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "WsFindGroupsResults": {
                    "resultMetadata": {"resultCode": "SUCCESS", "success": "T"},
                    "groupResults": []
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = gateway(&server).call(Method::POST, "groups", Some(&body)).await.unwrap();

        let value = response.into_body().unwrap();
        assert!(value["WsFindGroupsResults"]["groupResults"].is_array());
    }

    #[tokio::test]
    async fn status_404_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let response = gateway(&server).call(Method::GET, "groups", None).await.unwrap();
        assert_eq!(response, GatewayResponse::NotFound);
    }

    #[tokio::test]
    async fn embedded_not_found_code_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "WsGetMembersResults": {
                    "resultMetadata": {"resultCode": "GROUP_NOT_FOUND", "success": "F"}
                }
            })))
            .mount(&server)
            .await;

        let response =
            gateway(&server).call(Method::POST, "groups", Some(&json!({}))).await.unwrap();
        assert_eq!(response, GatewayResponse::NotFound);
    }

    #[tokio::test]
    async fn unauthorized_and_forbidden_are_authentication_errors() {
        for status in [401u16, 403] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(status).set_body_string("denied"))
                .expect(1)
                .mount(&server)
                .await;

            let err =
                gateway(&server).call(Method::POST, "groups", Some(&json!({}))).await.unwrap_err();
            assert!(
                matches!(&err, GrouperError::Authentication(msg) if msg.contains("denied")),
                "status {status} produced {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn server_error_is_service_error_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let err = gateway(&server).call(Method::POST, "groups", Some(&json!({}))).await.unwrap_err();
        assert!(matches!(err, GrouperError::Service(msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn other_client_error_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let err = gateway(&server).call(Method::POST, "groups", None).await.unwrap_err();
        assert!(matches!(err, GrouperError::Service(_)));
    }

    #[tokio::test]
    async fn malformed_json_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = gateway(&server).call(Method::POST, "groups", None).await.unwrap_err();
        assert!(matches!(err, GrouperError::Service(_)));
    }

    #[tokio::test]
    async fn empty_body_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = gateway(&server).call(Method::POST, "groups", None).await.unwrap_err();
        assert!(matches!(err, GrouperError::Service(msg) if msg.contains("empty body")));
    }

    #[tokio::test]
    async fn signing_failure_stops_before_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let gateway =
            RequestGateway::new(&server.uri(), direct_http(), Arc::new(FailingAuthProvider))
                .unwrap();

        let err = gateway.call(Method::POST, "groups", None).await.unwrap_err();
        assert!(matches!(err, GrouperError::Signing(_)));
    }

    #[tokio::test]
    async fn call_json_decodes_and_maps_absent_to_none() {
        #[derive(Debug, serde::Deserialize)]
        struct Envelope {
            #[serde(rename = "WsGetSubjectsResults")]
            results: Value,
        }

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/subjects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "WsGetSubjectsResults": {"wsSubjects": []}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/groups"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let gateway = gateway_at_root(&server);
        let found: Option<Envelope> = gateway.call_json(Method::POST, "subjects", None).await.unwrap();
        assert!(found.unwrap().results["wsSubjects"].is_array());

        let absent: Option<Envelope> = gateway.call_json(Method::POST, "groups", None).await.unwrap();
        assert!(absent.is_none());
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let auth = Arc::new(MockAuthProvider { token: String::new() });
        let gateway =
            RequestGateway::new("https://grouper.example.edu/ws/v2", direct_http(), auth)
                .unwrap();

        assert_eq!(gateway.base_url().as_str(), "https://grouper.example.edu/ws/v2/");
        assert_eq!(
            gateway.endpoint_url("groups").unwrap().as_str(),
            "https://grouper.example.edu/ws/v2/groups"
        );
    }

    #[test]
    fn relative_base_url_is_config_error() {
        let auth = Arc::new(MockAuthProvider { token: String::new() });
        let result = RequestGateway::new("grouper/ws", direct_http(), auth);
        assert!(matches!(result, Err(GrouperError::Config(_))));
    }

    fn gateway_at_root(server: &MockServer) -> RequestGateway {
        let auth = Arc::new(MockAuthProvider { token: "t".to_string() });
        RequestGateway::new(&server.uri(), direct_http(), auth).unwrap()
    }
}
