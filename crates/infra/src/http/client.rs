use std::time::Duration;

use grouper_domain::GrouperError;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

/// Single-shot JSON transport.
///
/// Every request is sent exactly once. Timeouts, connection failures and
/// 5xx responses are handed back to the caller unchanged.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client with the default timeout, honouring proxy environment variables.
    pub fn new() -> Result<Self, GrouperError> {
        Self::builder().build()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send `builder` once.
    ///
    /// # Errors
    /// Returns `GrouperError::Network` for timeouts and connection failures.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, GrouperError> {
        let request = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            GrouperError::from(infra)
        })?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => Ok(response),
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                let infra: InfraError = err.into();
                Err(GrouperError::from(infra))
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    accept_invalid_certs: bool,
    system_proxy: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
            accept_invalid_certs: false,
            system_proxy: true,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Skip TLS certificate verification (self-signed development servers).
    pub fn accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    /// Whether `HTTPS_PROXY` / `HTTP_PROXY` / `NO_PROXY` are honoured. On by default.
    pub fn system_proxy(mut self, enabled: bool) -> Self {
        self.system_proxy = enabled;
        self
    }

    pub fn build(self) -> Result<HttpClient, GrouperError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout);
        builder = builder.default_headers(
            [(ACCEPT, HeaderValue::from_static("application/json"))].into_iter().collect(),
        );

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if !self.system_proxy {
            builder = builder.no_proxy();
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            GrouperError::from(infra)
        })?;

        Ok(HttpClient { client })
    }
}
