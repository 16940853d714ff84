//! HTTP client wrapper for LLM API requests.

use crate::provider::error::Error;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;

/// HTTP request timeout.
const TIMEOUT: Duration = Duration::from_secs(120);
/// Connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("palaver/", env!("CARGO_PKG_VERSION"));

/// Transport settings shared by every vendor client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Verify server TLS certificates. Only disable against hosts whose
    /// certificate chain the system store cannot validate.
    pub verify_tls: bool,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            verify_tls: true,
            timeout: TIMEOUT,
            connect_timeout: CONNECT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest` client with these settings.
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.clone());

        if !self.verify_tls {
            tracing::warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder.build()
    }
}

/// Authentication configuration.
#[derive(Clone)]
pub enum AuthConfig {
    /// No static credentials; callers attach per-request headers.
    None,
    /// Custom header authentication (e.g., `Authorization: Api-Key {key}`).
    ApiKey { header: String, key: String },
    /// API key passed as a query parameter (e.g., `?key={key}`).
    QueryKey { param: String, key: String },
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::ApiKey { header, .. } => f
                .debug_struct("ApiKey")
                .field("header", header)
                .field("key", &"[REDACTED]")
                .finish(),
            Self::QueryKey { param, .. } => f
                .debug_struct("QueryKey")
                .field("param", param)
                .field("key", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Build an `Authorization: Bearer {token}` header map for one request.
pub fn bearer_headers(token: &str) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| Error::Config("Bearer token contains invalid header characters".into()))?;
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

/// HTTP client for LLM API requests.
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    auth: AuthConfig,
    static_headers: HeaderMap,
    provider: &'static str,
}

impl HttpClient {
    /// Create a new HTTP client.
    ///
    /// Static credentials are validated here so a bad key fails before any
    /// request is sent.
    pub fn new(
        provider: &'static str,
        base_url: impl Into<String>,
        auth: AuthConfig,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let client = transport
            .build_client()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        let static_headers = auth_headers(&auth)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            static_headers,
            provider,
        })
    }

    /// Add a fixed header sent with every request (e.g., `x-folder-id`).
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, Error> {
        let name = HeaderName::try_from(name)
            .map_err(|_| Error::Config(format!("Header name {name:?} is invalid")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::Config(format!("Header {name} contains invalid characters")))?;
        self.static_headers.insert(name, value);
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_headers(&self, extra: HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.extend(self.static_headers.clone());
        headers.extend(extra);
        headers
    }

    /// Make a POST request with JSON body and deserialize the response.
    pub async fn post_json<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, Error> {
        self.post_json_with_headers(path, body, HeaderMap::new())
            .await
    }

    /// POST with additional per-request headers.
    ///
    /// Shared client state is never mutated; per-call credentials such as
    /// bearer tokens travel in `extra`.
    pub async fn post_json_with_headers<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
        extra: HeaderMap,
    ) -> Result<R, Error> {
        let url = format!("{}{path}", self.base_url);
        let headers = self.build_headers(extra);

        let mut request = self.client.post(&url).headers(headers).json(body);
        if let AuthConfig::QueryKey { param, key } = &self.auth {
            request = request.query(&[(param.as_str(), key.as_str())]);
        }

        let response = request.send().await.map_err(|source| Error::Transport {
            provider: self.provider,
            source,
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| Error::Transport {
            provider: self.provider,
            source,
        })?;

        if !status.is_success() {
            tracing::debug!(provider = self.provider, status = status.as_u16(), "API error response");
            return Err(Error::Api {
                provider: self.provider,
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|source| Error::Parse {
            provider: self.provider,
            source,
            body: text,
        })
    }
}

fn auth_headers(auth: &AuthConfig) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();

    match auth {
        AuthConfig::None => {}
        AuthConfig::ApiKey { header, key } => {
            let name = HeaderName::try_from(header.as_str())
                .map_err(|_| Error::Config("API key header name is invalid".into()))?;
            let value = HeaderValue::from_str(key)
                .map_err(|_| Error::Config("API key contains invalid header characters".into()))?;
            headers.insert(name, value);
        }
        AuthConfig::QueryKey { key, .. } => {
            if key.chars().any(char::is_control) {
                return Err(Error::Config("API key contains control characters".into()));
            }
        }
    }

    Ok(headers)
}
