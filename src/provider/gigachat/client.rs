//! GigaChat client with OAuth token lifecycle.
//!
//! Each request obtains a valid bearer token from the [`TokenCache`] and
//! attaches it as a per-request header.

use super::types::{GigaChatRequest, GigaChatResponse};
use crate::auth::{
    AUTH_URL, AuthError, ClientCredentialsSource, ClientIdentity, Credential, DEFAULT_SCOPE,
    TokenCache,
};
use crate::provider::client::ChatProvider;
use crate::provider::error::Error;
use crate::provider::http::{AuthConfig, HttpClient, TransportConfig, bearer_headers};
use crate::provider::types::{ChatTurn, CompletionOptions, CompletionResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const PROVIDER_ID: &str = "gigachat";

/// GigaChat REST API base URL.
pub const GIGACHAT_API_BASE: &str = "https://gigachat.devices.sberbank.ru/api/v1";

pub const DEFAULT_MODEL: &str = "GigaChat";
const DEFAULT_TEMPERATURE: f32 = 1.0;
const DEFAULT_MAX_TOKENS: u32 = 512;

/// GigaChat connection settings.
///
/// Either `authorization_key` (the pre-encoded key from the developer
/// console) or the `client_id`/`client_secret` pair must be set.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GigaChatConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorization_key: Option<String>,
    pub scope: String,
    pub base_url: String,
    pub auth_url: String,
    pub model: String,
}

impl Default for GigaChatConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            authorization_key: None,
            scope: DEFAULT_SCOPE.to_string(),
            base_url: GIGACHAT_API_BASE.to_string(),
            auth_url: AUTH_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl GigaChatConfig {
    /// Settings for a client id/secret pair with default endpoints.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ..Self::default()
        }
    }

    /// Identity presented to the OAuth endpoint.
    #[must_use]
    pub fn identity(&self) -> ClientIdentity {
        match self.authorization_key.as_deref() {
            Some(key) if !key.trim().is_empty() => ClientIdentity::AuthorizationKey(key.into()),
            _ => ClientIdentity::pair(&self.client_id, &self.client_secret),
        }
    }
}

impl std::fmt::Debug for GigaChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GigaChatConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field(
                "authorization_key",
                &self.authorization_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("scope", &self.scope)
            .field("base_url", &self.base_url)
            .field("auth_url", &self.auth_url)
            .field("model", &self.model)
            .finish()
    }
}

/// GigaChat API client.
pub struct GigaChatClient {
    http: HttpClient,
    tokens: TokenCache<ClientCredentialsSource>,
    config: GigaChatConfig,
    transport: TransportConfig,
}

impl std::fmt::Debug for GigaChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GigaChatClient")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl GigaChatClient {
    /// Create a new client. Credentials are validated before any request.
    pub fn new(config: GigaChatConfig, transport: &TransportConfig) -> Result<Self, Error> {
        let source = ClientCredentialsSource::new(
            config.identity(),
            config.scope.clone(),
            config.auth_url.clone(),
            transport,
        )
        .map_err(|e| match e {
            AuthError::Config(msg) => Error::Config(format!("GigaChat {msg}")),
            other => Error::Auth(other),
        })?;

        let http = HttpClient::new(PROVIDER_ID, config.base_url.clone(), AuthConfig::None, transport)?;

        Ok(Self {
            http,
            tokens: TokenCache::new(source),
            config,
            transport: transport.clone(),
        })
    }

    /// Build a fresh client from the same settings with another transport.
    ///
    /// The token cache starts empty.
    pub fn with_transport(&self, transport: TransportConfig) -> Result<Self, Error> {
        if !transport.verify_tls {
            tracing::warn!(provider = PROVIDER_ID, "Rebuilding client without TLS verification");
        }
        Self::new(self.config.clone(), &transport)
    }

    pub fn config(&self) -> &GigaChatConfig {
        &self.config
    }

    pub fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    /// Current valid access token, refreshing if needed.
    pub async fn access_token(&self) -> Result<Credential, Error> {
        Ok(self.tokens.get_valid_token().await?)
    }

    /// Drop the cached token so the next call re-authenticates.
    pub async fn invalidate_token(&self) {
        self.tokens.invalidate().await;
    }
}

#[async_trait]
impl ChatProvider for GigaChatClient {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn default_options(&self) -> CompletionOptions {
        CompletionOptions::new(DEFAULT_TEMPERATURE, DEFAULT_MAX_TOKENS)
    }

    async fn complete_with_history(
        &self,
        turns: &[ChatTurn],
        options: &CompletionOptions,
    ) -> Result<CompletionResult, Error> {
        let token = self.tokens.get_valid_token().await?;
        let headers = bearer_headers(token.token())?;

        let model = options.model_or(&self.config.model);
        let request = GigaChatRequest::new(model, turns, options);

        tracing::debug!(
            provider = PROVIDER_ID,
            model = %model,
            messages = request.messages.len(),
            "GigaChat API request"
        );

        let response: GigaChatResponse = self
            .http
            .post_json_with_headers("/chat/completions", &request, headers)
            .await?;

        Ok(response.into_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::types::NO_ANSWER;
    use chrono::{TimeDelta, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> GigaChatConfig {
        GigaChatConfig {
            base_url: format!("{}/api/v1", server.uri()),
            auth_url: format!("{}/api/v2/oauth", server.uri()),
            ..GigaChatConfig::new("client-id", "client-secret")
        }
    }

    fn client(server: &MockServer) -> GigaChatClient {
        GigaChatClient::new(config(server), &TransportConfig::default()).unwrap()
    }

    async fn mount_token(server: &MockServer, token: &str, expected_calls: u64) {
        let expires_at = (Utc::now() + TimeDelta::minutes(30)).timestamp_millis();
        Mock::given(method("POST"))
            .and(path("/api/v2/oauth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": token,
                "expires_at": expires_at
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    fn chat_response(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": content}, "index": 0, "finish_reason": "stop"}],
            "created": 1_706_026_848,
            "model": "GigaChat:latest",
            "object": "chat.completion",
            "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
        }))
    }

    #[tokio::test]
    async fn test_empty_credentials_fail_before_network() {
        let server = MockServer::start().await;

        for config in [
            GigaChatConfig {
                auth_url: server.uri(),
                ..GigaChatConfig::new("", "secret")
            },
            GigaChatConfig {
                auth_url: server.uri(),
                ..GigaChatConfig::new("id", "")
            },
            GigaChatConfig {
                scope: String::new(),
                auth_url: server.uri(),
                ..GigaChatConfig::new("id", "secret")
            },
        ] {
            let result = GigaChatClient::new(config, &TransportConfig::default());
            assert!(matches!(result, Err(Error::Config(_))));
        }

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn test_authorization_key_takes_precedence() {
        let config = GigaChatConfig {
            authorization_key: Some("a2V5".into()),
            ..GigaChatConfig::default()
        };
        assert_eq!(config.identity(), ClientIdentity::AuthorizationKey("a2V5".into()));
        assert!(GigaChatClient::new(config, &TransportConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_complete_attaches_bearer_token() {
        let server = MockServer::start().await;
        mount_token(&server, "token-1", 1).await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer token-1"))
            .and(body_json(json!({
                "model": "GigaChat",
                "messages": [{"role": "user", "content": "Tell me about security"}],
                "temperature": 1.0,
                "max_tokens": 512,
                "stream": false
            })))
            .respond_with(chat_response("Use strong passwords."))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let result = client
            .complete("Tell me about security", None, &client.default_options())
            .await
            .unwrap();

        assert_eq!(result.text, "Use strong passwords.");
        assert_eq!(result.model.as_deref(), Some("GigaChat:latest"));
        assert_eq!(result.usage.unwrap().total_tokens, 13);
    }

    #[tokio::test]
    async fn test_token_reused_across_calls() {
        let server = MockServer::start().await;
        mount_token(&server, "token-1", 1).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(chat_response("ok"))
            .expect(2)
            .mount(&server)
            .await;

        let client = client(&server);
        let options = client.default_options();
        client.complete("one", None, &options).await.unwrap();
        client.complete("two", None, &options).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalidate_token_forces_reauthentication() {
        let server = MockServer::start().await;
        mount_token(&server, "token-1", 2).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer token-1"))
            .respond_with(chat_response("ok"))
            .expect(2)
            .mount(&server)
            .await;

        let client = client(&server);
        let token = client.access_token().await.unwrap();
        assert_eq!(token.token(), "token-1");
        assert!(!token.is_expired());

        let options = client.default_options();
        client.complete("one", None, &options).await.unwrap();

        client.invalidate_token().await;
        client.complete("two", None, &options).await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_choices_returns_sentinel() {
        let server = MockServer::start().await;
        mount_token(&server, "token-1", 1).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [],
                "model": "GigaChat"
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let result = client
            .complete("hi", None, &client.default_options())
            .await
            .unwrap();
        assert_eq!(result.text, NO_ANSWER);
        assert!(result.is_no_answer());
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let server = MockServer::start().await;
        mount_token(&server, "token-1", 1).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(422).set_body_string(r#"{"status":422,"message":"Invalid params"}"#),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        let err = client
            .complete("hi", None, &client.default_options())
            .await
            .unwrap_err();
        match err {
            Error::Api {
                provider,
                status,
                body,
            } => {
                assert_eq!(provider, PROVIDER_ID);
                assert_eq!(status, 422);
                assert!(body.contains("Invalid params"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_auth_failure_surfaces_as_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/oauth"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(chat_response("unreachable"))
            .expect(0)
            .mount(&server)
            .await;

        let client = client(&server);
        let err = client
            .complete("hi", None, &client.default_options())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::Rejected { status: 401, .. })));
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_history_sent_in_order() {
        let server = MockServer::start().await;
        mount_token(&server, "token-1", 1).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(body_json(json!({
                "model": "GigaChat-Pro",
                "messages": [
                    {"role": "system", "content": "Answer in one word."},
                    {"role": "user", "content": "Capital of France?"},
                    {"role": "assistant", "content": "Paris"},
                    {"role": "user", "content": "Of Italy?"}
                ],
                "temperature": 0.5,
                "max_tokens": 16,
                "stream": false
            })))
            .respond_with(chat_response("Rome"))
            .expect(1)
            .mount(&server)
            .await;

        let turns = vec![
            ChatTurn::system("Answer in one word."),
            ChatTurn::user("Capital of France?"),
            ChatTurn::assistant("Paris"),
            ChatTurn::user("Of Italy?"),
        ];
        let options = CompletionOptions::new(0.5, 16).with_model("GigaChat-Pro");
        let result = client(&server)
            .complete_with_history(&turns, &options)
            .await
            .unwrap();
        assert_eq!(result.text, "Rome");
    }

    #[tokio::test]
    async fn test_with_transport_keeps_config() {
        let server = MockServer::start().await;
        let client = client(&server);

        let insecure = client
            .with_transport(TransportConfig {
                verify_tls: false,
                ..TransportConfig::default()
            })
            .unwrap();

        assert_eq!(insecure.config().client_id, "client-id");
        assert_eq!(insecure.config().auth_url, client.config().auth_url);
        assert!(!insecure.transport().verify_tls);
        assert!(client.transport().verify_tls);
    }
}
