//! Gemini `generateContent` client.
//!
//! Stateless: the API key travels as the `key` query parameter on every
//! request and there is no token lifecycle.

use super::types::{GeminiRequest, GeminiResponse};
use crate::provider::client::ChatProvider;
use crate::provider::error::Error;
use crate::provider::http::{AuthConfig, HttpClient, TransportConfig};
use crate::provider::types::{ChatTurn, CompletionOptions, CompletionResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const PROVIDER_ID: &str = "gemini";

/// Generative Language API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_MODEL: &str = "gemini-pro";
const DEFAULT_TEMPERATURE: f32 = 1.0;
const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Gemini connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: GEMINI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Normalize model name (strip any `models/` prefix).
fn normalize_model_name(model: &str) -> String {
    let trimmed = model.trim();
    trimmed
        .strip_prefix("models/")
        .unwrap_or(trimmed)
        .to_string()
}

/// Gemini API client.
#[derive(Debug)]
pub struct GeminiClient {
    http: HttpClient,
    model: String,
}

impl GeminiClient {
    /// Create a new Gemini client. Fails on an empty API key.
    pub fn new(config: GeminiConfig, transport: &TransportConfig) -> Result<Self, Error> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Config("Gemini API key is empty".into()));
        }

        let http = HttpClient::new(
            PROVIDER_ID,
            config.base_url,
            AuthConfig::QueryKey {
                param: "key".into(),
                key: config.api_key,
            },
            transport,
        )?;

        let model = if config.model.trim().is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            normalize_model_name(&config.model)
        };

        Ok(Self { http, model })
    }

    /// Generate text for a single prompt with default sampling.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, Error> {
        let result = self
            .complete(prompt, None, &self.default_options())
            .await?;
        Ok(result.text)
    }
}

#[async_trait]
impl ChatProvider for GeminiClient {
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
        let model = normalize_model_name(options.model_or(&self.model));
        let request = GeminiRequest::from_turns(turns, options);

        tracing::debug!(
            provider = PROVIDER_ID,
            model = %model,
            contents = request.contents.len(),
            "Gemini API request"
        );

        let url = format!("/models/{model}:generateContent");
        let response: GeminiResponse = self.http.post_json(&url, &request).await?;

        let mut result = CompletionResult::from_text(response.get_text());
        result.usage = response.usage();
        result.model_version = response.model_version;
        result.model = Some(model);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::types::NO_ANSWER;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new(
            GeminiConfig {
                api_key: "test-key".into(),
                base_url: server.uri(),
                ..GeminiConfig::default()
            },
            &TransportConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_model_name() {
        assert_eq!(normalize_model_name("models/gemini-pro"), "gemini-pro");
        assert_eq!(normalize_model_name(" gemini-1.5-flash "), "gemini-1.5-flash");
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = GeminiClient::new(GeminiConfig::default(), &TransportConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GeminiConfig {
            api_key: "AIza-secret".into(),
            ..GeminiConfig::default()
        };
        assert!(!format!("{config:?}").contains("AIza-secret"));
    }

    #[tokio::test]
    async fn test_generate_text_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-pro:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_json(json!({
                "contents": [{"parts": [{"text": "Write a poem"}]}],
                "generationConfig": {"temperature": 1.0, "maxOutputTokens": 2048}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Blossoms wake."}], "role": "model"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server).generate_text("Write a poem").await.unwrap();
        assert_eq!(text, "Blossoms wake.");
    }

    #[tokio::test]
    async fn test_model_override_in_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let options = client.default_options().with_model("models/gemini-1.5-flash");
        let result = client.complete("hi", None, &options).await.unwrap();
        assert_eq!(result.text, NO_ANSWER);
        assert_eq!(result.model.as_deref(), Some("gemini-1.5-flash"));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).generate_text("hi").await.unwrap_err();
        assert!(matches!(err, Error::Api { provider: "gemini", status: 400, .. }));
    }
}
