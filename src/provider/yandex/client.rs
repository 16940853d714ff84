//! YandexGPT client scoped to a cloud folder.
//!
//! Authenticates with a static `Api-Key` and the `x-folder-id` header; the
//! model is addressed as `gpt://<folder>/<model>`.

use super::types::{YandexRequest, YandexResponse};
use crate::provider::client::ChatProvider;
use crate::provider::error::Error;
use crate::provider::http::{AuthConfig, HttpClient, TransportConfig};
use crate::provider::types::{ChatTurn, CompletionOptions, CompletionResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const PROVIDER_ID: &str = "yandex";

/// Foundation Models completion endpoint.
pub const YANDEX_COMPLETION_URL: &str =
    "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";

pub const DEFAULT_MODEL: &str = "yandexgpt-lite";
const DEFAULT_TEMPERATURE: f32 = 0.6;
const DEFAULT_MAX_TOKENS: u32 = 2000;

/// YandexGPT connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YandexConfig {
    pub folder_id: String,
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
}

impl Default for YandexConfig {
    fn default() -> Self {
        Self {
            folder_id: String::new(),
            api_key: String::new(),
            endpoint: YANDEX_COMPLETION_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl YandexConfig {
    pub fn new(folder_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            folder_id: folder_id.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }
}

impl std::fmt::Debug for YandexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YandexConfig")
            .field("folder_id", &self.folder_id)
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

/// YandexGPT API client.
#[derive(Debug)]
pub struct YandexClient {
    http: HttpClient,
    folder_id: String,
    model: String,
}

impl YandexClient {
    /// Create a new client. Fails on an empty folder id or API key.
    pub fn new(config: YandexConfig, transport: &TransportConfig) -> Result<Self, Error> {
        if config.folder_id.trim().is_empty() {
            return Err(Error::Config("Yandex folder id is empty".into()));
        }
        if config.api_key.trim().is_empty() {
            return Err(Error::Config("Yandex API key is empty".into()));
        }

        let http = HttpClient::new(
            PROVIDER_ID,
            config.endpoint,
            AuthConfig::ApiKey {
                header: "Authorization".into(),
                key: format!("Api-Key {}", config.api_key),
            },
            transport,
        )?
        .with_header("x-folder-id", &config.folder_id)?;

        let model = if config.model.trim().is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            config.model
        };

        Ok(Self {
            http,
            folder_id: config.folder_id,
            model,
        })
    }

    /// Full model URI; values already in `gpt://` form are kept.
    fn model_uri(&self, model: &str) -> String {
        if model.starts_with("gpt://") {
            model.to_string()
        } else {
            format!("gpt://{}/{model}", self.folder_id)
        }
    }
}

#[async_trait]
impl ChatProvider for YandexClient {
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
        let model_uri = self.model_uri(options.model_or(&self.model));
        let request = YandexRequest::new(model_uri, turns, options);

        tracing::debug!(
            provider = PROVIDER_ID,
            model_uri = %request.model_uri,
            messages = request.messages.len(),
            "YandexGPT API request"
        );

        let response: YandexResponse = self.http.post_json("", &request).await?;
        let mut result = response.into_result();
        result.model = Some(request.model_uri);
        Ok(result)
    }
}
