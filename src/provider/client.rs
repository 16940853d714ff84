//! Vendor-neutral chat interface and the configured-client dispatcher.

use super::api_provider::Provider;
use super::error::Error;
use super::gemini::GeminiClient;
use super::gigachat::GigaChatClient;
use super::types::{ChatTurn, CompletionOptions, CompletionResult};
use super::yandex::YandexClient;
use crate::config::Config;
use async_trait::async_trait;

/// A chat-completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider id used in logs and errors.
    fn id(&self) -> &'static str;

    /// Vendor defaults for model, temperature and token limit.
    fn default_options(&self) -> CompletionOptions;

    /// Send a full transcript in order and return the vendor's reply.
    async fn complete_with_history(
        &self,
        turns: &[ChatTurn],
        options: &CompletionOptions,
    ) -> Result<CompletionResult, Error>;

    /// Single prompt with an optional system instruction.
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &CompletionOptions,
    ) -> Result<CompletionResult, Error> {
        let turns = prompt_turns(prompt, system_prompt);
        self.complete_with_history(&turns, options).await
    }
}

/// Turns for a one-shot prompt. An empty system prompt is dropped.
#[must_use]
pub fn prompt_turns(prompt: &str, system_prompt: Option<&str>) -> Vec<ChatTurn> {
    let mut turns = Vec::with_capacity(2);
    if let Some(system) = system_prompt
        && !system.is_empty()
    {
        turns.push(ChatTurn::system(system));
    }
    turns.push(ChatTurn::user(prompt));
    turns
}

/// A vendor client built from configuration.
#[derive(Debug)]
pub enum Client {
    Gemini(GeminiClient),
    GigaChat(GigaChatClient),
    Yandex(YandexClient),
}

impl Client {
    /// Build the client for `provider` from the loaded configuration.
    pub fn from_config(provider: Provider, config: &Config) -> Result<Self, Error> {
        let transport = config.transport.to_transport();
        tracing::debug!(provider = provider.id(), verify_tls = transport.verify_tls, "Building client");

        Ok(match provider {
            Provider::Gemini => Self::Gemini(GeminiClient::new(config.gemini.clone(), &transport)?),
            Provider::GigaChat => {
                Self::GigaChat(GigaChatClient::new(config.gigachat.clone(), &transport)?)
            }
            Provider::YandexGpt => {
                Self::Yandex(YandexClient::new(config.yandex.clone(), &transport)?)
            }
        })
    }

    #[must_use]
    pub fn provider(&self) -> Provider {
        match self {
            Self::Gemini(_) => Provider::Gemini,
            Self::GigaChat(_) => Provider::GigaChat,
            Self::Yandex(_) => Provider::YandexGpt,
        }
    }

    fn inner(&self) -> &dyn ChatProvider {
        match self {
            Self::Gemini(c) => c,
            Self::GigaChat(c) => c,
            Self::Yandex(c) => c,
        }
    }
}

#[async_trait]
impl ChatProvider for Client {
    fn id(&self) -> &'static str {
        self.inner().id()
    }

    fn default_options(&self) -> CompletionOptions {
        self.inner().default_options()
    }

    async fn complete_with_history(
        &self,
        turns: &[ChatTurn],
        options: &CompletionOptions,
    ) -> Result<CompletionResult, Error> {
        self.inner().complete_with_history(turns, options).await
    }
}
