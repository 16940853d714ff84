//! GigaChat chat-completions API types.

use crate::provider::types::{ChatTurn, CompletionOptions, CompletionResult, Usage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct GigaChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<GigaChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct GigaChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> GigaChatRequest<'a> {
    pub(crate) fn new(model: &'a str, turns: &'a [ChatTurn], options: &CompletionOptions) -> Self {
        Self {
            model,
            messages: turns
                .iter()
                .map(|t| GigaChatMessage {
                    role: t.role.as_str(),
                    content: &t.text,
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GigaChatResponse {
    pub choices: Option<Vec<Choice>>,
    pub model: Option<String>,
    pub usage: Option<GigaChatUsage>,
    pub created: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[allow(clippy::struct_field_names)]
#[derive(Debug, Deserialize)]
pub(crate) struct GigaChatUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl GigaChatResponse {
    pub(crate) fn into_result(self) -> CompletionResult {
        let text = self
            .choices
            .into_iter()
            .flatten()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);

        let mut result = CompletionResult::from_text(text);
        result.model = self.model;
        result.created = self.created;
        result.usage = self.usage.map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        result
    }
}
