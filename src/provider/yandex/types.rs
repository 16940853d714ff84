//! YandexGPT Foundation Models completion API types.

use crate::provider::types::{ChatTurn, CompletionOptions, CompletionResult, Usage, lenient_u32};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct YandexRequest<'a> {
    pub model_uri: String,
    pub completion_options: YandexCompletionOptions,
    pub messages: Vec<YandexMessage<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct YandexCompletionOptions {
    pub stream: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct YandexMessage<'a> {
    pub role: &'static str,
    pub text: &'a str,
}

impl<'a> YandexRequest<'a> {
    pub(crate) fn new(model_uri: String, turns: &'a [ChatTurn], options: &CompletionOptions) -> Self {
        Self {
            model_uri,
            completion_options: YandexCompletionOptions {
                stream: false,
                temperature: options.temperature,
                max_tokens: options.max_tokens,
            },
            messages: turns
                .iter()
                .map(|t| YandexMessage {
                    role: t.role.as_str(),
                    text: &t.text,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct YandexResponse {
    pub result: Option<YandexResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct YandexResult {
    pub alternatives: Option<Vec<Alternative>>,
    pub usage: Option<YandexUsage>,
    pub model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Alternative {
    pub message: Option<AlternativeMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlternativeMessage {
    pub text: Option<String>,
}

/// Token counts; the API encodes them as decimal strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct YandexUsage {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub input_text_tokens: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub completion_tokens: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub total_tokens: u32,
}

impl YandexResponse {
    pub(crate) fn into_result(self) -> CompletionResult {
        let Some(result) = self.result else {
            return CompletionResult::from_text(None);
        };

        let text = result
            .alternatives
            .into_iter()
            .flatten()
            .next()
            .and_then(|a| a.message)
            .and_then(|m| m.text);

        let mut completion = CompletionResult::from_text(text);
        completion.model_version = result.model_version;
        completion.usage = result.usage.map(|u| Usage {
            input_tokens: u.input_text_tokens,
            output_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        completion
    }
}
