//! Shared types for LLM providers.

use serde::{Deserialize, Deserializer, Serialize};

/// Text returned when the vendor produced no candidate.
pub const NO_ANSWER: &str = "No answer";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name shared by the OpenAI-style vendors.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One entry of a conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Sampling parameters for a single completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    /// Overrides the provider's default model when set.
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionOptions {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            model: None,
            temperature,
            max_tokens,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Resolve the model name, falling back to `default`.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(default)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// Result of a completion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionResult {
    /// Model output, or [`NO_ANSWER`] when the vendor returned nothing.
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Unix timestamp reported by the vendor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl CompletionResult {
    /// Build a result from optional text, substituting the sentinel.
    pub fn from_text(text: Option<String>) -> Self {
        Self {
            text: text.unwrap_or_else(|| NO_ANSWER.to_string()),
            usage: None,
            model: None,
            created: None,
            model_version: None,
        }
    }

    /// True when the vendor produced no output.
    #[must_use]
    pub fn is_no_answer(&self) -> bool {
        self.text == NO_ANSWER
    }
}

/// Deserialize a token count that some vendors encode as a JSON string.
pub(crate) fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u32),
        Text(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
