//! Provider error types.

use crate::auth::AuthError;
use thiserror::Error;

/// Format an API error for display, extracting message from JSON if present.
///
/// Handles common patterns:
/// - `{"error": {"message": "...", "code": "..."}}` (Gemini)
/// - `{"status": 401, "message": "..."}` (GigaChat)
/// - `{"error": {"grpcCode": 16, "message": "...", "httpStatus": 401}}` (YandexGPT)
/// - Plain text errors → returns as-is
#[must_use]
pub fn format_api_error(error: &str) -> String {
    if let Some(json_start) = error.find('{') {
        let json_str = &error[json_start..];

        let prefix = error[..json_start].trim();
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(json_str)
            && let Some(msg) = extract_error_message(&json, http_status(prefix))
        {
            if prefix.is_empty() {
                return msg;
            }
            return format!("{prefix} {msg}");
        }
    }

    error.to_string()
}

/// Status code from an `HTTP 401:` style prefix.
fn http_status(prefix: &str) -> Option<u64> {
    prefix
        .strip_prefix("HTTP ")?
        .trim_end_matches(':')
        .trim()
        .parse()
        .ok()
}

/// Extract user-friendly message from JSON error response.
///
/// `http_status` is the transport status already shown to the user; a body
/// status equal to it is not repeated.
fn extract_error_message(json: &serde_json::Value, http_status: Option<u64>) -> Option<String> {
    if let Some(error_obj) = json.get("error") {
        if let Some(msg) = error_obj.get("message").and_then(|v| v.as_str()) {
            let mut result = msg.to_string();

            if let Some(code) = error_obj.get("code").and_then(|v| v.as_str()) {
                result = format!("{result} (code: {code})");
            } else if let Some(status) = error_obj.get("status").and_then(|v| v.as_str()) {
                result = format!("{result} (status: {status})");
            }

            return Some(result);
        }

        if let Some(msg) = error_obj.as_str() {
            return Some(msg.to_string());
        }
    }

    // GigaChat: flat body with a numeric status that may differ from the HTTP one
    if let Some(msg) = json.get("message").and_then(|v| v.as_str()) {
        return Some(match json.get("status").and_then(serde_json::Value::as_u64) {
            Some(status) if Some(status) != http_status => format!("{msg} (status: {status})"),
            _ => msg.to_string(),
        });
    }

    None
}

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid construction arguments; raised before any network access.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("{provider} API error: HTTP {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} returned an unexpected response: {source}")]
    Parse {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl Error {
    /// HTTP status of a failed API call, if the vendor answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Auth(AuthError::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Readable one-line description for terminal output.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Api {
                provider,
                status,
                body,
            } => format!(
                "{provider}: {}",
                format_api_error(&format!("HTTP {status}: {body}"))
            ),
            other => other.to_string(),
        }
    }
}
