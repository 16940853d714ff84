//! Bearer-token acquisition for OAuth-gated providers.
//!
//! A [`TokenSource`] knows how to obtain a fresh [`Credential`]; a
//! [`TokenCache`] keeps the current one and refreshes it on demand.

mod cache;
mod client_credentials;
mod credential;

pub use cache::{REFRESH_SKEW, TokenCache};
pub use client_credentials::{
    AUTH_URL, ClientCredentialsSource, ClientIdentity, DEFAULT_SCOPE, FALLBACK_TOKEN_TTL,
};
pub use credential::Credential;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid auth configuration: {0}")]
    Config(String),

    #[error("Token request rejected: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Token response has no access_token: {body}")]
    MissingToken { body: String },

    #[error("Failed to parse token response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Token request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Obtains fresh credentials from an identity provider.
pub trait TokenSource: Send + Sync {
    /// Perform one token request.
    fn fetch(&self) -> impl std::future::Future<Output = Result<Credential, AuthError>> + Send;
}
