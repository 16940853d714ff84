//! OAuth client-credentials token source (GigaChat identity provider).
//!
//! Exchanges a client id/secret pair for a short-lived access token with a
//! form-encoded `scope` request. Every attempt carries a fresh `RqUID`
//! correlation id.

use super::{AuthError, Credential, TokenSource};
use crate::provider::http::TransportConfig;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// GigaChat OAuth endpoint.
pub const AUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";

/// Scope for personal API access.
pub const DEFAULT_SCOPE: &str = "GIGACHAT_API_PERS";

/// Validity assumed when the provider reports no usable expiry.
pub const FALLBACK_TOKEN_TTL: Duration = Duration::from_secs(25 * 60);

/// Values below this are treated as seconds rather than milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Client identity presented to the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub enum ClientIdentity {
    /// Client id and secret, encoded as `base64(id:secret)`.
    Pair {
        client_id: String,
        client_secret: String,
    },
    /// Authorization key already encoded by the vendor console.
    AuthorizationKey(String),
}

impl ClientIdentity {
    pub fn pair(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::Pair {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    fn validate(&self) -> Result<(), AuthError> {
        match self {
            Self::Pair {
                client_id,
                client_secret,
            } => {
                if client_id.trim().is_empty() {
                    return Err(AuthError::Config("client id is empty".into()));
                }
                if client_secret.trim().is_empty() {
                    return Err(AuthError::Config("client secret is empty".into()));
                }
            }
            Self::AuthorizationKey(key) => {
                if key.trim().is_empty() {
                    return Err(AuthError::Config("authorization key is empty".into()));
                }
            }
        }
        Ok(())
    }

    /// Value for the `Authorization: Basic ...` header.
    #[must_use]
    pub fn basic_credentials(&self) -> String {
        match self {
            Self::Pair {
                client_id,
                client_secret,
            } => STANDARD.encode(format!("{client_id}:{client_secret}")),
            Self::AuthorizationKey(key) => key.trim().to_string(),
        }
    }
}

impl std::fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pair { client_id, .. } => f
                .debug_struct("Pair")
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .finish(),
            Self::AuthorizationKey(_) => f
                .debug_tuple("AuthorizationKey")
                .field(&"[REDACTED]")
                .finish(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    expires_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    expires_in: Option<i64>,
}

/// Read an integer, float or numeric string; anything else is treated as absent.
#[allow(clippy::cast_possible_truncation)]
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let from_f64 = |f: f64| f.is_finite().then_some(f as i64);

    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(from_f64)),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(from_f64))
        }
        _ => None,
    })
}

/// Fetches tokens with the client-credentials grant.
pub struct ClientCredentialsSource {
    client: reqwest::Client,
    auth_url: String,
    identity: ClientIdentity,
    scope: String,
}

impl ClientCredentialsSource {
    /// Validate the identity and scope and build the HTTP client.
    pub fn new(
        identity: ClientIdentity,
        scope: impl Into<String>,
        auth_url: impl Into<String>,
        transport: &TransportConfig,
    ) -> Result<Self, AuthError> {
        identity.validate()?;

        let scope = scope.into();
        if scope.trim().is_empty() {
            return Err(AuthError::Config("scope is empty".into()));
        }

        let auth_url = auth_url.into();
        if auth_url.trim().is_empty() {
            return Err(AuthError::Config("authorization URL is empty".into()));
        }

        let client = transport
            .build_client()
            .map_err(|e| AuthError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            auth_url,
            identity,
            scope,
        })
    }
}

impl TokenSource for ClientCredentialsSource {
    async fn fetch(&self) -> Result<Credential, AuthError> {
        let rq_uid = uuid::Uuid::new_v4().to_string();
        tracing::debug!(rq_uid = %rq_uid, scope = %self.scope, "Requesting access token");

        let response = self
            .client
            .post(&self.auth_url)
            .header(
                AUTHORIZATION,
                format!("Basic {}", self.identity.basic_credentials()),
            )
            .header("RqUID", &rq_uid)
            .header(ACCEPT, "application/json")
            .form(&[("scope", self.scope.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(rq_uid = %rq_uid, status = status.as_u16(), "Token request rejected");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)?;
        let Some(access_token) = parsed.access_token.filter(|t| !t.is_empty()) else {
            return Err(AuthError::MissingToken { body });
        };

        let expires_at = resolve_expiry(parsed.expires_at, parsed.expires_in, Utc::now());
        tracing::info!(rq_uid = %rq_uid, %expires_at, "Access token refreshed");

        Ok(Credential::new(access_token, expires_at))
    }
}

/// Pick the expiry instant for a freshly issued token.
///
/// Prefers the absolute `expires_at` (milliseconds, or seconds for small
/// values), then relative `expires_in` seconds. Anything missing or not in
/// the future falls back to [`FALLBACK_TOKEN_TTL`].
fn resolve_expiry(
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let reported = expires_at
        .and_then(|raw| {
            if raw >= MILLIS_THRESHOLD {
                DateTime::from_timestamp_millis(raw)
            } else {
                DateTime::from_timestamp(raw, 0)
            }
        })
        .or_else(|| {
            expires_in
                .and_then(TimeDelta::try_seconds)
                .and_then(|ttl| now.checked_add_signed(ttl))
        });

    match reported {
        Some(at) if at > now => at,
        _ => {
            tracing::warn!(
                ttl_secs = FALLBACK_TOKEN_TTL.as_secs(),
                "Token response has no usable expiry, applying fallback TTL"
            );
            now + TimeDelta::from_std(FALLBACK_TOKEN_TTL).unwrap_or_default()
        }
    }
}
