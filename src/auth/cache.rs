//! Single-flight cache for one bearer credential.

use super::{AuthError, Credential, TokenSource};
use chrono::{TimeDelta, Utc};
use std::time::Duration;
use tokio::sync::Mutex;

/// Tokens expiring within this window are refreshed early.
pub const REFRESH_SKEW: Duration = Duration::from_secs(60);

/// Caches a credential obtained from a [`TokenSource`].
///
/// The lock is held across the network refresh, so concurrent callers wait
/// for the in-flight refresh and then share its result.
pub struct TokenCache<S> {
    source: S,
    current: Mutex<Option<Credential>>,
    skew: TimeDelta,
}

impl<S: TokenSource> TokenCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            current: Mutex::new(None),
            skew: TimeDelta::from_std(REFRESH_SKEW).unwrap_or_default(),
        }
    }

    /// Override the early-refresh window.
    #[must_use]
    pub fn with_refresh_skew(mut self, skew: Duration) -> Self {
        self.skew = TimeDelta::from_std(skew).unwrap_or_default();
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Return the cached credential, refreshing it first if absent or expired.
    pub async fn get_valid_token(&self) -> Result<Credential, AuthError> {
        let mut current = self.current.lock().await;

        if let Some(cred) = current.as_ref()
            && !cred.is_expired_at(Utc::now(), self.skew)
        {
            return Ok(cred.clone());
        }

        tracing::debug!(cached = current.is_some(), "Access token missing or expired");
        let fresh = self.source.fetch().await?;
        *current = Some(fresh.clone());
        Ok(fresh)
    }

    /// Force a refresh regardless of the cached credential.
    pub async fn refresh(&self) -> Result<Credential, AuthError> {
        let mut current = self.current.lock().await;
        let fresh = self.source.fetch().await?;
        *current = Some(fresh.clone());
        Ok(fresh)
    }

    /// Drop the cached credential; the next call refreshes.
    pub async fn invalidate(&self) {
        self.current.lock().await.take();
    }

    /// Snapshot of the cached credential, if any.
    pub async fn cached(&self) -> Option<Credential> {
        self.current.lock().await.clone()
    }
}
