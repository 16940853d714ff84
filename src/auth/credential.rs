//! Bearer credential with an expiry instant.

use chrono::{DateTime, TimeDelta, Utc};

/// Short-lived bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// The raw bearer token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.access_token
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Check whether the token must not be sent at `now`.
    ///
    /// `skew` treats tokens expiring within that window as already expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, skew: TimeDelta) -> bool {
        self.access_token.is_empty() || now + skew >= self.expires_at
    }

    /// Check if the token is expired right now (no skew).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now(), TimeDelta::zero())
    }

    /// Time left until expiry, zero once expired.
    #[must_use]
    pub fn remaining(&self) -> TimeDelta {
        (self.expires_at - Utc::now()).max(TimeDelta::zero())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
