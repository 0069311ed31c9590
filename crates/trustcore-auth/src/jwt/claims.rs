//! Claims carried by every bearer token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JWT payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Authenticated user id.
    pub user_id: String,
    /// User email at issuance.
    pub email: String,
    /// Role ids at issuance.
    pub roles: Vec<String>,
    /// Fixed service identifier.
    pub iss: String,
    /// Subject, equal to `user_id`.
    pub sub: String,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Not-before (seconds since epoch).
    pub nbf: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
    /// Random token id, distinct for every issued token.
    pub jti: String,
}

impl TokenClaims {
    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Checks whether the token is expired at `now`, allowing `leeway`.
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway: chrono::Duration) -> bool {
        now - leeway >= self.expires_at()
    }
}
