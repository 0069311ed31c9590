//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A server-side login record bound to a bearer token.
///
/// Sessions are created on login and become unusable once deactivated
/// or past their expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: String,
    /// Bearer token issued with the session.
    pub token: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
    /// Client IP address.
    pub ip_address: String,
    /// User-Agent header value.
    pub user_agent: String,
    /// Cleared by invalidation or expiry detection.
    pub active: bool,
}

impl Session {
    /// Check whether the session expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Check whether the session has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Check whether the session is active and unexpired.
    pub fn is_valid(&self) -> bool {
        self.active && !self.is_expired()
    }
}
