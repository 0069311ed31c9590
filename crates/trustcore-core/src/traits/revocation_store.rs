//! Revoked bearer token tracking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::result::AppResult;

/// Records tokens invalidated before their natural expiry.
///
/// Entries are keyed by the raw token string.
#[async_trait]
pub trait RevocationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Record a token as revoked at `revoked_at`.
    async fn revoke(&self, token: &str, revoked_at: DateTime<Utc>) -> AppResult<()>;

    /// Check whether a token has been revoked.
    async fn is_revoked(&self, token: &str) -> AppResult<bool>;

    /// Forget entries revoked before `cutoff`. Returns the number removed.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<usize>;
}
