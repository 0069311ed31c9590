//! In-memory revoked token set.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use trustcore_core::result::AppResult;
use trustcore_core::traits::RevocationStore;

/// Revocation set keyed by the raw token string.
#[derive(Debug, Clone, Default)]
pub struct MemoryRevocationStore {
    revoked: Arc<DashMap<String, DateTime<Utc>>>,
}

impl MemoryRevocationStore {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked tokens.
    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    /// Whether no tokens are tracked.
    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn revoke(&self, token: &str, revoked_at: DateTime<Utc>) -> AppResult<()> {
        self.revoked.insert(token.to_string(), revoked_at);
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> AppResult<bool> {
        Ok(self.revoked.contains_key(token))
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<usize> {
        let before = self.revoked.len();
        self.revoked.retain(|_, revoked_at| *revoked_at >= cutoff);
        let purged = before.saturating_sub(self.revoked.len());
        if purged > 0 {
            debug!(purged, "Purged stale revoked tokens");
        }
        Ok(purged)
    }
}
