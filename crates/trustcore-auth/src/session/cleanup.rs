//! Expired session cleanup.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use trustcore_core::error::AppError;

use crate::jwt::TokenManager;

use super::manager::SessionManager;

/// Handles periodic cleanup of expired sessions and stale revocations.
#[derive(Clone)]
pub struct SessionCleanup {
    /// Session manager whose store is swept.
    sessions: SessionManager,
    /// Token manager whose revocation entries are purged.
    tokens: Option<TokenManager>,
}

impl std::fmt::Debug for SessionCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCleanup").finish()
    }
}

impl SessionCleanup {
    /// Creates a new session cleanup handler.
    pub fn new(sessions: SessionManager) -> Self {
        Self {
            sessions,
            tokens: None,
        }
    }

    /// Also purges revocation entries older than the refresh TTL on each cycle.
    pub fn with_tokens(mut self, tokens: TokenManager) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Runs a cleanup cycle.
    ///
    /// Returns the number of sessions removed.
    pub async fn run_cleanup(&self) -> Result<u64, AppError> {
        let removed = self.sessions.cleanup_expired().await?;
        if removed > 0 {
            info!(count = removed, "Removed expired sessions");
        }

        if let Some(tokens) = &self.tokens {
            match tokens.purge_revocations().await {
                Ok(0) => {}
                Ok(purged) => info!(count = purged, "Purged stale token revocations"),
                Err(e) => error!(error = %e, "Failed to purge token revocations"),
            }
        }

        Ok(removed)
    }

    /// Runs cleanup cycles every `period` until `cancel` fires.
    pub async fn run(&self, period: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(interval_secs = period.as_secs(), "Session cleanup started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cleanup().await {
                        error!(error = %e, "Session cleanup cycle failed");
                    }
                }
            }
        }
        info!("Session cleanup stopped");
    }
}
