//! Session lifecycle orchestration.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use trustcore_core::config::SessionConfig;
use trustcore_core::deadline::{DEFAULT_STORE_TIMEOUT, bounded};
use trustcore_core::error::AppError;
use trustcore_core::result::AppResult;
use trustcore_core::traits::SessionStore;
use trustcore_entity::session::Session;

/// Creates, validates, refreshes and invalidates sessions.
///
/// Each user holds at most `max_sessions` stored sessions. Creation for
/// one user is serialised so that the cap holds under concurrent logins.
#[derive(Clone)]
pub struct SessionManager {
    /// Persistent session storage.
    store: Arc<dyn SessionStore>,
    /// Lifetime applied on create and refresh.
    ttl: chrono::Duration,
    /// Per-user session cap.
    max_sessions: usize,
    /// Per-user creation locks.
    creation_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    /// Upper bound for each store call.
    store_timeout: Duration,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .field("max_sessions", &self.max_sessions)
            .finish()
    }
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(config: &SessionConfig, store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            ttl: chrono::Duration::hours(config.ttl_hours as i64),
            max_sessions: config.max_sessions_per_user.max(1),
            creation_locks: Arc::new(DashMap::new()),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Overrides the session lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        self
    }

    /// Overrides the per-user session cap.
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// Sets the upper bound for each store call.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Creates a session, evicting the user's oldest sessions when the
    /// cap would be exceeded.
    pub async fn create(
        &self,
        user_id: &str,
        token: &str,
        ip_address: &str,
        user_agent: &str,
    ) -> AppResult<Session> {
        let lock = self
            .creation_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = lock.lock().await;
            self.create_locked(user_id, token, ip_address, user_agent)
                .await
        };

        drop(lock);
        self.creation_locks
            .remove_if(user_id, |_, held| Arc::strong_count(held) == 1);

        result
    }

    async fn create_locked(
        &self,
        user_id: &str,
        token: &str,
        ip_address: &str,
        user_agent: &str,
    ) -> AppResult<Session> {
        let mut existing = bounded(
            self.store_timeout,
            "session_store.get_by_user_id",
            self.store.get_by_user_id(user_id),
        )
        .await?;

        if existing.len() >= self.max_sessions {
            existing.sort_by_key(|s| s.created_at);
            let excess = existing.len() + 1 - self.max_sessions;
            for oldest in existing.iter().take(excess) {
                bounded(
                    self.store_timeout,
                    "session_store.delete",
                    self.store.delete(oldest.id),
                )
                .await?;
                info!(
                    user_id,
                    session_id = %oldest.id,
                    "Evicted oldest session over per-user limit"
                );
            }
        }

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            token: token.to_string(),
            created_at: now,
            expires_at: now + self.ttl,
            ip_address: ip_address.to_string(),
            user_agent: user_agent.to_string(),
            active: true,
        };

        bounded(
            self.store_timeout,
            "session_store.create",
            self.store.create(&session),
        )
        .await?;

        info!(
            user_id,
            session_id = %session.id,
            ip_address,
            "Session created"
        );

        Ok(session)
    }

    /// Looks up a session by id, whatever its state.
    pub async fn get(&self, session_id: Uuid) -> AppResult<Session> {
        bounded(
            self.store_timeout,
            "session_store.get",
            self.store.get(session_id),
        )
        .await?
        .ok_or_else(|| AppError::session_not_found(format!("Session {session_id} not found")))
    }

    /// Lists a user's active, unexpired sessions.
    pub async fn get_by_user_id(&self, user_id: &str) -> AppResult<Vec<Session>> {
        let now = Utc::now();
        let sessions = bounded(
            self.store_timeout,
            "session_store.get_by_user_id",
            self.store.get_by_user_id(user_id),
        )
        .await?;

        Ok(sessions
            .into_iter()
            .filter(|s| s.active && !s.is_expired_at(now))
            .collect())
    }

    /// Validates a session.
    ///
    /// An expired session is marked inactive before `SessionExpired` is
    /// returned.
    pub async fn validate(&self, session_id: Uuid) -> AppResult<Session> {
        let mut session = self.get(session_id).await?;
        if !session.active {
            debug!(session_id = %session_id, "Session inactive");
            return Err(AppError::session_not_found(format!(
                "Session {session_id} not found"
            )));
        }

        if session.is_expired_at(Utc::now()) {
            session.active = false;
            if let Err(e) = bounded(
                self.store_timeout,
                "session_store.update",
                self.store.update(&session),
            )
            .await
            {
                warn!(session_id = %session_id, error = %e, "Failed to deactivate expired session");
            }
            debug!(session_id = %session_id, user_id = %session.user_id, "Session expired");
            return Err(AppError::session_expired(format!(
                "Session {session_id} has expired"
            )));
        }

        Ok(session)
    }

    /// Extends a valid session's expiry from now.
    pub async fn refresh(&self, session_id: Uuid) -> AppResult<Session> {
        let mut session = self.validate(session_id).await?;
        session.expires_at = Utc::now() + self.ttl;

        bounded(
            self.store_timeout,
            "session_store.update",
            self.store.update(&session),
        )
        .await?;

        debug!(session_id = %session_id, expires_at = %session.expires_at, "Session refreshed");
        Ok(session)
    }

    /// Deactivates a session.
    pub async fn invalidate(&self, session_id: Uuid) -> AppResult<Session> {
        let mut session = self.get(session_id).await?;
        session.active = false;

        bounded(
            self.store_timeout,
            "session_store.update",
            self.store.update(&session),
        )
        .await?;

        info!(session_id = %session_id, user_id = %session.user_id, "Session invalidated");
        Ok(session)
    }

    /// Deletes every session belonging to a user.
    pub async fn invalidate_all(&self, user_id: &str) -> AppResult<()> {
        bounded(
            self.store_timeout,
            "session_store.delete_by_user_id",
            self.store.delete_by_user_id(user_id),
        )
        .await?;

        info!(user_id, "All sessions invalidated");
        Ok(())
    }

    /// Deletes sessions whose expiry has passed. Returns the number removed.
    pub async fn cleanup_expired(&self) -> AppResult<u64> {
        bounded(
            self.store_timeout,
            "session_store.delete_expired",
            self.store.delete_expired(Utc::now()),
        )
        .await
    }
}
