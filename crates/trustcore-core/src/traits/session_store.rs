//! Session persistence trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use trustcore_entity::session::Session;
use uuid::Uuid;

use crate::result::AppResult;

/// Persistence for server-side sessions.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new session.
    async fn create(&self, session: &Session) -> AppResult<()>;

    /// Find a session by id.
    async fn get(&self, id: Uuid) -> AppResult<Option<Session>>;

    /// All stored sessions for a user, active or not.
    async fn get_by_user_id(&self, user_id: &str) -> AppResult<Vec<Session>>;

    /// Replace an existing session.
    async fn update(&self, session: &Session) -> AppResult<()>;

    /// Remove a session. Removing an unknown id is not an error.
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Remove every session for a user.
    async fn delete_by_user_id(&self, user_id: &str) -> AppResult<()>;

    /// Remove sessions that expired at or before `now`. Returns the count.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
