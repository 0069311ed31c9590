//! User persistence trait.

use async_trait::async_trait;
use trustcore_entity::user::User;

use crate::result::AppResult;

/// Persistence for user records and their password hashes.
///
/// Lookups return `None` for unknown users; managers map that to the
/// appropriate domain error.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a user by email address.
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find a user by id.
    async fn get_by_id(&self, id: &str) -> AppResult<Option<User>>;

    /// Insert a new user together with its password hash.
    async fn create(&self, user: &User, password_hash: &str) -> AppResult<()>;

    /// Replace an existing user record.
    async fn update(&self, user: &User) -> AppResult<()>;

    /// Fetch the stored password hash for a user.
    async fn password_hash(&self, user_id: &str) -> AppResult<Option<String>>;
}
