//! Role persistence trait.

use async_trait::async_trait;
use trustcore_entity::role::Role;

use crate::result::AppResult;

/// Persistence for role definitions.
#[async_trait]
pub trait RoleStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert or replace a role.
    async fn save(&self, role: &Role) -> AppResult<()>;

    /// Remove a role by id.
    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Find a role by id.
    async fn get(&self, id: &str) -> AppResult<Option<Role>>;

    /// All roles, ordered by id.
    async fn list(&self) -> AppResult<Vec<Role>>;

    /// Remove every role.
    async fn clear(&self) -> AppResult<()>;
}
