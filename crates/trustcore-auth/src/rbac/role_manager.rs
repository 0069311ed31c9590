//! Role CRUD over an injected [`RoleStore`].

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use trustcore_core::deadline::{DEFAULT_STORE_TIMEOUT, bounded};
use trustcore_core::error::AppError;
use trustcore_core::result::AppResult;
use trustcore_core::traits::RoleStore;
use trustcore_entity::role::Role;

/// Creates, updates, deletes and lists roles.
///
/// Roles are returned by value, so callers never hold a reference into
/// the store.
#[derive(Debug, Clone)]
pub struct RoleManager {
    store: Arc<dyn RoleStore>,
    store_timeout: Duration,
}

impl RoleManager {
    /// Creates a role manager over the given store.
    pub fn new(store: Arc<dyn RoleStore>) -> Self {
        Self {
            store,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Sets the upper bound for each store call.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Creates a role. Fails if the id is already taken.
    pub async fn create_role(&self, role: Role) -> AppResult<Role> {
        validate_role(&role)?;
        if self.find(&role.id).await?.is_some() {
            return Err(AppError::role_already_exists(format!(
                "Role '{}' already exists",
                role.id
            )));
        }
        self.save(&role).await?;
        info!(role_id = %role.id, permissions = role.permissions.len(), "Role created");
        Ok(role)
    }

    /// Replaces an existing role.
    pub async fn update_role(&self, role: Role) -> AppResult<Role> {
        validate_role(&role)?;
        if self.find(&role.id).await?.is_none() {
            return Err(AppError::role_not_found(format!("Role '{}' not found", role.id)));
        }
        self.save(&role).await?;
        info!(role_id = %role.id, "Role updated");
        Ok(role)
    }

    /// Deletes a role.
    pub async fn delete_role(&self, id: &str) -> AppResult<()> {
        require_id(id)?;
        if self.find(id).await?.is_none() {
            return Err(AppError::role_not_found(format!("Role '{id}' not found")));
        }
        bounded(self.store_timeout, "role_store.delete", self.store.delete(id)).await?;
        info!(role_id = %id, "Role deleted");
        Ok(())
    }

    /// Fetches a role.
    pub async fn get_role(&self, id: &str) -> AppResult<Role> {
        require_id(id)?;
        self.find(id)
            .await?
            .ok_or_else(|| AppError::role_not_found(format!("Role '{id}' not found")))
    }

    /// Lists every role, ordered by id.
    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles = bounded(self.store_timeout, "role_store.list", self.store.list()).await?;
        roles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(roles)
    }

    /// Replaces the whole role set.
    pub async fn sync(&self, roles: Vec<Role>) -> AppResult<()> {
        for role in &roles {
            validate_role(role)?;
        }
        bounded(self.store_timeout, "role_store.clear", self.store.clear()).await?;
        for role in &roles {
            self.save(role).await?;
        }
        info!(count = roles.len(), "Roles synchronised");
        Ok(())
    }

    pub(crate) async fn find(&self, id: &str) -> AppResult<Option<Role>> {
        bounded(self.store_timeout, "role_store.get", self.store.get(id)).await
    }

    async fn save(&self, role: &Role) -> AppResult<()> {
        bounded(self.store_timeout, "role_store.save", self.store.save(role)).await
    }
}

fn require_id(id: &str) -> AppResult<()> {
    if id.trim().is_empty() {
        return Err(AppError::invalid_role("Role id must not be empty"));
    }
    Ok(())
}

fn validate_role(role: &Role) -> AppResult<()> {
    require_id(&role.id)?;
    if role.name.trim().is_empty() {
        return Err(AppError::invalid_role(format!(
            "Role '{}' must have a name",
            role.id
        )));
    }
    Ok(())
}
