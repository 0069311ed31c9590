//! In-memory role store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use trustcore_core::result::AppResult;
use trustcore_core::traits::RoleStore;
use trustcore_entity::role::Role;

/// Role store ordered by role id.
#[derive(Debug, Clone, Default)]
pub struct MemoryRoleStore {
    roles: Arc<RwLock<BTreeMap<String, Role>>>,
}

impl MemoryRoleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn save(&self, role: &Role) -> AppResult<()> {
        self.roles.write().await.insert(role.id.clone(), role.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.roles.write().await.remove(id);
        Ok(())
    }

    async fn get(&self, id: &str) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Role>> {
        Ok(self.roles.read().await.values().cloned().collect())
    }

    async fn clear(&self) -> AppResult<()> {
        self.roles.write().await.clear();
        Ok(())
    }
}
