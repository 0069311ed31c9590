//! Builds roles, overrides and policies from [`RbacConfig`].

use std::sync::Arc;

use tracing::{info, warn};

use trustcore_core::config::{OverrideConfig, PolicyConfig, RbacConfig, RoleConfig};
use trustcore_core::result::AppResult;
use trustcore_core::traits::RoleStore;
use trustcore_entity::policy::{PermissionOverride, Policy, PolicyRule};
use trustcore_entity::role::{Permission, Role};

use super::manager::RbacManager;
use super::role_manager::RoleManager;

impl RbacManager {
    /// Creates a manager and loads every configured role, override and
    /// policy. Invalid entries are logged and skipped.
    pub async fn from_config(config: &RbacConfig, store: Arc<dyn RoleStore>) -> AppResult<Self> {
        Self::from_config_with(config, RoleManager::new(store)).await
    }

    /// Like [`from_config`](Self::from_config) with a preconfigured role manager.
    pub async fn from_config_with(config: &RbacConfig, roles: RoleManager) -> AppResult<Self> {
        let rbac = Self::with_role_manager(roles, config.policy_fail_open);
        load(&rbac, config).await?;
        Ok(rbac)
    }
}

async fn load(rbac: &RbacManager, config: &RbacConfig) -> AppResult<()> {
    let mut roles = Vec::with_capacity(config.roles.len());
    for entry in &config.roles {
        match role_from(entry) {
            Some(role) if roles.iter().any(|r: &Role| r.id == role.id) => {
                warn!(role_id = %role.id, "Skipping duplicate role in configuration");
            }
            Some(role) => roles.push(role),
            None => warn!(role_id = %entry.id, "Skipping role without id or name"),
        }
    }
    let role_count = roles.len();
    rbac.roles().sync(roles).await?;

    let mut override_count = 0;
    for entry in &config.overrides {
        match override_from(entry) {
            Some(rule) => {
                rbac.checker().add_override(rule);
                override_count += 1;
            }
            None => warn!(
                resource = %entry.resource,
                action = %entry.action,
                "Skipping override without resource or action"
            ),
        }
    }

    let mut policy_count = 0;
    for entry in &config.policies {
        match rbac.policies().register(policy_from(entry)) {
            Ok(()) => policy_count += 1,
            Err(e) => warn!(policy_id = %entry.id, error = %e, "Skipping invalid policy"),
        }
    }

    info!(
        roles = role_count,
        overrides = override_count,
        policies = policy_count,
        fail_open = config.policy_fail_open,
        "RBAC configuration loaded"
    );
    Ok(())
}

fn role_from(entry: &RoleConfig) -> Option<Role> {
    if entry.id.trim().is_empty() || entry.name.trim().is_empty() {
        return None;
    }
    let permissions = entry
        .permissions
        .iter()
        .filter(|p| !p.resource.is_empty() && !p.action.is_empty())
        .map(|p| Permission::new(&p.resource, &p.action))
        .collect();
    let mut role = Role::new(&entry.id, &entry.name, permissions);
    role.description = entry.description.clone();
    Some(role)
}

fn override_from(entry: &OverrideConfig) -> Option<PermissionOverride> {
    if entry.resource.is_empty() || entry.action.is_empty() {
        return None;
    }
    Some(PermissionOverride {
        role_id: entry.role_id.clone().filter(|r| !r.is_empty()),
        resource: entry.resource.clone(),
        action: entry.action.clone(),
        effect: entry.effect,
        condition: entry.condition.clone(),
        description: entry.description.clone(),
    })
}

fn policy_from(entry: &PolicyConfig) -> Policy {
    let rules = entry
        .rules
        .iter()
        .map(|r| PolicyRule {
            resource: r.resource.clone(),
            action: r.action.clone(),
            effect: r.effect,
            description: r.description.clone(),
            conditions: r.conditions.clone(),
        })
        .collect();
    Policy {
        id: entry.id.clone(),
        description: entry.description.clone(),
        priority: entry.priority,
        rules,
        tags: entry.tags.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustcore_core::config::{PermissionConfig, PolicyRuleConfig};
    use trustcore_entity::policy::{Condition, Effect};
    use trustcore_store::MemoryRoleStore;

    #[tokio::test]
    async fn test_default_config() {
        let rbac = RbacManager::from_config(&RbacConfig::default(), Arc::new(MemoryRoleStore::new()))
            .await
            .unwrap();
        assert_eq!(rbac.list_roles().await.unwrap().len(), 2);

        rbac.assign_role("u1", "user").await.unwrap();
        assert!(rbac.has_permission("u1", "mcp", "read").await);
        assert!(rbac.has_permission("u1", "mcp", "create").await);
        assert!(!rbac.has_permission("u1", "mcp", "delete").await);
    }

    #[tokio::test]
    async fn test_invalid_entries_skipped() {
        let config = RbacConfig {
            policy_fail_open: true,
            roles: vec![
                RoleConfig {
                    id: "ops".to_string(),
                    name: "Ops".to_string(),
                    description: String::new(),
                    permissions: vec![PermissionConfig {
                        resource: "servers".to_string(),
                        action: "*".to_string(),
                    }],
                },
                RoleConfig {
                    id: String::new(),
                    name: "Nameless".to_string(),
                    description: String::new(),
                    permissions: Vec::new(),
                },
            ],
            overrides: vec![OverrideConfig {
                role_id: Some("ops".to_string()),
                resource: "servers".to_string(),
                action: "reboot".to_string(),
                effect: Effect::Deny,
                condition: Some(Condition::tenant_in(["prod"])),
                description: "no prod reboots".to_string(),
            }],
            policies: vec![
                PolicyConfig {
                    id: "empty".to_string(),
                    description: String::new(),
                    priority: 1,
                    rules: Vec::new(),
                    tags: Vec::new(),
                },
                PolicyConfig {
                    id: "audit".to_string(),
                    description: String::new(),
                    priority: 5,
                    rules: vec![PolicyRuleConfig {
                        resource: "servers".to_string(),
                        action: "delete".to_string(),
                        effect: Effect::Deny,
                        description: String::new(),
                        conditions: Vec::new(),
                    }],
                    tags: vec!["audit".to_string()],
                },
            ],
        };

        let rbac = RbacManager::from_config(&config, Arc::new(MemoryRoleStore::new()))
            .await
            .unwrap();
        assert_eq!(rbac.list_roles().await.unwrap().len(), 1);
        assert_eq!(rbac.checker().overrides().len(), 1);
        assert_eq!(rbac.policies().list().len(), 1);

        rbac.assign_role("u1", "ops").await.unwrap();
        assert!(rbac.has_permission("u1", "servers", "reboot").await);
        assert!(!rbac.has_permission("u1", "servers", "delete").await);
        assert!(
            !rbac
                .check(&crate::rbac::AccessRequest::new("u1", "servers", "reboot").with_tenant("prod"))
                .await
        );
    }
}
