//! Composed authorization: role stage, then policy veto.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use trustcore_core::error::{AppError, ErrorKind};
use trustcore_core::result::AppResult;
use trustcore_core::traits::RoleStore;
use trustcore_entity::policy::{PermissionContext, PolicyContext};
use trustcore_entity::role::Role;

use super::checker::PermissionChecker;
use super::policy::PolicyEnforcer;
use super::role_manager::RoleManager;

/// A fully described authorization request.
#[derive(Debug, Clone, Default)]
pub struct AccessRequest {
    /// Requesting user.
    pub user_id: String,
    /// Requested resource.
    pub resource: String,
    /// Requested action.
    pub action: String,
    /// Tenant the request is scoped to.
    pub tenant_id: Option<String>,
    /// Free-form request attributes.
    pub attributes: HashMap<String, String>,
}

impl AccessRequest {
    /// Creates a request without tenant or attributes.
    pub fn new(
        user_id: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            resource: resource.into(),
            action: action.into(),
            ..Self::default()
        }
    }

    /// Scopes the request to a tenant.
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Adds a request attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Role assignment plus the two authorization stages.
///
/// A request is allowed only when one of the user's roles grants it and
/// the policy stage does not deny it. Policies never grant on their own.
#[derive(Debug)]
pub struct RbacManager {
    roles: RoleManager,
    checker: PermissionChecker,
    policies: PolicyEnforcer,
    assignments: RwLock<HashMap<String, Vec<String>>>,
    cancel: CancellationToken,
}

impl RbacManager {
    /// Creates a manager over a role store.
    pub fn new(store: Arc<dyn RoleStore>, policy_fail_open: bool) -> Self {
        Self::with_role_manager(RoleManager::new(store), policy_fail_open)
    }

    /// Creates a manager over a configured role manager.
    pub fn with_role_manager(roles: RoleManager, policy_fail_open: bool) -> Self {
        let cancel = CancellationToken::new();
        Self {
            roles,
            checker: PermissionChecker::new(),
            policies: PolicyEnforcer::with_cancellation(policy_fail_open, cancel.child_token()),
            assignments: RwLock::new(HashMap::new()),
            cancel,
        }
    }

    /// Role CRUD.
    pub fn roles(&self) -> &RoleManager {
        &self.roles
    }

    /// Permission overrides.
    pub fn checker(&self) -> &PermissionChecker {
        &self.checker
    }

    /// Attribute policies.
    pub fn policies(&self) -> &PolicyEnforcer {
        &self.policies
    }

    /// Creates a role.
    pub async fn create_role(&self, role: Role) -> AppResult<Role> {
        self.roles.create_role(role).await
    }

    /// Fetches a role.
    pub async fn get_role(&self, id: &str) -> AppResult<Role> {
        self.roles.get_role(id).await
    }

    /// Lists roles ordered by id.
    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.roles.list_roles().await
    }

    /// Assigns an existing role to a user.
    pub async fn assign_role(&self, user_id: &str, role_id: &str) -> AppResult<()> {
        if let Err(e) = self.roles.get_role(role_id).await {
            warn!(user_id, role_id, error = %e, "Failed to assign role");
            return Err(match e.kind {
                ErrorKind::Timeout => e,
                _ => AppError::role_not_found(format!("Role '{role_id}' not found")),
            });
        }

        let mut assignments = self.assignments.write();
        let held = assignments.entry(user_id.to_string()).or_default();
        if held.iter().any(|r| r == role_id) {
            return Err(AppError::user_already_has_role(format!(
                "User '{user_id}' already has role '{role_id}'"
            )));
        }
        held.push(role_id.to_string());
        info!(user_id, role_id, "Role assigned");
        Ok(())
    }

    /// Removes a role from a user. Removing an unassigned role is a no-op.
    pub fn revoke_role(&self, user_id: &str, role_id: &str) {
        let mut assignments = self.assignments.write();
        if let Some(held) = assignments.get_mut(user_id) {
            held.retain(|r| r != role_id);
            if held.is_empty() {
                assignments.remove(user_id);
            }
            info!(user_id, role_id, "Role revoked");
        }
    }

    /// Role ids assigned to a user, in assignment order.
    pub fn get_user_roles(&self, user_id: &str) -> Vec<String> {
        self.assignments
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Checks a `(resource, action)` pair for a user.
    pub async fn has_permission(&self, user_id: &str, resource: &str, action: &str) -> bool {
        self.check(&AccessRequest::new(user_id, resource, action))
            .await
    }

    /// Like [`has_permission`](Self::has_permission) but fails with
    /// `PermissionDenied`.
    pub async fn require_permission(&self, request: &AccessRequest) -> AppResult<()> {
        if self.check(request).await {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!(
                "User '{}' may not {} on '{}'",
                request.user_id, request.action, request.resource
            )))
        }
    }

    /// Runs both authorization stages for a request.
    pub async fn check(&self, request: &AccessRequest) -> bool {
        if self.cancel.is_cancelled() {
            debug!(user_id = %request.user_id, "Authorization refused after shutdown");
            return false;
        }

        let role_ids = self.get_user_roles(&request.user_id);
        if role_ids.is_empty() {
            debug!(user_id = %request.user_id, "User has no roles");
            return false;
        }

        let requested_at = Utc::now();
        let context = PermissionContext {
            user_id: request.user_id.clone(),
            roles: role_ids.clone(),
            tenant_id: request.tenant_id.clone(),
            attributes: request.attributes.clone(),
            requested_at: Some(requested_at),
        };

        let mut granted_by = None;
        for role_id in &role_ids {
            let role = match self.roles.find(role_id).await {
                Ok(Some(role)) => role,
                Ok(None) => {
                    debug!(user_id = %request.user_id, role_id, "Assigned role no longer exists");
                    continue;
                }
                Err(e) => {
                    error!(role_id, error = %e, "Role lookup failed");
                    continue;
                }
            };

            if self
                .checker
                .check(&role, &request.resource, &request.action, &context)
            {
                granted_by = Some(role.id);
                break;
            }
        }

        let Some(role_id) = granted_by else {
            debug!(
                user_id = %request.user_id,
                resource = %request.resource,
                action = %request.action,
                "No role grants permission"
            );
            return false;
        };

        let policy_context = PolicyContext {
            user_id: request.user_id.clone(),
            roles: role_ids,
            resource: request.resource.clone(),
            action: request.action.clone(),
            tenant_id: request.tenant_id.clone(),
            attributes: request.attributes.clone(),
            requested_at,
        };

        match self.policies.evaluate(&policy_context) {
            Ok(decision) => {
                debug!(
                    user_id = %request.user_id,
                    resource = %request.resource,
                    action = %request.action,
                    role_id = %role_id,
                    allowed = decision.allowed,
                    reason = %decision.reason,
                    "Authorization decided"
                );
                decision.allowed
            }
            Err(e) => {
                warn!(user_id = %request.user_id, error = %e, "Policy evaluation failed");
                false
            }
        }
    }

    /// Stops policy evaluation. Every later check is denied.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        info!("RBAC manager shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustcore_entity::policy::{Condition, Effect, PermissionOverride, Policy, PolicyRule};
    use trustcore_entity::role::Permission;
    use trustcore_store::MemoryRoleStore;

    async fn manager() -> RbacManager {
        let rbac = RbacManager::new(Arc::new(MemoryRoleStore::new()), true);
        rbac.create_role(Role::new("admin", "Admin", vec![Permission::new("*", "*")]))
            .await
            .unwrap();
        rbac.create_role(Role::new("user", "User", vec![Permission::new("mcp", "read")]))
            .await
            .unwrap();
        rbac
    }

    #[tokio::test]
    async fn test_admin_wildcard() {
        let rbac = manager().await;
        rbac.assign_role("u1", "admin").await.unwrap();
        assert!(rbac.has_permission("u1", "mcp", "delete").await);
    }

    #[tokio::test]
    async fn test_policy_vetoes_grant() {
        let rbac = manager().await;
        rbac.assign_role("u1", "admin").await.unwrap();
        rbac.policies()
            .register(Policy::new(
                "no-delete",
                10,
                vec![PolicyRule::new("mcp", "delete", Effect::Deny)],
            ))
            .unwrap();
        assert!(!rbac.has_permission("u1", "mcp", "delete").await);
        assert!(rbac.has_permission("u1", "mcp", "read").await);
    }

    #[tokio::test]
    async fn test_policy_never_grants() {
        let rbac = manager().await;
        rbac.assign_role("u1", "user").await.unwrap();
        rbac.policies()
            .register(Policy::new("open", 1, vec![PolicyRule::new("*", "*", Effect::Allow)]))
            .unwrap();
        assert!(!rbac.has_permission("u1", "mcp", "delete").await);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let rbac = manager().await;
        assert!(!rbac.has_permission("ghost", "mcp", "read").await);
    }

    #[tokio::test]
    async fn test_override_with_tenant() {
        let rbac = manager().await;
        rbac.assign_role("u1", "user").await.unwrap();
        rbac.checker().add_override(
            PermissionOverride::new("mcp", "create", Effect::Allow)
                .for_role("user")
                .when(Condition::tenant_in(["acme"])),
        );

        assert!(!rbac.has_permission("u1", "mcp", "create").await);
        assert!(
            rbac.check(&AccessRequest::new("u1", "mcp", "create").with_tenant("acme"))
                .await
        );
    }

    #[tokio::test]
    async fn test_assignments() {
        let rbac = manager().await;
        rbac.assign_role("u1", "user").await.unwrap();
        assert_eq!(
            rbac.assign_role("u1", "user").await.unwrap_err().kind,
            ErrorKind::UserAlreadyHasRole
        );
        assert_eq!(
            rbac.assign_role("u1", "missing").await.unwrap_err().kind,
            ErrorKind::RoleNotFound
        );
        rbac.assign_role("u1", "admin").await.unwrap();
        assert_eq!(rbac.get_user_roles("u1"), vec!["user", "admin"]);

        rbac.revoke_role("u1", "admin");
        rbac.revoke_role("u1", "admin");
        assert_eq!(rbac.get_user_roles("u1"), vec!["user"]);
        assert!(rbac.get_user_roles("nobody").is_empty());
    }

    #[tokio::test]
    async fn test_require_permission() {
        let rbac = manager().await;
        rbac.assign_role("u1", "user").await.unwrap();
        rbac.require_permission(&AccessRequest::new("u1", "mcp", "read"))
            .await
            .unwrap();
        let err = rbac
            .require_permission(&AccessRequest::new("u1", "mcp", "delete"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_shutdown_denies() {
        let rbac = manager().await;
        rbac.assign_role("u1", "admin").await.unwrap();
        rbac.shutdown();
        assert!(!rbac.has_permission("u1", "mcp", "read").await);
    }
}
