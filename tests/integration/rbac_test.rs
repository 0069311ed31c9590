//! Integration tests for the two-stage authorization pipeline.

mod helpers;

use std::sync::Arc;

use trustcore_auth::{AccessRequest, RbacManager};
use trustcore_core::config::{PolicyConfig, PolicyRuleConfig, RbacConfig};
use trustcore_core::error::ErrorKind;
use trustcore_entity::policy::{
    Condition, Effect, PermissionOverride, Policy, PolicyRule, TimeWindow,
};
use trustcore_entity::role::{Permission, Role};
use trustcore_store::MemoryRoleStore;

async fn admin_only() -> RbacManager {
    let rbac = RbacManager::new(Arc::new(MemoryRoleStore::new()), true);
    rbac.create_role(Role::new("admin", "Admin", vec![Permission::new("*", "*")]))
        .await
        .unwrap();
    rbac.assign_role("u1", "admin").await.unwrap();
    rbac
}

#[tokio::test]
async fn test_admin_wildcard_grants_everything() {
    let rbac = admin_only().await;
    assert!(rbac.has_permission("u1", "mcp", "delete").await);
    assert!(rbac.has_permission("u1", "billing", "export").await);
}

#[tokio::test]
async fn test_policy_deny_overrides_role_grant() {
    let rbac = admin_only().await;
    rbac.policies()
        .register(Policy::new(
            "protect-mcp",
            10,
            vec![PolicyRule::new("mcp", "delete", Effect::Deny)],
        ))
        .unwrap();

    assert!(!rbac.has_permission("u1", "mcp", "delete").await);
    assert!(rbac.has_permission("u1", "mcp", "read").await);
}

#[tokio::test]
async fn test_user_without_roles_never_touches_store() {
    let store = Arc::new(helpers::CountingRoleStore::default());
    let rbac = RbacManager::new(store.clone(), true);

    assert!(!rbac.has_permission("unknown_user", "mcp", "read").await);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_policy_cannot_grant_what_roles_deny() {
    let store = Arc::new(helpers::CountingRoleStore::default());
    let rbac = RbacManager::new(store.clone(), true);
    rbac.create_role(Role::new("viewer", "Viewer", vec![Permission::new("docs", "read")]))
        .await
        .unwrap();
    rbac.assign_role("u1", "viewer").await.unwrap();
    rbac.policies()
        .register(Policy::new(
            "allow-all",
            100,
            vec![PolicyRule::new("*", "*", Effect::Allow)],
        ))
        .unwrap();

    assert!(!rbac.has_permission("u1", "docs", "write").await);
    assert!(rbac.has_permission("u1", "docs", "read").await);
}

#[tokio::test]
async fn test_first_granting_role_stops_role_scan() {
    let store = Arc::new(helpers::CountingRoleStore::default());
    let rbac = RbacManager::new(store.clone(), true);
    rbac.create_role(Role::new("a", "A", vec![Permission::new("docs", "read")]))
        .await
        .unwrap();
    rbac.create_role(Role::new("b", "B", vec![Permission::new("docs", "read")]))
        .await
        .unwrap();
    rbac.assign_role("u1", "a").await.unwrap();
    rbac.assign_role("u1", "b").await.unwrap();

    let before = store.calls();
    assert!(rbac.has_permission("u1", "docs", "read").await);
    assert_eq!(store.calls() - before, 1);
}

#[tokio::test]
async fn test_fail_closed_denies_unmatched_requests() {
    let rbac = RbacManager::new(Arc::new(MemoryRoleStore::new()), false);
    rbac.create_role(Role::new("admin", "Admin", vec![Permission::new("*", "*")]))
        .await
        .unwrap();
    rbac.assign_role("u1", "admin").await.unwrap();
    rbac.policies()
        .register(Policy::new(
            "reports",
            1,
            vec![PolicyRule::new("reports", "*", Effect::Allow)],
        ))
        .unwrap();

    assert!(rbac.has_permission("u1", "reports", "read").await);
    assert!(!rbac.has_permission("u1", "mcp", "read").await);
}

#[tokio::test]
async fn test_conditions_flow_from_request() {
    let rbac = admin_only().await;
    rbac.policies()
        .register(Policy::new(
            "tenant-fence",
            5,
            vec![
                PolicyRule::new("orders", "*", Effect::Allow)
                    .when(Condition::tenant_in(["acme"]))
                    .when(Condition::attribute_equals("region", ["eu", "us"])),
                PolicyRule::new("orders", "*", Effect::Deny).described("outside tenant fence"),
            ],
        ))
        .unwrap();

    let allowed = AccessRequest::new("u1", "orders", "read")
        .with_tenant("acme")
        .with_attribute("region", "eu");
    let wrong_region = AccessRequest::new("u1", "orders", "read")
        .with_tenant("acme")
        .with_attribute("region", "apac");

    assert!(rbac.check(&allowed).await);
    assert!(!rbac.check(&wrong_region).await);
    assert!(!rbac.has_permission("u1", "orders", "read").await);

    let err = rbac.require_permission(&wrong_region).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn test_overrides_apply_before_role_permissions() {
    let rbac = admin_only().await;
    rbac.checker().add_override(
        PermissionOverride::new("secrets", "*", Effect::Deny)
            .for_role("admin")
            .when(Condition::TimeWindow(TimeWindow::utc(0, 24))),
    );

    assert!(!rbac.has_permission("u1", "secrets", "read").await);
    assert!(rbac.has_permission("u1", "mcp", "read").await);
}

#[tokio::test]
async fn test_policies_loaded_from_config() {
    let mut config = RbacConfig::default();
    config.policies.push(PolicyConfig {
        id: "no-delete".to_string(),
        description: String::new(),
        priority: 10,
        rules: vec![PolicyRuleConfig {
            resource: "mcp".to_string(),
            action: "delete".to_string(),
            effect: Effect::Deny,
            description: String::new(),
            conditions: Vec::new(),
        }],
        tags: Vec::new(),
    });

    let rbac = RbacManager::from_config(&config, Arc::new(MemoryRoleStore::new()))
        .await
        .unwrap();
    rbac.assign_role("root", "admin").await.unwrap();

    assert!(!rbac.has_permission("root", "mcp", "delete").await);
    assert!(rbac.has_permission("root", "mcp", "update").await);
}

#[tokio::test]
async fn test_role_snapshots_are_copies() {
    let rbac = admin_only().await;
    let mut snapshot = rbac.get_role("admin").await.unwrap();
    snapshot.permissions.clear();

    assert!(rbac.has_permission("u1", "mcp", "read").await);
    assert_eq!(rbac.list_roles().await.unwrap()[0].permissions.len(), 1);
}
