//! Role, override and policy configuration.

use serde::{Deserialize, Serialize};

use trustcore_entity::policy::{Condition, Effect};

/// RBAC configuration loaded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RbacConfig {
    /// Outcome when no policy rule matches a request that passed role checks.
    #[serde(default = "default_true")]
    pub policy_fail_open: bool,
    /// Roles created at startup.
    #[serde(default = "default_roles")]
    pub roles: Vec<RoleConfig>,
    /// Permission overrides, evaluated in declared order.
    #[serde(default)]
    pub overrides: Vec<OverrideConfig>,
    /// Attribute policies.
    #[serde(default)]
    pub policies: Vec<PolicyConfig>,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            policy_fail_open: true,
            roles: default_roles(),
            overrides: Vec::new(),
            policies: Vec::new(),
        }
    }
}

/// A role and its permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Unique role id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: String,
    /// Granted `(resource, action)` patterns.
    #[serde(default)]
    pub permissions: Vec<PermissionConfig>,
}

/// A `(resource, action)` pattern pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionConfig {
    /// Resource pattern; `*` matches any resource.
    pub resource: String,
    /// Action pattern; `*` matches any action.
    pub action: String,
}

/// A role-scoped or global allow/deny exception.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideConfig {
    /// Restricts the override to one role. Empty applies to every role.
    #[serde(default)]
    pub role_id: Option<String>,
    /// Resource pattern.
    pub resource: String,
    /// Action pattern.
    pub action: String,
    /// Decision when the override matches.
    #[serde(default)]
    pub effect: Effect,
    /// Optional extra constraint.
    #[serde(default)]
    pub condition: Option<Condition>,
    /// Free-form note for logs.
    #[serde(default)]
    pub description: String,
}

/// A prioritised set of attribute rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Unique policy id.
    pub id: String,
    /// Optional description.
    #[serde(default)]
    pub description: String,
    /// Higher priorities are evaluated first.
    #[serde(default)]
    pub priority: i32,
    /// Rules in evaluation order.
    #[serde(default)]
    pub rules: Vec<PolicyRuleConfig>,
    /// Free-form labels.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A single policy rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRuleConfig {
    /// Resource pattern.
    pub resource: String,
    /// Action pattern.
    pub action: String,
    /// Decision when the rule matches.
    pub effect: Effect,
    /// Free-form note, echoed in decisions.
    #[serde(default)]
    pub description: String,
    /// All conditions must hold for the rule to match.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

fn default_true() -> bool {
    true
}

fn default_roles() -> Vec<RoleConfig> {
    vec![
        RoleConfig {
            id: "admin".to_string(),
            name: "Administrator".to_string(),
            description: String::new(),
            permissions: vec![PermissionConfig {
                resource: "*".to_string(),
                action: "*".to_string(),
            }],
        },
        RoleConfig {
            id: "user".to_string(),
            name: "User".to_string(),
            description: String::new(),
            permissions: vec![
                PermissionConfig {
                    resource: "mcp".to_string(),
                    action: "read".to_string(),
                },
                PermissionConfig {
                    resource: "mcp".to_string(),
                    action: "create".to_string(),
                },
            ],
        },
    ]
}
