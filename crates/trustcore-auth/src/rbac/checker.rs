//! Role-stage permission checks with ordered overrides.

use parking_lot::RwLock;
use tracing::debug;

use trustcore_entity::policy::{Effect, PermissionContext, PermissionOverride};
use trustcore_entity::role::Role;

/// Decides whether a role grants a `(resource, action)` pair.
///
/// Overrides are scanned in registration order and the first one that
/// applies decides. Otherwise the role's own permissions decide.
#[derive(Debug, Default)]
pub struct PermissionChecker {
    overrides: RwLock<Vec<PermissionOverride>>,
}

impl PermissionChecker {
    /// Creates a checker with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an override.
    pub fn add_override(&self, rule: PermissionOverride) {
        debug!(
            role_id = rule.role_id.as_deref().unwrap_or("*"),
            resource = %rule.resource,
            action = %rule.action,
            effect = %rule.effect,
            "Permission override registered"
        );
        self.overrides.write().push(rule);
    }

    /// Removes every override.
    pub fn clear_overrides(&self) {
        self.overrides.write().clear();
    }

    /// Copy of the registered overrides, in evaluation order.
    pub fn overrides(&self) -> Vec<PermissionOverride> {
        self.overrides.read().clone()
    }

    /// Checks a single role.
    ///
    /// The role's id is added to the context's roles before overrides are
    /// evaluated.
    pub fn check(
        &self,
        role: &Role,
        resource: &str,
        action: &str,
        context: &PermissionContext,
    ) -> bool {
        let mut context = context.clone();
        if !context.roles.iter().any(|r| r == &role.id) {
            context.roles.push(role.id.clone());
        }

        let overrides = self.overrides.read();
        if let Some(rule) = overrides
            .iter()
            .find(|rule| rule.applies(&role.id, resource, action, &context))
        {
            debug!(
                role_id = %role.id,
                resource,
                action,
                effect = %rule.effect,
                "Permission override matched"
            );
            return rule.effect == Effect::Allow;
        }

        role.grants(resource, action)
    }
}
