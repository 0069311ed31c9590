//! Override and policy rule entities.

use serde::{Deserialize, Serialize};

use super::condition::{Condition, ConditionSubject};
use super::effect::Effect;
use super::pattern_matches;

/// A role-scoped or global allow/deny exception, evaluated before role
/// permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverride {
    /// Applies only to this role when set.
    #[serde(default)]
    pub role_id: Option<String>,
    /// Resource pattern.
    pub resource: String,
    /// Action pattern.
    pub action: String,
    /// Decision when the override applies.
    pub effect: Effect,
    /// Optional extra constraint.
    #[serde(default)]
    pub condition: Option<Condition>,
    /// Free-form note.
    #[serde(default)]
    pub description: String,
}

impl PermissionOverride {
    /// Create an unconditional global override.
    pub fn new(resource: impl Into<String>, action: impl Into<String>, effect: Effect) -> Self {
        Self {
            role_id: None,
            resource: resource.into(),
            action: action.into(),
            effect,
            condition: None,
            description: String::new(),
        }
    }

    /// Restrict the override to one role.
    pub fn for_role(mut self, role_id: impl Into<String>) -> Self {
        self.role_id = Some(role_id.into());
        self
    }

    /// Attach a condition.
    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Check whether the override applies to `role_id` for the request.
    pub fn applies<S: ConditionSubject + ?Sized>(
        &self,
        role_id: &str,
        resource: &str,
        action: &str,
        subject: &S,
    ) -> bool {
        if let Some(scope) = self.role_id.as_deref() {
            if !scope.is_empty() && scope != role_id {
                return false;
            }
        }
        if !pattern_matches(&self.resource, resource) || !pattern_matches(&self.action, action) {
            return false;
        }
        self.condition
            .as_ref()
            .is_none_or(|condition| condition.evaluate(subject))
    }
}

/// A single rule inside a [`Policy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Resource pattern.
    pub resource: String,
    /// Action pattern.
    pub action: String,
    /// Decision when the rule matches.
    pub effect: Effect,
    /// Free-form note echoed in decisions.
    #[serde(default)]
    pub description: String,
    /// Every condition must hold.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl PolicyRule {
    /// Create an unconditional rule.
    pub fn new(resource: impl Into<String>, action: impl Into<String>, effect: Effect) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
            effect,
            description: String::new(),
            conditions: Vec::new(),
        }
    }

    /// Set the description.
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a condition.
    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Check whether the rule matches the request.
    pub fn matches<S: ConditionSubject + ?Sized>(
        &self,
        resource: &str,
        action: &str,
        subject: &S,
    ) -> bool {
        pattern_matches(&self.resource, resource)
            && pattern_matches(&self.action, action)
            && self.conditions.iter().all(|c| c.evaluate(subject))
    }
}

/// A prioritised, ordered set of attribute rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Unique policy id.
    pub id: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Higher priorities are evaluated first.
    #[serde(default)]
    pub priority: i32,
    /// Rules in evaluation order.
    pub rules: Vec<PolicyRule>,
    /// Free-form labels.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Policy {
    /// Create a policy with the given rules.
    pub fn new(id: impl Into<String>, priority: i32, rules: Vec<PolicyRule>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            priority,
            rules,
            tags: Vec::new(),
        }
    }
}
