//! Request contexts and policy decisions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::condition::ConditionSubject;
use super::effect::Effect;

/// Attributes available to override conditions during the role stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionContext {
    /// Requesting user.
    pub user_id: String,
    /// Roles collected so far for this request.
    pub roles: Vec<String>,
    /// Tenant the request is scoped to.
    pub tenant_id: Option<String>,
    /// Free-form request attributes.
    pub attributes: HashMap<String, String>,
    /// When the request was made.
    pub requested_at: Option<DateTime<Utc>>,
}

impl PermissionContext {
    /// Create a context for a user.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }
}

impl ConditionSubject for PermissionContext {
    fn roles(&self) -> &[String] {
        &self.roles
    }

    fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    fn evaluated_at(&self) -> DateTime<Utc> {
        self.requested_at.unwrap_or_else(Utc::now)
    }
}

/// Attributes a policy rule is evaluated against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyContext {
    /// Requesting user.
    pub user_id: String,
    /// Roles held by the user.
    pub roles: Vec<String>,
    /// Requested resource.
    pub resource: String,
    /// Requested action.
    pub action: String,
    /// Tenant the request is scoped to.
    pub tenant_id: Option<String>,
    /// Free-form request attributes.
    pub attributes: HashMap<String, String>,
    /// When the request was made.
    pub requested_at: DateTime<Utc>,
}

impl PolicyContext {
    /// Create a context for a request made now.
    pub fn new(
        user_id: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            roles: Vec::new(),
            resource: resource.into(),
            action: action.into(),
            tenant_id: None,
            attributes: HashMap::new(),
            requested_at: Utc::now(),
        }
    }

    /// Set the user's roles.
    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    /// Scope the request to a tenant.
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Add a request attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Pin the evaluation time.
    pub fn at(mut self, requested_at: DateTime<Utc>) -> Self {
        self.requested_at = requested_at;
        self
    }
}

impl ConditionSubject for PolicyContext {
    fn roles(&self) -> &[String] {
        &self.roles
    }

    fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    fn evaluated_at(&self) -> DateTime<Utc> {
        self.requested_at
    }
}

/// Why the policy stage reached its decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// An allow rule matched.
    AllowRuleMatched,
    /// A deny rule matched.
    DenyRuleMatched,
    /// No rule matched; the fail-open/fail-closed default applied.
    NoPolicyMatched,
}

impl DecisionReason {
    /// Reason for a matched rule with the given effect.
    pub fn for_effect(effect: Effect) -> Self {
        match effect {
            Effect::Allow => Self::AllowRuleMatched,
            Effect::Deny => Self::DenyRuleMatched,
        }
    }

    /// Return the reason as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllowRuleMatched => "allow_rule_matched",
            Self::DenyRuleMatched => "deny_rule_matched",
            Self::NoPolicyMatched => "no_policy_matched",
        }
    }
}

impl std::fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of the policy stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Policy whose rule decided, if any.
    pub policy_id: Option<String>,
    /// Description of the deciding rule.
    pub rule_description: Option<String>,
    /// Why the decision was reached.
    pub reason: DecisionReason,
}

impl PolicyDecision {
    /// Decision from a matched rule.
    pub fn matched(policy_id: &str, effect: Effect, rule_description: &str) -> Self {
        Self {
            allowed: effect.is_allow(),
            policy_id: Some(policy_id.to_string()),
            rule_description: (!rule_description.is_empty()).then(|| rule_description.to_string()),
            reason: DecisionReason::for_effect(effect),
        }
    }

    /// Decision when no rule matched.
    pub fn default_outcome(allowed: bool) -> Self {
        Self {
            allowed,
            policy_id: None,
            rule_description: None,
            reason: DecisionReason::NoPolicyMatched,
        }
    }
}
