//! Priority-ordered attribute policies that confirm or veto a role grant.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use trustcore_core::error::AppError;
use trustcore_core::result::AppResult;
use trustcore_entity::policy::{Policy, PolicyContext, PolicyDecision};

/// Evaluates registered policies against a request context.
///
/// Policies are ordered by priority (highest first) and then by id. The
/// first rule whose patterns and conditions match decides. When nothing
/// matches, the configured default applies.
#[derive(Debug)]
pub struct PolicyEnforcer {
    policies: RwLock<HashMap<String, Policy>>,
    fail_open: bool,
    cancel: CancellationToken,
}

impl PolicyEnforcer {
    /// Creates an enforcer with the given no-match outcome.
    pub fn new(fail_open: bool) -> Self {
        Self::with_cancellation(fail_open, CancellationToken::new())
    }

    /// Creates an enforcer that refuses to evaluate once `cancel` fires.
    pub fn with_cancellation(fail_open: bool, cancel: CancellationToken) -> Self {
        Self {
            policies: RwLock::new(HashMap::new()),
            fail_open,
            cancel,
        }
    }

    /// The outcome used when no rule matches.
    pub fn fail_open(&self) -> bool {
        self.fail_open
    }

    /// Registers a policy, replacing any policy with the same id.
    pub fn register(&self, policy: Policy) -> AppResult<()> {
        if policy.id.trim().is_empty() {
            return Err(AppError::invalid_policy("Policy id must not be empty"));
        }
        if policy.rules.is_empty() {
            return Err(AppError::invalid_policy(format!(
                "Policy '{}' has no rules",
                policy.id
            )));
        }

        info!(
            policy_id = %policy.id,
            priority = policy.priority,
            rules = policy.rules.len(),
            "Policy registered"
        );
        self.policies.write().insert(policy.id.clone(), policy);
        Ok(())
    }

    /// Removes a policy. Returns whether it was present.
    pub fn remove(&self, policy_id: &str) -> bool {
        let removed = self.policies.write().remove(policy_id).is_some();
        if removed {
            info!(policy_id, "Policy removed");
        }
        removed
    }

    /// Removes every policy.
    pub fn clear(&self) {
        self.policies.write().clear();
    }

    /// Copies of the registered policies in evaluation order.
    pub fn list(&self) -> Vec<Policy> {
        let mut policies: Vec<Policy> = self.policies.read().values().cloned().collect();
        policies.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        policies
    }

    /// Evaluates the request.
    pub fn evaluate(&self, context: &PolicyContext) -> AppResult<PolicyDecision> {
        if self.cancel.is_cancelled() {
            return Err(AppError::cancelled("Policy evaluation cancelled"));
        }

        for policy in self.list() {
            if let Some(rule) = policy
                .rules
                .iter()
                .find(|rule| rule.matches(&context.resource, &context.action, context))
            {
                let decision = PolicyDecision::matched(&policy.id, rule.effect, &rule.description);
                debug!(
                    user_id = %context.user_id,
                    resource = %context.resource,
                    action = %context.action,
                    policy_id = %policy.id,
                    reason = %decision.reason,
                    "Policy rule matched"
                );
                return Ok(decision);
            }
        }

        Ok(PolicyDecision::default_outcome(self.fail_open))
    }
}
