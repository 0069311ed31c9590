//! Permission overrides, attribute policies and the request contexts they
//! are evaluated against.

pub mod condition;
pub mod context;
pub mod effect;
pub mod rule;

pub use condition::{Condition, ConditionSubject, TimeWindow};
pub use context::{DecisionReason, PermissionContext, PolicyContext, PolicyDecision};
pub use effect::Effect;
pub use rule::{PermissionOverride, Policy, PolicyRule};

/// The token that matches any resource or action.
pub const WILDCARD: &str = "*";

/// Match a resource or action pattern against a requested value.
///
/// A pattern matches when it is the wildcard or equal to the value.
pub fn pattern_matches(pattern: &str, value: &str) -> bool {
    pattern == WILDCARD || pattern == value
}
