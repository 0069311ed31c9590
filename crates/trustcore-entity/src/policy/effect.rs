//! Allow/deny outcome attached to overrides and policy rules.

use serde::{Deserialize, Serialize};

/// Decision carried by a permission override or a policy rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Grant access.
    Allow,
    /// Refuse access.
    Deny,
}

impl Effect {
    /// Returns `true` for [`Effect::Allow`].
    pub fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl Default for Effect {
    fn default() -> Self {
        Self::Allow
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::Allow => write!(f, "allow"),
            Effect::Deny => write!(f, "deny"),
        }
    }
}
