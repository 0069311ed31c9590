//! Role and permission entities.

use serde::{Deserialize, Serialize};

use crate::policy::pattern_matches;

/// A `(resource, action)` grant. Either side may be the `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    /// Resource pattern.
    pub resource: String,
    /// Action pattern.
    pub action: String,
}

impl Permission {
    /// Create a permission from resource and action patterns.
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
        }
    }

    /// Check whether this permission covers the requested pair.
    pub fn matches(&self, resource: &str, action: &str) -> bool {
        pattern_matches(&self.resource, resource) && pattern_matches(&self.action, action)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

/// A named permission bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique role id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Ordered permission list.
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Role {
    /// Create a role without a description.
    pub fn new(id: impl Into<String>, name: impl Into<String>, permissions: Vec<Permission>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            permissions,
        }
    }

    /// Check whether any permission on the role covers the requested pair.
    pub fn grants(&self, resource: &str, action: &str) -> bool {
        self.permissions.iter().any(|p| p.matches(resource, action))
    }
}
