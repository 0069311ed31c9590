//! User entity and login/registration payloads.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// An authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: String,
    /// Email address used to log in.
    pub email: String,
    /// Display login name.
    pub username: String,
    /// Role ids assigned at registration.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Inactive users cannot authenticate.
    pub active: bool,
}

impl User {
    /// Check whether the user holds the given role id.
    pub fn has_role(&self, role_id: &str) -> bool {
        self.roles.iter().any(|r| r == role_id)
    }
}

/// A login attempt. Never persisted.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Email address.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

impl Credentials {
    /// Build credentials from borrowed parts.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Data required to register a new user.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct Registration {
    /// Email address.
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    /// Desired username.
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub username: String,
    /// Plain-text password, checked for strength before hashing.
    pub password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
