//! # trustcore-auth
//!
//! Authentication and authorization for trustcore.
//!
//! ## Modules
//!
//! - `jwt`: bearer token issuance, validation, refresh and revocation
//! - `session`: server-side session lifecycle and expiry cleanup
//! - `password`: password strength policy
//! - `rbac`: roles, permission overrides, attribute policies
//! - `identity`: registry of external identity provider adapters
//! - `account`: login, registration and logout facade

pub mod account;
pub mod identity;
pub mod jwt;
pub mod password;
pub mod rbac;
pub mod session;

pub use account::{AuthManager, LoginResult};
pub use identity::IdentityRegistry;
pub use jwt::{TokenClaims, TokenManager};
pub use password::PasswordValidator;
pub use rbac::{AccessRequest, PermissionChecker, PolicyEnforcer, RbacManager, RoleManager};
pub use session::{SessionCleanup, SessionManager};
