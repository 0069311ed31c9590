//! Two-stage authorization: role permissions with overrides, then
//! attribute policies that may veto a grant.

pub mod checker;
pub mod loader;
pub mod manager;
pub mod policy;
pub mod role_manager;

pub use checker::PermissionChecker;
pub use manager::{AccessRequest, RbacManager};
pub use policy::PolicyEnforcer;
pub use role_manager::RoleManager;
