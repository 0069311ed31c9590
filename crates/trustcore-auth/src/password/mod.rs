//! Password strength policy.

pub mod validator;

pub use validator::PasswordValidator;
