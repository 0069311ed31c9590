//! Login, registration and logout.

pub mod manager;

pub use manager::{AuthManager, LoginResult};
