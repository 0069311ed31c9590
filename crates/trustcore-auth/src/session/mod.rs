//! Server-side session lifecycle.

pub mod cleanup;
pub mod manager;

pub use cleanup::SessionCleanup;
pub use manager::SessionManager;
