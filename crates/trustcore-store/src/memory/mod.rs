//! In-memory stores.

pub mod revocation;
pub mod role;
pub mod secret;
pub mod session;
pub mod user;

pub use revocation::MemoryRevocationStore;
pub use role::MemoryRoleStore;
pub use secret::MemoryStorageBackend;
pub use session::MemorySessionStore;
pub use user::MemoryUserStore;
