//! Collaborator traits defined in `trustcore-core` and implemented by store
//! crates or the embedding application.

pub mod identity_provider;
pub mod revocation_store;
pub mod role_store;
pub mod session_store;
pub mod storage_backend;
pub mod user_store;

pub use identity_provider::IdentityProvider;
pub use revocation_store::RevocationStore;
pub use role_store::RoleStore;
pub use session_store::SessionStore;
pub use storage_backend::StorageBackend;
pub use user_store::UserStore;
