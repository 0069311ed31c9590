//! # trustcore-store
//!
//! Reference implementations of the collaborator traits from
//! `trustcore-core`. Everything here is process-local and lost on restart;
//! production deployments inject durable stores through the same traits.

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "memory")]
pub use memory::{
    MemoryRevocationStore, MemoryRoleStore, MemorySessionStore, MemoryStorageBackend,
    MemoryUserStore,
};
