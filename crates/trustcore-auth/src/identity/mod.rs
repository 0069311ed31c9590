//! External identity provider adapters.

pub mod registry;

pub use registry::IdentityRegistry;
