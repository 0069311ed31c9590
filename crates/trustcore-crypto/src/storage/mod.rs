//! Encrypt-at-rest key/value storage.

pub mod secure;

pub use secure::SecureStorage;
