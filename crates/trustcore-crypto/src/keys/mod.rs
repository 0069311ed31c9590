//! Symmetric key and RSA keypair management.

pub mod decode;
pub mod manager;

pub use decode::{KEY_LENGTH, decode_key_material};
pub use manager::KeyManager;
