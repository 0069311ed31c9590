//! Symmetric encryption, password hashing and RSA signatures.

pub mod cipher;
pub mod manager;
pub mod password;

pub use cipher::NONCE_LENGTH;
pub use manager::EncryptionManager;
pub use password::PasswordHasher;
