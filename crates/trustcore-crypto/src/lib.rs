//! # trustcore-crypto
//!
//! Cryptographic substrate for trustcore.
//!
//! ## Modules
//!
//! - `keys`: symmetric key and RSA keypair ownership, loading and rotation
//! - `encryption`: AES-256-GCM, Argon2id password hashing, RSA signatures
//! - `certificate`: self-signed TLS certificate issuance and rotation
//! - `storage`: encrypt-at-rest key/value facade over a pluggable backend
//! - `rotation`: single-flight guard shared by key and certificate rotation

pub mod certificate;
pub mod encryption;
pub mod keys;
pub mod rotation;
pub mod storage;

pub use certificate::{CertificateManager, TlsCertificate};
pub use encryption::{EncryptionManager, PasswordHasher};
pub use keys::KeyManager;
pub use storage::SecureStorage;
