//! Encryption facade over the key manager.

use rand::rngs::OsRng;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use sha2::Sha256;
use tracing::{debug, error};

use trustcore_core::error::AppError;
use trustcore_core::result::AppResult;

use super::cipher;
use super::password::PasswordHasher;
use crate::keys::KeyManager;

/// Symmetric encryption, password hashing and RSA signatures.
///
/// Stateless apart from the shared [`KeyManager`].
#[derive(Debug, Clone)]
pub struct EncryptionManager {
    keys: KeyManager,
    hasher: PasswordHasher,
}

impl EncryptionManager {
    /// Creates a manager using the given key manager.
    pub fn new(keys: KeyManager) -> Self {
        Self {
            keys,
            hasher: PasswordHasher::new(),
        }
    }

    /// The underlying key manager.
    pub fn keys(&self) -> &KeyManager {
        &self.keys
    }

    /// Encrypts with the current symmetric key.
    pub fn encrypt(&self, plaintext: &[u8]) -> AppResult<Vec<u8>> {
        let key = self.keys.get_encryption_key();
        cipher::seal(&key[..], plaintext)
    }

    /// Decrypts with the current symmetric key.
    pub fn decrypt(&self, ciphertext: &[u8]) -> AppResult<Vec<u8>> {
        let key = self.keys.get_encryption_key();
        cipher::open(&key[..], ciphertext)
    }

    /// Encrypts with a caller-supplied 32-byte key.
    pub fn encrypt_with_key(&self, key: &[u8], plaintext: &[u8]) -> AppResult<Vec<u8>> {
        cipher::seal(key, plaintext)
    }

    /// Decrypts with a caller-supplied 32-byte key.
    pub fn decrypt_with_key(&self, key: &[u8], ciphertext: &[u8]) -> AppResult<Vec<u8>> {
        cipher::open(key, ciphertext)
    }

    /// Hashes a password with Argon2id.
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        self.hasher.hash_password(password)
    }

    /// Checks a password against a stored hash.
    pub fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        self.hasher.verify_password(password, hash)
    }

    /// Fixed-parameter Argon2id derivation.
    pub fn hash_argon2(&self, data: &[u8], salt: &[u8]) -> AppResult<Vec<u8>> {
        self.hasher.hash_argon2(data, salt)
    }

    /// RSA PKCS#1 v1.5 signature over the SHA-256 digest of `data`.
    pub fn sign(&self, data: &[u8]) -> AppResult<Vec<u8>> {
        let signing_key = SigningKey::<Sha256>::new(self.keys.get_rsa_private_key().clone());
        let signature = signing_key
            .try_sign_with_rng(&mut OsRng, data)
            .map_err(|e| {
                error!(error = %e, "RSA signing failed");
                AppError::internal(format!("Signing failed: {e}"))
            })?;
        Ok(signature.to_vec())
    }

    /// Checks a signature produced by [`sign`](Self::sign).
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> AppResult<bool> {
        let verifying_key = VerifyingKey::<Sha256>::new(self.keys.get_rsa_public_key().clone());
        let Ok(signature) = Signature::try_from(signature) else {
            debug!("Malformed signature");
            return Ok(false);
        };
        Ok(verifying_key.verify(data, &signature).is_ok())
    }
}
