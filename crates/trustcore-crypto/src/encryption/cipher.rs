//! AES-256-GCM sealing with the `nonce || ciphertext || tag` wire format.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::error;

use trustcore_core::error::AppError;
use trustcore_core::result::AppResult;

use crate::keys::KEY_LENGTH;

/// Length of the random nonce prefixed to every blob.
pub const NONCE_LENGTH: usize = 12;

fn cipher_for(key: &[u8]) -> AppResult<Aes256Gcm> {
    if key.len() != KEY_LENGTH {
        return Err(AppError::invalid_key(format!(
            "Encryption key must be {KEY_LENGTH} bytes, got {}",
            key.len()
        )));
    }
    Aes256Gcm::new_from_slice(key).map_err(|e| {
        error!(error = %e, "Failed to construct AES-256-GCM cipher");
        AppError::internal(format!("Failed to construct cipher: {e}"))
    })
}

/// Encrypts `plaintext` under `key` with a fresh random nonce.
pub fn seal(key: &[u8], plaintext: &[u8]) -> AppResult<Vec<u8>> {
    let cipher = cipher_for(key)?;

    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher.encrypt(nonce, plaintext).map_err(|_| {
        error!("AES-256-GCM encryption failed");
        AppError::internal("Encryption failed")
    })?;

    let mut sealed = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypts a blob produced by [`seal`].
///
/// Tampering and a wrong key both yield the same `DecryptionFailed` error.
pub fn open(key: &[u8], sealed: &[u8]) -> AppResult<Vec<u8>> {
    let cipher = cipher_for(key)?;

    if sealed.len() < NONCE_LENGTH {
        return Err(AppError::invalid_data(format!(
            "Ciphertext shorter than the {NONCE_LENGTH}-byte nonce"
        )));
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LENGTH);

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| AppError::decryption_failed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustcore_core::error::ErrorKind;

    const KEY: [u8; KEY_LENGTH] = [42u8; KEY_LENGTH];

    #[test]
    fn test_wire_format() {
        let sealed = seal(&KEY, b"hello").unwrap();
        // nonce + plaintext + 16-byte tag
        assert_eq!(sealed.len(), NONCE_LENGTH + 5 + 16);
        assert_eq!(open(&KEY, &sealed).unwrap(), b"hello");
    }

    #[test]
    fn test_nonce_is_fresh_per_call() {
        let a = seal(&KEY, b"same").unwrap();
        let b = seal(&KEY, b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tamper_and_wrong_key_are_indistinguishable() {
        let mut sealed = seal(&KEY, b"payload").unwrap();
        let wrong_key = open(&[1u8; KEY_LENGTH], &sealed).unwrap_err();

        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        let tampered = open(&KEY, &sealed).unwrap_err();

        assert_eq!(wrong_key.kind, ErrorKind::DecryptionFailed);
        assert_eq!(tampered.kind, ErrorKind::DecryptionFailed);
        assert_eq!(wrong_key.message, tampered.message);
    }

    #[test]
    fn test_short_input_is_invalid_data() {
        let err = open(&KEY, &[0u8; NONCE_LENGTH - 1]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidData);
    }

    #[test]
    fn test_key_length_enforced() {
        assert_eq!(seal(&[0u8; 16], b"x").unwrap_err().kind, ErrorKind::InvalidKey);
        assert_eq!(open(&[0u8; 33], &[0u8; 40]).unwrap_err().kind, ErrorKind::InvalidKey);
    }
}
