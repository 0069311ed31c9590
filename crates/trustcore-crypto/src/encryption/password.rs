//! Argon2id password hashing and fixed-parameter key derivation.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use trustcore_core::error::AppError;
use trustcore_core::result::AppResult;

/// Iterations used by [`PasswordHasher::hash_argon2`].
pub const DERIVE_ITERATIONS: u32 = 1;
/// Memory in KiB used by [`PasswordHasher::hash_argon2`].
pub const DERIVE_MEMORY_KIB: u32 = 64 * 1024;
/// Lanes used by [`PasswordHasher::hash_argon2`].
pub const DERIVE_LANES: u32 = 4;
/// Output length of [`PasswordHasher::hash_argon2`].
pub const DERIVE_OUTPUT_LENGTH: usize = 32;
/// Shortest salt accepted by [`PasswordHasher::hash_argon2`].
pub const DERIVE_MIN_SALT_LENGTH: usize = 8;

/// Handles password hashing and verification using Argon2id.
#[derive(Debug, Clone)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Creates a new password hasher instance.
    pub fn new() -> Self {
        Self
    }

    /// Hashes a plaintext password using Argon2id with a random salt.
    ///
    /// The result is a PHC string carrying its own salt and parameters.
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verifies a plaintext password against a stored Argon2id hash.
    ///
    /// Returns `Ok(true)` if the password matches, `Ok(false)` if not.
    pub fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::invalid_data(format!("Invalid password hash format: {e}")))?;

        let argon2 = Argon2::default();
        match argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }

    /// Derives 32 bytes from `data` and `salt` with fixed Argon2id parameters.
    ///
    /// Deterministic for a given pair. Salts shorter than
    /// [`DERIVE_MIN_SALT_LENGTH`] fail with `InvalidData`.
    pub fn hash_argon2(&self, data: &[u8], salt: &[u8]) -> AppResult<Vec<u8>> {
        if salt.len() < DERIVE_MIN_SALT_LENGTH {
            return Err(AppError::invalid_data(format!(
                "Argon2 salt must be at least {DERIVE_MIN_SALT_LENGTH} bytes, got {}",
                salt.len()
            )));
        }

        let params = Params::new(
            DERIVE_MEMORY_KIB,
            DERIVE_ITERATIONS,
            DERIVE_LANES,
            Some(DERIVE_OUTPUT_LENGTH),
        )
        .map_err(|e| AppError::internal(format!("Invalid Argon2 parameters: {e}")))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut output = vec![0u8; DERIVE_OUTPUT_LENGTH];
        argon2
            .hash_password_into(data, salt, &mut output)
            .map_err(|e| AppError::invalid_data(format!("Argon2 derivation failed: {e}")))?;
        Ok(output)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
