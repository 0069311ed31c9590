//! Secure storage facade.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use trustcore_core::deadline::{DEFAULT_STORE_TIMEOUT, bounded};
use trustcore_core::error::{AppError, ErrorKind};
use trustcore_core::result::AppResult;
use trustcore_core::traits::StorageBackend;

use crate::encryption::EncryptionManager;

/// Encrypts values before they reach the backend and decrypts them on read.
#[derive(Debug, Clone)]
pub struct SecureStorage {
    encryption: EncryptionManager,
    backend: Arc<dyn StorageBackend>,
    timeout: Duration,
}

impl SecureStorage {
    /// Creates secure storage over a backend.
    pub fn new(encryption: EncryptionManager, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            encryption,
            backend,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Sets the upper bound for each backend call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Encrypts and stores a value.
    pub async fn store(&self, key: &str, value: &[u8]) -> AppResult<()> {
        require_key(key)?;
        let sealed = self.encryption.encrypt(value)?;
        bounded(self.timeout, "storage_backend.put", self.backend.put(key, sealed))
            .await
            .map_err(|e| storage_error(e, key, "store"))?;
        debug!(key, "Secret stored");
        Ok(())
    }

    /// Reads and decrypts a value.
    pub async fn retrieve(&self, key: &str) -> AppResult<Vec<u8>> {
        require_key(key)?;
        let sealed = match bounded(self.timeout, "storage_backend.get", self.backend.get(key)).await
        {
            Ok(Some(sealed)) => sealed,
            Ok(None) => return Err(not_found(key)),
            Err(e) if e.is(ErrorKind::Timeout) => return Err(e),
            Err(e) => {
                warn!(key, error = %e, "Backend read failed");
                return Err(not_found(key));
            }
        };
        self.encryption.decrypt(&sealed)
    }

    /// Removes a value.
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        require_key(key)?;
        bounded(self.timeout, "storage_backend.delete", self.backend.delete(key))
            .await
            .map_err(|e| storage_error(e, key, "delete"))
    }

    /// Whether a value is stored under `key`.
    pub async fn exists(&self, key: &str) -> AppResult<bool> {
        require_key(key)?;
        bounded(self.timeout, "storage_backend.exists", self.backend.exists(key))
            .await
            .map_err(|e| storage_error(e, key, "exists"))
    }

    /// Keys starting with `prefix`, sorted.
    pub async fn list(&self, prefix: &str) -> AppResult<Vec<String>> {
        bounded(self.timeout, "storage_backend.list", self.backend.list(prefix))
            .await
            .map_err(|e| storage_error(e, prefix, "list"))
    }
}

fn require_key(key: &str) -> AppResult<()> {
    if key.is_empty() {
        return Err(AppError::invalid_secret("Secret key must not be empty"));
    }
    Ok(())
}

fn not_found(key: &str) -> AppError {
    AppError::secret_not_found(format!("Secret '{key}' not found"))
}

fn storage_error(e: AppError, key: &str, operation: &str) -> AppError {
    if e.is(ErrorKind::Timeout) {
        return e;
    }
    warn!(key, operation, error = %e, "Backend call failed");
    AppError::storage(format!("Secure storage {operation} failed for '{key}'"))
}
