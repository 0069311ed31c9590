//! Byte-oriented key/value backend used by secure storage.

use async_trait::async_trait;

use crate::result::AppResult;

/// Key/value backend holding already-encrypted blobs.
#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Write a value, replacing any previous one.
    async fn put(&self, key: &str, value: Vec<u8>) -> AppResult<()>;

    /// Read a value. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    /// Delete a key. Deleting an unknown key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Keys starting with `prefix`, sorted.
    async fn list(&self, prefix: &str) -> AppResult<Vec<String>>;
}
