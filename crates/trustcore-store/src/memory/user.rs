//! In-memory user store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use trustcore_core::error::AppError;
use trustcore_core::result::AppResult;
use trustcore_core::traits::UserStore;
use trustcore_entity::user::User;

#[derive(Debug)]
struct StoredUser {
    user: User,
    password_hash: String,
}

/// User store keyed by id with a secondary email index.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<String, StoredUser>>>,
    by_email: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let by_email = self.by_email.read().await;
        let Some(id) = by_email.get(&email_key(email)) else {
            return Ok(None);
        };
        let users = self.users.read().await;
        Ok(users.get(id).map(|stored| stored.user.clone()))
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(id).map(|stored| stored.user.clone()))
    }

    async fn create(&self, user: &User, password_hash: &str) -> AppResult<()> {
        let mut by_email = self.by_email.write().await;
        let mut users = self.users.write().await;
        let key = email_key(&user.email);
        if by_email.contains_key(&key) || users.contains_key(&user.id) {
            return Err(AppError::user_already_exists(format!(
                "User '{}' already exists",
                user.email
            )));
        }
        by_email.insert(key, user.id.clone());
        users.insert(
            user.id.clone(),
            StoredUser {
                user: user.clone(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(())
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        let mut by_email = self.by_email.write().await;
        let mut users = self.users.write().await;
        let Some(stored) = users.get_mut(&user.id) else {
            return Err(AppError::user_not_found(format!("User '{}' not found", user.id)));
        };
        let old_key = email_key(&stored.user.email);
        let new_key = email_key(&user.email);
        if old_key != new_key {
            if by_email.contains_key(&new_key) {
                return Err(AppError::user_already_exists(format!(
                    "Email '{}' is already in use",
                    user.email
                )));
            }
            by_email.remove(&old_key);
            by_email.insert(new_key, user.id.clone());
        }
        stored.user = user.clone();
        Ok(())
    }

    async fn password_hash(&self, user_id: &str) -> AppResult<Option<String>> {
        let users = self.users.read().await;
        Ok(users.get(user_id).map(|stored| stored.password_hash.clone()))
    }
}
