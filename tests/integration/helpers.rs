//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use trustcore_auth::{AuthManager, RbacManager, SessionManager, TokenManager};
use trustcore_core::config::{AppConfig, AuthConfig, SessionConfig};
use trustcore_core::result::AppResult;
use trustcore_core::traits::RoleStore;
use trustcore_entity::role::Role;
use trustcore_entity::user::Registration;
use trustcore_store::{
    MemoryRevocationStore, MemoryRoleStore, MemorySessionStore, MemoryUserStore,
};

/// A password that passes the default strength policy.
pub const STRONG_PASSWORD: &str = "correct-horse-battery-staple-42";

/// Auth configuration with a fixed test secret.
pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-test-secret-with-enough-entropy".to_string(),
        ..AuthConfig::default()
    }
}

/// HS256 token manager over a fresh revocation store.
pub fn token_manager() -> TokenManager {
    TokenManager::new(&auth_config(), Arc::new(MemoryRevocationStore::new()))
        .expect("token manager")
}

/// Session manager over a fresh store with the given cap.
pub fn session_manager(max_sessions: usize) -> (SessionManager, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::new());
    let config = SessionConfig {
        max_sessions_per_user: max_sessions,
        ..SessionConfig::default()
    };
    (SessionManager::new(&config, store.clone()), store)
}

/// Role store that counts every call before delegating.
#[derive(Debug, Default)]
pub struct CountingRoleStore {
    inner: MemoryRoleStore,
    calls: AtomicUsize,
}

impl CountingRoleStore {
    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RoleStore for CountingRoleStore {
    async fn save(&self, role: &Role) -> AppResult<()> {
        self.hit();
        self.inner.save(role).await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.hit();
        self.inner.delete(id).await
    }

    async fn get(&self, id: &str) -> AppResult<Option<Role>> {
        self.hit();
        self.inner.get(id).await
    }

    async fn list(&self) -> AppResult<Vec<Role>> {
        self.hit();
        self.inner.list().await
    }

    async fn clear(&self) -> AppResult<()> {
        self.hit();
        self.inner.clear().await
    }
}

/// Fully wired auth stack over in-memory stores.
pub struct TestApp {
    /// The auth facade.
    pub auth: AuthManager,
    /// Backing user store.
    pub users: Arc<MemoryUserStore>,
    /// Backing session store.
    pub sessions: Arc<MemorySessionStore>,
}

impl TestApp {
    /// Create a new test application with default configuration.
    pub async fn new() -> Self {
        let config = AppConfig {
            auth: auth_config(),
            ..AppConfig::default()
        };

        let users = Arc::new(MemoryUserStore::new());
        let sessions = Arc::new(MemorySessionStore::new());
        let tokens = TokenManager::new(&config.auth, Arc::new(MemoryRevocationStore::new()))
            .expect("token manager");
        let session_manager = SessionManager::new(&config.session, sessions.clone());
        let rbac = RbacManager::from_config(&config.rbac, Arc::new(MemoryRoleStore::new()))
            .await
            .expect("rbac");

        let auth = AuthManager::new(
            &config.auth,
            users.clone(),
            tokens,
            session_manager,
            Arc::new(rbac),
        );

        Self {
            auth,
            users,
            sessions,
        }
    }

    /// Register a user with the strong test password.
    pub async fn register(&self, email: &str) -> trustcore_entity::user::User {
        self.auth
            .register(&Registration {
                email: email.to_string(),
                username: email.split('@').next().unwrap_or("user").to_string(),
                password: STRONG_PASSWORD.to_string(),
            })
            .await
            .expect("register")
    }
}
