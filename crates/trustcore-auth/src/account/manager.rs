//! Authentication facade tying users, tokens, sessions and RBAC together.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use trustcore_core::config::AuthConfig;
use trustcore_core::deadline::{DEFAULT_STORE_TIMEOUT, bounded};
use trustcore_core::error::{AppError, ErrorKind};
use trustcore_core::result::AppResult;
use trustcore_core::traits::UserStore;
use trustcore_crypto::PasswordHasher;
use trustcore_entity::session::Session;
use trustcore_entity::user::{Credentials, Registration, User};

use crate::identity::IdentityRegistry;
use crate::jwt::TokenManager;
use crate::password::PasswordValidator;
use crate::rbac::RbacManager;
use crate::session::SessionManager;

/// Well-formed Argon2id hash with the default cost, verified on paths that
/// have no stored hash so every failed login costs one verification.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$dHJ1c3Rjb3JlLWR1bW15IQ$AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginResult {
    /// The authenticated user.
    pub user: User,
    /// Bearer token for subsequent requests.
    pub token: String,
    /// Server-side session bound to the token.
    pub session: Session,
}

/// Orchestrates login, registration, token checks and logout.
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserStore>,
    tokens: TokenManager,
    sessions: SessionManager,
    rbac: Arc<RbacManager>,
    identity: Arc<IdentityRegistry>,
    hasher: PasswordHasher,
    validator: PasswordValidator,
    default_role: String,
    store_timeout: Duration,
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("tokens", &self.tokens)
            .field("sessions", &self.sessions)
            .field("default_role", &self.default_role)
            .field("identity_providers", &self.identity.kinds())
            .finish()
    }
}

impl AuthManager {
    /// Creates a new auth manager.
    pub fn new(
        config: &AuthConfig,
        users: Arc<dyn UserStore>,
        tokens: TokenManager,
        sessions: SessionManager,
        rbac: Arc<RbacManager>,
    ) -> Self {
        Self {
            users,
            tokens,
            sessions,
            rbac,
            identity: Arc::new(IdentityRegistry::new()),
            hasher: PasswordHasher::new(),
            validator: PasswordValidator::new(config),
            default_role: config.default_role.clone(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Sets the upper bound for each user store call.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Replaces the identity provider registry.
    pub fn with_identity(mut self, identity: Arc<IdentityRegistry>) -> Self {
        self.identity = identity;
        self
    }

    /// Token manager.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Session manager.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// RBAC manager.
    pub fn rbac(&self) -> &Arc<RbacManager> {
        &self.rbac
    }

    /// External identity provider registry.
    pub fn identity(&self) -> &Arc<IdentityRegistry> {
        &self.identity
    }

    /// Checks credentials.
    ///
    /// Every failure is reported as `InvalidCredentials`.
    pub async fn authenticate(&self, credentials: &Credentials) -> AppResult<User> {
        let lookup = bounded(
            self.store_timeout,
            "user_store.get_by_email",
            self.users.get_by_email(&credentials.email),
        )
        .await;

        let user = match lookup {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.burn_verification(&credentials.password);
                warn!(reason = "unknown_email", "Authentication failed");
                return Err(AppError::invalid_credentials());
            }
            Err(e) => {
                self.burn_verification(&credentials.password);
                error!(error = %e, "User lookup failed during authentication");
                return Err(AppError::invalid_credentials());
            }
        };

        if !user.active {
            self.burn_verification(&credentials.password);
            warn!(user_id = %user.id, reason = "inactive", "Authentication failed");
            return Err(AppError::invalid_credentials());
        }

        let stored = bounded(
            self.store_timeout,
            "user_store.password_hash",
            self.users.password_hash(&user.id),
        )
        .await;

        let hash = match stored {
            Ok(Some(hash)) => hash,
            Ok(None) => {
                self.burn_verification(&credentials.password);
                warn!(user_id = %user.id, reason = "no_password", "Authentication failed");
                return Err(AppError::invalid_credentials());
            }
            Err(e) => {
                self.burn_verification(&credentials.password);
                error!(user_id = %user.id, error = %e, "Password hash lookup failed");
                return Err(AppError::invalid_credentials());
            }
        };

        match self.hasher.verify_password(&credentials.password, &hash) {
            Ok(true) => Ok(user),
            Ok(false) => {
                warn!(user_id = %user.id, reason = "wrong_password", "Authentication failed");
                Err(AppError::invalid_credentials())
            }
            Err(e) => {
                error!(user_id = %user.id, error = %e, "Stored password hash is unusable");
                Err(AppError::invalid_credentials())
            }
        }
    }

    /// Registers a new user with the default role.
    pub async fn register(&self, registration: &Registration) -> AppResult<User> {
        registration
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid registration: {e}")))?;
        self.validator.validate(&registration.password)?;

        let existing = bounded(
            self.store_timeout,
            "user_store.get_by_email",
            self.users.get_by_email(&registration.email),
        )
        .await?;
        if existing.is_some() {
            return Err(AppError::user_already_exists(format!(
                "A user with email '{}' already exists",
                registration.email
            )));
        }

        let hash = self.hasher.hash_password(&registration.password)?;
        let user = User {
            id: generate_user_id(),
            email: registration.email.clone(),
            username: registration.username.clone(),
            roles: vec![self.default_role.clone()],
            active: true,
        };

        bounded(
            self.store_timeout,
            "user_store.create",
            self.users.create(&user, &hash),
        )
        .await?;

        self.sync_roles(&user).await;
        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Authenticates, issues a token and opens a session.
    pub async fn login(
        &self,
        credentials: &Credentials,
        ip_address: &str,
        user_agent: &str,
    ) -> AppResult<LoginResult> {
        let user = self.authenticate(credentials).await?;
        self.sync_roles(&user).await;

        let token = self.tokens.generate(&user.id, &user.email, &user.roles)?;
        let session = self
            .sessions
            .create(&user.id, &token, ip_address, user_agent)
            .await?;

        info!(
            user_id = %user.id,
            session_id = %session.id,
            ip_address,
            "User logged in"
        );

        Ok(LoginResult {
            user,
            token,
            session,
        })
    }

    /// Resolves a bearer token to an active user.
    pub async fn validate_token(&self, token: &str) -> AppResult<User> {
        let claims = self.tokens.validate_claims(token).await?;

        let lookup = bounded(
            self.store_timeout,
            "user_store.get_by_id",
            self.users.get_by_id(&claims.user_id),
        )
        .await;

        match lookup {
            Ok(Some(user)) if user.active => Ok(user),
            Ok(Some(_)) => {
                warn!(user_id = %claims.user_id, reason = "inactive", "Token rejected");
                Err(AppError::invalid_token())
            }
            Ok(None) => {
                warn!(user_id = %claims.user_id, reason = "unknown_user", "Token rejected");
                Err(AppError::invalid_token())
            }
            Err(e) => {
                error!(user_id = %claims.user_id, error = %e, "User lookup failed during token validation");
                Err(AppError::invalid_token())
            }
        }
    }

    /// Checks a `(resource, action)` pair for a user.
    pub async fn has_permission(&self, user_id: &str, resource: &str, action: &str) -> bool {
        self.rbac.has_permission(user_id, resource, action).await
    }

    /// Ends a session and revokes its token.
    pub async fn logout(&self, session_id: Uuid) -> AppResult<()> {
        let session = self.sessions.invalidate(session_id).await?;
        self.tokens.revoke(&session.token).await?;
        info!(user_id = %session.user_id, session_id = %session_id, "User logged out");
        Ok(())
    }

    /// Ends every session of a user and revokes their tokens.
    pub async fn logout_all(&self, user_id: &str) -> AppResult<()> {
        let sessions = self.sessions.get_by_user_id(user_id).await?;
        for session in &sessions {
            self.tokens.revoke(&session.token).await?;
        }
        self.sessions.invalidate_all(user_id).await?;
        info!(user_id, sessions = sessions.len(), "User logged out everywhere");
        Ok(())
    }

    fn burn_verification(&self, password: &str) {
        if let Err(e) = self.hasher.verify_password(password, DUMMY_PASSWORD_HASH) {
            error!(error = %e, "Dummy password verification failed");
        }
    }

    async fn sync_roles(&self, user: &User) {
        let held = self.rbac.get_user_roles(&user.id);
        for role_id in user.roles.iter().filter(|r| !held.contains(r)) {
            match self.rbac.assign_role(&user.id, role_id).await {
                Ok(()) => {}
                Err(e) if e.is(ErrorKind::UserAlreadyHasRole) => {}
                Err(e) => warn!(user_id = %user.id, role_id, error = %e, "Could not assign role"),
            }
        }
    }
}

fn generate_user_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("user_{}_{suffix}", Utc::now().format("%Y%m%d%H%M%S"))
}
