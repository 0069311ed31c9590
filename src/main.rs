//! Trustcore Server - authentication, authorization and key management core
//!
//! Main entry point that wires all crates together and runs background
//! maintenance until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

use trustcore_auth::{
    AuthManager, IdentityRegistry, RbacManager, RoleManager, SessionCleanup, SessionManager,
    TokenManager,
};
use trustcore_core::config::AppConfig;
use trustcore_core::error::AppError;
use trustcore_crypto::{CertificateManager, EncryptionManager, KeyManager, SecureStorage};
use trustcore_store::{
    MemoryRevocationStore, MemoryRoleStore, MemorySessionStore, MemoryStorageBackend,
    MemoryUserStore,
};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("TRUSTCORE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Trustcore v{}", env!("CARGO_PKG_VERSION"));
    let store_timeout = config.store.operation_timeout();

    // ── Step 1: Key material and certificates ────────────────────
    if config.encryption.kms.is_configured() {
        tracing::warn!(
            provider = %config.encryption.kms.provider,
            "External KMS is not supported; using local key material"
        );
    }

    tracing::info!(rsa_bits = config.encryption.rsa_key_size, "Generating key material...");
    let encryption_config = config.encryption.clone();
    let (keys, certificates) = tokio::task::spawn_blocking(move || {
        let keys = KeyManager::new(&encryption_config)?;
        let certificates = CertificateManager::new(&encryption_config)?;
        Ok::<_, AppError>((keys, certificates))
    })
    .await
    .map_err(|e| AppError::internal(format!("Key generation task failed: {e}")))??;

    tracing::info!(
        key_version = %keys.get_key_version(),
        certificate_expires = %certificates.get_certificate_expiry()?,
        "Key material ready"
    );

    let encryption = EncryptionManager::new(keys.clone());
    let secrets = SecureStorage::new(encryption, Arc::new(MemoryStorageBackend::new()))
        .with_timeout(store_timeout);
    secure_storage_self_check(&secrets).await?;

    // ── Step 2: Stores ───────────────────────────────────────────
    let users = Arc::new(MemoryUserStore::new());
    let session_store = Arc::new(MemorySessionStore::new());
    let role_store = Arc::new(MemoryRoleStore::new());
    let revocations = Arc::new(MemoryRevocationStore::new());

    // ── Step 3: Authorization ────────────────────────────────────
    let roles = RoleManager::new(role_store).with_store_timeout(store_timeout);
    let rbac = Arc::new(RbacManager::from_config_with(&config.rbac, roles).await?);

    // ── Step 4: Authentication ───────────────────────────────────
    tracing::info!(
        signing_method = %config.auth.signing_method,
        "Initializing authentication system..."
    );
    let tokens = TokenManager::from_config(&config.auth, &keys, revocations)?
        .with_store_timeout(store_timeout);
    let sessions =
        SessionManager::new(&config.session, session_store).with_store_timeout(store_timeout);
    let identity = Arc::new(IdentityRegistry::new().with_call_timeout(store_timeout));
    for provider in config.identity.providers.iter().filter(|p| p.enabled) {
        tracing::info!(
            provider = %provider.kind,
            "Identity provider configured; awaiting adapter registration"
        );
    }

    let auth = AuthManager::new(
        &config.auth,
        users,
        tokens.clone(),
        sessions.clone(),
        Arc::clone(&rbac),
    )
    .with_store_timeout(store_timeout)
    .with_identity(identity);
    tracing::debug!(?auth, "Auth manager ready");

    // ── Step 5: Background maintenance ───────────────────────────
    let shutdown = CancellationToken::new();
    let cleanup = SessionCleanup::new(sessions).with_tokens(tokens);
    let interval = Duration::from_secs(config.session.cleanup_interval_minutes.max(1) * 60);
    let cleanup_handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { cleanup.run(interval, shutdown).await })
    };

    tracing::info!("Trustcore ready");

    // ── Step 6: Wait for shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    shutdown.cancel();
    rbac.shutdown();

    if tokio::time::timeout(Duration::from_secs(10), cleanup_handle)
        .await
        .is_err()
    {
        tracing::warn!("Session cleanup did not stop in time");
    }

    tracing::info!("Trustcore shut down gracefully");
    Ok(())
}

/// Round-trip a probe value through encrypted storage
async fn secure_storage_self_check(secrets: &SecureStorage) -> Result<(), AppError> {
    const PROBE_KEY: &str = "__startup_probe";

    secrets.store(PROBE_KEY, b"ok").await?;
    let value = secrets.retrieve(PROBE_KEY).await?;
    secrets.delete(PROBE_KEY).await?;

    if value != b"ok" {
        return Err(AppError::internal("Secure storage self-check returned wrong value"));
    }
    tracing::info!("Secure storage self-check passed");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
