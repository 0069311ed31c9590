//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every section falls back to defaults when absent.

pub mod auth;
pub mod encryption;
pub mod identity;
pub mod logging;
pub mod rbac;
pub mod session;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use self::auth::{AuthConfig, SigningMethod};
pub use self::encryption::{EncryptionConfig, KmsConfig};
pub use self::identity::{IdentityConfig, ProviderConfig};
pub use self::logging::LoggingConfig;
pub use self::rbac::{
    OverrideConfig, PermissionConfig, PolicyConfig, PolicyRuleConfig, RbacConfig, RoleConfig,
};
pub use self::session::SessionConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Token and credential settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Session management settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Roles, overrides and policies.
    #[serde(default)]
    pub rbac: RbacConfig,
    /// Key management and certificate settings.
    #[serde(default)]
    pub encryption: EncryptionConfig,
    /// External identity providers.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Injected store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings applied to every call into an injected store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Upper bound for a single store call in milliseconds.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            operation_timeout_ms: default_operation_timeout(),
        }
    }
}

impl StoreConfig {
    /// The operation timeout as a [`Duration`].
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `TRUSTCORE_`, then resolves
    /// `${VAR:default}` placeholders in secret fields.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TRUSTCORE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let mut loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.resolve_placeholders(|name| std::env::var(name).ok());
        Ok(loaded)
    }

    /// Replaces `${VAR}` / `${VAR:default}` placeholders in secret fields.
    pub fn resolve_placeholders<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.auth.jwt_secret = resolve_placeholder(&self.auth.jwt_secret, &lookup);
        for provider in self.identity.providers.iter_mut() {
            provider.client_secret = resolve_placeholder(&provider.client_secret, &lookup);
        }
    }
}

/// Resolves a single `${VAR}` or `${VAR:default}` placeholder.
///
/// Values that are not placeholders are returned unchanged. An unset or
/// empty variable falls back to the default, or to an empty string.
pub fn resolve_placeholder<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let Some(inner) = value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return value.to_string();
    };

    let (name, default) = match inner.split_once(':') {
        Some((name, default)) => (name, default),
        None => (inner, ""),
    };

    match lookup(name) {
        Some(found) if !found.is_empty() => found,
        _ => default.to_string(),
    }
}

fn default_operation_timeout() -> u64 {
    5000
}
