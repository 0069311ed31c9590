//! Registry of identity provider adapters keyed by kind.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{info, warn};

use trustcore_core::deadline::{DEFAULT_STORE_TIMEOUT, bounded};
use trustcore_core::error::{AppError, ErrorKind};
use trustcore_core::result::AppResult;
use trustcore_core::traits::IdentityProvider;
use trustcore_entity::identity::{ProviderKind, ProviderUserInfo};

/// Holds one adapter per provider kind and runs the callback flow.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    providers: RwLock<HashMap<ProviderKind, Arc<dyn IdentityProvider>>>,
    call_timeout: Option<Duration>,
}

impl IdentityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the upper bound for each provider call.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Registers an adapter, replacing any adapter of the same kind.
    pub fn register_provider(&self, kind: ProviderKind, provider: Arc<dyn IdentityProvider>) {
        if self.providers.write().insert(kind, provider).is_some() {
            warn!(provider = %kind, "Replaced identity provider");
        } else {
            info!(provider = %kind, "Identity provider registered");
        }
    }

    /// Looks up the adapter for a kind.
    pub fn get_provider(&self, kind: ProviderKind) -> AppResult<Arc<dyn IdentityProvider>> {
        self.providers
            .read()
            .get(&kind)
            .cloned()
            .ok_or_else(|| {
                AppError::provider_not_found(format!("No identity provider registered for {kind}"))
            })
    }

    /// Registered kinds.
    pub fn kinds(&self) -> Vec<ProviderKind> {
        self.providers.read().keys().copied().collect()
    }

    /// Consent URL for the provider.
    pub fn authorization_url(&self, kind: ProviderKind, state: &str) -> AppResult<String> {
        Ok(self.get_provider(kind)?.authorization_url(state))
    }

    /// Exchanges an authorization code and fetches the user's profile.
    pub async fn handle_callback(&self, kind: ProviderKind, code: &str) -> AppResult<ProviderUserInfo> {
        let provider = self.get_provider(kind)?;
        let limit = self.call_timeout.unwrap_or(DEFAULT_STORE_TIMEOUT);

        let tokens = bounded(limit, "identity_provider.exchange_code", provider.exchange_code(code))
            .await
            .map_err(|e| {
                warn!(provider = %kind, error = %e, "Authorization code exchange failed");
                if e.is(ErrorKind::Timeout) {
                    e
                } else {
                    AppError::code_exchange_failed(format!("{kind} rejected the authorization code"))
                }
            })?;

        let user = bounded(
            limit,
            "identity_provider.fetch_user_info",
            provider.fetch_user_info(&tokens.access_token),
        )
        .await?;

        info!(provider = %kind, subject = %user.subject, "Identity provider callback completed");
        Ok(user)
    }
}
