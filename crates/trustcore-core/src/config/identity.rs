//! External identity provider configuration.

use serde::{Deserialize, Serialize};

use trustcore_entity::identity::ProviderKind;

/// Identity provider settings. Adapters are supplied by the embedding application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Configured providers.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// Settings for one OAuth/OIDC provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which provider this entry configures.
    pub kind: ProviderKind,
    /// Whether an adapter should be registered.
    #[serde(default)]
    pub enabled: bool,
    /// OAuth client id.
    #[serde(default)]
    pub client_id: String,
    /// OAuth client secret. May be a `${VAR:default}` placeholder.
    #[serde(default)]
    pub client_secret: String,
    /// Redirect URL registered with the provider.
    #[serde(default)]
    pub redirect_url: String,
    /// Requested scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Authorization endpoint override.
    #[serde(default)]
    pub auth_url: Option<String>,
    /// Token endpoint override.
    #[serde(default)]
    pub token_url: Option<String>,
    /// User-info endpoint override.
    #[serde(default)]
    pub userinfo_url: Option<String>,
    /// Auth0 domain or Azure AD tenant.
    #[serde(default)]
    pub domain: Option<String>,
}
