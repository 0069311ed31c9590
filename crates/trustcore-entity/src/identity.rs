//! Identity provider kinds.

use serde::{Deserialize, Serialize};

/// External identity providers the registry can hold adapters for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google OAuth 2.0 / OIDC.
    Google,
    /// GitHub OAuth apps.
    Github,
    /// Microsoft Entra ID (Azure AD).
    Azuread,
    /// Auth0 tenants.
    Auth0,
    /// Any other OIDC-compatible provider.
    Generic,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Google => write!(f, "google"),
            ProviderKind::Github => write!(f, "github"),
            ProviderKind::Azuread => write!(f, "azuread"),
            ProviderKind::Auth0 => write!(f, "auth0"),
            ProviderKind::Generic => write!(f, "generic"),
        }
    }
}

/// Tokens returned by a provider's authorization-code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderTokens {
    /// Provider access token.
    pub access_token: String,
    /// Provider refresh token, when issued.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// OIDC id token, when issued.
    #[serde(default)]
    pub id_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Profile fetched from a provider's user-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUserInfo {
    /// The provider the profile came from.
    pub provider: ProviderKind,
    /// Stable subject id at the provider.
    pub subject: String,
    /// Email address.
    pub email: String,
    /// Whether the provider verified the email.
    #[serde(default)]
    pub email_verified: bool,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}
