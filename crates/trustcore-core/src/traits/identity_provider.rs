//! External identity provider capability.

use async_trait::async_trait;
use trustcore_entity::identity::{ProviderKind, ProviderTokens, ProviderUserInfo};

use crate::result::AppResult;

/// An OAuth/OIDC provider adapter supplied by the embedding application.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Which provider this adapter talks to.
    fn kind(&self) -> ProviderKind;

    /// Build the URL the user is redirected to for consent.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an authorization code for provider tokens.
    async fn exchange_code(&self, code: &str) -> AppResult<ProviderTokens>;

    /// Fetch the user's profile with a provider access token.
    async fn fetch_user_info(&self, access_token: &str) -> AppResult<ProviderUserInfo>;
}
