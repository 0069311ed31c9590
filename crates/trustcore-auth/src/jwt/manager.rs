//! Token lifecycle: generate, validate, refresh, revoke.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, error, warn};
use uuid::Uuid;

use trustcore_core::config::{AuthConfig, SigningMethod};
use trustcore_core::deadline::{DEFAULT_STORE_TIMEOUT, bounded};
use trustcore_core::error::AppError;
use trustcore_core::result::AppResult;
use trustcore_core::traits::RevocationStore;
use trustcore_crypto::KeyManager;

use super::claims::TokenClaims;

/// Issues and checks signed bearer tokens.
///
/// Revocation is tracked by raw token string in the injected
/// [`RevocationStore`].
#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
    issuer: String,
    token_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
    leeway: chrono::Duration,
    revocations: Arc<dyn RevocationStore>,
    store_timeout: Duration,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

impl TokenManager {
    /// Creates an HS256 manager from the configured shared secret.
    pub fn new(config: &AuthConfig, revocations: Arc<dyn RevocationStore>) -> AppResult<Self> {
        if config.signing_method != SigningMethod::Hs256 {
            return Err(AppError::configuration(
                "RS256 signing requires a key manager; use TokenManager::with_rsa_keys",
            ));
        }
        if config.jwt_secret.is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must not be empty"));
        }
        let secret = config.jwt_secret.as_bytes();
        Ok(Self::build(
            config,
            Algorithm::HS256,
            EncodingKey::from_secret(secret),
            DecodingKey::from_secret(secret),
            revocations,
        ))
    }

    /// Creates an RS256 manager signing with the key manager's RSA keypair.
    pub fn with_rsa_keys(
        config: &AuthConfig,
        keys: &KeyManager,
        revocations: Arc<dyn RevocationStore>,
    ) -> AppResult<Self> {
        let private_pem = keys.export_rsa_private_key_pem()?;
        let public_pem = keys.export_rsa_public_key_pem()?;
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| AppError::configuration(format!("Unusable RSA signing key: {e}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| AppError::configuration(format!("Unusable RSA verification key: {e}")))?;
        Ok(Self::build(
            config,
            Algorithm::RS256,
            encoding_key,
            decoding_key,
            revocations,
        ))
    }

    /// Creates a manager for the configured signing method.
    pub fn from_config(
        config: &AuthConfig,
        keys: &KeyManager,
        revocations: Arc<dyn RevocationStore>,
    ) -> AppResult<Self> {
        match config.signing_method {
            SigningMethod::Hs256 => Self::new(config, revocations),
            SigningMethod::Rs256 => Self::with_rsa_keys(config, keys, revocations),
        }
    }

    fn build(
        config: &AuthConfig,
        algorithm: Algorithm,
        encoding_key: EncodingKey,
        decoding_key: DecodingKey,
        revocations: Arc<dyn RevocationStore>,
    ) -> Self {
        let mut validation = Validation::new(algorithm);
        // Expiry is checked after decoding so it surfaces as ExpiredToken.
        validation.validate_exp = false;
        validation.validate_nbf = true;
        validation.leeway = config.leeway_seconds;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding_key,
            decoding_key,
            algorithm,
            validation,
            issuer: config.issuer.clone(),
            token_ttl: chrono::Duration::minutes(config.token_ttl_minutes as i64),
            refresh_ttl: chrono::Duration::hours(config.refresh_ttl_hours as i64),
            leeway: chrono::Duration::seconds(config.leeway_seconds as i64),
            revocations,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Overrides the token lifetime.
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        self
    }

    /// Overrides how long revocation entries are kept.
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        self
    }

    /// Overrides the clock skew tolerance for expiry and not-before checks.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = chrono::Duration::from_std(leeway).unwrap_or(chrono::Duration::zero());
        self.validation.leeway = leeway.as_secs();
        self
    }

    /// Sets the upper bound for each revocation store call.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// The signing algorithm in use.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Issues a token for the user.
    pub fn generate(&self, user_id: &str, email: &str, roles: &[String]) -> AppResult<String> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.token_ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let claims = TokenClaims {
            user_id: user_id.to_string(),
            email: email.to_string(),
            roles: roles.to_vec(),
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key).map_err(|e| {
            error!(user_id, error = %e, "Failed to sign token");
            AppError::token_signature(format!("Failed to sign token: {e}"))
        })
    }

    /// Validates a token and returns its user id.
    pub async fn validate(&self, token: &str) -> AppResult<String> {
        Ok(self.validate_claims(token).await?.user_id)
    }

    /// Validates a token and returns its claims.
    ///
    /// Checks revocation, then signature and algorithm, then expiry.
    pub async fn validate_claims(&self, token: &str) -> AppResult<TokenClaims> {
        let revoked = bounded(
            self.store_timeout,
            "revocation_store.is_revoked",
            self.revocations.is_revoked(token),
        )
        .await
        .map_err(|e| {
            error!(error = %e, "Revocation lookup failed");
            AppError::invalid_token()
        })?;
        if revoked {
            warn!(reason = "revoked", "Token rejected");
            return Err(AppError::invalid_token());
        }

        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| {
                let reason = match e.kind() {
                    JwtErrorKind::InvalidSignature => "signature",
                    JwtErrorKind::InvalidAlgorithm => "algorithm",
                    JwtErrorKind::InvalidIssuer => "issuer",
                    JwtErrorKind::ImmatureSignature => "not_yet_valid",
                    _ => "malformed",
                };
                warn!(reason, "Token rejected");
                AppError::invalid_token()
            },
        )?;

        let claims = data.claims;
        if claims.is_expired_at(Utc::now(), self.leeway) {
            debug!(user_id = %claims.user_id, "Token expired");
            return Err(AppError::expired_token());
        }

        Ok(claims)
    }

    /// Re-issues a valid token with the same identity and revokes the old one.
    pub async fn refresh(&self, token: &str) -> AppResult<String> {
        let claims = self.validate_claims(token).await?;
        let fresh = self.generate(&claims.user_id, &claims.email, &claims.roles)?;
        self.revoke(token).await?;
        debug!(user_id = %claims.user_id, "Token refreshed");
        Ok(fresh)
    }

    /// Revokes a token and drops revocation entries older than the refresh TTL.
    pub async fn revoke(&self, token: &str) -> AppResult<()> {
        let now = Utc::now();
        bounded(
            self.store_timeout,
            "revocation_store.revoke",
            self.revocations.revoke(token, now),
        )
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to record token revocation");
            AppError::storage("Failed to revoke token")
        })?;

        if let Err(e) = self.purge_revocations().await {
            warn!(error = %e, "Failed to purge stale revocations");
        }
        Ok(())
    }

    /// Drops revocation entries older than the refresh TTL.
    pub async fn purge_revocations(&self) -> AppResult<usize> {
        let cutoff = Utc::now()
            .checked_sub_signed(self.refresh_ttl)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        bounded(
            self.store_timeout,
            "revocation_store.purge_older_than",
            self.revocations.purge_older_than(cutoff),
        )
        .await
    }
}
