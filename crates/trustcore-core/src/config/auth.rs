//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Token signing and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for HS256 signing. May be a `${VAR:default}` placeholder.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Token signing algorithm.
    #[serde(default)]
    pub signing_method: SigningMethod,
    /// Issuer claim stamped on and required from every token.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Token TTL in minutes.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: u64,
    /// How long revoked tokens are remembered, in hours.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_hours: u64,
    /// Clock skew tolerance applied to expiry checks, in seconds.
    #[serde(default)]
    pub leeway_seconds: u64,
    /// Minimum password length accepted at registration.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Minimum zxcvbn score (0-4) accepted at registration.
    #[serde(default = "default_password_score")]
    pub password_min_score: u8,
    /// Role assigned to newly registered users.
    #[serde(default = "default_role")]
    pub default_role: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            signing_method: SigningMethod::default(),
            issuer: default_issuer(),
            token_ttl_minutes: default_token_ttl(),
            refresh_ttl_hours: default_refresh_ttl(),
            leeway_seconds: 0,
            password_min_length: default_password_min(),
            password_min_score: default_password_score(),
            default_role: default_role(),
        }
    }
}

/// Supported token signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningMethod {
    /// HMAC-SHA256 with the shared `jwt_secret`.
    #[serde(rename = "HS256")]
    Hs256,
    /// RSASSA-PKCS1-v1_5 with SHA-256, keyed by the key manager's RSA pair.
    #[serde(rename = "RS256")]
    Rs256,
}

impl Default for SigningMethod {
    fn default() -> Self {
        Self::Hs256
    }
}

impl std::fmt::Display for SigningMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningMethod::Hs256 => write!(f, "HS256"),
            SigningMethod::Rs256 => write!(f, "RS256"),
        }
    }
}

fn default_jwt_secret() -> String {
    "change-me-in-production-use-strong-random-key-32-bytes-minimum".to_string()
}

fn default_issuer() -> String {
    "trustcore".to_string()
}

fn default_token_ttl() -> u64 {
    60
}

fn default_refresh_ttl() -> u64 {
    24
}

fn default_password_min() -> usize {
    8
}

fn default_password_score() -> u8 {
    2
}

fn default_role() -> String {
    "user".to_string()
}
