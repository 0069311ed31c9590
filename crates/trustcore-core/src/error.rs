//! Unified error types for trustcore.
//!
//! Every manager maps store, backend and library failures into [`AppError`]
//! so callers match on a closed [`ErrorKind`] and never on a persistence or
//! crypto library's own error type.

use std::fmt;
use thiserror::Error;

/// Closed set of failure kinds surfaced by trustcore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    // -- Authentication --
    /// Credentials were rejected. Covers unknown users, inactive users and
    /// wrong passwords alike.
    InvalidCredentials,
    /// The requested user does not exist.
    UserNotFound,
    /// A user with the same email is already registered.
    UserAlreadyExists,

    // -- Tokens --
    /// The token is revoked, malformed, or signed with the wrong key or algorithm.
    InvalidToken,
    /// The token is past its expiry.
    ExpiredToken,
    /// The token could not be signed.
    TokenSignature,

    // -- Sessions --
    /// The session is absent or inactive.
    SessionNotFound,
    /// The session is past its expiry.
    SessionExpired,

    // -- RBAC --
    /// The role does not exist.
    RoleNotFound,
    /// A role with the same id already exists.
    RoleAlreadyExists,
    /// The role is missing its id or name.
    InvalidRole,
    /// The caller is not allowed to perform the action.
    PermissionDenied,
    /// The user already holds the role.
    UserAlreadyHasRole,
    /// The policy is missing its id or has no rules.
    InvalidPolicy,

    // -- Keys --
    /// No key material is available.
    KeyNotFound,
    /// Generating replacement key material failed.
    KeyRotationFailed,
    /// Key material has the wrong length or encoding.
    InvalidKey,

    // -- Certificates --
    /// No certificate has been installed.
    CertificateNotFound,
    /// The certificate or its private key could not be parsed or do not match.
    CertificateInvalid,

    // -- Storage and crypto --
    /// No secret is stored under the key.
    SecretNotFound,
    /// The secret key is empty.
    InvalidSecret,
    /// The ciphertext is too short to contain a nonce.
    InvalidData,
    /// Authenticated decryption failed.
    DecryptionFailed,

    // -- Identity providers --
    /// No identity provider is registered for the kind.
    ProviderNotFound,
    /// The provider rejected the authorization code.
    CodeExchangeFailed,

    // -- Infrastructure --
    /// Input validation failed.
    Validation,
    /// An injected store or backend failed.
    Storage,
    /// An injected store call did not finish in time.
    Timeout,
    /// The operation was cancelled.
    Cancelled,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::ExpiredToken => "EXPIRED_TOKEN",
            Self::TokenSignature => "TOKEN_SIGNATURE",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::RoleNotFound => "ROLE_NOT_FOUND",
            Self::RoleAlreadyExists => "ROLE_ALREADY_EXISTS",
            Self::InvalidRole => "INVALID_ROLE",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::UserAlreadyHasRole => "USER_ALREADY_HAS_ROLE",
            Self::InvalidPolicy => "INVALID_POLICY",
            Self::KeyNotFound => "KEY_NOT_FOUND",
            Self::KeyRotationFailed => "KEY_ROTATION_FAILED",
            Self::InvalidKey => "INVALID_KEY",
            Self::CertificateNotFound => "CERTIFICATE_NOT_FOUND",
            Self::CertificateInvalid => "CERTIFICATE_INVALID",
            Self::SecretNotFound => "SECRET_NOT_FOUND",
            Self::InvalidSecret => "INVALID_SECRET",
            Self::InvalidData => "INVALID_DATA",
            Self::DecryptionFailed => "DECRYPTION_FAILED",
            Self::ProviderNotFound => "PROVIDER_NOT_FOUND",
            Self::CodeExchangeFailed => "CODE_EXCHANGE_FAILED",
            Self::Validation => "VALIDATION",
            Self::Storage => "STORAGE",
            Self::Timeout => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::Internal => "INTERNAL",
        };
        f.write_str(name)
    }
}

/// The unified error used throughout trustcore.
///
/// Crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls at the manager boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns `true` when the error is of the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// Create an invalid-credentials error.
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials, "Invalid credentials")
    }

    /// Create a user-not-found error.
    pub fn user_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UserNotFound, message)
    }

    /// Create a user-already-exists error.
    pub fn user_already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UserAlreadyExists, message)
    }

    /// Create an invalid-token error.
    ///
    /// The message is fixed so that revocation, signature and format
    /// failures are indistinguishable to the caller.
    pub fn invalid_token() -> Self {
        Self::new(ErrorKind::InvalidToken, "Invalid token")
    }

    /// Create an expired-token error.
    pub fn expired_token() -> Self {
        Self::new(ErrorKind::ExpiredToken, "Token has expired")
    }

    /// Create a token-signature error.
    pub fn token_signature(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenSignature, message)
    }

    /// Create a session-not-found error.
    pub fn session_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SessionNotFound, message)
    }

    /// Create a session-expired error.
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SessionExpired, message)
    }

    /// Create a role-not-found error.
    pub fn role_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RoleNotFound, message)
    }

    /// Create a role-already-exists error.
    pub fn role_already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RoleAlreadyExists, message)
    }

    /// Create an invalid-role error.
    pub fn invalid_role(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRole, message)
    }

    /// Create a permission-denied error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionDenied, message)
    }

    /// Create a user-already-has-role error.
    pub fn user_already_has_role(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UserAlreadyHasRole, message)
    }

    /// Create an invalid-policy error.
    pub fn invalid_policy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPolicy, message)
    }

    /// Create a key-not-found error.
    pub fn key_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::KeyNotFound, message)
    }

    /// Create a key-rotation-failed error.
    pub fn key_rotation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::KeyRotationFailed, message)
    }

    /// Create an invalid-key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidKey, message)
    }

    /// Create a certificate-not-found error.
    pub fn certificate_not_found() -> Self {
        Self::new(ErrorKind::CertificateNotFound, "No certificate installed")
    }

    /// Create a certificate-invalid error.
    pub fn certificate_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CertificateInvalid, message)
    }

    /// Create a secret-not-found error.
    pub fn secret_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SecretNotFound, message)
    }

    /// Create an invalid-secret error.
    pub fn invalid_secret(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSecret, message)
    }

    /// Create an invalid-data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidData, message)
    }

    /// Create a decryption-failed error.
    ///
    /// Tampering and wrong keys produce the same message.
    pub fn decryption_failed() -> Self {
        Self::new(ErrorKind::DecryptionFailed, "Decryption failed")
    }

    /// Create a provider-not-found error.
    pub fn provider_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProviderNotFound, message)
    }

    /// Create a code-exchange-failed error.
    pub fn code_exchange_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CodeExchangeFailed, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Create a cancelled error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
