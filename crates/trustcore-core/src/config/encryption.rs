//! Key management, encryption and certificate configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Key management and TLS certificate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionConfig {
    /// Symmetric algorithm name. Only `AES-256-GCM` is supported.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Symmetric key rotation interval in hours.
    #[serde(default = "default_key_rotation_ttl")]
    pub key_rotation_ttl_hours: u64,
    /// RSA modulus size in bits for the signing keypair.
    #[serde(default = "default_rsa_key_size")]
    pub rsa_key_size: usize,
    /// Certificate rotation interval in hours.
    #[serde(default = "default_certificate_ttl")]
    pub certificate_ttl_hours: u64,
    /// Subject common name for the startup certificate.
    #[serde(default = "default_common_name")]
    pub certificate_common_name: String,
    /// SAN DNS names for the startup certificate.
    #[serde(default = "default_dns_names")]
    pub certificate_dns_names: Vec<String>,
    /// Environment variable to load the symmetric key from at startup.
    #[serde(default)]
    pub key_env_var: Option<String>,
    /// File to load the symmetric key from at startup.
    #[serde(default)]
    pub key_file: Option<String>,
    /// External key management provider slot.
    #[serde(default)]
    pub kms: KmsConfig,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            key_rotation_ttl_hours: default_key_rotation_ttl(),
            rsa_key_size: default_rsa_key_size(),
            certificate_ttl_hours: default_certificate_ttl(),
            certificate_common_name: default_common_name(),
            certificate_dns_names: default_dns_names(),
            key_env_var: None,
            key_file: None,
            kms: KmsConfig::default(),
        }
    }
}

/// External key management provider. Recognised but not wired to any backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KmsConfig {
    /// `none`, `aws`, `gcp` or `vault`.
    #[serde(default = "default_kms_provider")]
    pub provider: String,
    /// Provider-specific settings.
    #[serde(default)]
    pub config: HashMap<String, String>,
}

impl Default for KmsConfig {
    fn default() -> Self {
        Self {
            provider: default_kms_provider(),
            config: HashMap::new(),
        }
    }
}

impl KmsConfig {
    /// Returns `true` when a provider other than `none` is configured.
    pub fn is_configured(&self) -> bool {
        !self.provider.is_empty() && self.provider != "none"
    }
}

fn default_algorithm() -> String {
    "AES-256-GCM".to_string()
}

fn default_key_rotation_ttl() -> u64 {
    720
}

fn default_rsa_key_size() -> usize {
    2048
}

fn default_certificate_ttl() -> u64 {
    8760
}

fn default_common_name() -> String {
    "localhost".to_string()
}

fn default_dns_names() -> Vec<String> {
    vec!["localhost".to_string()]
}

fn default_kms_provider() -> String {
    "none".to_string()
}
