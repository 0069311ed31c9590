//! TLS certificate ownership and rotation.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rand::rngs::OsRng;
use rcgen::{
    CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, KeyPair,
    KeyUsagePurpose,
};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::{error, info, warn};
use x509_parser::extensions::GeneralName;
use x509_parser::pem::parse_x509_pem;
use zeroize::Zeroizing;

use trustcore_core::config::EncryptionConfig;
use trustcore_core::error::{AppError, ErrorKind};
use trustcore_core::result::AppResult;

use crate::rotation::{RotationGuard, spawn_detached};

/// Modulus size of the dedicated certificate key.
pub const CERTIFICATE_KEY_BITS: usize = 2048;

/// Validity window of issued certificates.
pub const CERTIFICATE_VALIDITY: Duration = Duration::from_secs(365 * 24 * 3600);

/// An installed certificate and its private key.
#[derive(Clone)]
pub struct TlsCertificate {
    /// PEM-encoded certificate.
    pub certificate_pem: String,
    /// PEM-encoded private key.
    pub private_key_pem: Zeroizing<String>,
    /// Subject common name.
    pub common_name: String,
    /// DNS subject alternative names.
    pub dns_names: Vec<String>,
    /// Start of the validity window.
    pub not_before: DateTime<Utc>,
    /// End of the validity window.
    pub not_after: DateTime<Utc>,
}

impl std::fmt::Debug for TlsCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsCertificate")
            .field("common_name", &self.common_name)
            .field("dns_names", &self.dns_names)
            .field("not_after", &self.not_after)
            .finish()
    }
}

#[derive(Debug)]
struct Installed {
    certificate: TlsCertificate,
    installed_at: Instant,
}

struct Inner {
    current: RwLock<Option<Installed>>,
    rotation_ttl: Duration,
    guard: Arc<RotationGuard>,
}

/// Serves and rotates the process TLS certificate.
///
/// Independent of the [`KeyManager`](crate::keys::KeyManager): every
/// certificate gets its own freshly generated RSA key.
#[derive(Clone)]
pub struct CertificateManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CertificateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateManager")
            .field("rotation_ttl", &self.inner.rotation_ttl)
            .field("installed", &self.inner.current.read().is_some())
            .finish()
    }
}

impl CertificateManager {
    /// Creates a manager and issues the startup certificate from configuration.
    pub fn new(config: &EncryptionConfig) -> AppResult<Self> {
        let manager = Self::without_certificate(Duration::from_secs(
            config.certificate_ttl_hours * 3600,
        ));
        manager.generate_self_signed_cert(
            &config.certificate_common_name,
            &config.certificate_dns_names,
        )?;
        Ok(manager)
    }

    /// Creates a manager with nothing installed.
    ///
    /// A zero `rotation_ttl` disables rotation on access.
    pub fn without_certificate(rotation_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                current: RwLock::new(None),
                rotation_ttl,
                guard: RotationGuard::new(),
            }),
        }
    }

    /// Returns the installed certificate.
    ///
    /// When the rotation interval has elapsed, a background rotation is
    /// started and the current certificate is still returned.
    pub fn get_tls_certificate(&self) -> AppResult<TlsCertificate> {
        let (certificate, due) = {
            let current = self.inner.current.read();
            let installed = current.as_ref().ok_or_else(AppError::certificate_not_found)?;
            (installed.certificate.clone(), self.rotation_due(installed))
        };
        if due {
            self.trigger_rotation();
        }
        Ok(certificate)
    }

    /// Expiry of the installed certificate.
    pub fn get_certificate_expiry(&self) -> AppResult<DateTime<Utc>> {
        self.inner
            .current
            .read()
            .as_ref()
            .map(|installed| installed.certificate.not_after)
            .ok_or_else(AppError::certificate_not_found)
    }

    /// Issues and installs a self-signed certificate.
    pub fn generate_self_signed_cert(
        &self,
        common_name: &str,
        dns_names: &[String],
    ) -> AppResult<TlsCertificate> {
        let certificate = issue_self_signed(common_name, dns_names)?;
        self.install(certificate.clone());
        info!(
            common_name,
            dns_names = ?dns_names,
            not_after = %certificate.not_after,
            "Self-signed certificate issued"
        );
        Ok(certificate)
    }

    /// Reissues the installed certificate with the same subject and SANs.
    pub fn rotate_certificate(&self) -> AppResult<TlsCertificate> {
        let (common_name, dns_names) = {
            let current = self.inner.current.read();
            let installed = current.as_ref().ok_or_else(AppError::certificate_not_found)?;
            (
                installed.certificate.common_name.clone(),
                installed.certificate.dns_names.clone(),
            )
        };
        let certificate = self.generate_self_signed_cert(&common_name, &dns_names)?;
        info!(common_name = %common_name, "Certificate rotated");
        Ok(certificate)
    }

    /// Installs a PEM certificate and private key read from disk.
    ///
    /// The private key must match the certificate's public key.
    pub fn load_certificate_from_file(
        &self,
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> AppResult<TlsCertificate> {
        let cert_path = cert_path.as_ref();
        let key_path = key_path.as_ref();

        let certificate_pem = std::fs::read_to_string(cert_path).map_err(|e| {
            AppError::with_source(
                ErrorKind::CertificateNotFound,
                format!("Failed to read certificate '{}'", cert_path.display()),
                e,
            )
        })?;
        let private_key_pem = Zeroizing::new(std::fs::read_to_string(key_path).map_err(|e| {
            AppError::with_source(
                ErrorKind::CertificateNotFound,
                format!("Failed to read private key '{}'", key_path.display()),
                e,
            )
        })?);

        let certificate = inspect(&certificate_pem, private_key_pem)?;
        self.install(certificate.clone());
        info!(
            path = %cert_path.display(),
            common_name = %certificate.common_name,
            not_after = %certificate.not_after,
            "Certificate loaded from file"
        );
        Ok(certificate)
    }

    fn install(&self, certificate: TlsCertificate) {
        *self.inner.current.write() = Some(Installed {
            certificate,
            installed_at: Instant::now(),
        });
    }

    fn rotation_due(&self, installed: &Installed) -> bool {
        !self.inner.rotation_ttl.is_zero()
            && installed.installed_at.elapsed() >= self.inner.rotation_ttl
    }

    fn trigger_rotation(&self) {
        let Some(permit) = self.inner.guard.try_acquire() else {
            return;
        };
        let manager = self.clone();
        spawn_detached("certificate-rotation", move || {
            let _permit = permit;
            let due = manager
                .inner
                .current
                .read()
                .as_ref()
                .is_some_and(|installed| manager.rotation_due(installed));
            if !due {
                return;
            }
            if let Err(e) = manager.rotate_certificate() {
                error!(error = %e, "Background certificate rotation failed");
            }
        });
    }
}

fn issue_self_signed(common_name: &str, dns_names: &[String]) -> AppResult<TlsCertificate> {
    let rsa_key = RsaPrivateKey::new(&mut OsRng, CERTIFICATE_KEY_BITS).map_err(|e| {
        error!(error = %e, "Failed to generate certificate key");
        AppError::with_source(ErrorKind::Internal, "Failed to generate certificate key", e)
    })?;
    let private_key_pem = rsa_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| AppError::internal(format!("Failed to encode certificate key: {e}")))?;
    let key_pair = KeyPair::from_pem_and_sign_algo(&private_key_pem, &rcgen::PKCS_RSA_SHA256)
        .map_err(|e| AppError::internal(format!("Failed to load certificate key: {e}")))?;

    let mut params = CertificateParams::new(dns_names.to_vec())
        .map_err(|e| AppError::validation(format!("Invalid DNS name: {e}")))?;
    params.distinguished_name = DistinguishedName::new();
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);

    let now = time::OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + CERTIFICATE_VALIDITY;
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];

    let certificate = params.self_signed(&key_pair).map_err(|e| {
        error!(error = %e, "Failed to self-sign certificate");
        AppError::internal(format!("Failed to self-sign certificate: {e}"))
    })?;

    Ok(TlsCertificate {
        certificate_pem: certificate.pem(),
        private_key_pem,
        common_name: common_name.to_string(),
        dns_names: dns_names.to_vec(),
        not_before: to_chrono(now),
        not_after: to_chrono(now + CERTIFICATE_VALIDITY),
    })
}

/// Parses a certificate, checks the key matches, and extracts its subject.
fn inspect(certificate_pem: &str, private_key_pem: Zeroizing<String>) -> AppResult<TlsCertificate> {
    let (_, pem) = parse_x509_pem(certificate_pem.as_bytes())
        .map_err(|e| AppError::certificate_invalid(format!("Malformed certificate PEM: {e}")))?;
    let x509 = pem
        .parse_x509()
        .map_err(|e| AppError::certificate_invalid(format!("Malformed certificate: {e}")))?;

    let private_key = RsaPrivateKey::from_pkcs8_pem(&private_key_pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&private_key_pem))
        .map_err(|_| AppError::certificate_invalid("Private key is not an RSA PEM key"))?;
    let certificate_key = RsaPublicKey::from_public_key_der(x509.public_key().raw)
        .map_err(|_| AppError::certificate_invalid("Certificate does not carry an RSA key"))?;
    if certificate_key != private_key.to_public_key() {
        warn!("Private key does not match certificate");
        return Err(AppError::certificate_invalid(
            "Private key does not match certificate",
        ));
    }

    let common_name = x509
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or_default()
        .to_string();

    let dns_names = match x509.subject_alternative_name() {
        Ok(Some(san)) => san
            .value
            .general_names
            .iter()
            .filter_map(|name| match name {
                GeneralName::DNSName(dns) => Some(dns.to_string()),
                _ => None,
            })
            .collect(),
        Ok(None) => Vec::new(),
        Err(e) => {
            return Err(AppError::certificate_invalid(format!(
                "Malformed subject alternative names: {e}"
            )));
        }
    };

    let validity = x509.validity();
    let not_before = DateTime::from_timestamp(validity.not_before.timestamp(), 0)
        .ok_or_else(|| AppError::certificate_invalid("Certificate start out of range"))?;
    let not_after = DateTime::from_timestamp(validity.not_after.timestamp(), 0)
        .ok_or_else(|| AppError::certificate_invalid("Certificate expiry out of range"))?;

    Ok(TlsCertificate {
        certificate_pem: certificate_pem.to_string(),
        private_key_pem,
        common_name,
        dns_names,
        not_before,
        not_after,
    })
}

fn to_chrono(at: time::OffsetDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(at.unix_timestamp(), at.nanosecond()).unwrap_or_else(Utc::now)
}
