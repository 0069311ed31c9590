//! Ownership, loading and rotation of key material.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::RwLock;
use rand::RngCore;
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::{error, info, warn};
use zeroize::Zeroizing;

use trustcore_core::config::EncryptionConfig;
use trustcore_core::error::{AppError, ErrorKind};
use trustcore_core::result::AppResult;

use super::decode::{KEY_LENGTH, decode_key_material};
use crate::rotation::{RotationGuard, spawn_detached};

/// Version assigned to the key generated at construction.
pub const INITIAL_KEY_VERSION: &str = "v1";

const VERSION_TIMESTAMP: &str = "%Y%m%d%H%M%S";

#[derive(Debug)]
struct KeyState {
    encryption_key: Zeroizing<[u8; KEY_LENGTH]>,
    version: String,
    installed_at: Instant,
}

struct Inner {
    state: RwLock<KeyState>,
    rsa_private: RsaPrivateKey,
    rsa_public: RsaPublicKey,
    rotation_ttl: Duration,
    guard: Arc<RotationGuard>,
    generation: AtomicU64,
}

/// Holds the symmetric encryption key and the RSA signing keypair.
///
/// Cloning is cheap and every clone shares the same key material. Rotation
/// replaces the symmetric key only; the superseded key is dropped and
/// zeroized.
#[derive(Clone)]
pub struct KeyManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("version", &self.inner.state.read().version)
            .field("rotation_ttl", &self.inner.rotation_ttl)
            .finish()
    }
}

impl KeyManager {
    /// Creates a key manager from encryption configuration, generating fresh
    /// key material and loading any configured key source.
    pub fn new(config: &EncryptionConfig) -> AppResult<Self> {
        let manager = Self::generate(
            config.rsa_key_size,
            Duration::from_secs(config.key_rotation_ttl_hours * 3600),
        )?;

        if let Some(name) = config.key_env_var.as_deref().filter(|n| !n.is_empty()) {
            manager.load_key_from_env(name)?;
        }
        if let Some(path) = config.key_file.as_deref().filter(|p| !p.is_empty()) {
            manager.load_key_from_file(path)?;
        }

        Ok(manager)
    }

    /// Generates a random symmetric key and an RSA keypair of `rsa_bits`.
    ///
    /// A zero `rotation_ttl` disables rotation on access.
    pub fn generate(rsa_bits: usize, rotation_ttl: Duration) -> AppResult<Self> {
        let encryption_key = random_key().map_err(|e| {
            error!(error = %e, "Failed to generate encryption key");
            AppError::internal(format!("Failed to generate encryption key: {e}"))
        })?;

        let rsa_private = RsaPrivateKey::new(&mut OsRng, rsa_bits).map_err(|e| {
            error!(bits = rsa_bits, error = %e, "Failed to generate RSA keypair");
            AppError::with_source(
                ErrorKind::Internal,
                format!("Failed to generate {rsa_bits}-bit RSA keypair"),
                e,
            )
        })?;
        let rsa_public = rsa_private.to_public_key();

        info!(bits = rsa_bits, version = INITIAL_KEY_VERSION, "Key material generated");

        Ok(Self {
            inner: Arc::new(Inner {
                state: RwLock::new(KeyState {
                    encryption_key,
                    version: INITIAL_KEY_VERSION.to_string(),
                    installed_at: Instant::now(),
                }),
                rsa_private,
                rsa_public,
                rotation_ttl,
                guard: RotationGuard::new(),
                generation: AtomicU64::new(0),
            }),
        })
    }

    /// Returns a copy of the current symmetric key.
    ///
    /// When the rotation interval has elapsed, a background rotation is
    /// started and the current key is still returned.
    pub fn get_encryption_key(&self) -> Zeroizing<[u8; KEY_LENGTH]> {
        let (key, due) = {
            let state = self.inner.state.read();
            (state.encryption_key.clone(), self.rotation_due(&state))
        };
        if due {
            self.trigger_rotation();
        }
        key
    }

    /// Version tag of the current symmetric key.
    pub fn get_key_version(&self) -> String {
        self.inner.state.read().version.clone()
    }

    /// Number of key replacements since construction.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// Replaces the symmetric key with a fresh random one.
    pub fn rotate_key(&self) -> AppResult<()> {
        let key = random_key().map_err(|e| {
            error!(error = %e, "Key rotation failed");
            AppError::key_rotation_failed(format!("Failed to generate replacement key: {e}"))
        })?;
        let version = format!("v{}", Utc::now().format(VERSION_TIMESTAMP));
        self.install(key, version.clone());
        info!(version = %version, "Encryption key rotated");
        Ok(())
    }

    /// The RSA signing key.
    pub fn get_rsa_private_key(&self) -> &RsaPrivateKey {
        &self.inner.rsa_private
    }

    /// The RSA verification key.
    pub fn get_rsa_public_key(&self) -> &RsaPublicKey {
        &self.inner.rsa_public
    }

    /// PKCS#8 PEM encoding of the RSA private key.
    pub fn export_rsa_private_key_pem(&self) -> AppResult<Zeroizing<String>> {
        self.inner
            .rsa_private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| AppError::internal(format!("Failed to encode RSA private key: {e}")))
    }

    /// SPKI PEM encoding of the RSA public key.
    pub fn export_rsa_public_key_pem(&self) -> AppResult<String> {
        self.inner
            .rsa_public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| AppError::internal(format!("Failed to encode RSA public key: {e}")))
    }

    /// Installs the symmetric key held in environment variable `name`.
    pub fn load_key_from_env(&self, name: &str) -> AppResult<()> {
        let raw = match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Zeroizing::new(value),
            _ => {
                return Err(AppError::key_not_found(format!(
                    "Environment variable '{name}' is not set"
                )));
            }
        };
        let key = decode_key_material(&raw)?;
        let version = format!("env_{name}_{}", Utc::now().format(VERSION_TIMESTAMP));
        self.install(key, version.clone());
        info!(source = "env", variable = name, version = %version, "Encryption key loaded");
        Ok(())
    }

    /// Installs the symmetric key stored in a text file.
    ///
    /// Group- or world-accessible files are logged but still accepted.
    pub fn load_key_from_file(&self, path: impl AsRef<Path>) -> AppResult<()> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| read_error(path, e))?;
        warn_if_shared(path, &metadata);

        let raw = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| read_error(path, e))?);
        let key = decode_key_material(&raw)?;

        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let version = format!("file_{basename}_{}", Utc::now().format(VERSION_TIMESTAMP));
        self.install(key, version.clone());
        info!(source = "file", path = %path.display(), version = %version, "Encryption key loaded");
        Ok(())
    }

    fn install(&self, key: Zeroizing<[u8; KEY_LENGTH]>, version: String) {
        let mut state = self.inner.state.write();
        state.encryption_key = key;
        state.version = version;
        state.installed_at = Instant::now();
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn rotation_due(&self, state: &KeyState) -> bool {
        !self.inner.rotation_ttl.is_zero() && state.installed_at.elapsed() >= self.inner.rotation_ttl
    }

    fn trigger_rotation(&self) {
        let Some(permit) = self.inner.guard.try_acquire() else {
            return;
        };
        let manager = self.clone();
        spawn_detached("key-rotation", move || {
            let _permit = permit;
            // A rotation may have completed between the read and the permit.
            if !manager.rotation_due(&manager.inner.state.read()) {
                return;
            }
            if let Err(e) = manager.rotate_key() {
                error!(error = %e, "Background key rotation failed");
            }
        });
    }
}

fn random_key() -> Result<Zeroizing<[u8; KEY_LENGTH]>, rand::Error> {
    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    OsRng.try_fill_bytes(&mut key[..])?;
    Ok(key)
}

fn read_error(path: &Path, e: std::io::Error) -> AppError {
    if e.kind() == std::io::ErrorKind::NotFound {
        AppError::key_not_found(format!("Key file '{}' not found", path.display()))
    } else {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to read key file '{}'", path.display()),
            e,
        )
    }
}

#[cfg(unix)]
fn warn_if_shared(path: &Path, metadata: &std::fs::Metadata) {
    use std::os::unix::fs::PermissionsExt;

    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        warn!(
            path = %path.display(),
            mode = %format!("{:o}", mode & 0o777),
            "Key file is accessible by group or others"
        );
    }
}

#[cfg(not(unix))]
fn warn_if_shared(_path: &Path, _metadata: &std::fs::Metadata) {}
