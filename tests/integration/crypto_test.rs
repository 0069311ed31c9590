//! Integration tests for keys, encryption, certificates and secure storage.

mod helpers;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use trustcore_core::error::ErrorKind;
use trustcore_crypto::{CertificateManager, EncryptionManager, KeyManager, SecureStorage};
use trustcore_store::MemoryStorageBackend;

fn keys() -> KeyManager {
    KeyManager::generate(1024, Duration::ZERO).unwrap()
}

#[test]
fn test_round_trip_for_edge_sizes() {
    let encryption = EncryptionManager::new(keys());
    let large: Vec<u8> = (0..1024).map(|i| (i % 251) as u8).collect();

    for plaintext in [Vec::new(), b"x".to_vec(), b"hello trustcore".to_vec(), large] {
        let sealed = encryption.encrypt(&plaintext).unwrap();
        if !plaintext.is_empty() {
            assert_ne!(sealed, plaintext);
        }
        assert_eq!(encryption.decrypt(&sealed).unwrap(), plaintext);
    }
}

#[test]
fn test_ciphertext_is_fresh_per_call() {
    let encryption = EncryptionManager::new(keys());
    let a = encryption.encrypt(b"same").unwrap();
    let b = encryption.encrypt(b"same").unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_key_length_and_data_errors() {
    let encryption = EncryptionManager::new(keys());

    let err = encryption.encrypt_with_key(&[0u8; 16], b"data").unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidKey);

    let err = encryption.decrypt(&[0u8; 5]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidData);

    let mut sealed = encryption.encrypt(b"payload").unwrap();
    let last = sealed.len() - 1;
    sealed[last] ^= 0x01;
    let tampered = encryption.decrypt(&sealed).unwrap_err();

    let other = EncryptionManager::new(keys());
    let wrong_key = other
        .decrypt(&encryption.encrypt(b"payload").unwrap())
        .unwrap_err();

    assert_eq!(tampered.kind, ErrorKind::DecryptionFailed);
    assert_eq!(wrong_key.kind, ErrorKind::DecryptionFailed);
    assert_eq!(tampered.to_string(), wrong_key.to_string());
}

#[test]
fn test_password_hashing() {
    let encryption = EncryptionManager::new(keys());
    let hash = encryption.hash_password("secret").unwrap();
    assert!(encryption.verify_password("secret", &hash).unwrap());
    assert!(!encryption.verify_password("wrong", &hash).unwrap());
}

#[test]
fn test_argon2_is_deterministic_per_salt() {
    let encryption = EncryptionManager::new(keys());
    let a = encryption.hash_argon2(b"data", b"salt-one").unwrap();
    let b = encryption.hash_argon2(b"data", b"salt-one").unwrap();
    let c = encryption.hash_argon2(b"data", b"salt-two").unwrap();
    assert_eq!(a.len(), 32);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_argon2_salt_length_floor() {
    let encryption = EncryptionManager::new(keys());
    let err = encryption.hash_argon2(b"data", b"1234567").unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidData);
    assert_eq!(
        encryption.hash_argon2(b"data", b"").unwrap_err().kind,
        ErrorKind::InvalidData
    );

    let a = encryption.hash_argon2(b"data", b"12345678").unwrap();
    let b = encryption.hash_argon2(b"data", b"12345678").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_sign_and_verify() {
    let encryption = EncryptionManager::new(keys());
    let signature = encryption.sign(b"message").unwrap();
    assert!(encryption.verify(b"message", &signature).unwrap());
    assert!(!encryption.verify(b"tampered", &signature).unwrap());
}

#[test]
fn test_rotation_discards_previous_key() {
    let keys = keys();
    let encryption = EncryptionManager::new(keys.clone());
    let sealed = encryption.encrypt(b"before rotation").unwrap();
    let before = keys.get_key_version();

    keys.rotate_key().unwrap();
    assert_ne!(keys.get_key_version(), before);
    assert_eq!(
        encryption.decrypt(&sealed).unwrap_err().kind,
        ErrorKind::DecryptionFailed
    );
}

#[test]
fn test_load_key_from_file_accepts_base64_and_hex() {
    let keys = keys();
    let material = [7u8; 32];

    let mut b64 = tempfile::NamedTempFile::new().unwrap();
    writeln!(b64, "  {}  ", STANDARD.encode(material)).unwrap();
    keys.load_key_from_file(b64.path()).unwrap();
    assert_eq!(*keys.get_encryption_key(), material);
    assert!(keys.get_key_version().starts_with("file_"));

    let hex_material = [9u8; 32];
    let mut hex_file = tempfile::NamedTempFile::new().unwrap();
    write!(hex_file, "{}", hex::encode(hex_material)).unwrap();
    keys.load_key_from_file(hex_file.path()).unwrap();
    assert_eq!(*keys.get_encryption_key(), hex_material);
}

#[test]
fn test_load_key_from_file_rejects_bad_material() {
    let keys = keys();
    let mut short = tempfile::NamedTempFile::new().unwrap();
    write!(short, "{}", STANDARD.encode([1u8; 16])).unwrap();
    assert_eq!(
        keys.load_key_from_file(short.path()).unwrap_err().kind,
        ErrorKind::InvalidKey
    );

    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        keys.load_key_from_file(dir.path().join("missing.key"))
            .unwrap_err()
            .kind,
        ErrorKind::KeyNotFound
    );
}

#[test]
fn test_self_signed_certificate_lifecycle() {
    let certificates = CertificateManager::without_certificate(Duration::ZERO);
    assert_eq!(
        certificates.get_tls_certificate().unwrap_err().kind,
        ErrorKind::CertificateNotFound
    );
    assert_eq!(
        certificates.rotate_certificate().unwrap_err().kind,
        ErrorKind::CertificateNotFound
    );

    let names = vec!["api.example.com".to_string(), "localhost".to_string()];
    let issued = certificates
        .generate_self_signed_cert("api.example.com", &names)
        .unwrap();
    assert!(issued.certificate_pem.contains("BEGIN CERTIFICATE"));
    let validity = issued.not_after - issued.not_before;
    assert_eq!(validity.num_days(), 365);

    let rotated = certificates.rotate_certificate().unwrap();
    assert_eq!(rotated.common_name, "api.example.com");
    assert_eq!(rotated.dns_names, names);
    assert_ne!(rotated.certificate_pem, issued.certificate_pem);
    assert_eq!(
        certificates.get_certificate_expiry().unwrap(),
        rotated.not_after
    );
}

#[test]
fn test_load_certificate_from_file_checks_key() {
    let issuer = CertificateManager::without_certificate(Duration::ZERO);
    let names = vec!["files.example.com".to_string()];
    let first = issuer
        .generate_self_signed_cert("files.example.com", &names)
        .unwrap();
    let second = issuer
        .generate_self_signed_cert("other.example.com", &names)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let cert_path = dir.path().join("tls.crt");
    let key_path = dir.path().join("tls.key");
    let wrong_key_path = dir.path().join("wrong.key");
    std::fs::write(&cert_path, &first.certificate_pem).unwrap();
    std::fs::write(&key_path, first.private_key_pem.as_str()).unwrap();
    std::fs::write(&wrong_key_path, second.private_key_pem.as_str()).unwrap();

    let loader = CertificateManager::without_certificate(Duration::ZERO);
    let loaded = loader.load_certificate_from_file(&cert_path, &key_path).unwrap();
    assert_eq!(loaded.common_name, "files.example.com");
    assert_eq!(loaded.dns_names, names);
    assert_eq!(
        loader.get_tls_certificate().unwrap().certificate_pem,
        first.certificate_pem
    );

    assert_eq!(
        loader
            .load_certificate_from_file(&cert_path, &wrong_key_path)
            .unwrap_err()
            .kind,
        ErrorKind::CertificateInvalid
    );
}

#[tokio::test]
async fn test_secure_storage() {
    let backend = Arc::new(MemoryStorageBackend::new());
    let storage = SecureStorage::new(EncryptionManager::new(keys()), backend.clone());

    storage.store("db/password", b"hunter2").await.unwrap();
    storage.store("db/user", b"admin").await.unwrap();
    storage.store("api/token", b"t0k3n").await.unwrap();

    assert_ne!(backend.raw("db/password").await.unwrap(), b"hunter2".to_vec());
    assert_eq!(storage.retrieve("db/password").await.unwrap(), b"hunter2");
    assert!(storage.exists("db/user").await.unwrap());
    assert_eq!(
        storage.list("db/").await.unwrap(),
        vec!["db/password".to_string(), "db/user".to_string()]
    );

    storage.delete("db/user").await.unwrap();
    assert_eq!(
        storage.retrieve("db/user").await.unwrap_err().kind,
        ErrorKind::SecretNotFound
    );
    assert_eq!(
        storage.store("", b"x").await.unwrap_err().kind,
        ErrorKind::InvalidSecret
    );
}
