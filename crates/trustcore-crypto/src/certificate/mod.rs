//! Self-signed TLS certificate issuance, loading and rotation.

pub mod manager;

pub use manager::{CertificateManager, TlsCertificate};
