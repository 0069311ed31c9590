//! Bearer token issuance and validation.

pub mod claims;
pub mod manager;

pub use claims::TokenClaims;
pub use manager::TokenManager;
