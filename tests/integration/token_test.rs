//! Integration tests for bearer token issuance, validation and revocation.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use trustcore_auth::TokenManager;
use trustcore_core::config::{AuthConfig, SigningMethod};
use trustcore_core::error::ErrorKind;
use trustcore_crypto::KeyManager;
use trustcore_store::MemoryRevocationStore;

fn roles() -> Vec<String> {
    vec!["user".to_string(), "admin".to_string()]
}

#[tokio::test]
async fn test_validate_returns_generated_user_id() {
    let tokens = helpers::token_manager();
    for (user_id, email) in [
        ("u1", "u1@example.com"),
        ("user_20240101120000_AbCd1234", "x@example.org"),
        ("ünïcode", ""),
    ] {
        let token = tokens.generate(user_id, email, &roles()).unwrap();
        assert_eq!(tokens.validate(&token).await.unwrap(), user_id);
    }
}

#[tokio::test]
async fn test_revoked_token_is_invalid() {
    let tokens = helpers::token_manager();
    let token = tokens.generate("u1", "u1@example.com", &roles()).unwrap();
    tokens.revoke(&token).await.unwrap();

    let err = tokens.validate(&token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_one_millisecond_ttl_expires() {
    let tokens = helpers::token_manager().with_token_ttl(Duration::from_millis(1));
    let token = tokens.generate("u1", "u1@example.com", &roles()).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let err = tokens.validate(&token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ExpiredToken);
}

#[tokio::test]
async fn test_refresh_revokes_old_token() {
    let tokens = helpers::token_manager();
    let old = tokens.generate("u1", "u1@example.com", &roles()).unwrap();

    let fresh = tokens.refresh(&old).await.unwrap();
    assert!(!fresh.is_empty());
    assert_ne!(fresh, old);

    assert_eq!(
        tokens.validate(&old).await.unwrap_err().kind,
        ErrorKind::InvalidToken
    );
    let claims = tokens.validate_claims(&fresh).await.unwrap();
    assert_eq!(claims.user_id, "u1");
    assert_eq!(claims.email, "u1@example.com");
    assert_eq!(claims.roles, roles());

    assert_eq!(
        tokens.refresh(&old).await.unwrap_err().kind,
        ErrorKind::InvalidToken
    );
}

#[tokio::test]
async fn test_signature_and_revocation_failures_look_identical() {
    let tokens = helpers::token_manager();
    let revoked = tokens.generate("u1", "e", &roles()).unwrap();
    tokens.revoke(&revoked).await.unwrap();

    let token = tokens.generate("u1", "e", &roles()).unwrap();
    let split = token.rfind('.').unwrap() + 1;
    let (head, signature) = token.split_at(split);
    let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{head}{flipped}{}", &signature[1..]);

    let a = tokens.validate(&revoked).await.unwrap_err();
    let b = tokens.validate(&tampered).await.unwrap_err();
    assert_eq!(a.kind, ErrorKind::InvalidToken);
    assert_eq!(b.kind, ErrorKind::InvalidToken);
    assert_eq!(a.to_string(), b.to_string());
}

#[tokio::test]
async fn test_rs256_round_trip_and_algorithm_mismatch() {
    let keys = KeyManager::generate(2048, Duration::ZERO).unwrap();
    let config = AuthConfig {
        signing_method: SigningMethod::Rs256,
        ..helpers::auth_config()
    };
    let rs = TokenManager::from_config(&config, &keys, Arc::new(MemoryRevocationStore::new()))
        .unwrap();
    let token = rs.generate("u1", "e", &roles()).unwrap();
    assert_eq!(rs.validate(&token).await.unwrap(), "u1");

    let hs_token = helpers::token_manager().generate("u1", "e", &roles()).unwrap();
    assert_eq!(
        rs.validate(&hs_token).await.unwrap_err().kind,
        ErrorKind::InvalidToken
    );
    assert_eq!(
        helpers::token_manager().validate(&token).await.unwrap_err().kind,
        ErrorKind::InvalidToken
    );
}

#[tokio::test]
async fn test_revocations_are_purged_after_refresh_ttl() {
    let revocations = Arc::new(MemoryRevocationStore::new());
    let tokens = TokenManager::new(&helpers::auth_config(), revocations.clone())
        .unwrap()
        .with_refresh_ttl(Duration::from_millis(10));

    let first = tokens.generate("u1", "e", &roles()).unwrap();
    tokens.revoke(&first).await.unwrap();
    assert_eq!(revocations.len(), 1);

    tokio::time::sleep(Duration::from_millis(30)).await;
    let second = tokens.generate("u1", "e", &roles()).unwrap();
    tokens.revoke(&second).await.unwrap();
    assert_eq!(revocations.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_validation_and_revocation() {
    let tokens = helpers::token_manager();
    let issued: Vec<String> = (0..32)
        .map(|i| tokens.generate(&format!("u{i}"), "e", &roles()).unwrap())
        .collect();

    let revocations = issued.iter().step_by(2).cloned().map(|token| {
        let tokens = tokens.clone();
        tokio::spawn(async move { tokens.revoke(&token).await })
    });
    for handle in futures::future::join_all(revocations).await {
        handle.unwrap().unwrap();
    }

    let checks = issued.iter().enumerate().map(|(i, token)| {
        let tokens = tokens.clone();
        let token = token.clone();
        tokio::spawn(async move { (i, tokens.validate(&token).await) })
    });
    for handle in futures::future::join_all(checks).await {
        let (i, result) = handle.unwrap();
        if i % 2 == 0 {
            assert_eq!(result.unwrap_err().kind, ErrorKind::InvalidToken);
        } else {
            assert_eq!(result.unwrap(), format!("u{i}"));
        }
    }
}
