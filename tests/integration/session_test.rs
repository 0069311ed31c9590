//! Integration tests for session limits, expiry and cleanup.

mod helpers;

use std::time::Duration;

use trustcore_auth::SessionCleanup;
use trustcore_core::error::ErrorKind;

#[tokio::test]
async fn test_sixth_session_evicts_oldest() {
    let (sessions, _) = helpers::session_manager(5);

    let mut created = Vec::new();
    for i in 0..5 {
        created.push(
            sessions
                .create("u1", &format!("token-{i}"), "10.0.0.1", "agent")
                .await
                .unwrap(),
        );
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    let oldest = created
        .iter()
        .min_by_key(|s| s.created_at)
        .map(|s| s.id)
        .unwrap();

    let sixth = sessions
        .create("u1", "token-5", "10.0.0.1", "agent")
        .await
        .unwrap();

    let active = sessions.get_by_user_id("u1").await.unwrap();
    assert_eq!(active.len(), 5);
    assert!(active.iter().all(|s| s.id != oldest));
    assert!(active.iter().any(|s| s.id == sixth.id));
}

#[tokio::test]
async fn test_expired_session_is_deactivated() {
    let (sessions, _) = helpers::session_manager(5);
    let sessions = sessions.with_ttl(Duration::from_millis(1));

    let session = sessions.create("u1", "t", "ip", "ua").await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let err = sessions.validate(session.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::SessionExpired);
    assert!(!sessions.get(session.id).await.unwrap().active);
    assert!(sessions.get_by_user_id("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_refresh_extends_from_now() {
    let (sessions, _) = helpers::session_manager(5);
    let sessions = sessions.with_ttl(Duration::from_millis(200));

    let session = sessions.create("u1", "t", "ip", "ua").await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;
    let refreshed = sessions.refresh(session.id).await.unwrap();
    assert!(refreshed.expires_at > session.expires_at);

    tokio::time::sleep(Duration::from_millis(120)).await;
    sessions.validate(session.id).await.unwrap();
}

#[tokio::test]
async fn test_invalidated_session_cannot_refresh() {
    let (sessions, _) = helpers::session_manager(5);
    let session = sessions.create("u1", "t", "ip", "ua").await.unwrap();

    let invalidated = sessions.invalidate(session.id).await.unwrap();
    assert!(!invalidated.active);
    assert_eq!(
        sessions.refresh(session.id).await.unwrap_err().kind,
        ErrorKind::SessionNotFound
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_logins_respect_cap() {
    let (sessions, store) = helpers::session_manager(5);

    let logins = (0..40).map(|i| {
        let sessions = sessions.clone();
        let user = if i % 2 == 0 { "alice" } else { "bob" };
        tokio::spawn(async move {
            sessions
                .create(user, &format!("token-{i}"), "ip", "ua")
                .await
        })
    });
    for handle in futures::future::join_all(logins).await {
        handle.unwrap().unwrap();
    }

    assert_eq!(sessions.get_by_user_id("alice").await.unwrap().len(), 5);
    assert_eq!(sessions.get_by_user_id("bob").await.unwrap().len(), 5);
    assert_eq!(store.len().await, 10);
}

#[tokio::test]
async fn test_cleanup_removes_only_expired() {
    let (sessions, store) = helpers::session_manager(5);
    let short = sessions.clone().with_ttl(Duration::from_millis(1));

    short.create("u1", "a", "ip", "ua").await.unwrap();
    short.create("u2", "b", "ip", "ua").await.unwrap();
    let kept = sessions.create("u1", "c", "ip", "ua").await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let cleanup = SessionCleanup::new(sessions.clone()).with_tokens(helpers::token_manager());
    assert_eq!(cleanup.run_cleanup().await.unwrap(), 2);
    assert_eq!(store.len().await, 1);
    sessions.validate(kept.id).await.unwrap();
}
