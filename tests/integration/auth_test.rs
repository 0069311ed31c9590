//! Integration tests for the login, registration and logout flows.

mod helpers;

use trustcore_core::error::ErrorKind;
use trustcore_core::traits::{SessionStore, UserStore};
use trustcore_entity::user::{Credentials, Registration};

use helpers::STRONG_PASSWORD;

#[tokio::test]
async fn test_full_login_flow() {
    let app = helpers::TestApp::new().await;
    let user = app.register("alice@example.com").await;
    assert!(user.id.starts_with("user_"));
    assert_eq!(user.roles, vec!["user"]);

    let login = app
        .auth
        .login(
            &Credentials::new("alice@example.com", STRONG_PASSWORD),
            "192.0.2.10",
            "integration-test",
        )
        .await
        .unwrap();

    assert_eq!(login.session.user_id, user.id);
    assert_eq!(login.session.ip_address, "192.0.2.10");
    assert_eq!(login.session.user_agent, "integration-test");
    assert_eq!(
        app.sessions.get(login.session.id).await.unwrap().unwrap().token,
        login.token
    );

    let resolved = app.auth.validate_token(&login.token).await.unwrap();
    assert_eq!(resolved.id, user.id);

    assert!(app.auth.has_permission(&user.id, "mcp", "read").await);
    assert!(app.auth.has_permission(&user.id, "mcp", "create").await);
    assert!(!app.auth.has_permission(&user.id, "mcp", "delete").await);
}

#[tokio::test]
async fn test_password_is_checked() {
    let app = helpers::TestApp::new().await;
    app.register("bob@example.com").await;

    let err = app
        .auth
        .login(&Credentials::new("bob@example.com", "guess"), "ip", "ua")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    assert!(app.sessions.is_empty().await);
}

#[tokio::test]
async fn test_unknown_and_wrong_password_are_indistinguishable() {
    let app = helpers::TestApp::new().await;
    app.register("carol@example.com").await;

    let unknown = app
        .auth
        .authenticate(&Credentials::new("nobody@example.com", STRONG_PASSWORD))
        .await
        .unwrap_err();
    let wrong = app
        .auth
        .authenticate(&Credentials::new("carol@example.com", "not-it"))
        .await
        .unwrap_err();

    assert_eq!(unknown.kind, wrong.kind);
    assert_eq!(unknown.message, wrong.message);
}

#[tokio::test]
async fn test_email_lookup_is_case_insensitive() {
    let app = helpers::TestApp::new().await;
    let user = app.register("dave@example.com").await;

    let found = app.users.get_by_email("DAVE@example.com").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id));

    let err = app
        .auth
        .register(&Registration {
            email: "Dave@Example.com".to_string(),
            username: "dave2".to_string(),
            password: STRONG_PASSWORD.to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UserAlreadyExists);
}

#[tokio::test]
async fn test_logout_revokes_only_that_session() {
    let app = helpers::TestApp::new().await;
    app.register("erin@example.com").await;
    let creds = Credentials::new("erin@example.com", STRONG_PASSWORD);

    let laptop = app.auth.login(&creds, "ip", "laptop").await.unwrap();
    let phone = app.auth.login(&creds, "ip", "phone").await.unwrap();

    app.auth.logout(laptop.session.id).await.unwrap();

    assert_eq!(
        app.auth.validate_token(&laptop.token).await.unwrap_err().kind,
        ErrorKind::InvalidToken
    );
    app.auth.validate_token(&phone.token).await.unwrap();
    app.auth.sessions().validate(phone.session.id).await.unwrap();
}

#[tokio::test]
async fn test_logout_all_clears_every_session() {
    let app = helpers::TestApp::new().await;
    let user = app.register("frank@example.com").await;
    let creds = Credentials::new("frank@example.com", STRONG_PASSWORD);

    let mut tokens = Vec::new();
    for agent in ["a", "b", "c"] {
        tokens.push(app.auth.login(&creds, "ip", agent).await.unwrap().token);
    }

    app.auth.logout_all(&user.id).await.unwrap();
    for token in &tokens {
        assert_eq!(
            app.auth.validate_token(token).await.unwrap_err().kind,
            ErrorKind::InvalidToken
        );
    }
    assert!(app.sessions.is_empty().await);
}

#[tokio::test]
async fn test_login_cap_matches_session_limit() {
    let app = helpers::TestApp::new().await;
    let user = app.register("gina@example.com").await;
    let creds = Credentials::new("gina@example.com", STRONG_PASSWORD);

    let first = app.auth.login(&creds, "ip", "ua").await.unwrap();
    for _ in 0..5 {
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        app.auth.login(&creds, "ip", "ua").await.unwrap();
    }

    let active = app.auth.sessions().get_by_user_id(&user.id).await.unwrap();
    assert_eq!(active.len(), 5);
    assert!(active.iter().all(|s| s.id != first.session.id));
}

#[tokio::test]
async fn test_weak_password_rejected() {
    let app = helpers::TestApp::new().await;
    let err = app
        .auth
        .register(&Registration {
            email: "hank@example.com".to_string(),
            username: "hank".to_string(),
            password: "qwerty12".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}
