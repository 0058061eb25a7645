//! Use-case sequences over one shared in-memory store: the lifecycle as the
//! handlers drive it, minus HTTP.

use keygate::application::auth::cleanup::CleanupTokensUseCase;
use keygate::application::auth::login::{LoginRequest, LoginUseCase};
use keygate::application::auth::logout::LogoutUseCase;
use keygate::application::auth::rotate::{RotateTokenUseCase, RotationError};
use keygate::application::auth::token_utils::hash_token;
use keygate::domain::auth::RefreshTokenRepository;
use keygate::infrastructure::password::PasswordService;
use keygate::infrastructure::repositories::mock::{
    MockRefreshTokenRepository, MockUserRepository,
};
use keygate::testing::{test_issuer, test_user_with_password};
use std::sync::Arc;

const ORIGIN: &str = "http://localhost:3000";

struct Harness {
    tokens: MockRefreshTokenRepository,
    login: LoginUseCase,
    rotate: RotateTokenUseCase,
    logout: LogoutUseCase,
    cleanup: CleanupTokensUseCase,
}

fn harness(users: MockUserRepository) -> Harness {
    let tokens = MockRefreshTokenRepository::new();
    let users = Arc::new(users);
    let token_repo: Arc<dyn RefreshTokenRepository> = Arc::new(tokens.clone());

    Harness {
        tokens,
        login: LoginUseCase::new(
            users.clone(),
            token_repo.clone(),
            test_issuer(),
            Arc::new(PasswordService::new()),
            86_400,
            604_800,
        ),
        rotate: RotateTokenUseCase::new(
            users,
            token_repo.clone(),
            test_issuer(),
            vec![ORIGIN.to_string()],
            86_400,
            604_800,
        ),
        logout: LogoutUseCase::new(token_repo.clone()),
        cleanup: CleanupTokensUseCase::new(token_repo),
    }
}

#[tokio::test]
async fn test_login_rotate_replay_sequence() {
    let user = test_user_with_password("alice@example.com", "hunter2!");
    let h = harness(MockUserRepository::new().with_user(user));

    let first = h
        .login
        .execute(LoginRequest {
            email: "alice@example.com".to_string(),
            password: "hunter2!".to_string(),
        })
        .await
        .unwrap();

    let rotated = h
        .rotate
        .execute(Some(&first.refresh_token), Some(ORIGIN))
        .await
        .unwrap();

    assert_ne!(rotated.access_token, first.access_token);
    assert_ne!(rotated.refresh_token, first.refresh_token);

    // Replaying the first refresh token must fail now.
    let err = h
        .rotate
        .execute(Some(&first.refresh_token), Some(ORIGIN))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RotationError::InvalidToken | RotationError::UnknownToken
    ));

    // The rotated token still works.
    h.rotate
        .execute(Some(&rotated.refresh_token), Some(ORIGIN))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_logout_then_rotate_fails_and_cleanup_sweeps_the_row() {
    let user = test_user_with_password("alice@example.com", "hunter2!");
    let h = harness(MockUserRepository::new().with_user(user));

    let issued = h
        .login
        .execute(LoginRequest {
            email: "alice@example.com".to_string(),
            password: "hunter2!".to_string(),
        })
        .await
        .unwrap();

    h.logout.execute(Some(&issued.refresh_token)).await.unwrap();

    let err = h
        .rotate
        .execute(Some(&issued.refresh_token), Some(ORIGIN))
        .await
        .unwrap_err();
    assert!(err.should_clear_cookie());

    // The rotation attempt already deleted the retired row eagerly; a
    // cleanup pass finds nothing further.
    let report = h.cleanup.execute().await.unwrap();
    assert_eq!(report.cleaned_tokens, 0);
    assert_eq!(h.tokens.token_count(), 0);
}

#[tokio::test]
async fn test_two_logins_keep_independent_chains() {
    let user = test_user_with_password("alice@example.com", "hunter2!");
    let h = harness(MockUserRepository::new().with_user(user));

    let request = || LoginRequest {
        email: "alice@example.com".to_string(),
        password: "hunter2!".to_string(),
    };

    // Two devices, two chains.
    let device_a = h.login.execute(request()).await.unwrap();
    let device_b = h.login.execute(request()).await.unwrap();
    assert_eq!(h.tokens.token_count(), 2);

    // Rotating one chain leaves the other untouched.
    h.rotate
        .execute(Some(&device_a.refresh_token), Some(ORIGIN))
        .await
        .unwrap();

    let b_row = h
        .tokens
        .find_by_hash(&hash_token(&device_b.refresh_token))
        .await
        .unwrap()
        .unwrap();
    assert!(b_row.is_valid());
}
