//! End-to-end session lifecycle over the real router, backed by in-memory
//! repositories.

use crate::common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use keygate::domain::users::User;
use keygate::infrastructure::repositories::mock::{
    MockRefreshTokenRepository, MockUserRepository,
};
use keygate::testing::test_user_with_password;
use serde_json::{Value, json};
use tower::ServiceExt;

const ORIGIN: &str = "http://localhost:3000";

fn app_with_user(user: User) -> Router {
    let state = common::mock_app_state(
        MockUserRepository::new().with_user(user),
        MockRefreshTokenRepository::new(),
    );
    keygate::presentation::router::app(state)
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Pull the refresh-token value out of the response's Set-Cookie header.
fn refresh_cookie_value(response: &Response) -> Option<String> {
    let set_cookie = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    let (name_value, _) = set_cookie.split_once(';')?;
    let (name, value) = name_value.split_once('=')?;
    assert_eq!(name, "keygate_refresh");
    Some(value.to_string())
}

fn login_request(email: &str, password: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/v1/auth/login")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "email": email, "password": password }).to_string(),
        ))
        .unwrap()
}

fn refresh_request(cookie: &str, origin: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri("/api/v1/auth/refresh")
        .method("POST")
        .header(header::COOKIE, format!("keygate_refresh={cookie}"));
    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_full_session_lifecycle() {
    let user = test_user_with_password("alice@example.com", "hunter2!!");
    let app = app_with_user(user);

    // Login: access token in the body, refresh token in the cookie.
    let response = app
        .clone()
        .oneshot(login_request("alice@example.com", "hunter2!!"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie_r1 = refresh_cookie_value(&response).expect("login sets refresh cookie");
    let set_cookie = response.headers().get(header::SET_COOKIE).unwrap();
    let cookie_str = set_cookie.to_str().unwrap();
    assert!(cookie_str.contains("HttpOnly"));
    assert!(cookie_str.contains("SameSite=Strict"));
    assert!(cookie_str.contains("Secure"));

    let body = body_json(response).await;
    let token_t1 = body["data"]["access_token"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert!(body["data"].get("refresh_token").is_none());

    // Refresh with R1: a new pair, both different from the first.
    let response = app
        .clone()
        .oneshot(refresh_request(&cookie_r1, Some(ORIGIN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie_r2 = refresh_cookie_value(&response).expect("refresh resets the cookie");
    assert_ne!(cookie_r2, cookie_r1);

    let body = body_json(response).await;
    let token_t2 = body["data"]["access_token"].as_str().unwrap().to_string();
    assert_ne!(token_t2, token_t1);

    // Replaying R1 fails and clears the stale cookie.
    let response = app
        .clone()
        .oneshot(refresh_request(&cookie_r1, Some(ORIGIN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cleared.contains("Max-Age=0"));

    // R2 is still good.
    let response = app
        .oneshot(refresh_request(&cookie_r2, Some(ORIGIN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rejects_foreign_or_missing_origin() {
    let user = test_user_with_password("alice@example.com", "hunter2!!");
    let app = app_with_user(user);

    let response = app
        .clone()
        .oneshot(login_request("alice@example.com", "hunter2!!"))
        .await
        .unwrap();
    let cookie = refresh_cookie_value(&response).unwrap();

    let response = app
        .clone()
        .oneshot(refresh_request(&cookie, Some("https://evil.example")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(refresh_request(&cookie, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The cookie survived both rejections; the original origin still works.
    let response = app
        .oneshot(refresh_request(&cookie, Some(ORIGIN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unauthorized_body_never_names_the_failed_check() {
    let user = test_user_with_password("alice@example.com", "hunter2!!");
    let app = app_with_user(user);

    // Wrong password vs unknown refresh token: byte-identical error bodies.
    let response = app
        .clone()
        .oneshot(login_request("alice@example.com", "wrong-password"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bad_login = body_json(response).await;

    let response = app
        .oneshot(refresh_request("never-issued-token", Some(ORIGIN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bad_refresh = body_json(response).await;

    assert_eq!(bad_login, bad_refresh);
    assert_eq!(bad_login["errors"][0]["detail"], "Authentication failed");
}

#[tokio::test]
async fn test_logout_retires_token_and_clears_cookie() {
    let user = test_user_with_password("alice@example.com", "hunter2!!");
    let app = app_with_user(user);

    let response = app
        .clone()
        .oneshot(login_request("alice@example.com", "hunter2!!"))
        .await
        .unwrap();
    let cookie = refresh_cookie_value(&response).unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/auth/logout")
                .method("POST")
                .header(header::COOKIE, format!("keygate_refresh={cookie}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(
        response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("Max-Age=0")
    );

    // The retired token cannot be rotated.
    let response = app
        .oneshot(refresh_request(&cookie, Some(ORIGIN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_then_login() {
    let state = common::mock_app_state(
        MockUserRepository::new(),
        MockRefreshTokenRepository::new(),
    );
    let app = keygate::presentation::router::app(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/auth/register")
                .method("POST")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "email": "bob@example.com",
                        "full_name": "Bob Example",
                        "password": "long-enough-pw"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(login_request("bob@example.com", "long-enough-pw"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_validation_error_is_400() {
    let app = app_with_user(test_user_with_password("alice@example.com", "hunter2!!"));

    let response = app
        .oneshot(login_request("not-an-email", "pw"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_cleanup_requires_admin_role() {
    use keygate::domain::auth::{RefreshTokenRepository, TokenIssuer};

    let mut admin = test_user_with_password("root@example.com", "pw");
    admin.roles = vec!["User".to_string(), "Admin".to_string()];
    let plain = test_user_with_password("alice@example.com", "pw");

    let tokens = MockRefreshTokenRepository::new();
    // One purgeable row.
    tokens
        .create(keygate::domain::auth::NewRefreshToken {
            user_id: admin.id,
            token_hash: "retired-row".to_string(),
            expires_at: time::OffsetDateTime::now_utc() + time::Duration::days(7),
        })
        .await
        .unwrap();
    tokens.retire("retired-row").await.unwrap();

    let issuer = keygate::testing::test_issuer();
    let admin_token = issuer.issue(&admin).unwrap();
    let plain_token = issuer.issue(&plain).unwrap();

    let state = common::mock_app_state(
        MockUserRepository::new().with_user(admin).with_user(plain),
        tokens,
    );
    let app = keygate::presentation::router::app(state);

    let cleanup = |bearer: Option<String>| {
        let mut builder = Request::builder()
            .uri("/api/v1/admin/cleanup-tokens")
            .method("POST");
        if let Some(token) = bearer {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    };

    // No token.
    let response = app.clone().oneshot(cleanup(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Authenticated but not an administrator.
    let response = app.clone().oneshot(cleanup(Some(plain_token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Administrator: the retired row is purged and counted.
    let response = app.oneshot(cleanup(Some(admin_token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["cleanedTokens"], 1);
}
