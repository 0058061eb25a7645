use crate::common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use keygate::infrastructure::repositories::mock::{
    MockRefreshTokenRepository, MockUserRepository,
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn fresh_app() -> Router {
    let state = common::mock_app_state(
        MockUserRepository::new(),
        MockRefreshTokenRepository::new(),
    );
    keygate::presentation::router::app(state)
}

fn login_attempt() -> Request<Body> {
    Request::builder()
        .uri("/api/v1/auth/login")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "email": "alice@example.com", "password": "guess" }).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_rapid_login_attempts_hit_the_auth_bucket() {
    let app = fresh_app();

    // The auth bucket holds ten tokens; the eleventh rapid attempt must be
    // turned away regardless of credentials.
    let mut rejected = 0;
    for _ in 0..11 {
        let response = app.clone().oneshot(login_attempt()).await.unwrap();
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            rejected += 1;

            let retry_header = response
                .headers()
                .get("Retry-After")
                .expect("429 carries a Retry-After header")
                .to_str()
                .unwrap()
                .to_string();

            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body["error"], "Too many requests");
            assert_eq!(
                body["retryAfter"].as_u64().unwrap(),
                retry_header.parse::<u64>().unwrap()
            );
        }
    }

    assert!(rejected >= 1);
}

#[tokio::test]
async fn test_health_is_exempt_from_admission_control() {
    let app = fresh_app();

    // Drain the auth bucket first; health keeps answering regardless.
    for _ in 0..11 {
        let _ = app.clone().oneshot(login_attempt()).await.unwrap();
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
