use crate::common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use keygate::infrastructure::repositories::mock::{
    MockRefreshTokenRepository, MockUserRepository,
};
use tower::ServiceExt;

#[tokio::test]
async fn test_health_reports_unhealthy_without_database() {
    let state = common::mock_app_state(
        MockUserRepository::new(),
        MockRefreshTokenRepository::new(),
    );
    let app = keygate::presentation::router::app(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
