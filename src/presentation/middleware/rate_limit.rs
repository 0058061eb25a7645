use crate::infrastructure::state::AppState;
use crate::rate_limit::{Decision, RouteClass};
use crate::shared::error::AppError;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

/// Admission control in front of every route. Rejections are uniform 429s;
/// the caller cannot tell which policy fired.
pub async fn admission_control(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let route = classify(request.uri().path());
    let key = partition_key(&state, request.headers());

    match state.limiter.admit(&key, route).await {
        Decision::Admitted => Ok(next.run(request).await),
        rejected @ Decision::Rejected { .. } => Err(AppError::RateLimited {
            retry_after: rejected.retry_after_secs().unwrap_or(60),
        }),
    }
}

fn classify(path: &str) -> RouteClass {
    if path == "/health" || path.starts_with("/swagger-ui") || path.starts_with("/api-docs") {
        RouteClass::Exempt
    } else if path.starts_with("/api/v1/auth/") {
        RouteClass::Auth
    } else {
        RouteClass::Api
    }
}

/// Partition the global window by authenticated identity when the bearer
/// token verifies, by host header otherwise.
fn partition_key(state: &AppState, headers: &HeaderMap) -> String {
    let bearer = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    if let Some(token) = bearer {
        if let Ok(claims) = state.issuer.verify(token) {
            return claims.sub;
        }
    }

    headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
