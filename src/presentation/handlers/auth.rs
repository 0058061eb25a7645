use crate::application::auth::login::{LoginRequest, LoginUseCase};
use crate::application::auth::logout::LogoutUseCase;
use crate::application::auth::register::{RegisterRequest, RegisterUseCase};
use crate::application::auth::rotate::RotateTokenUseCase;
use crate::application::auth::token_utils::AccessTokenResponse;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::state::AppState;
use crate::shared::error::{AppError, ErrorResponse};
use crate::shared::response::ApiResponse;
use crate::shared::validation::ValidatedJson;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde_json::json;

const REFRESH_COOKIE_NAME: &str = "keygate_refresh";

/// The narrowest path prefix covering the refresh and logout endpoints; the
/// cookie is never sent anywhere else.
const REFRESH_COOKIE_PATH: &str = "/api/v1/auth";

fn refresh_cookie(config: &AppConfig, token: &str) -> Result<HeaderValue, AppError> {
    let mut cookie = format!(
        "{REFRESH_COOKIE_NAME}={token}; Path={REFRESH_COOKIE_PATH}; HttpOnly; SameSite=Strict; Max-Age={}",
        config.refresh_token_ttl_secs
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("invalid cookie value: {e}")))
}

fn clear_refresh_cookie(config: &AppConfig) -> HeaderValue {
    let mut cookie = format!(
        "{REFRESH_COOKIE_NAME}=; Path={REFRESH_COOKIE_PATH}; HttpOnly; SameSite=Strict; Max-Age=0"
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).expect("static cookie string is a valid header value")
}

fn extract_refresh_cookie(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    for pair in value.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == REFRESH_COOKIE_NAME && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

fn origin_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::ORIGIN)
        .and_then(|v| v.to_str().ok())
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered successfully"),
        (status = 400, description = "Validation error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let use_case = RegisterUseCase::new(state.users.clone(), state.passwords.clone());
    use_case.execute(req).await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AccessTokenResponse>),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 400, description = "Validation error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Response, AppError> {
    let use_case = LoginUseCase::new(
        state.users.clone(),
        state.refresh_tokens.clone(),
        state.issuer.clone(),
        state.passwords.clone(),
        state.config.access_token_ttl_secs,
        state.config.refresh_token_ttl_secs,
    );

    let issued = use_case.execute(req).await?;
    let cookie = refresh_cookie(&state.config, &issued.refresh_token)?;

    let mut response = (
        StatusCode::OK,
        Json(ApiResponse::new(issued.into_response())),
    )
        .into_response();
    response.headers_mut().append(SET_COOKIE, cookie);
    Ok(response)
}

/// Rotate the refresh token and obtain a fresh access token
///
/// The refresh token travels only in an HttpOnly cookie; the request must
/// carry an allow-listed Origin header.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Token refreshed successfully", body = ApiResponse<AccessTokenResponse>),
        (status = 401, description = "Invalid, expired or replayed refresh token", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn refresh_token(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let use_case = RotateTokenUseCase::new(
        state.users.clone(),
        state.refresh_tokens.clone(),
        state.issuer.clone(),
        state.config.allowed_origins.clone(),
        state.config.access_token_ttl_secs,
        state.config.refresh_token_ttl_secs,
    );

    let presented = extract_refresh_cookie(&headers);
    let origin = origin_header(&headers);

    match use_case.execute(presented.as_deref(), origin).await {
        Ok(issued) => {
            let cookie = match refresh_cookie(&state.config, &issued.refresh_token) {
                Ok(cookie) => cookie,
                Err(e) => return e.into_response(),
            };
            let mut response = (
                StatusCode::OK,
                Json(ApiResponse::new(issued.into_response())),
            )
                .into_response();
            response.headers_mut().append(SET_COOKIE, cookie);
            response
        }
        Err(err) => {
            let clear = err.should_clear_cookie();
            let mut response = AppError::from(err).into_response();
            if clear {
                response
                    .headers_mut()
                    .append(SET_COOKIE, clear_refresh_cookie(&state.config));
            }
            response
        }
    }
}

/// Logout and retire the refresh token
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let use_case = LogoutUseCase::new(state.refresh_tokens.clone());
    let presented = extract_refresh_cookie(&headers);

    let status = match use_case.execute(presented.as_deref()).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => return e.into_response(),
    };

    // The cookie goes away even when no matching row existed.
    let mut response = status.into_response();
    response
        .headers_mut()
        .append(SET_COOKIE, clear_refresh_cookie(&state.config));
    response
}
