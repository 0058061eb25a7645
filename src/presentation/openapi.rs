use crate::application::auth::login::LoginRequest;
use crate::application::auth::register::RegisterRequest;
use crate::application::auth::token_utils::AccessTokenResponse;
use crate::shared::error::{ErrorDetail, ErrorResponse};
use crate::shared::response::ApiResponse;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Keygate API",
        version = "0.1.0",
        description = "Session and token lifecycle service: short-lived signed access tokens, rotating single-use refresh tokens, background expiry sweeping and admission control."
    ),
    paths(
        crate::presentation::handlers::auth::register,
        crate::presentation::handlers::auth::login,
        crate::presentation::handlers::auth::refresh_token,
        crate::presentation::handlers::auth::logout,
        crate::presentation::handlers::admin::cleanup_tokens,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            AccessTokenResponse,
            ApiResponse<AccessTokenResponse>,
            ErrorResponse,
            ErrorDetail,
        )
    ),
    tags(
        (name = "auth", description = "Session lifecycle endpoints"),
        (name = "admin", description = "Privileged operational endpoints")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
