// HTTP handlers for authentication endpoints

use axum::extract::State;
use serde_json::Value;

use crate::auth::{
    middleware::AuthenticatedUser,
    models::{
        AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, UserEnvelope,
        ValidateResponse, ValidateTokenRequest,
    },
    token::TokenPair,
};
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::response::{self, Envelope};
use crate::state::AppState;
use validator::Validate;

/// Handler for POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid input or email already in use")
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<Envelope<AuthResponse>, ApiError> {
    tracing::debug!("Registration request received");
    let result = state.auth.register(request).await?;
    Ok(response::created(result, "User registered successfully"))
}

/// Handler for POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Invalid credentials or deactivated account")
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Envelope<AuthResponse>, ApiError> {
    let result = state.auth.login(request).await?;
    Ok(response::ok(result, "Login successful"))
}

/// Handler for POST /api/auth/refresh
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 400, description = "Refresh token missing"),
        (status = 401, description = "Invalid or expired refresh token")
    ),
    tag = "auth"
)]
pub async fn refresh_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RefreshRequest>,
) -> Result<Envelope<TokenPair>, ApiError> {
    request.validate()?;
    let tokens = state.auth.refresh_token(&request.refresh_token).await?;
    Ok(response::ok(tokens, "Token refreshed successfully"))
}

/// Handler for GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Profile of the caller", body = UserEnvelope),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Account no longer exists")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Envelope<UserEnvelope>, ApiError> {
    let profile = state.auth.current_user(user.user_id).await?;
    Ok(response::ok(
        UserEnvelope { user: profile },
        "User profile retrieved successfully",
    ))
}

/// Handler for POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Envelope<Value>, ApiError> {
    state.auth.logout(user.user_id).await?;
    Ok(response::message("Logout successful"))
}

/// Handler for POST /api/auth/validate
#[utoipa::path(
    post,
    path = "/api/auth/validate",
    request_body = ValidateTokenRequest,
    responses(
        (status = 200, description = "Decoded claims", body = ValidateResponse),
        (status = 400, description = "Token missing"),
        (status = 401, description = "Invalid or expired token")
    ),
    tag = "auth"
)]
pub async fn validate_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ValidateTokenRequest>,
) -> Result<Envelope<ValidateResponse>, ApiError> {
    request.validate()?;
    let payload = state.auth.validate_token(&request.token).await?;
    Ok(response::ok(ValidateResponse { payload }, "Token is valid"))
}
