// Authentication and authorization error types

use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::error::ApiError;
use crate::users::Role;

/// Failures raised by the token, password and access-control layers
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    /// An access token was presented where a refresh token was expected, or the reverse
    #[error("Wrong token type")]
    WrongTokenType,

    #[error("Missing authentication token")]
    MissingToken,

    #[error("Password hashing error")]
    PasswordHashError,

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),

    /// User lacks one of the roles allowed on the endpoint
    #[error("Access denied. Required roles: {}", format_roles(.allowed))]
    InsufficientPermissions { allowed: Vec<Role>, actual: Role },

    /// Non-admin touching somebody else's record
    #[error("Access denied. You can only access your own data.")]
    NotResourceOwner,
}

fn format_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::WrongTokenType
            | AuthError::MissingToken => ApiError::Authentication(err.to_string()),
            AuthError::InsufficientPermissions { .. } | AuthError::NotResourceOwner => {
                ApiError::Authorization(err.to_string())
            }
            AuthError::PasswordHashError => {
                error!("Password hashing error");
                ApiError::Internal(err.to_string())
            }
            AuthError::TokenGenerationError(msg) => {
                error!("Token generation error: {}", msg);
                ApiError::Internal(format!("Token generation error: {}", msg))
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
