// Authentication data models and DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::token::{Claims, TokenPair};
use crate::users::{Role, UserResponse};
use crate::validation::{
    validate_password_complexity, validate_person_name, validate_register_confirmation,
};

/// Registration request DTO
///
/// `role` is accepted for compatibility with older clients but ignored:
/// self-registered accounts are always regular users.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_registration", skip_on_field_errors = false))]
pub struct RegisterRequest {
    #[validate(email(message = "Valid email is required"))]
    #[schema(example = "jane.doe@example.com")]
    pub email: String,
    #[validate(
        length(min = 6, max = 128, message = "Password must be between 6 and 128 characters long"),
        custom = "validate_password_complexity"
    )]
    #[schema(example = "Secret123")]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_password: Option<String>,
    #[validate(
        length(min = 2, max = 50, message = "First name must be between 2 and 50 characters long"),
        custom = "validate_person_name"
    )]
    #[schema(example = "Jane")]
    pub first_name: String,
    #[validate(
        length(min = 2, max = 50, message = "Last name must be between 2 and 50 characters long"),
        custom = "validate_person_name"
    )]
    #[schema(example = "Doe")]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

fn validate_registration(request: &RegisterRequest) -> Result<(), validator::ValidationError> {
    validate_register_confirmation(&request.password, request.confirm_password.as_deref())
}

/// Login request DTO
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Valid email is required"))]
    #[schema(example = "admin@thales.com")]
    pub email: String,
    #[validate(length(min = 1, max = 128, message = "Password is required (max 128 characters)"))]
    #[schema(example = "admin123")]
    pub password: String,
}

/// Token refresh request DTO
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Token validation request DTO
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ValidateTokenRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

/// Authentication response DTO (register and login)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

impl AuthResponse {
    pub fn new(user: UserResponse, tokens: TokenPair) -> Self {
        Self {
            user,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }
}

/// Payload of GET /api/auth/me and of the single-user endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

/// Payload of POST /api/auth/validate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ValidateResponse {
    pub payload: Claims,
}
