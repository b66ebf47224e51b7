// User data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::{
    validate_password_complexity, validate_person_name, validate_register_confirmation,
};

/// Account role carried in the `role` column and in token claims
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("Invalid role '{}'. Must be 'admin' or 'user'", other)),
        }
    }
}

/// User database model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User response model (excludes password_hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "jane.doe@example.com")]
    pub email: String,
    #[schema(example = "Jane")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    pub role: Role,
    #[schema(example = true)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Row to insert, password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
    }
}

/// Admin-side user creation DTO
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_create_confirmation", skip_on_field_errors = false))]
pub struct CreateUserRequest {
    #[validate(email(message = "Valid email is required"))]
    #[schema(example = "new.user@example.com")]
    pub email: String,
    #[validate(
        length(min = 6, max = 128, message = "Password must be between 6 and 128 characters long"),
        custom = "validate_password_complexity"
    )]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_password: Option<String>,
    #[validate(
        length(min = 2, max = 50, message = "First name must be between 2 and 50 characters long"),
        custom = "validate_person_name"
    )]
    pub first_name: String,
    #[validate(
        length(min = 2, max = 50, message = "Last name must be between 2 and 50 characters long"),
        custom = "validate_person_name"
    )]
    pub last_name: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn validate_create_confirmation(
    request: &CreateUserRequest,
) -> Result<(), validator::ValidationError> {
    validate_register_confirmation(&request.password, request.confirm_password.as_deref())
}

/// Profile update DTO, all fields optional
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(email(message = "Valid email is required"))]
    pub email: Option<String>,
    #[validate(
        length(min = 2, max = 50, message = "First name must be between 2 and 50 characters long"),
        custom = "validate_person_name"
    )]
    pub first_name: Option<String>,
    #[validate(
        length(min = 2, max = 50, message = "Last name must be between 2 and 50 characters long"),
        custom = "validate_person_name"
    )]
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    /// Whether the request touches fields only an admin may change
    pub fn touches_privileged_fields(&self) -> bool {
        self.role.is_some() || self.is_active.is_some()
    }
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(request: UpdateUserRequest) -> Self {
        Self {
            email: request.email.map(|e| normalize_email(&e)),
            first_name: request.first_name.map(|n| n.trim().to_string()),
            last_name: request.last_name.map(|n| n.trim().to_string()),
            role: request.role,
            is_active: request.is_active,
        }
    }
}

/// Password change DTO
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_new_password_confirmation", skip_on_field_errors = false))]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(
        length(min = 6, max = 128, message = "New password must be between 6 and 128 characters long"),
        custom = "validate_password_complexity"
    )]
    pub new_password: String,
    #[validate(length(min = 1, message = "Password confirmation is required"))]
    pub confirm_new_password: String,
}

fn validate_new_password_confirmation(
    request: &ChangePasswordRequest,
) -> Result<(), validator::ValidationError> {
    validate_register_confirmation(&request.new_password, Some(&request.confirm_new_password))
}

/// Emails are compared and stored lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
