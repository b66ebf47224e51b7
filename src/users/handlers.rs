// HTTP handlers for user management endpoints

use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::auth::{middleware::AuthenticatedUser, models::UserEnvelope, AuthError};
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam, QueryString};
use crate::query::{Pagination, QueryParams, QueryValidator};
use crate::response::{self, Envelope};
use crate::state::AppState;
use crate::users::models::{ChangePasswordRequest, CreateUserRequest, UpdateUserRequest, UserResponse};

/// Payload of GET /api/users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserList {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

/// Handler for GET /api/users (admin only)
#[utoipa::path(
    get,
    path = "/api/users",
    params(QueryParams),
    responses(
        (status = 200, description = "One page of users", body = UserList),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users_handler(
    State(state): State<AppState>,
    QueryString(params): QueryString<QueryParams>,
) -> Result<Envelope<UserList>, ApiError> {
    tracing::debug!("Listing users with {:?}", params);
    let filter = QueryValidator::validate(params).map_err(|e| ApiError::validation(e.message))?;
    let (users, pagination) = state.users.list_users(filter).await?;
    Ok(response::ok(
        UserList { users, pagination },
        "Users retrieved successfully",
    ))
}

/// Handler for POST /api/users (admin only)
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserEnvelope),
        (status = 400, description = "Invalid input or email already in use"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create_user_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateUserRequest>,
) -> Result<Envelope<UserEnvelope>, ApiError> {
    let user = state.users.create_user(request).await?;
    Ok(response::created(UserEnvelope { user }, "User created successfully"))
}

/// Handler for GET /api/users/:id (self or admin)
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserEnvelope),
        (status = 403, description = "Not the caller's own record"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    PathParam(id): PathParam<i32>,
) -> Result<Envelope<UserEnvelope>, ApiError> {
    caller.ensure_self_or_admin(id)?;
    let user = state.users.get_user(id).await?;
    Ok(response::ok(UserEnvelope { user }, "User retrieved successfully"))
}

/// Handler for PUT /api/users/:id (self or admin)
///
/// Only admins may change `role` or `isActive`.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserEnvelope),
        (status = 400, description = "Invalid input or email already taken"),
        (status = 403, description = "Not allowed to modify this record or these fields"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    PathParam(id): PathParam<i32>,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> Result<Envelope<UserEnvelope>, ApiError> {
    caller.ensure_self_or_admin(id)?;
    if !caller.is_admin() && request.touches_privileged_fields() {
        tracing::warn!(
            "User {} tried to change role or active status of user {}",
            caller.user_id,
            id
        );
        return Err(ApiError::authorization(
            "Access denied. Only administrators can change role or active status.",
        ));
    }

    let user = state.users.update_user(id, request).await?;
    Ok(response::ok(UserEnvelope { user }, "User updated successfully"))
}

/// Handler for DELETE /api/users/:id (admin only)
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_user_handler(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<Envelope<Value>, ApiError> {
    state.users.delete_user(id).await?;
    Ok(response::message("User deleted successfully"))
}

/// Handler for PUT /api/users/:id/password (own account only)
#[utoipa::path(
    put,
    path = "/api/users/{id}/password",
    params(("id" = i32, Path, description = "User ID")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "New password rejected"),
        (status = 401, description = "Current password is incorrect"),
        (status = 403, description = "Not the caller's own account")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn change_password_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    PathParam(id): PathParam<i32>,
    JsonBody(request): JsonBody<ChangePasswordRequest>,
) -> Result<Envelope<Value>, ApiError> {
    if caller.user_id != id {
        return Err(AuthError::NotResourceOwner.into());
    }
    state.users.change_password(id, request).await?;
    Ok(response::message("Password changed successfully"))
}
