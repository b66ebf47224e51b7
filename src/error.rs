// Error handling module for the user API
// Provides the central error type and its conversion into the response envelope

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::response::ApiResponse;
use crate::validation::summarize_errors;

/// Debug rendering of a 500's cause, attached to the response extensions
///
/// Only [`reveal_internal_details`] copies it into the body.
#[derive(Debug, Clone)]
pub struct InternalDetails(pub Value);

/// Main error type for the API
/// All handlers return Result<T, ApiError>
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or rule-breaking input (400)
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    /// Missing, invalid or expired credentials (401)
    #[error("{0}")]
    Authentication(String),

    /// Authenticated but not allowed (403)
    #[error("{0}")]
    Authorization(String),

    /// Resource not found (404)
    #[error("{0} not found")]
    NotFound(String),

    /// Path exists but not for this method (405)
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Unique constraint collision (409)
    #[error("{0}")]
    Conflict(String),

    /// Database failure (500), details hidden from clients
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Anything else (500), details hidden from clients
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        ApiError::Authentication(message.into())
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        ApiError::Authorization(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        ApiError::NotFound(resource.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Authentication(_) => "AUTHENTICATION_ERROR",
            ApiError::Authorization(_) => "AUTHORIZATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message that is safe to send to clients
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Database(_) => "A database error occurred".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    fn log(&self) {
        match self {
            ApiError::Validation { message, .. } => debug!("Validation error: {}", message),
            ApiError::NotFound(resource) => debug!("{} not found", resource),
            ApiError::MethodNotAllowed => debug!("Method not allowed"),
            ApiError::Authentication(message) => warn!("Authentication failed: {}", message),
            ApiError::Authorization(message) => warn!("Access denied: {}", message),
            ApiError::Conflict(message) => warn!("Conflict: {}", message),
            ApiError::Database(db_error) => error!("Database error: {:?}", db_error),
            ApiError::Internal(message) => error!("Internal error: {}", message),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            ApiError::Validation { details, .. } => details.clone(),
            _ => None,
        }
    }

    fn internal_details(&self) -> Option<Value> {
        match self {
            ApiError::Database(db_error) => Some(Value::String(format!("{:?}", db_error))),
            ApiError::Internal(message) => Some(Value::String(message.clone())),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let body: ApiResponse<Value> =
            ApiResponse::failure(self.client_message(), self.code(), self.details());
        let mut response = (self.status_code(), Json(body)).into_response();
        if let Some(details) = self.internal_details() {
            response.extensions_mut().insert(InternalDetails(details));
        }
        response
    }
}

/// Development-only layer copying [`InternalDetails`] into the envelope's `details`
pub async fn reveal_internal_details(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let Some(InternalDetails(details)) = response.extensions().get::<InternalDetails>().cloned()
    else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to buffer error response: {}", e);
            return Response::from_parts(parts, Body::empty());
        }
    };

    let rewritten = serde_json::from_slice::<ApiResponse<Value>>(&bytes)
        .and_then(|mut envelope| {
            envelope.details = Some(details);
            serde_json::to_vec(&envelope)
        });
    match rewritten {
        Ok(body) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(body))
        }
        Err(_) => Response::from_parts(parts, Body::from(bytes)),
    }
}

/// Constraint violations become client errors, everything else is a 500
impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &error {
            if db_err.is_unique_violation() {
                return ApiError::Conflict(
                    "A record with this information already exists".to_string(),
                );
            }
            if db_err.is_foreign_key_violation() {
                return ApiError::validation("Referenced record does not exist");
            }
            if db_err.is_check_violation() {
                return ApiError::validation("Invalid data provided");
            }
        }
        ApiError::Database(error)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation {
            message: summarize_errors(&errors),
            details: serde_json::to_value(&errors).ok(),
        }
    }
}
