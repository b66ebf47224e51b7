// Authentication middleware for protected routes

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::{error::AuthError, token::Claims};
use crate::state::AppState;
use crate::users::Role;

/// Authenticated user extractor for protected routes
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.id,
            email: claims.email,
            role: claims.role,
        }
    }
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Admins may act on any account, everybody else only on their own
    pub fn ensure_self_or_admin(&self, user_id: i32) -> Result<(), AuthError> {
        if self.is_admin() || self.user_id == user_id {
            return Ok(());
        }
        warn!(
            "Access denied: user_id={} tried to reach user_id={}",
            self.user_id, user_id
        );
        Err(AuthError::NotResourceOwner)
    }
}

/// Pulls the token out of `Authorization: Bearer <jwt>`; the scheme is case-insensitive
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    let (scheme, token) = value.trim().split_once(' ').ok_or(AuthError::InvalidToken)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::InvalidToken);
    }
    Ok(token)
}

fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(headers)?;
    let claims = state.tokens.validate_access_token(token)?;
    Ok(claims.into())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already resolved by a role gate further out
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }
        authenticate(&parts.headers, state).map_err(|e| {
            debug!("Bearer authentication failed on {}: {}", parts.uri.path(), e);
            e
        })
    }
}

/// Role gate restricting a route to a set of roles
///
/// Successful checks leave the [`AuthenticatedUser`] in the request
/// extensions, so handlers behind the gate do not decode the token twice.
#[derive(Debug, Clone)]
pub struct RequireRole {
    allowed: Vec<Role>,
}

impl RequireRole {
    pub fn new(allowed: Vec<Role>) -> Self {
        Self { allowed }
    }

    pub fn admin() -> Self {
        Self::new(vec![Role::Admin])
    }

    /// Any authenticated account
    pub fn any_user() -> Self {
        Self::new(vec![Role::User, Role::Admin])
    }

    pub fn check(&self, user: &AuthenticatedUser) -> Result<(), AuthError> {
        if self.allowed.contains(&user.role) {
            Ok(())
        } else {
            Err(AuthError::InsufficientPermissions {
                allowed: self.allowed.clone(),
                actual: user.role,
            })
        }
    }

    pub async fn enforce(
        &self,
        state: &AppState,
        mut request: Request,
        next: Next,
    ) -> Result<Response, AuthError> {
        let endpoint = request.uri().path().to_string();

        let user = authenticate(request.headers(), state).map_err(|e| {
            warn!("Rejected request to protected endpoint {}: {}", endpoint, e);
            e
        })?;

        if let Err(e) = self.check(&user) {
            warn!(
                "Authorization failed: user_id={}, role={}, endpoint={}",
                user.user_id, user.role, endpoint
            );
            return Err(e);
        }

        debug!(
            "Authorization successful: user_id={}, role={}, endpoint={}",
            user.user_id, user.role, endpoint
        );
        request.extensions_mut().insert(user);
        Ok(next.run(request).await)
    }
}

/// `middleware::from_fn_with_state` adapter for admin-only routes
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    RequireRole::admin().enforce(&state, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenType;
    use crate::config::AppConfig;
    use crate::users::{InMemoryUserRepository, User};
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(AppConfig::default(), Arc::new(InMemoryUserRepository::new()))
    }

    fn user(id: i32, role: Role) -> User {
        User {
            id,
            email: format!("user{}@example.com", id),
            password_hash: String::new(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = HttpRequest::builder().uri("/");
        if let Some(value) = value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    async fn extract(state: &AppState, value: Option<&str>) -> Result<AuthenticatedUser, AuthError> {
        let mut parts = parts_with_auth(value);
        AuthenticatedUser::from_request_parts(&mut parts, state).await
    }

    #[tokio::test]
    async fn valid_access_token_is_accepted() {
        let state = test_state();
        let token = state.tokens.generate_access_token(&user(42, Role::User)).unwrap();

        let extracted = extract(&state, Some(&format!("Bearer {}", token))).await.unwrap();
        assert_eq!(extracted.user_id, 42);
        assert_eq!(extracted.email, "user42@example.com");
        assert_eq!(extracted.role, Role::User);
    }

    #[tokio::test]
    async fn bearer_scheme_is_case_insensitive() {
        let state = test_state();
        let token = state.tokens.generate_access_token(&user(1, Role::User)).unwrap();
        assert!(extract(&state, Some(&format!("bearer {}", token))).await.is_ok());
        assert!(extract(&state, Some(&format!("BEARER  {}", token))).await.is_ok());
    }

    #[tokio::test]
    async fn missing_and_malformed_headers_are_rejected() {
        let state = test_state();
        assert_eq!(extract(&state, None).await, Err(AuthError::MissingToken));

        for value in [
            "Bearer invalid_token",
            "Bearer ",
            "token_without_scheme",
            "Basic dXNlcjpwYXNz",
        ] {
            assert!(extract(&state, Some(value)).await.is_err(), "{}", value);
        }
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let state = test_state();
        let claims = Claims {
            id: 1,
            email: "test@example.com".to_string(),
            role: Role::User,
            typ: TokenType::Access,
            iat: Utc::now().timestamp() - 1000,
            exp: Utc::now().timestamp() - 500,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(state.config.jwt.secret.as_bytes()),
        )
        .unwrap();

        assert_eq!(
            extract(&state, Some(&format!("Bearer {}", token))).await,
            Err(AuthError::ExpiredToken)
        );
    }

    #[tokio::test]
    async fn refresh_token_is_not_a_bearer_token() {
        let state = test_state();
        let token = state.tokens.generate_refresh_token(&user(1, Role::User)).unwrap();
        assert_eq!(
            extract(&state, Some(&format!("Bearer {}", token))).await,
            Err(AuthError::WrongTokenType)
        );
    }

    #[test]
    fn role_gate_lists_allowed_roles() {
        let member = AuthenticatedUser {
            user_id: 1,
            email: "u@example.com".to_string(),
            role: Role::User,
        };
        assert!(RequireRole::any_user().check(&member).is_ok());

        let err = RequireRole::admin().check(&member).unwrap_err();
        assert_eq!(err.to_string(), "Access denied. Required roles: admin");
    }

    #[test]
    fn self_or_admin_guard() {
        let member = AuthenticatedUser {
            user_id: 5,
            email: "u@example.com".to_string(),
            role: Role::User,
        };
        assert!(member.ensure_self_or_admin(5).is_ok());
        assert_eq!(member.ensure_self_or_admin(6), Err(AuthError::NotResourceOwner));

        let admin = AuthenticatedUser {
            role: Role::Admin,
            ..member
        };
        assert!(admin.ensure_self_or_admin(6).is_ok());
    }

    fn admin_router(state: AppState) -> Router {
        Router::new()
            .route("/admin", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
            .with_state(state)
    }

    async fn call_admin(state: &AppState, auth: Option<String>) -> StatusCode {
        let mut builder = HttpRequest::builder().uri("/admin");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        admin_router(state.clone())
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn require_admin_middleware_gates_by_role() {
        let state = test_state();
        let admin = state.tokens.generate_access_token(&user(1, Role::Admin)).unwrap();
        let member = state.tokens.generate_access_token(&user(2, Role::User)).unwrap();

        assert_eq!(call_admin(&state, None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            call_admin(&state, Some(format!("Bearer {}", member))).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            call_admin(&state, Some(format!("Bearer {}", admin))).await,
            StatusCode::OK
        );
    }
}
