// Router assembly: routes, middleware stack and OpenAPI document

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{self, require_admin};
use crate::error::{reveal_internal_details, ApiError};
use crate::query::Pagination;
use crate::state::AppState;
use crate::users::{self, handlers::UserList};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        auth::handlers::register_handler,
        auth::handlers::login_handler,
        auth::handlers::refresh_handler,
        auth::handlers::me_handler,
        auth::handlers::logout_handler,
        auth::handlers::validate_handler,
        users::handlers::list_users_handler,
        users::handlers::create_user_handler,
        users::handlers::get_user_handler,
        users::handlers::update_user_handler,
        users::handlers::delete_user_handler,
        users::handlers::change_password_handler,
    ),
    components(schemas(
        HealthStatus,
        auth::RegisterRequest,
        auth::LoginRequest,
        auth::RefreshRequest,
        auth::ValidateTokenRequest,
        auth::AuthResponse,
        auth::UserEnvelope,
        auth::ValidateResponse,
        auth::TokenPair,
        auth::Claims,
        auth::TokenType,
        users::Role,
        users::UserResponse,
        users::CreateUserRequest,
        users::UpdateUserRequest,
        users::ChangePasswordRequest,
        UserList,
        Pagination,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and token management"),
        (name = "users", description = "User account management"),
        (name = "health", description = "Service liveness")
    ),
    info(
        title = "User Auth API",
        version = "1.0.0",
        description = "User registration, JWT authentication and profile management"
    )
)]
pub struct ApiDoc;

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
            );
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "ok")]
    pub status: String,
    pub timestamp: chrono::DateTime<Utc>,
}

/// Handler for GET /health and /api/health
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthStatus)),
    tag = "health"
)]
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}

fn cors_layer(origin: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match origin.parse::<HeaderValue>() {
        Ok(value) if origin != "*" => base.allow_origin(value).allow_credentials(true),
        _ => {
            tracing::warn!("CORS origin '{}' is a wildcard or invalid, allowing any origin", origin);
            base.allow_origin(Any)
        }
    }
}

/// Creates and configures the application router
pub fn create_router(state: AppState) -> Router {
    let admin_only = || middleware::from_fn_with_state(state.clone(), require_admin);

    let auth_routes = Router::new()
        .route("/register", post(auth::register_handler))
        .route("/login", post(auth::login_handler))
        .route("/refresh", post(auth::refresh_handler))
        .route("/me", get(auth::me_handler))
        .route("/logout", post(auth::logout_handler))
        .route("/validate", post(auth::validate_handler));

    let user_routes = Router::new()
        .route(
            "/",
            get(users::handlers::list_users_handler)
                .post(users::handlers::create_user_handler)
                .route_layer(admin_only()),
        )
        .route(
            "/:id",
            get(users::handlers::get_user_handler)
                .put(users::handlers::update_user_handler)
                .merge(delete(users::handlers::delete_user_handler).route_layer(admin_only())),
        )
        .route("/:id/password", put(users::handlers::change_password_handler));

    let cors = cors_layer(&state.config.cors_origin);
    let development = state.config.is_development();

    let mut router = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .route("/api/health", get(health))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .method_not_allowed_fallback(|| async { ApiError::MethodNotAllowed })
        .fallback(|| async { ApiError::not_found("Route") });
    if development {
        router = router.layer(middleware::from_fn(reveal_internal_details));
    }

    router
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                tracing::info_span!("http_request", %method, uri = %uri)
            }),
        )
}
