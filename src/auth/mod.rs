// Authentication module
// JWT access/refresh tokens, password hashing, bearer middleware and the auth endpoints

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod token;

pub use error::AuthError;
pub use handlers::{
    login_handler, logout_handler, me_handler, refresh_handler, register_handler,
    validate_handler,
};
pub use middleware::{require_admin, AuthenticatedUser, RequireRole};
pub use models::{
    AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, UserEnvelope, ValidateResponse,
    ValidateTokenRequest,
};
pub use password::PasswordService;
pub use service::AuthService;
pub use token::{Claims, TokenPair, TokenService, TokenType};
