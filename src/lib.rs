// User accounts API: JWT authentication, role-guarded user management and a
// client-side session manager for frontends talking to it

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod query;
pub mod response;
pub mod state;
pub mod users;
pub mod validation;

pub use app::create_router;
pub use config::AppConfig;
pub use error::ApiError;
pub use state::AppState;
