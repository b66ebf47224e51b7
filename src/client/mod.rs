// Client-side session management for frontends consuming the API

pub mod api;
pub mod error;
pub mod routes;
pub mod session;
pub mod store;

pub use api::{ApiClient, DEFAULT_BASE_URL};
pub use error::ClientError;
pub use routes::{guard, Route, RouteDecision};
pub use session::{SessionManager, SessionState};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoredSession};
