// User accounts module
// Models, storage and the user management service

pub mod handlers;
pub mod memory;
pub mod models;
pub mod repository;
pub mod service;

pub use memory::InMemoryUserRepository;
pub use models::{
    normalize_email, ChangePasswordRequest, CreateUserRequest, NewUser, Role,
    UpdateUserRequest, User, UserChanges, UserResponse,
};
pub use repository::{PgUserRepository, UserRepository};
pub use service::UserService;
