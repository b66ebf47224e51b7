// Application state shared across handlers

use std::sync::Arc;

use crate::auth::{password::PasswordService, service::AuthService, token::TokenService};
use crate::config::AppConfig;
use crate::users::{UserRepository, UserService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenService>,
    pub auth: AuthService,
    pub users: UserService,
}

impl AppState {
    pub fn new(config: AppConfig, repository: Arc<dyn UserRepository>) -> Self {
        Self::with_passwords(config, repository, PasswordService::default())
    }

    /// Same as [`AppState::new`] with explicit hashing cost
    pub fn with_passwords(
        config: AppConfig,
        repository: Arc<dyn UserRepository>,
        passwords: PasswordService,
    ) -> Self {
        let tokens = Arc::new(TokenService::from_config(&config.jwt));
        Self {
            auth: AuthService::new(repository.clone(), passwords.clone(), tokens.clone()),
            users: UserService::new(repository, passwords),
            tokens,
            config: Arc::new(config),
        }
    }
}
