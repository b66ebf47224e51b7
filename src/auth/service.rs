// Authentication service - business logic layer

use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::auth::{
    error::AuthError,
    models::{AuthResponse, LoginRequest, RegisterRequest},
    password::PasswordService,
    token::{Claims, TokenPair, TokenService},
};
use crate::error::ApiError;
use crate::users::{normalize_email, NewUser, Role, User, UserRepository, UserResponse};

/// Authentication service coordinating all auth operations
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    passwords: PasswordService,
    tokens: Arc<TokenService>,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: PasswordService,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
        }
    }

    /// Register a new user
    ///
    /// Self-registered accounts are always active regular users, whatever
    /// role the payload asks for.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, ApiError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        if self.users.find_by_email(&email).await?.is_some() {
            debug!("Registration rejected, email already in use");
            return Err(ApiError::validation("User with this email already exists"));
        }
        if request.role == Some(Role::Admin) {
            warn!("Ignoring admin role requested during self-registration");
        }

        let password_hash = self.passwords.hash_password(&request.password)?;
        let user = self
            .users
            .create(NewUser {
                email,
                password_hash,
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                role: Role::User,
                is_active: true,
            })
            .await?;

        let tokens = self.tokens.generate_token_pair(&user)?;
        info!("User {} registered", user.id);
        Ok(AuthResponse::new(user.into(), tokens))
    }

    /// Login a user
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ApiError> {
        request.validate()?;

        let Some(user) = self
            .users
            .find_by_email(&normalize_email(&request.email))
            .await?
        else {
            self.passwords.verify_decoy(&request.password);
            debug!("Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials.into());
        };

        if !self
            .passwords
            .verify_password(&request.password, &user.password_hash)?
        {
            warn!("Failed login attempt for user {}", user.id);
            return Err(AuthError::InvalidCredentials.into());
        }
        if !user.is_active {
            warn!("Login attempt on deactivated account {}", user.id);
            return Err(ApiError::authentication("Account is deactivated"));
        }

        let tokens = self.tokens.generate_token_pair(&user)?;
        info!("User {} logged in", user.id);
        Ok(AuthResponse::new(user.into(), tokens))
    }

    /// Exchange a refresh token for a new pair
    ///
    /// The new pair is built from the stored user, so role changes made
    /// since the last login take effect here.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let claims = self.tokens.validate_refresh_token(refresh_token)?;
        let user = self
            .active_user(claims.id)
            .await?
            .ok_or_else(|| ApiError::authentication("Invalid refresh token"))?;

        debug!("Refreshing tokens for user {}", user.id);
        Ok(self.tokens.generate_token_pair(&user)?)
    }

    /// Decode an access token and check its subject is still an active user
    pub async fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let claims = self.tokens.validate_access_token(token)?;
        if self.active_user(claims.id).await?.is_none() {
            return Err(AuthError::InvalidToken.into());
        }
        Ok(claims)
    }

    /// Tokens are stateless; logging out only confirms the account exists
    pub async fn logout(&self, user_id: i32) -> Result<(), ApiError> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(ApiError::authentication("User not found"));
        }
        info!("User {} logged out", user_id);
        Ok(())
    }

    pub async fn current_user(&self, user_id: i32) -> Result<UserResponse, ApiError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| ApiError::not_found("User"))
    }

    async fn active_user(&self, id: i32) -> Result<Option<User>, ApiError> {
        Ok(self.users.find_by_id(id).await?.filter(|u| u.is_active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{InMemoryUserRepository, UserChanges};
    use argon2::Params;

    const SECRET: &str = "test_secret_key_for_testing_purposes";

    struct Harness {
        repo: Arc<InMemoryUserRepository>,
        service: AuthService,
    }

    fn harness() -> Harness {
        let repo = Arc::new(InMemoryUserRepository::new());
        let service = AuthService::new(
            repo.clone(),
            PasswordService::with_params(Params::new(8, 1, 1, None).unwrap()),
            Arc::new(TokenService::new(SECRET)),
        );
        Harness { repo, service }
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "Secret123".to_string(),
            confirm_password: Some("Secret123".to_string()),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            role: None,
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn register_ignores_requested_admin_role() {
        let h = harness();
        let mut request = register_request("Jane@Example.com");
        request.role = Some(Role::Admin);

        let response = h.service.register(request).await.unwrap();
        assert_eq!(response.user.role, Role::User);
        assert_eq!(response.user.email, "jane@example.com");

        let claims = h.service.validate_token(&response.access_token).await.unwrap();
        assert_eq!(claims.role, Role::User);
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_validation_error() {
        let h = harness();
        h.service.register(register_request("jane@example.com")).await.unwrap();
        let err = h
            .service
            .register(register_request("JANE@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[tokio::test]
    async fn login_tokens_validate_and_wrong_password_fails() {
        let h = harness();
        h.service.register(register_request("jane@example.com")).await.unwrap();

        let response = h
            .service
            .login(login_request("jane@example.com", "Secret123"))
            .await
            .unwrap();
        let claims = h.service.validate_token(&response.access_token).await.unwrap();
        assert_eq!(claims.email, "jane@example.com");

        let err = h
            .service
            .login(login_request("jane@example.com", "Secret124"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");

        let err = h
            .service
            .login(login_request("nobody@example.com", "Secret123"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn unknown_email_still_pays_for_a_verification() {
        let h = harness();
        assert!(!h.service.passwords.decoy_ready());

        let err = h
            .service
            .login(login_request("ghost@example.com", "Secret123"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(h.service.passwords.decoy_ready());
    }

    #[tokio::test]
    async fn deactivated_users_cannot_login_or_refresh() {
        let h = harness();
        let registered = h.service.register(register_request("jane@example.com")).await.unwrap();
        h.repo
            .update(
                registered.user.id,
                UserChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = h
            .service
            .login(login_request("jane@example.com", "Secret123"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Account is deactivated");

        let err = h
            .service
            .refresh_token(&registered.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
        assert!(h.service.validate_token(&registered.access_token).await.is_err());
    }

    #[tokio::test]
    async fn refresh_reissues_with_current_role() {
        let h = harness();
        let registered = h.service.register(register_request("jane@example.com")).await.unwrap();
        h.repo
            .update(
                registered.user.id,
                UserChanges {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let pair = h.service.refresh_token(&registered.refresh_token).await.unwrap();
        let claims = h.service.validate_token(&pair.access_token).await.unwrap();
        assert_eq!(claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens() {
        let h = harness();
        let registered = h.service.register(register_request("jane@example.com")).await.unwrap();
        let err = h
            .service
            .refresh_token(&registered.access_token)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
    }

    #[tokio::test]
    async fn logout_and_current_user_need_an_existing_account() {
        let h = harness();
        let registered = h.service.register(register_request("jane@example.com")).await.unwrap();

        h.service.logout(registered.user.id).await.unwrap();
        assert!(matches!(
            h.service.logout(999).await,
            Err(ApiError::Authentication(_))
        ));

        let me = h.service.current_user(registered.user.id).await.unwrap();
        assert_eq!(me, registered.user);
        assert!(matches!(
            h.service.current_user(999).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
