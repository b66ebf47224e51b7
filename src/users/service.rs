// User management service - business logic layer

use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

use crate::auth::password::PasswordService;
use crate::error::ApiError;
use crate::query::{Pagination, QueryValidator, UserFilter};
use crate::users::models::{
    normalize_email, ChangePasswordRequest, CreateUserRequest, NewUser, Role, UpdateUserRequest,
    User, UserChanges, UserResponse,
};
use crate::users::repository::UserRepository;

/// Service for user account management
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    passwords: PasswordService,
}

fn ensure_valid_id(id: i32) -> Result<(), ApiError> {
    if id <= 0 {
        return Err(ApiError::validation("Invalid user ID"));
    }
    Ok(())
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, passwords: PasswordService) -> Self {
        Self { users, passwords }
    }

    async fn load(&self, id: i32) -> Result<User, ApiError> {
        ensure_valid_id(id)?;
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User"))
    }

    /// Create an account on behalf of an admin
    ///
    /// Unlike self-registration the caller may pick the role and the active
    /// flag; both default to a regular, active account.
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserResponse, ApiError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ApiError::validation("User with this email already exists"));
        }

        let password_hash = self.passwords.hash_password(&request.password)?;
        let user = self
            .users
            .create(NewUser {
                email,
                password_hash,
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                role: request.role.unwrap_or_default(),
                is_active: request.is_active.unwrap_or(true),
            })
            .await?;

        info!("User {} created with role {}", user.id, user.role);
        Ok(user.into())
    }

    pub async fn get_user(&self, id: i32) -> Result<UserResponse, ApiError> {
        self.load(id).await.map(UserResponse::from)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserResponse>, ApiError> {
        if !validator::validate_email(email.trim()) {
            return Err(ApiError::validation("Invalid email address"));
        }
        let user = self.users.find_by_email(&normalize_email(email)).await?;
        Ok(user.map(UserResponse::from))
    }

    /// Apply a partial profile update
    ///
    /// # Errors
    /// - `Validation` for malformed fields or an email owned by another account
    /// - `NotFound` when the user does not exist
    pub async fn update_user(
        &self,
        id: i32,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, ApiError> {
        request.validate()?;
        let existing = self.load(id).await?;

        let changes = UserChanges::from(request);
        if let Some(ref email) = changes.email {
            if *email != existing.email && self.users.find_by_email(email).await?.is_some() {
                return Err(ApiError::validation("Email is already taken"));
            }
        }
        if changes.is_empty() {
            debug!("Update of user {} carried no changes", id);
            return Ok(existing.into());
        }

        let user = self.users.update(id, changes).await?;
        info!("User {} updated", id);
        Ok(user.into())
    }

    pub async fn delete_user(&self, id: i32) -> Result<(), ApiError> {
        self.load(id).await?;
        self.users.delete(id).await?;
        info!("User {} deleted", id);
        Ok(())
    }

    /// One page of users matching the filter, plus pagination metadata
    pub async fn list_users(
        &self,
        filter: UserFilter,
    ) -> Result<(Vec<UserResponse>, Pagination), ApiError> {
        let (users, total) = self.users.list(&filter).await?;
        let pagination = Pagination::new(filter.page, filter.limit, total);
        debug!(
            "Listed {} users (page {} of {})",
            users.len(),
            pagination.page,
            pagination.total_pages
        );
        Ok((users.into_iter().map(UserResponse::from).collect(), pagination))
    }

    async fn list_all(&self, filter: UserFilter) -> Result<Vec<UserResponse>, ApiError> {
        let (users, _) = self.users.list(&filter).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn search_users(&self, term: &str) -> Result<Vec<UserResponse>, ApiError> {
        let term = term.trim();
        QueryValidator::validate_search_term(term)
            .map_err(|e| ApiError::validation(e.message))?;
        self.list_all(UserFilter {
            search: Some(term.to_string()),
            ..UserFilter::all()
        })
        .await
    }

    pub async fn users_by_role(&self, role: Role) -> Result<Vec<UserResponse>, ApiError> {
        self.list_all(UserFilter {
            role: Some(role),
            ..UserFilter::all()
        })
        .await
    }

    pub async fn active_users(&self) -> Result<Vec<UserResponse>, ApiError> {
        self.list_all(UserFilter {
            is_active: Some(true),
            ..UserFilter::all()
        })
        .await
    }

    /// Replace the password after checking the current one
    pub async fn change_password(
        &self,
        id: i32,
        request: ChangePasswordRequest,
    ) -> Result<(), ApiError> {
        request.validate()?;
        let user = self.load(id).await?;

        if !self
            .passwords
            .verify_password(&request.current_password, &user.password_hash)?
        {
            return Err(ApiError::authentication("Current password is incorrect"));
        }

        let password_hash = self.passwords.hash_password(&request.new_password)?;
        self.users.update_password(id, &password_hash).await?;
        info!("Password changed for user {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::memory::InMemoryUserRepository;
    use argon2::Params;

    fn service() -> UserService {
        UserService::new(
            Arc::new(InMemoryUserRepository::new()),
            PasswordService::with_params(Params::new(8, 1, 1, None).unwrap()),
        )
    }

    fn create_request(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            password: "Passw0rd".to_string(),
            confirm_password: None,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            role: None,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn create_user_defaults_to_active_regular_account() {
        let service = service();
        let user = service
            .create_user(create_request("Jane@Example.com"))
            .await
            .unwrap();
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.role, Role::User);
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_validation_error() {
        let service = service();
        service.create_user(create_request("jane@example.com")).await.unwrap();
        let err = service
            .create_user(create_request("JANE@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
        assert_eq!(err.to_string(), "User with this email already exists");
    }

    #[tokio::test]
    async fn get_user_checks_id_and_existence() {
        let service = service();
        assert!(matches!(service.get_user(0).await, Err(ApiError::Validation { .. })));
        assert!(matches!(service.get_user(42).await, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_rejects_email_owned_by_someone_else() {
        let service = service();
        let jane = service.create_user(create_request("jane@example.com")).await.unwrap();
        service.create_user(create_request("john@example.com")).await.unwrap();

        let err = service
            .update_user(
                jane.id,
                UpdateUserRequest {
                    email: Some("john@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email is already taken");

        // Re-submitting one's own email is fine
        let same = service
            .update_user(
                jane.id,
                UpdateUserRequest {
                    email: Some("Jane@example.com".to_string()),
                    first_name: Some("Janet".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.first_name, "Janet");
    }

    #[tokio::test]
    async fn list_users_reports_pagination() {
        let service = service();
        for i in 0..7 {
            service
                .create_user(create_request(&format!("user{}@example.com", i)))
                .await
                .unwrap();
        }

        let filter = UserFilter {
            page: 2,
            limit: 3,
            ..Default::default()
        };
        let (users, pagination) = service.list_users(filter).await.unwrap();
        assert_eq!(users.len(), 3);
        assert_eq!(pagination.total, 7);
        assert_eq!(pagination.total_pages, 3);
    }

    #[tokio::test]
    async fn convenience_lookups_filter_by_role_activity_and_term() {
        let service = service();
        let mut admin = create_request("root@example.com");
        admin.role = Some(Role::Admin);
        admin.first_name = "Rooty".to_string();
        service.create_user(admin).await.unwrap();

        let mut inactive = create_request("idle@example.com");
        inactive.is_active = Some(false);
        service.create_user(inactive).await.unwrap();

        assert_eq!(service.users_by_role(Role::Admin).await.unwrap().len(), 1);
        assert_eq!(service.active_users().await.unwrap().len(), 1);
        assert_eq!(service.search_users("  root ").await.unwrap().len(), 1);
        assert!(service.search_users("r").await.is_err());
    }

    #[tokio::test]
    async fn change_password_requires_the_current_password() {
        let service = service();
        let user = service.create_user(create_request("jane@example.com")).await.unwrap();

        let wrong = ChangePasswordRequest {
            current_password: "nope".to_string(),
            new_password: "N3wPassword".to_string(),
            confirm_new_password: "N3wPassword".to_string(),
        };
        assert!(matches!(
            service.change_password(user.id, wrong).await,
            Err(ApiError::Authentication(_))
        ));

        let right = ChangePasswordRequest {
            current_password: "Passw0rd".to_string(),
            new_password: "N3wPassword".to_string(),
            confirm_new_password: "N3wPassword".to_string(),
        };
        service.change_password(user.id, right).await.unwrap();
    }

    #[tokio::test]
    async fn delete_user_then_lookup_is_not_found() {
        let service = service();
        let user = service.create_user(create_request("jane@example.com")).await.unwrap();
        service.delete_user(user.id).await.unwrap();
        assert!(matches!(service.get_user(user.id).await, Err(ApiError::NotFound(_))));
        assert!(matches!(service.delete_user(user.id).await, Err(ApiError::NotFound(_))));
    }
}
