// Database repository for users

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::ApiError;
use crate::query::{UserFilter, USER_COLUMNS};
use crate::users::models::{NewUser, User, UserChanges};

/// Storage seam for user accounts
///
/// Services receive an `Arc<dyn UserRepository>`; PostgreSQL backs it in
/// production and [`InMemoryUserRepository`](super::memory::InMemoryUserRepository)
/// in tests and local runs.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; duplicate emails surface as `ApiError::Conflict`
    async fn create(&self, new_user: NewUser) -> Result<User, ApiError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, ApiError>;

    /// Case-insensitive email lookup
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;

    /// Apply a partial update; `NotFound` when the row is missing
    async fn update(&self, id: i32, changes: UserChanges) -> Result<User, ApiError>;

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), ApiError>;

    /// Hard delete; `NotFound` when the row is missing
    async fn delete(&self, id: i32) -> Result<(), ApiError>;

    /// One page of matching users plus the total match count
    async fn list(&self, filter: &UserFilter) -> Result<(Vec<User>, u64), ApiError>;
}

/// User repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, role, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(new_user.role)
        .bind(new_user.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => {
                ApiError::Conflict("User with this email already exists".to_string())
            }
            other => other,
        })?;

        tracing::info!("Created user {} ({})", user.id, user.email);
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update(&self, id: i32, changes: UserChanges) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($1, email),
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                role = COALESCE($4, role),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $6
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(changes.email)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.role)
        .bind(changes.is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::Conflict("Email is already taken".to_string()),
            other => other,
        })?
        .ok_or_else(|| ApiError::not_found("User"))?;

        Ok(user)
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), ApiError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
                .bind(password_hash)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("User"));
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("User"));
        }
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    async fn list(&self, filter: &UserFilter) -> Result<(Vec<User>, u64), ApiError> {
        let builder = filter.to_builder();

        let (count_sql, count_params) = builder.build_count();
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for param in count_params {
            count_query = count_query.bind(param);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let (page_sql, page_params) = builder.build();
        let mut page_query = sqlx::query_as::<_, User>(&page_sql);
        for param in page_params {
            page_query = page_query.bind(param);
        }
        let users = page_query.fetch_all(&self.pool).await?;

        tracing::debug!("User listing returned {} of {} rows", users.len(), total);
        Ok((users, total.max(0) as u64))
    }
}
