// In-memory user repository, used by tests and database-less local runs

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::error::ApiError;
use crate::query::UserFilter;
use crate::users::models::{normalize_email, NewUser, User, UserChanges};
use crate::users::repository::UserRepository;

#[derive(Default)]
struct Table {
    next_id: i32,
    rows: BTreeMap<i32, User>,
}

impl Table {
    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        let email = normalize_email(email);
        self.rows
            .values()
            .any(|u| Some(u.id) != except && normalize_email(&u.email) == email)
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    table: RwLock<Table>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_filter(user: &User, filter: &UserFilter) -> bool {
    if let Some(role) = filter.role {
        if user.role != role {
            return false;
        }
    }
    if let Some(active) = filter.is_active {
        if user.is_active != active {
            return false;
        }
    }
    if let Some(ref term) = filter.search {
        let term = term.to_lowercase();
        let hit = [&user.first_name, &user.last_name, &user.email]
            .iter()
            .any(|field| field.to_lowercase().contains(&term));
        if !hit {
            return false;
        }
    }
    true
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, ApiError> {
        let mut table = self.table.write().await;
        if table.email_taken(&new_user.email, None) {
            return Err(ApiError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        table.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: table.next_id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            role: new_user.role,
            is_active: new_user.is_active,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, ApiError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let email = normalize_email(email);
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .find(|u| normalize_email(&u.email) == email)
            .cloned())
    }

    async fn update(&self, id: i32, changes: UserChanges) -> Result<User, ApiError> {
        let mut table = self.table.write().await;
        if let Some(ref email) = changes.email {
            if table.email_taken(email, Some(id)) {
                return Err(ApiError::Conflict("Email is already taken".to_string()));
            }
        }

        let user = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| ApiError::not_found("User"))?;
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), ApiError> {
        let mut table = self.table.write().await;
        let user = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| ApiError::not_found("User"))?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), ApiError> {
        self.table
            .write()
            .await
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found("User"))
    }

    async fn list(&self, filter: &UserFilter) -> Result<(Vec<User>, u64), ApiError> {
        let table = self.table.read().await;
        // Newest first; ids break ties between rows created in the same instant
        let mut matching: Vec<&User> = table
            .rows
            .values()
            .filter(|u| matches_filter(u, filter))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(filter.offset())
            .take(filter.limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }
}
