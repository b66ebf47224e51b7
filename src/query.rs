use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::users::Role;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Columns every user query selects
pub const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, role, is_active, created_at, updated_at";

/// SQL query builder for the user listing
/// Builds the page query and the matching count query from the same filters
pub struct SQLQueryBuilder {
    where_clauses: Vec<String>,
    params: Vec<String>,
    limit: u32,
    offset: u32,
}

impl Default for SQLQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SQLQueryBuilder {
    pub fn new() -> Self {
        Self {
            where_clauses: Vec::new(),
            params: Vec::new(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    fn next_param(&mut self, value: String) -> usize {
        self.params.push(value);
        self.params.len()
    }

    /// Case-insensitive substring match across first name, last name and email
    pub fn add_search_filter(&mut self, search: &str) {
        let index = self.next_param(format!("%{}%", escape_like(search)));
        self.where_clauses.push(format!(
            "(first_name ILIKE ${i} OR last_name ILIKE ${i} OR email ILIKE ${i})",
            i = index
        ));
    }

    pub fn add_role_filter(&mut self, role: Role) {
        let index = self.next_param(role.as_str().to_string());
        self.where_clauses.push(format!("role = ${}", index));
    }

    pub fn add_active_filter(&mut self, active: bool) {
        let index = self.next_param(active.to_string());
        self.where_clauses.push(format!("is_active = ${}::boolean", index));
    }

    /// Calculates LIMIT and OFFSET from a 1-indexed page
    pub fn set_pagination(&mut self, page: u32, limit: u32) {
        self.limit = limit;
        self.offset = page.saturating_sub(1).saturating_mul(limit);
    }

    fn where_sql(&self) -> String {
        if self.where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.where_clauses.join(" AND "))
        }
    }

    /// Page query, newest accounts first
    pub fn build(&self) -> (String, Vec<String>) {
        // LIMIT/OFFSET are validated integers, inlined rather than bound
        let query = format!(
            "SELECT {} FROM users{} ORDER BY created_at DESC, id DESC LIMIT {} OFFSET {}",
            USER_COLUMNS,
            self.where_sql(),
            self.limit,
            self.offset
        );
        (query, self.params.clone())
    }

    /// Count query over the same filters
    pub fn build_count(&self) -> (String, Vec<String>) {
        (
            format!("SELECT COUNT(*) FROM users{}", self.where_sql()),
            self.params.clone(),
        )
    }
}

/// Escapes LIKE wildcards so the term matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Query parameters of GET /api/users
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QueryParams {
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<u32>,
    /// Items per page (1..=100, defaults to 10)
    pub limit: Option<u32>,
    /// Role filter: "admin" or "user"
    pub role: Option<String>,
    /// Active flag filter
    pub active: Option<bool>,
    /// Substring searched in names and email (min 2 chars)
    pub search: Option<String>,
}

/// Validated listing filter handed to the repository
#[derive(Debug, Clone, PartialEq)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub page: u32,
    pub limit: u32,
}

impl Default for UserFilter {
    fn default() -> Self {
        Self {
            search: None,
            role: None,
            is_active: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl UserFilter {
    /// Unpaged variant used by the convenience lookups
    pub fn all() -> Self {
        Self {
            limit: u32::MAX,
            ..Self::default()
        }
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }

    pub fn to_builder(&self) -> SQLQueryBuilder {
        let mut builder = SQLQueryBuilder::new();
        if let Some(ref search) = self.search {
            builder.add_search_filter(search);
        }
        if let Some(role) = self.role {
            builder.add_role_filter(role);
        }
        if let Some(active) = self.is_active {
            builder.add_active_filter(active);
        }
        builder.set_pagination(self.page, self.limit);
        builder
    }
}

/// Validation error type
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Query parameter validator
pub struct QueryValidator;

impl QueryValidator {
    /// Validates and normalizes listing parameters
    pub fn validate(params: QueryParams) -> Result<UserFilter, ValidationError> {
        let page = params.page.unwrap_or(DEFAULT_PAGE);
        if page < 1 {
            return Err(ValidationError::new("Invalid page parameter"));
        }

        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(ValidationError::new(format!(
                "Invalid limit parameter (must be between 1 and {})",
                MAX_LIMIT
            )));
        }

        let role = match Self::normalize_string(params.role) {
            Some(raw) => Some(raw.parse::<Role>().map_err(|e| ValidationError::new(e))?),
            None => None,
        };

        let search = Self::normalize_string(params.search);
        if let Some(ref term) = search {
            Self::validate_search_term(term)?;
        }

        Ok(UserFilter {
            search,
            role,
            is_active: params.active,
            page,
            limit,
        })
    }

    pub fn validate_search_term(term: &str) -> Result<(), ValidationError> {
        if term.chars().count() < 2 {
            return Err(ValidationError::new(
                "Search query must be at least 2 characters long",
            ));
        }
        Ok(())
    }

    /// Trims whitespace; empty strings count as absent
    fn normalize_string(s: Option<String>) -> Option<String> {
        s.and_then(|s| {
            let trimmed = s.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        })
    }
}

/// Pagination block of a listing response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total_pages(total, limit),
        }
    }
}

/// ceil(total / limit), zero when there is nothing to page
pub fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    let limit = u64::from(limit);
    (total + limit - 1) / limit
}
