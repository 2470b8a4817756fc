use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;

use super::ADMIN_ROLE;
use crate::database::store::StoreError;
use crate::filter::types::validate_column;

/// How an email is compared against the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailMatch {
    CaseInsensitive,
    Exact,
}

/// Email-keyed role lookup for subjects whose token carries no admin claim
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn role_for_email(&self, email: &str, mode: EmailMatch) -> Result<Option<String>, StoreError>;
}

/// Reads `email` and `role` columns from a user table
pub struct PgDirectory {
    pool: PgPool,
    table: String,
}

impl PgDirectory {
    pub fn new(pool: PgPool, table: &str) -> Result<Self, StoreError> {
        validate_column(table).map_err(|e| StoreError::backend(e.to_string()))?;
        Ok(Self { pool, table: table.to_string() })
    }
}

#[async_trait]
impl UserDirectory for PgDirectory {
    async fn role_for_email(&self, email: &str, mode: EmailMatch) -> Result<Option<String>, StoreError> {
        let sql = lookup_sql(&self.table, mode);
        let row = sqlx::query(&sql).bind(email).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => Ok(row.try_get::<Option<String>, _>("role")?),
            None => Ok(None),
        }
    }
}

/// Several rows can match one email, most often under the case-insensitive
/// comparison. An admin row wins.
fn lookup_sql(table: &str, mode: EmailMatch) -> String {
    let condition = match mode {
        EmailMatch::CaseInsensitive => "lower(\"email\") = lower($1)",
        EmailMatch::Exact => "\"email\" = $1",
    };
    format!(
        "SELECT \"role\"::text AS role FROM \"{}\" WHERE {} \
         ORDER BY (lower(\"role\"::text) = '{}') DESC LIMIT 1",
        table, condition, ADMIN_ROLE
    )
}

/// Fixed email to role map
#[derive(Debug, Default, Clone)]
pub struct MemoryDirectory {
    users: HashMap<String, String>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, email: &str, role: &str) -> Self {
        self.users.insert(email.to_string(), role.to_string());
        self
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn role_for_email(&self, email: &str, mode: EmailMatch) -> Result<Option<String>, StoreError> {
        let role = match mode {
            EmailMatch::Exact => self.users.get(email),
            EmailMatch::CaseInsensitive => self
                .users
                .iter()
                .filter(|(known, _)| known.eq_ignore_ascii_case(email))
                .map(|(_, role)| role)
                .max_by_key(|role| role.eq_ignore_ascii_case(ADMIN_ROLE)),
        };
        Ok(role.cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_directory_honors_match_mode() {
        let directory = MemoryDirectory::new().with_user("Ops@Example.com", "admin");

        let loose = directory.role_for_email("ops@example.com", EmailMatch::CaseInsensitive).await.unwrap();
        assert_eq!(loose.as_deref(), Some("admin"));

        let strict = directory.role_for_email("ops@example.com", EmailMatch::Exact).await.unwrap();
        assert_eq!(strict, None);
    }

    #[tokio::test]
    async fn admin_row_wins_among_case_variants() {
        let directory = MemoryDirectory::new()
            .with_user("ops@example.com", "viewer")
            .with_user("OPS@example.com", "admin")
            .with_user("Ops@Example.com", "editor");

        for _ in 0..8 {
            let role = directory.role_for_email("Ops@example.COM", EmailMatch::CaseInsensitive).await.unwrap();
            assert_eq!(role.as_deref(), Some("admin"));
        }
    }

    #[test]
    fn lookup_orders_admin_rows_first() {
        let sql = lookup_sql("users", EmailMatch::CaseInsensitive);
        assert!(sql.contains("WHERE lower(\"email\") = lower($1)"));
        assert!(sql.ends_with("ORDER BY (lower(\"role\"::text) = 'admin') DESC LIMIT 1"));

        let exact = lookup_sql("users", EmailMatch::Exact);
        assert!(exact.contains("WHERE \"email\" = $1 ORDER BY"));
    }
}
