//! PostgreSQL-backed repository for client accounts.

use async_trait::async_trait;
use sqlx::PgPool;

use fusion_application::AccountRepository;
use fusion_core::{AppError, AppResult};
use fusion_domain::Account;

/// PostgreSQL implementation of the account repository port.
#[derive(Clone)]
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn insert_account(&self, account: Account) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, display_name, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(account.account_id)
        .bind(String::from(account.email))
        .bind(account.display_name)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| email_conflict_or_internal(error, "insert account"))?;

        Ok(())
    }
}

fn email_conflict_or_internal(error: sqlx::Error, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict("an account with this email already exists".to_owned());
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}
