//! Account signup use-case.

use std::sync::Arc;

use async_trait::async_trait;

use fusion_core::AppResult;
use fusion_domain::{Account, EmailAddress};

/// Repository port for account persistence.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Inserts a new account; duplicate emails surface as `Conflict`.
    async fn insert_account(&self, account: Account) -> AppResult<()>;
}

/// Signup request payload after transport decoding.
#[derive(Debug, Clone)]
pub struct SignupInput {
    /// Requested email address.
    pub email: String,
    /// Optional display name; defaults to the email local part.
    pub display_name: Option<String>,
}

/// Application service for client signup.
#[derive(Clone)]
pub struct SignupService {
    repository: Arc<dyn AccountRepository>,
}

impl SignupService {
    /// Creates a service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AccountRepository>) -> Self {
        Self { repository }
    }

    /// Validates the input and persists a new account.
    pub async fn sign_up(&self, input: SignupInput) -> AppResult<Account> {
        let email = EmailAddress::new(input.email)?;
        let display_name = input
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| default_display_name(email.as_str()).to_owned());

        let account = Account::new(email, display_name);
        self.repository.insert_account(account.clone()).await?;
        Ok(account)
    }
}

fn default_display_name(email: &str) -> &str {
    email.split('@').next().unwrap_or("new user")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use fusion_core::{AppError, AppResult};
    use fusion_domain::Account;

    use super::{AccountRepository, SignupInput, SignupService};

    struct FakeRepository {
        accounts: Mutex<Vec<Account>>,
    }

    #[async_trait]
    impl AccountRepository for FakeRepository {
        async fn insert_account(&self, account: Account) -> AppResult<()> {
            let mut accounts = self.accounts.lock().await;
            if accounts
                .iter()
                .any(|existing| existing.email == account.email)
            {
                return Err(AppError::Conflict("email already registered".to_owned()));
            }

            accounts.push(account);
            Ok(())
        }
    }

    fn service() -> (SignupService, Arc<FakeRepository>) {
        let repository = Arc::new(FakeRepository {
            accounts: Mutex::new(Vec::new()),
        });
        (SignupService::new(repository.clone()), repository)
    }

    #[tokio::test]
    async fn signup_defaults_display_name_to_local_part() {
        let (service, repository) = service();

        let result = service
            .sign_up(SignupInput {
                email: "Ana@Example.com".to_owned(),
                display_name: None,
            })
            .await;

        assert_eq!(
            result.map(|account| account.display_name).ok(),
            Some("ana".to_owned())
        );
        assert_eq!(repository.accounts.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let (service, _repository) = service();

        let first = service
            .sign_up(SignupInput {
                email: "ana@example.com".to_owned(),
                display_name: Some("Ana".to_owned()),
            })
            .await;
        assert!(first.is_ok());

        let second = service
            .sign_up(SignupInput {
                email: "ana@example.com".to_owned(),
                display_name: None,
            })
            .await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn invalid_email_is_rejected_before_persistence() {
        let (service, repository) = service();

        let result = service
            .sign_up(SignupInput {
                email: "not-an-email".to_owned(),
                display_name: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(repository.accounts.lock().await.is_empty());
    }
}
