//! Driving port for account reads.

use async_trait::async_trait;

use crate::domain::{Account, AccountId, Email, Error, Username};

/// Read-only account use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountQuery: Send + Sync {
    async fn find_account(&self, id: AccountId) -> Result<Account, Error>;

    async fn find_by_username(&self, username: &Username) -> Result<Account, Error>;

    /// Active accounts, newest first.
    async fn list_active_accounts(&self) -> Result<Vec<Account>, Error>;

    async fn is_username_available(&self, username: &Username) -> Result<bool, Error>;

    async fn is_email_available(&self, email: &Email) -> Result<bool, Error>;
}
