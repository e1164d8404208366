//! Driven port for durable account records.
//!
//! Adapters own uniqueness enforcement: `insert` must reject a username or
//! email already held by a non-deleted account inside the same atomic unit
//! that writes the row, reporting [`AccountStoreError::Conflict`]. Every
//! lookup ignores logically deleted rows.

use std::fmt;

use async_trait::async_trait;

use crate::domain::{
    Account, AccountDraft, AccountId, Email, EngagementCounters, PasswordHash, Username,
};

/// Identity column guarded by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    Username,
    Email,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Username => "username",
            Self::Email => "email",
        })
    }
}

/// Errors raised by account store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountStoreError {
    /// Store connection could not be established.
    #[error("account store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("account store query failed: {message}")]
    Query { message: String },
    /// Insert collided with an existing non-deleted account.
    #[error("account {field} is already taken")]
    Conflict { field: UniqueField },
}

impl AccountStoreError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn conflict(field: UniqueField) -> Self {
        Self::Conflict { field }
    }
}

/// Port for account persistence.
///
/// # Write semantics
///
/// - `insert` assigns the id and both timestamps.
/// - `update` persists profile fields only, bumping `updated_at`. The
///   activation flag, password hash and counters each have a dedicated
///   single-statement operation, so a profile write can never clobber a
///   concurrent status, credential or counter change.
/// - Counter operations are single atomic statements; `decrement_like`
///   leaves a zero count untouched. Unknown ids are ignored.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountStoreError>;

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Account>, AccountStoreError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, AccountStoreError>;

    /// Match `identifier` against the username or the email column.
    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, AccountStoreError>;

    async fn exists_by_username(&self, username: &Username) -> Result<bool, AccountStoreError>;

    async fn exists_by_email(&self, email: &Email) -> Result<bool, AccountStoreError>;

    /// Persist a new account.
    async fn insert(&self, draft: AccountDraft) -> Result<Account, AccountStoreError>;

    /// Persist the profile fields of `account`.
    ///
    /// Returns `None` when the account no longer exists.
    async fn update(&self, account: &Account) -> Result<Option<Account>, AccountStoreError>;

    /// Set the activation flag. Returns `false` for unknown ids.
    async fn set_active(&self, id: AccountId, active: bool) -> Result<bool, AccountStoreError>;

    /// Swap the password hash only if it still equals `expected`.
    ///
    /// Returns `false` when the account is gone or the hash has moved on.
    async fn replace_password_hash(
        &self,
        id: AccountId,
        expected: &PasswordHash,
        replacement: &PasswordHash,
    ) -> Result<bool, AccountStoreError>;

    /// Overwrite all three counters. Returns `false` for unknown ids.
    async fn overwrite_counters(
        &self,
        id: AccountId,
        counters: EngagementCounters,
    ) -> Result<bool, AccountStoreError>;

    async fn increment_view(&self, id: AccountId) -> Result<(), AccountStoreError>;

    async fn increment_like(&self, id: AccountId) -> Result<(), AccountStoreError>;

    async fn decrement_like(&self, id: AccountId) -> Result<(), AccountStoreError>;

    /// Active accounts, newest first.
    async fn list_active(&self) -> Result<Vec<Account>, AccountStoreError>;
}
