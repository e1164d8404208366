//! Driving port for account mutations.

use async_trait::async_trait;

use crate::domain::{
    Account, AccountId, EngagementCounters, Error, NewAccount, ProfilePatch, RawPassword,
};

/// Mutating account use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Create an active account with zeroed counters.
    async fn register(&self, candidate: NewAccount) -> Result<Account, Error>;

    /// Merge whitelisted profile fields.
    async fn update_profile(&self, id: AccountId, patch: ProfilePatch) -> Result<Account, Error>;

    async fn change_password(
        &self,
        id: AccountId,
        old_password: &RawPassword,
        new_password: &RawPassword,
    ) -> Result<(), Error>;

    /// Enable or disable login without touching any other column.
    async fn set_active(&self, id: AccountId, active: bool) -> Result<(), Error>;

    async fn increment_view_count(&self, id: AccountId) -> Result<(), Error>;

    async fn increment_like_count(&self, id: AccountId) -> Result<(), Error>;

    async fn decrement_like_count(&self, id: AccountId) -> Result<(), Error>;

    /// Overwrite note, view and like counters in one write.
    ///
    /// Like the other counter operations, unknown ids are ignored.
    async fn update_stats(&self, id: AccountId, counters: EngagementCounters)
    -> Result<(), Error>;
}
