//! Account domain service.
//!
//! Implements the driving ports on top of an [`AccountStore`] and a
//! [`PasswordHasher`]. Uniqueness pre-checks here only fail early; the store's
//! own constraint is what makes registration race-free, and its conflicts are
//! reported with the same taxonomy entries.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    AccountCommand, AccountQuery, AccountStore, AccountStoreError, LoginService,
    PasswordHashError, PasswordHasher, UniqueField,
};
use crate::domain::{
    Account, AccountDraft, AccountId, DisplayName, Email, EngagementCounters, Error, NewAccount,
    PasswordHash, Profile, ProfilePatch, RawPassword, Username,
};

/// Account service implementing [`AccountCommand`], [`AccountQuery`] and
/// [`LoginService`].
pub struct AccountService<S, H> {
    store: Arc<S>,
    hasher: Arc<H>,
}

impl<S, H> Clone for AccountService<S, H> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            hasher: Arc::clone(&self.hasher),
        }
    }
}

impl<S, H> AccountService<S, H> {
    /// Create a new service over the given store and hasher.
    pub fn new(store: Arc<S>, hasher: Arc<H>) -> Self {
        Self { store, hasher }
    }
}

impl<S, H> AccountService<S, H>
where
    S: AccountStore,
    H: PasswordHasher + 'static,
{
    fn map_store_error(error: AccountStoreError) -> Error {
        match error {
            AccountStoreError::Conflict {
                field: UniqueField::Username,
            } => Error::username_exists(),
            AccountStoreError::Conflict {
                field: UniqueField::Email,
            } => Error::email_exists(),
            AccountStoreError::Connection { message } => {
                Error::internal(format!("account store unavailable: {message}"))
            }
            AccountStoreError::Query { message } => {
                Error::internal(format!("account store error: {message}"))
            }
        }
    }

    fn map_hash_error(error: PasswordHashError) -> Error {
        Error::internal(error.to_string())
    }

    async fn hash_password(&self, password: &RawPassword) -> Result<PasswordHash, Error> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
            .map_err(Self::map_hash_error)
    }

    async fn verify_password(
        &self,
        password: &RawPassword,
        hash: &PasswordHash,
    ) -> Result<bool, Error> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.clone();
        let hash = hash.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|err| Error::internal(format!("password verification task failed: {err}")))?
            .map_err(Self::map_hash_error)
    }

    async fn require_account(&self, id: AccountId) -> Result<Account, Error> {
        self.store
            .find_by_id(id)
            .await
            .map_err(Self::map_store_error)?
            .ok_or_else(|| {
                debug!(account_id = %id, "account not found");
                Error::user_not_found()
            })
    }

    async fn persist(&self, account: &Account) -> Result<Account, Error> {
        self.store
            .update(account)
            .await
            .map_err(Self::map_store_error)?
            .ok_or_else(Error::user_not_found)
    }
}

#[async_trait]
impl<S, H> AccountCommand for AccountService<S, H>
where
    S: AccountStore,
    H: PasswordHasher + 'static,
{
    async fn register(&self, candidate: NewAccount) -> Result<Account, Error> {
        let NewAccount {
            username,
            email,
            password,
            display_name,
            avatar_url,
            bio,
            links,
        } = candidate;

        if self
            .store
            .exists_by_username(&username)
            .await
            .map_err(Self::map_store_error)?
        {
            debug!(username = %username, "registration rejected: username taken");
            return Err(Error::username_exists());
        }
        if self
            .store
            .exists_by_email(&email)
            .await
            .map_err(Self::map_store_error)?
        {
            debug!("registration rejected: email taken");
            return Err(Error::email_exists());
        }

        let password_hash = self.hash_password(&password).await?;
        let display_name = display_name.unwrap_or_else(|| DisplayName::from(&username));
        let draft = AccountDraft {
            username,
            email,
            password_hash,
            profile: Profile {
                display_name,
                avatar_url,
                bio,
                links,
            },
            counters: EngagementCounters::default(),
            is_active: true,
        };

        let account = self.store.insert(draft).await.map_err(|err| {
            if matches!(err, AccountStoreError::Conflict { .. }) {
                warn!(error = %err, "registration lost a uniqueness race");
            }
            Self::map_store_error(err)
        })?;
        info!(account_id = %account.id(), "account registered");
        Ok(account)
    }

    async fn update_profile(&self, id: AccountId, patch: ProfilePatch) -> Result<Account, Error> {
        let mut account = self.require_account(id).await?;
        account.apply_patch(patch);
        let saved = self.persist(&account).await?;
        debug!(account_id = %id, "profile updated");
        Ok(saved)
    }

    async fn change_password(
        &self,
        id: AccountId,
        old_password: &RawPassword,
        new_password: &RawPassword,
    ) -> Result<(), Error> {
        let account = self.require_account(id).await?;
        if !self
            .verify_password(old_password, account.password_hash())
            .await?
        {
            debug!(account_id = %id, "password change rejected: old password mismatch");
            return Err(Error::password_error());
        }

        let replacement = self.hash_password(new_password).await?;
        let swapped = self
            .store
            .replace_password_hash(id, account.password_hash(), &replacement)
            .await
            .map_err(Self::map_store_error)?;
        if !swapped {
            warn!(account_id = %id, "password changed concurrently; rejecting stale change");
            return Err(Error::password_error());
        }
        info!(account_id = %id, "password changed");
        Ok(())
    }

    async fn set_active(&self, id: AccountId, active: bool) -> Result<(), Error> {
        let updated = self
            .store
            .set_active(id, active)
            .await
            .map_err(Self::map_store_error)?;
        if !updated {
            debug!(account_id = %id, "account not found");
            return Err(Error::user_not_found());
        }
        info!(account_id = %id, active, "account activation changed");
        Ok(())
    }

    async fn increment_view_count(&self, id: AccountId) -> Result<(), Error> {
        self.store
            .increment_view(id)
            .await
            .map_err(Self::map_store_error)
    }

    async fn increment_like_count(&self, id: AccountId) -> Result<(), Error> {
        self.store
            .increment_like(id)
            .await
            .map_err(Self::map_store_error)
    }

    async fn decrement_like_count(&self, id: AccountId) -> Result<(), Error> {
        self.store
            .decrement_like(id)
            .await
            .map_err(Self::map_store_error)
    }

    async fn update_stats(
        &self,
        id: AccountId,
        counters: EngagementCounters,
    ) -> Result<(), Error> {
        let updated = self
            .store
            .overwrite_counters(id, counters)
            .await
            .map_err(Self::map_store_error)?;
        debug!(account_id = %id, updated, "engagement counters overwritten");
        Ok(())
    }
}

#[async_trait]
impl<S, H> LoginService for AccountService<S, H>
where
    S: AccountStore,
    H: PasswordHasher + 'static,
{
    async fn login(&self, identifier: &str, password: &RawPassword) -> Result<Account, Error> {
        let account = self
            .store
            .find_by_username_or_email(identifier)
            .await
            .map_err(Self::map_store_error)?
            .ok_or_else(|| {
                debug!("login rejected: unknown identifier");
                Error::user_not_found()
            })?;

        // Disabled accounts never reach password verification.
        if !account.is_active() {
            debug!(account_id = %account.id(), "login rejected: account disabled");
            return Err(Error::user_disabled());
        }

        if !self
            .verify_password(password, account.password_hash())
            .await?
        {
            debug!(account_id = %account.id(), "login rejected: wrong password");
            return Err(Error::password_error());
        }

        info!(account_id = %account.id(), "login succeeded");
        Ok(account)
    }
}

#[async_trait]
impl<S, H> AccountQuery for AccountService<S, H>
where
    S: AccountStore,
    H: PasswordHasher + 'static,
{
    async fn find_account(&self, id: AccountId) -> Result<Account, Error> {
        self.require_account(id).await
    }

    async fn find_by_username(&self, username: &Username) -> Result<Account, Error> {
        self.store
            .find_by_username(username)
            .await
            .map_err(Self::map_store_error)?
            .ok_or_else(Error::user_not_found)
    }

    async fn list_active_accounts(&self) -> Result<Vec<Account>, Error> {
        self.store
            .list_active()
            .await
            .map_err(Self::map_store_error)
    }

    async fn is_username_available(&self, username: &Username) -> Result<bool, Error> {
        self.store
            .exists_by_username(username)
            .await
            .map(|taken| !taken)
            .map_err(Self::map_store_error)
    }

    async fn is_email_available(&self, email: &Email) -> Result<bool, Error> {
        self.store
            .exists_by_email(email)
            .await
            .map(|taken| !taken)
            .map_err(Self::map_store_error)
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
