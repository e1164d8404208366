//! In-process `AccountStore` used when no database is configured.
//!
//! All state sits behind one mutex, so the uniqueness check and the insert
//! share a critical section and counters never lose updates.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{AccountStore, AccountStoreError, UniqueField};
use crate::domain::{
    Account, AccountDraft, AccountId, AccountParts, Email, EngagementCounters, PasswordHash,
    Username,
};

#[derive(Debug)]
struct StoredAccount {
    account: Account,
    is_deleted: bool,
}

#[derive(Debug, Default)]
struct State {
    last_id: i64,
    rows: BTreeMap<i64, StoredAccount>,
}

impl State {
    fn live(&self) -> impl Iterator<Item = &Account> {
        self.rows
            .values()
            .filter(|row| !row.is_deleted)
            .map(|row| &row.account)
    }

    fn live_mut(&mut self, id: AccountId) -> Option<&mut Account> {
        self.rows
            .get_mut(&id.get())
            .filter(|row| !row.is_deleted)
            .map(|row| &mut row.account)
    }
}

/// Mutex-guarded account store with store-assigned sequential ids.
pub struct InMemoryAccountStore {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
}

impl InMemoryAccountStore {
    /// Create an empty store stamping rows with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, AccountStoreError> {
        self.state
            .lock()
            .map_err(|_| AccountStoreError::query("account store lock poisoned"))
    }

    /// Logically delete an account. Returns `false` if it was not live.
    pub fn mark_deleted(&self, id: AccountId) -> Result<bool, AccountStoreError> {
        let mut state = self.lock()?;
        Ok(match state.rows.get_mut(&id.get()) {
            Some(row) if !row.is_deleted => {
                row.is_deleted = true;
                true
            }
            _ => false,
        })
    }

    fn find_live(
        &self,
        predicate: impl Fn(&Account) -> bool,
    ) -> Result<Option<Account>, AccountStoreError> {
        let state = self.lock()?;
        Ok(state.live().find(|account| predicate(account)).cloned())
    }

    fn mutate(
        &self,
        id: AccountId,
        change: impl FnOnce(&mut Account) -> bool,
    ) -> Result<bool, AccountStoreError> {
        let now = self.clock.utc();
        let mut state = self.lock()?;
        let Some(account) = state.live_mut(id) else {
            return Ok(false);
        };
        if change(account) {
            account.touch(now);
            return Ok(true);
        }
        Ok(false)
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountStoreError> {
        self.find_live(|account| account.id() == id)
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Account>, AccountStoreError> {
        self.find_live(|account| account.username() == username)
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, AccountStoreError> {
        self.find_live(|account| account.email() == email)
    }

    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, AccountStoreError> {
        let by_username = self.find_live(|account| account.username().as_str() == identifier)?;
        if by_username.is_some() {
            return Ok(by_username);
        }
        self.find_live(|account| account.email().as_str() == identifier)
    }

    async fn exists_by_username(&self, username: &Username) -> Result<bool, AccountStoreError> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    async fn exists_by_email(&self, email: &Email) -> Result<bool, AccountStoreError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn insert(&self, draft: AccountDraft) -> Result<Account, AccountStoreError> {
        let now = self.clock.utc();
        let mut state = self.lock()?;
        if state.live().any(|account| account.username() == &draft.username) {
            return Err(AccountStoreError::conflict(UniqueField::Username));
        }
        if state.live().any(|account| account.email() == &draft.email) {
            return Err(AccountStoreError::conflict(UniqueField::Email));
        }

        let raw_id = state.last_id + 1;
        let id = AccountId::new(raw_id)
            .map_err(|err| AccountStoreError::query(format!("id sequence exhausted: {err}")))?;
        let AccountDraft {
            username,
            email,
            password_hash,
            profile,
            counters,
            is_active,
        } = draft;
        let account = Account::from_parts(AccountParts {
            id,
            username,
            email,
            password_hash,
            profile,
            counters,
            is_active,
            created_at: now,
            updated_at: now,
        });
        state.last_id = raw_id;
        state.rows.insert(
            raw_id,
            StoredAccount {
                account: account.clone(),
                is_deleted: false,
            },
        );
        Ok(account)
    }

    async fn update(&self, account: &Account) -> Result<Option<Account>, AccountStoreError> {
        let now = self.clock.utc();
        let mut state = self.lock()?;
        let Some(stored) = state.live_mut(account.id()) else {
            return Ok(None);
        };
        // Everything but the profile keeps its stored value.
        let mut parts = stored.clone().into_parts();
        parts.profile = account.profile().clone();
        parts.updated_at = now;
        *stored = Account::from_parts(parts);
        Ok(Some(stored.clone()))
    }

    async fn set_active(&self, id: AccountId, active: bool) -> Result<bool, AccountStoreError> {
        self.mutate(id, |account| {
            account.set_active(active);
            true
        })
    }

    async fn replace_password_hash(
        &self,
        id: AccountId,
        expected: &PasswordHash,
        replacement: &PasswordHash,
    ) -> Result<bool, AccountStoreError> {
        self.mutate(id, |account| {
            if account.password_hash() != expected {
                return false;
            }
            account.set_password_hash(replacement.clone());
            true
        })
    }

    async fn overwrite_counters(
        &self,
        id: AccountId,
        counters: EngagementCounters,
    ) -> Result<bool, AccountStoreError> {
        self.mutate(id, |account| {
            account.set_counters(counters);
            true
        })
    }

    async fn increment_view(&self, id: AccountId) -> Result<(), AccountStoreError> {
        self.mutate(id, |account| {
            let mut counters = account.counters();
            counters.view_count = counters.view_count.saturating_add(1);
            account.set_counters(counters);
            true
        })
        .map(|_| ())
    }

    async fn increment_like(&self, id: AccountId) -> Result<(), AccountStoreError> {
        self.mutate(id, |account| {
            let mut counters = account.counters();
            counters.like_count = counters.like_count.saturating_add(1);
            account.set_counters(counters);
            true
        })
        .map(|_| ())
    }

    async fn decrement_like(&self, id: AccountId) -> Result<(), AccountStoreError> {
        self.mutate(id, |account| {
            let mut counters = account.counters();
            if counters.like_count == 0 {
                return false;
            }
            counters.like_count -= 1;
            account.set_counters(counters);
            true
        })
        .map(|_| ())
    }

    async fn list_active(&self) -> Result<Vec<Account>, AccountStoreError> {
        let state = self.lock()?;
        let mut active: Vec<Account> = state
            .live()
            .filter(|account| account.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(active)
    }
}
