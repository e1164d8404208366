//! PostgreSQL-backed `AccountStore` implementation using Diesel ORM.
//!
//! Uniqueness is enforced by the partial unique indexes created in the
//! migrations; their violations are recognised by index name and reported as
//! [`AccountStoreError::Conflict`]. Counter updates are single `UPDATE`
//! statements so concurrent calls never lose increments. Counters saturate at
//! `i32::MAX`, the widest value the columns hold.

use async_trait::async_trait;
use diesel::dsl::{exists, now};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{AccountStore, AccountStoreError, UniqueField};
use crate::domain::{
    Account, AccountDraft, AccountId, AccountParts, AvatarUrl, DisplayName, Email,
    EngagementCounters, PasswordHash, Profile, SocialLinks, SocialUrl, Username,
};

use super::models::{AccountRow, NewAccountRow, ProfileUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::accounts;

/// Partial unique index guarding live usernames.
pub(crate) const USERNAME_INDEX: &str = "accounts_username_live_key";
/// Partial unique index guarding live emails.
pub(crate) const EMAIL_INDEX: &str = "accounts_email_live_key";

/// Diesel-backed implementation of the [`AccountStore`] port.
#[derive(Clone)]
pub struct DieselAccountStore {
    pool: DbPool,
}

impl DieselAccountStore {
    /// Create a new store over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AccountStoreError {
    AccountStoreError::connection(error.message())
}

fn conflict_field(constraint: Option<&str>) -> Option<UniqueField> {
    match constraint? {
        USERNAME_INDEX => Some(UniqueField::Username),
        EMAIL_INDEX => Some(UniqueField::Email),
        _ => None,
    }
}

fn map_diesel_error(error: DieselError) -> AccountStoreError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            match conflict_field(info.constraint_name()) {
                Some(field) => AccountStoreError::conflict(field),
                None => AccountStoreError::query("unique constraint violated"),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            AccountStoreError::connection("database connection error")
        }
        DieselError::QueryBuilderError(_) => AccountStoreError::query("database query error"),
        _ => AccountStoreError::query("database error"),
    }
}

fn counter_to_db(name: &str, value: u32) -> Result<i32, AccountStoreError> {
    i32::try_from(value)
        .map_err(|_| AccountStoreError::query(format!("{name} {value} exceeds column range")))
}

fn counter_from_db(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn optional<T, E>(
    value: Option<String>,
    build: impl FnOnce(String) -> Result<T, E>,
) -> Result<Option<T>, E> {
    value.map(build).transpose()
}

/// Convert a database row to a domain account.
fn row_to_account(row: AccountRow) -> Result<Account, AccountStoreError> {
    let id = row.id;
    let corrupt = move |err: crate::domain::AccountValidationError| {
        AccountStoreError::query(format!("stored account {id} is invalid: {err}"))
    };
    let profile = Profile {
        display_name: DisplayName::new(row.display_name).map_err(corrupt)?,
        avatar_url: optional(row.avatar_url, AvatarUrl::new).map_err(corrupt)?,
        bio: row.bio,
        links: SocialLinks {
            github_url: optional(row.github_url, |v| SocialUrl::new("githubUrl", v))
                .map_err(corrupt)?,
            twitter_url: optional(row.twitter_url, |v| SocialUrl::new("twitterUrl", v))
                .map_err(corrupt)?,
            website_url: optional(row.website_url, |v| SocialUrl::new("websiteUrl", v))
                .map_err(corrupt)?,
        },
    };
    Ok(Account::from_parts(AccountParts {
        id: AccountId::new(row.id).map_err(corrupt)?,
        username: Username::new(row.username).map_err(corrupt)?,
        email: Email::new(row.email).map_err(corrupt)?,
        password_hash: PasswordHash::from_encoded(row.password_hash).map_err(corrupt)?,
        profile,
        counters: EngagementCounters {
            note_count: counter_from_db(row.note_count),
            view_count: counter_from_db(row.view_count),
            like_count: counter_from_db(row.like_count),
        },
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn opt_str<T: AsRef<str>>(value: Option<&T>) -> Option<&str> {
    value.map(AsRef::as_ref)
}

#[async_trait]
impl AccountStore for DieselAccountStore {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = accounts::table
            .filter(accounts::id.eq(id.get()))
            .filter(accounts::is_deleted.eq(false))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_account).transpose()
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Account>, AccountStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = accounts::table
            .filter(accounts::username.eq(username.as_str()))
            .filter(accounts::is_deleted.eq(false))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_account).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, AccountStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = accounts::table
            .filter(accounts::email.eq(email.as_str()))
            .filter(accounts::is_deleted.eq(false))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_account).transpose()
    }

    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, AccountStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // A username match wins over an email match for the same identifier.
        let row = accounts::table
            .filter(
                accounts::username
                    .eq(identifier)
                    .or(accounts::email.eq(identifier)),
            )
            .filter(accounts::is_deleted.eq(false))
            .order((accounts::username.eq(identifier).desc(), accounts::id.asc()))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_account).transpose()
    }

    async fn exists_by_username(&self, username: &Username) -> Result<bool, AccountStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(exists(
            accounts::table
                .filter(accounts::username.eq(username.as_str()))
                .filter(accounts::is_deleted.eq(false)),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn exists_by_email(&self, email: &Email) -> Result<bool, AccountStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(exists(
            accounts::table
                .filter(accounts::email.eq(email.as_str()))
                .filter(accounts::is_deleted.eq(false)),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn insert(&self, draft: AccountDraft) -> Result<Account, AccountStoreError> {
        let profile = &draft.profile;
        let links = &profile.links;
        let new_row = NewAccountRow {
            username: draft.username.as_str(),
            email: draft.email.as_str(),
            password_hash: draft.password_hash.as_str(),
            display_name: profile.display_name.as_str(),
            avatar_url: opt_str(profile.avatar_url.as_ref()),
            bio: profile.bio.as_deref(),
            github_url: opt_str(links.github_url.as_ref()),
            twitter_url: opt_str(links.twitter_url.as_ref()),
            website_url: opt_str(links.website_url.as_ref()),
            note_count: counter_to_db("note_count", draft.counters.note_count)?,
            view_count: counter_to_db("view_count", draft.counters.view_count)?,
            like_count: counter_to_db("like_count", draft.counters.like_count)?,
            is_active: draft.is_active,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(accounts::table)
            .values(&new_row)
            .returning(AccountRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_account(row)
    }

    async fn update(&self, account: &Account) -> Result<Option<Account>, AccountStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let profile = account.profile();
        let links = &profile.links;
        let changes = ProfileUpdate {
            display_name: profile.display_name.as_str(),
            avatar_url: opt_str(profile.avatar_url.as_ref()),
            bio: profile.bio.as_deref(),
            github_url: opt_str(links.github_url.as_ref()),
            twitter_url: opt_str(links.twitter_url.as_ref()),
            website_url: opt_str(links.website_url.as_ref()),
        };

        let row = diesel::update(
            accounts::table
                .filter(accounts::id.eq(account.id().get()))
                .filter(accounts::is_deleted.eq(false)),
        )
        .set((&changes, accounts::updated_at.eq(now)))
        .returning(AccountRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        row.map(row_to_account).transpose()
    }

    async fn set_active(&self, id: AccountId, active: bool) -> Result<bool, AccountStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            accounts::table
                .filter(accounts::id.eq(id.get()))
                .filter(accounts::is_deleted.eq(false)),
        )
        .set((accounts::is_active.eq(active), accounts::updated_at.eq(now)))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated == 1)
    }

    async fn replace_password_hash(
        &self,
        id: AccountId,
        expected: &PasswordHash,
        replacement: &PasswordHash,
    ) -> Result<bool, AccountStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            accounts::table
                .filter(accounts::id.eq(id.get()))
                .filter(accounts::is_deleted.eq(false))
                .filter(accounts::password_hash.eq(expected.as_str())),
        )
        .set((
            accounts::password_hash.eq(replacement.as_str()),
            accounts::updated_at.eq(now),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated == 1)
    }

    async fn overwrite_counters(
        &self,
        id: AccountId,
        counters: EngagementCounters,
    ) -> Result<bool, AccountStoreError> {
        let note_count = counter_to_db("note_count", counters.note_count)?;
        let view_count = counter_to_db("view_count", counters.view_count)?;
        let like_count = counter_to_db("like_count", counters.like_count)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            accounts::table
                .filter(accounts::id.eq(id.get()))
                .filter(accounts::is_deleted.eq(false)),
        )
        .set((
            accounts::note_count.eq(note_count),
            accounts::view_count.eq(view_count),
            accounts::like_count.eq(like_count),
            accounts::updated_at.eq(now),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated == 1)
    }

    async fn increment_view(&self, id: AccountId) -> Result<(), AccountStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(
            accounts::table
                .filter(accounts::id.eq(id.get()))
                .filter(accounts::is_deleted.eq(false))
                .filter(accounts::view_count.lt(i32::MAX)),
        )
        .set((
            accounts::view_count.eq(accounts::view_count + 1),
            accounts::updated_at.eq(now),
        ))
        .execute(&mut conn)
        .await
        .map(|_| ())
        .map_err(map_diesel_error)
    }

    async fn increment_like(&self, id: AccountId) -> Result<(), AccountStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(
            accounts::table
                .filter(accounts::id.eq(id.get()))
                .filter(accounts::is_deleted.eq(false))
                .filter(accounts::like_count.lt(i32::MAX)),
        )
        .set((
            accounts::like_count.eq(accounts::like_count + 1),
            accounts::updated_at.eq(now),
        ))
        .execute(&mut conn)
        .await
        .map(|_| ())
        .map_err(map_diesel_error)
    }

    async fn decrement_like(&self, id: AccountId) -> Result<(), AccountStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(
            accounts::table
                .filter(accounts::id.eq(id.get()))
                .filter(accounts::is_deleted.eq(false))
                .filter(accounts::like_count.gt(0)),
        )
        .set((
            accounts::like_count.eq(accounts::like_count - 1),
            accounts::updated_at.eq(now),
        ))
        .execute(&mut conn)
        .await
        .map(|_| ())
        .map_err(map_diesel_error)
    }

    async fn list_active(&self) -> Result<Vec<Account>, AccountStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AccountRow> = accounts::table
            .filter(accounts::is_active.eq(true))
            .filter(accounts::is_deleted.eq(false))
            .order((accounts::created_at.desc(), accounts::id.desc()))
            .select(AccountRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_account).collect()
    }
}
