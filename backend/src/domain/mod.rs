//! Domain primitives, ports and services.
//!
//! Purpose: define the account aggregate, the closed error taxonomy and the
//! account use-cases independently of transport and storage.
//!
//! Public surface:
//! - Account (alias to `account::Account`): durable identity record.
//! - Error / ErrorCode / ErrorEntry: taxonomy every failure is built from.
//! - AccountService: implementation of the driving ports.
//! - TraceId: request-scoped correlation identifier.

pub mod account;
pub mod account_service;
pub mod error;
pub mod ports;
pub mod trace_id;

pub use self::account::{
    Account, AccountDraft, AccountId, AccountParts, AccountValidationError, AvatarUrl,
    DisplayName, Email, EngagementCounters, NewAccount, PasswordHash, Profile, ProfilePatch,
    RawPassword, SocialLinks, SocialUrl, Username,
};
pub use self::account_service::AccountService;
pub use self::error::{Error, ErrorCode, ErrorEntry, ErrorValidationError, UnknownErrorCode};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use accounts::domain::{ApiResult, Error};
///
/// fn lookup() -> ApiResult<()> {
///     Err(Error::user_not_found())
/// }
/// # assert!(lookup().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
