//! Domain ports for the hexagonal boundary.
//!
//! Driven ports ([`AccountStore`], [`PasswordHasher`]) are implemented by
//! outbound adapters. Driving ports ([`AccountCommand`], [`AccountQuery`],
//! [`LoginService`]) are implemented by the account service and consumed by
//! inbound adapters.

mod account_command;
mod account_query;
mod account_store;
mod login_service;
mod password_hasher;

pub use account_command::AccountCommand;
#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use account_query::AccountQuery;
#[cfg(test)]
pub use account_query::MockAccountQuery;
pub use account_store::{AccountStore, AccountStoreError, UniqueField};
#[cfg(test)]
pub use account_store::MockAccountStore;
pub use login_service::LoginService;
#[cfg(test)]
pub use login_service::MockLoginService;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
