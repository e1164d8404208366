//! Driving port for login.
//!
//! Inbound adapters authenticate credentials through this trait without
//! knowing which store or hasher backs it, so handler tests can substitute a
//! mock.

use async_trait::async_trait;

use crate::domain::{Account, Error, RawPassword};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Authenticate by username or email.
    ///
    /// Fails with `UserNotFound`, then `UserDisabled`, then `PasswordError`,
    /// in that order of precedence.
    async fn login(&self, identifier: &str, password: &RawPassword) -> Result<Account, Error>;
}
