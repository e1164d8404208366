//! Driven port for one-way password hashing.

use crate::domain::{PasswordHash, RawPassword};

/// Errors raised by hashing adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordHashError {
    /// Hash could not be computed.
    #[error("password hashing failed: {message}")]
    Hash { message: String },
    /// Stored hash is not in a recognised encoding.
    #[error("stored password hash is malformed: {message}")]
    Malformed { message: String },
}

impl PasswordHashError {
    pub fn hash(message: impl Into<String>) -> Self {
        Self::Hash {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// Salted, adaptive, one-way hash.
///
/// `verify` answers `Ok(false)` for a wrong password; `Err` is reserved for
/// hashes the adapter cannot parse.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &RawPassword) -> Result<PasswordHash, PasswordHashError>;

    fn verify(
        &self,
        password: &RawPassword,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHashError>;
}
