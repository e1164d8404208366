//! Field validation helpers for inbound HTTP adapters.
//!
//! Domain constructors report [`AccountValidationError`]; this module picks
//! the matching taxonomy entry and attaches the offending field as details.

use serde_json::json;

use crate::domain::{AccountId, AccountValidationError, Error};

/// Map a field-level failure onto the `V00x` taxonomy entries.
pub(crate) fn validation_error(err: AccountValidationError) -> Error {
    let field = err.field();
    let message = err.to_string();
    let error = match err {
        AccountValidationError::Required { .. } => Error::required_field_empty(message),
        AccountValidationError::TooLong { .. } => Error::field_length_exceeded(message),
        AccountValidationError::InvalidEmail => Error::email_format(message),
        AccountValidationError::TooShort { .. } | AccountValidationError::InvalidId => {
            Error::validation(message)
        }
    };
    error.with_details(json!({ "field": field }))
}

/// Validate a path identifier.
pub(crate) fn account_id(raw: i64) -> Result<AccountId, Error> {
    AccountId::new(raw).map_err(validation_error)
}

/// Treat absent and blank strings alike.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Validate an optional field, skipping it when absent.
pub(crate) fn optional<T>(
    value: Option<String>,
    build: impl FnOnce(String) -> Result<T, AccountValidationError>,
) -> Result<Option<T>, Error> {
    value.map(build).transpose().map_err(validation_error)
}
