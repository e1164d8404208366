//! Account error taxonomy.
//!
//! Every failure raised by the account core selects exactly one [`ErrorCode`]
//! from a closed table. Each code owns a static [`ErrorEntry`] carrying the
//! stable machine-readable code, an HTTP status hint and a default message.
//! The errors are transport agnostic: inbound adapters turn the status hint
//! into a protocol response.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::TraceId;

/// Immutable taxonomy entry describing one failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorEntry {
    code: &'static str,
    http_status: u16,
    message: &'static str,
}

impl ErrorEntry {
    const fn new(code: &'static str, http_status: u16, message: &'static str) -> Self {
        Self {
            code,
            http_status,
            message,
        }
    }

    /// Stable short code, for example `U001`.
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// HTTP status an adapter should use for this failure.
    pub const fn http_status(&self) -> u16 {
        self.http_status
    }

    /// Default human-readable message.
    pub const fn message(&self) -> &'static str {
        self.message
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.http_status, self.message)
    }
}

const PARAM_ERROR: ErrorEntry = ErrorEntry::new("400", 400, "invalid request parameter");
const NOT_FOUND: ErrorEntry = ErrorEntry::new("404", 404, "resource not found");
const USER_NOT_FOUND: ErrorEntry = ErrorEntry::new("U001", 404, "user not found");
const USERNAME_EXISTS: ErrorEntry = ErrorEntry::new("U002", 400, "username already exists");
const EMAIL_EXISTS: ErrorEntry = ErrorEntry::new("U003", 400, "email already exists");
const PASSWORD_ERROR: ErrorEntry = ErrorEntry::new("U004", 400, "incorrect password");
const USER_DISABLED: ErrorEntry = ErrorEntry::new("U005", 403, "user account is disabled");
const VALIDATION_ERROR: ErrorEntry = ErrorEntry::new("V001", 400, "validation failed");
const REQUIRED_FIELD_EMPTY: ErrorEntry = ErrorEntry::new("V002", 400, "required field is empty");
const FIELD_LENGTH_EXCEEDED: ErrorEntry = ErrorEntry::new("V003", 400, "field length exceeded");
const EMAIL_FORMAT_ERROR: ErrorEntry = ErrorEntry::new("V004", 400, "email format is invalid");
const INTERNAL_ERROR: ErrorEntry = ErrorEntry::new("500", 500, "internal server error");

/// Closed set of failure kinds raised by the account core.
///
/// Serialised as the stable code of its [`ErrorEntry`] (`"U001"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ErrorCode {
    /// A request argument could not be interpreted.
    ParamError,
    /// No resource exists at the requested location.
    NotFound,
    /// No non-deleted account matched the id, username or email.
    UserNotFound,
    /// Registration used a username already held by another account.
    UsernameExists,
    /// Registration used an email already held by another account.
    EmailExists,
    /// Credential verification failed.
    PasswordError,
    /// Login attempted against a deactivated account.
    UserDisabled,
    /// Malformed input caught before reaching the store.
    ValidationError,
    /// A required field was missing or blank.
    RequiredFieldEmpty,
    /// A field exceeded its length bounds.
    FieldLengthExceeded,
    /// An email address did not match the accepted syntax.
    EmailFormatError,
    /// Unexpected failure not otherwise classified.
    InternalError,
}

static CODE_INDEX: OnceLock<HashMap<&'static str, ErrorCode>> = OnceLock::new();

impl ErrorCode {
    /// Every kind in table order.
    pub const ALL: [Self; 12] = [
        Self::ParamError,
        Self::NotFound,
        Self::UserNotFound,
        Self::UsernameExists,
        Self::EmailExists,
        Self::PasswordError,
        Self::UserDisabled,
        Self::ValidationError,
        Self::RequiredFieldEmpty,
        Self::FieldLengthExceeded,
        Self::EmailFormatError,
        Self::InternalError,
    ];

    /// Static table entry for this kind.
    pub const fn entry(self) -> &'static ErrorEntry {
        match self {
            Self::ParamError => &PARAM_ERROR,
            Self::NotFound => &NOT_FOUND,
            Self::UserNotFound => &USER_NOT_FOUND,
            Self::UsernameExists => &USERNAME_EXISTS,
            Self::EmailExists => &EMAIL_EXISTS,
            Self::PasswordError => &PASSWORD_ERROR,
            Self::UserDisabled => &USER_DISABLED,
            Self::ValidationError => &VALIDATION_ERROR,
            Self::RequiredFieldEmpty => &REQUIRED_FIELD_EMPTY,
            Self::FieldLengthExceeded => &FIELD_LENGTH_EXCEEDED,
            Self::EmailFormatError => &EMAIL_FORMAT_ERROR,
            Self::InternalError => &INTERNAL_ERROR,
        }
    }

    /// Stable machine-readable code.
    pub const fn as_str(self) -> &'static str {
        self.entry().code()
    }

    /// HTTP status hint.
    pub const fn http_status(self) -> u16 {
        self.entry().http_status()
    }

    /// Look a kind up by its stable code.
    ///
    /// # Examples
    /// ```
    /// use accounts::domain::ErrorCode;
    ///
    /// assert_eq!(ErrorCode::from_code("U005"), Some(ErrorCode::UserDisabled));
    /// assert_eq!(ErrorCode::from_code("X999"), None);
    /// ```
    pub fn from_code(code: &str) -> Option<Self> {
        CODE_INDEX
            .get_or_init(|| Self::ALL.iter().map(|kind| (kind.as_str(), *kind)).collect())
            .get(code)
            .copied()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ErrorCode> for &'static str {
    fn from(value: ErrorCode) -> Self {
        value.as_str()
    }
}

/// Returned when a string does not name any taxonomy entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown error code: {0}")]
pub struct UnknownErrorCode(String);

impl TryFrom<String> for ErrorCode {
    type Error = UnknownErrorCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_code(&value).ok_or(UnknownErrorCode(value))
    }
}

/// Validation errors emitted by the strict constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorValidationError {
    EmptyMessage,
    EmptyTraceId,
}

impl fmt::Display for ErrorValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "error message must not be empty"),
            Self::EmptyTraceId => write!(f, "trace identifier must not be empty"),
        }
    }
}

impl std::error::Error for ErrorValidationError {}

/// Typed failure carrying one taxonomy entry.
///
/// ## Invariants
/// - `message` is non-empty once trimmed; constructors fall back to the
///   entry's default message.
/// - `trace_id`, when present, is non-empty.
///
/// # Examples
/// ```
/// use accounts::domain::{Error, ErrorCode};
///
/// let err = Error::username_exists();
/// assert_eq!(err.code(), ErrorCode::UsernameExists);
/// assert_eq!(err.code().as_str(), "U002");
/// assert_eq!(err.message(), "username already exists");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    #[schema(value_type = String, example = "U001")]
    code: ErrorCode,
    #[schema(example = "user not found")]
    message: String,
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    details: Option<Value>,
}

impl Error {
    /// Create an error, using the entry's default message when `message` is
    /// blank. Captures the trace identifier in scope, if any.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            code.entry().message().to_owned()
        } else {
            message
        };
        Self {
            code,
            message,
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
        }
    }

    /// Fallible constructor rejecting blank messages.
    pub fn try_new(
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self::new(code, message))
    }

    /// Create an error carrying the entry's default message.
    pub fn of(code: ErrorCode) -> Self {
        Self::new(code, code.entry().message())
    }

    /// Stable failure kind.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// HTTP status hint of the underlying entry.
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Correlation identifier captured at construction.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Supplementary structured details.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details.
    ///
    /// # Examples
    /// ```
    /// use accounts::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::validation("bad").with_details(json!({ "field": "email" }));
    /// assert!(err.details().is_some());
    /// ```
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach a trace identifier, replacing any captured one.
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Attach a trace identifier, rejecting blank values.
    pub fn try_with_trace_id(
        self,
        trace_id: impl Into<String>,
    ) -> Result<Self, ErrorValidationError> {
        let trace_id = trace_id.into();
        if trace_id.trim().is_empty() {
            return Err(ErrorValidationError::EmptyTraceId);
        }
        Ok(self.with_trace_id(trace_id))
    }

    /// [`ErrorCode::ParamError`] with a custom message.
    pub fn param_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParamError, message)
    }

    /// [`ErrorCode::NotFound`] with a custom message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// [`ErrorCode::UserNotFound`] with the default message.
    pub fn user_not_found() -> Self {
        Self::of(ErrorCode::UserNotFound)
    }

    /// [`ErrorCode::UsernameExists`] with the default message.
    pub fn username_exists() -> Self {
        Self::of(ErrorCode::UsernameExists)
    }

    /// [`ErrorCode::EmailExists`] with the default message.
    pub fn email_exists() -> Self {
        Self::of(ErrorCode::EmailExists)
    }

    /// [`ErrorCode::PasswordError`] with the default message.
    pub fn password_error() -> Self {
        Self::of(ErrorCode::PasswordError)
    }

    /// [`ErrorCode::UserDisabled`] with the default message.
    pub fn user_disabled() -> Self {
        Self::of(ErrorCode::UserDisabled)
    }

    /// [`ErrorCode::ValidationError`] with a custom message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// [`ErrorCode::RequiredFieldEmpty`] with a custom message.
    pub fn required_field_empty(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RequiredFieldEmpty, message)
    }

    /// [`ErrorCode::FieldLengthExceeded`] with a custom message.
    pub fn field_length_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FieldLengthExceeded, message)
    }

    /// [`ErrorCode::EmailFormatError`] with a custom message.
    pub fn email_format(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EmailFormatError, message)
    }

    /// [`ErrorCode::InternalError`] with a custom message.
    ///
    /// Adapters redact the message before it leaves the process.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}

impl From<ErrorCode> for Error {
    fn from(value: ErrorCode) -> Self {
        Self::of(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        let Error {
            code,
            message,
            trace_id,
            details,
        } = value;
        Self {
            code,
            message,
            trace_id,
            details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            message,
            trace_id,
            details,
        } = value;
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        // The payload is authoritative; do not pick up an ambient trace id.
        let trace_id = match trace_id {
            Some(id) if id.trim().is_empty() => return Err(ErrorValidationError::EmptyTraceId),
            other => other,
        };
        Ok(Self {
            code,
            message,
            trace_id,
            details,
        })
    }
}
