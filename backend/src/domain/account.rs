//! Account aggregate and its validated value types.
//!
//! Constructors enforce field-level bounds so the service and the stores only
//! ever see well-formed values. Inbound adapters call them while parsing
//! request payloads and translate [`AccountValidationError`] into the
//! validation entries of the error taxonomy.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use zeroize::Zeroizing;

/// Minimum username length in characters.
pub const USERNAME_MIN: usize = 3;
/// Maximum username length in characters.
pub const USERNAME_MAX: usize = 50;
/// Maximum email length in characters.
pub const EMAIL_MAX: usize = 100;
/// Maximum display name length in characters.
pub const DISPLAY_NAME_MAX: usize = 100;
/// Maximum avatar URL length in characters.
pub const AVATAR_URL_MAX: usize = 500;
/// Maximum social link length in characters.
pub const SOCIAL_URL_MAX: usize = 200;
/// Minimum length of a password that will be stored.
pub const PASSWORD_MIN: usize = 6;

/// Field-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    /// Required value was missing or blank.
    Required { field: &'static str },
    /// Value is shorter than allowed.
    TooShort { field: &'static str, min: usize },
    /// Value is longer than allowed.
    TooLong { field: &'static str, max: usize },
    /// Email does not look like `local@domain.tld`.
    InvalidEmail,
    /// Account identifiers are positive integers.
    InvalidId,
}

impl AccountValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Required { field }
            | Self::TooShort { field, .. }
            | Self::TooLong { field, .. } => field,
            Self::InvalidEmail => "email",
            Self::InvalidId => "id",
        }
    }
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required { field } => write!(f, "{field} must not be empty"),
            Self::TooShort { field, min } => {
                write!(f, "{field} must be at least {min} characters")
            }
            Self::TooLong { field, max } => write!(f, "{field} must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "email must be a valid email address"),
            Self::InvalidId => write!(f, "account id must be a positive integer"),
        }
    }
}

impl std::error::Error for AccountValidationError {}

fn bounded(
    field: &'static str,
    value: String,
    min: usize,
    max: usize,
) -> Result<String, AccountValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AccountValidationError::Required { field });
    }
    let length = trimmed.chars().count();
    if length < min {
        return Err(AccountValidationError::TooShort { field, min });
    }
    if length > max {
        return Err(AccountValidationError::TooLong { field, max });
    }
    if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_owned())
    }
}

macro_rules! string_value {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// Borrow the validated value.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

/// Store-assigned account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(i64);

impl AccountId {
    /// Validate a raw identifier.
    pub fn new(id: i64) -> Result<Self, AccountValidationError> {
        if id <= 0 {
            return Err(AccountValidationError::InvalidId);
        }
        Ok(Self(id))
    }

    /// Raw integer value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

string_value! {
    /// Unique login name, 3 to 50 characters once trimmed.
    Username
}

impl Username {
    /// Validate and construct a username.
    pub fn new(value: impl Into<String>) -> Result<Self, AccountValidationError> {
        bounded("username", value.into(), USERNAME_MIN, USERNAME_MAX).map(Self)
    }
}

string_value! {
    /// Unique email address, at most 100 characters.
    Email
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

impl Email {
    /// Validate and construct an email address.
    pub fn new(value: impl Into<String>) -> Result<Self, AccountValidationError> {
        let value = bounded("email", value.into(), 1, EMAIL_MAX)?;
        if !email_regex().is_match(&value) {
            return Err(AccountValidationError::InvalidEmail);
        }
        Ok(Self(value))
    }
}

string_value! {
    /// Name shown to other users.
    DisplayName
}

impl DisplayName {
    /// Validate and construct a display name.
    pub fn new(value: impl Into<String>) -> Result<Self, AccountValidationError> {
        bounded("displayName", value.into(), 1, DISPLAY_NAME_MAX).map(Self)
    }
}

impl From<&Username> for DisplayName {
    fn from(value: &Username) -> Self {
        Self(value.0.clone())
    }
}

string_value! {
    /// Avatar image location, at most 500 characters.
    AvatarUrl
}

impl AvatarUrl {
    /// Validate and construct an avatar URL.
    pub fn new(value: impl Into<String>) -> Result<Self, AccountValidationError> {
        bounded("avatarUrl", value.into(), 1, AVATAR_URL_MAX).map(Self)
    }
}

string_value! {
    /// Profile link (GitHub, Twitter, personal site), at most 200 characters.
    SocialUrl
}

impl SocialUrl {
    /// Validate and construct a link for `field`.
    pub fn new(
        field: &'static str,
        value: impl Into<String>,
    ) -> Result<Self, AccountValidationError> {
        bounded(field, value.into(), 1, SOCIAL_URL_MAX).map(Self)
    }
}

/// One-way password hash in PHC string form.
///
/// `Debug` output is redacted so the hash never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash produced by a [`PasswordHasher`](super::ports::PasswordHasher).
    pub fn from_encoded(value: impl Into<String>) -> Result<Self, AccountValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AccountValidationError::Required {
                field: "passwordHash",
            });
        }
        Ok(Self(value))
    }

    /// Encoded hash string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Caller-supplied plaintext password, zeroed on drop.
///
/// Whitespace is preserved; only emptiness is rejected.
#[derive(Clone, PartialEq, Eq)]
pub struct RawPassword(Zeroizing<String>);

impl RawPassword {
    /// Accept any non-empty password, as used for verification.
    pub fn new(value: &str) -> Result<Self, AccountValidationError> {
        if value.is_empty() {
            return Err(AccountValidationError::Required { field: "password" });
        }
        Ok(Self(Zeroizing::new(value.to_owned())))
    }

    /// Accept a password that is about to be hashed and stored.
    pub fn for_storage(value: &str) -> Result<Self, AccountValidationError> {
        let password = Self::new(value)?;
        if value.chars().count() < PASSWORD_MIN {
            return Err(AccountValidationError::TooShort {
                field: "password",
                min: PASSWORD_MIN,
            });
        }
        Ok(password)
    }

    /// Plaintext value.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawPassword(<redacted>)")
    }
}

/// Optional outbound profile links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialLinks {
    pub github_url: Option<SocialUrl>,
    pub twitter_url: Option<SocialUrl>,
    pub website_url: Option<SocialUrl>,
}

/// Mutable, user-facing profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub display_name: DisplayName,
    pub avatar_url: Option<AvatarUrl>,
    pub bio: Option<String>,
    pub links: SocialLinks,
}

/// Engagement counters; never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementCounters {
    pub note_count: u32,
    pub view_count: u32,
    pub like_count: u32,
}

/// Whitelisted profile mutation.
///
/// Identity fields (id, username, email, password, counters) have no slot
/// here, so a patch can never change them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub display_name: Option<DisplayName>,
    pub avatar_url: Option<AvatarUrl>,
    pub bio: Option<String>,
    pub github_url: Option<SocialUrl>,
    pub twitter_url: Option<SocialUrl>,
    pub website_url: Option<SocialUrl>,
}

impl ProfilePatch {
    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Registration candidate supplied by the caller.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: Username,
    pub email: Email,
    pub password: RawPassword,
    /// Defaults to the username when absent.
    pub display_name: Option<DisplayName>,
    pub avatar_url: Option<AvatarUrl>,
    pub bio: Option<String>,
    pub links: SocialLinks,
}

/// Fully prepared record handed to the store for insertion.
///
/// The store assigns the id and both timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDraft {
    pub username: Username,
    pub email: Email,
    pub password_hash: PasswordHash,
    pub profile: Profile,
    pub counters: EngagementCounters,
    pub is_active: bool,
}

/// Components of a persisted account, used by store adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountParts {
    pub id: AccountId,
    pub username: Username,
    pub email: Email,
    pub password_hash: PasswordHash,
    pub profile: Profile,
    pub counters: EngagementCounters,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Durable identity record.
///
/// ## Invariants
/// - `id`, `username`, `email` and `created_at` never change after insert.
/// - `password_hash` is always a one-way hash, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    username: Username,
    email: Email,
    password_hash: PasswordHash,
    profile: Profile,
    counters: EngagementCounters,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Account {
    /// Rebuild an account from stored components.
    pub fn from_parts(parts: AccountParts) -> Self {
        let AccountParts {
            id,
            username,
            email,
            password_hash,
            profile,
            counters,
            is_active,
            created_at,
            updated_at,
        } = parts;
        Self {
            id,
            username,
            email,
            password_hash,
            profile,
            counters,
            is_active,
            created_at,
            updated_at,
        }
    }

    /// Decompose into stored components.
    pub fn into_parts(self) -> AccountParts {
        AccountParts {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            profile: self.profile,
            counters: self.counters,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn counters(&self) -> EngagementCounters {
        self.counters
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Merge the present fields of `patch` into the profile.
    pub fn apply_patch(&mut self, patch: ProfilePatch) {
        let ProfilePatch {
            display_name,
            avatar_url,
            bio,
            github_url,
            twitter_url,
            website_url,
        } = patch;
        let profile = &mut self.profile;
        if let Some(value) = display_name {
            profile.display_name = value;
        }
        if avatar_url.is_some() {
            profile.avatar_url = avatar_url;
        }
        if bio.is_some() {
            profile.bio = bio;
        }
        if github_url.is_some() {
            profile.links.github_url = github_url;
        }
        if twitter_url.is_some() {
            profile.links.twitter_url = twitter_url;
        }
        if website_url.is_some() {
            profile.links.website_url = website_url;
        }
    }

    /// Flip the activation flag.
    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    /// Replace the stored hash.
    pub fn set_password_hash(&mut self, hash: PasswordHash) {
        self.password_hash = hash;
    }

    /// Replace the counters.
    pub fn set_counters(&mut self, counters: EngagementCounters) {
        self.counters = counters;
    }

    /// Record the store's modification time.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}
