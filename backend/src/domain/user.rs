//! User data model.
//!
//! The persisted [`User`] record is owned by the user repository; the domain
//! only ever reads it back. The password hash travels with the record so the
//! login flow can verify credentials, but it is never serialised.

use std::fmt;

use chrono::{DateTime, Utc};

use super::credentials::PasswordHash;

/// Validation errors returned when parsing a [`UserId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserIdError {
    /// The identifier was not a decimal integer.
    #[error("user id must be numeric")]
    NotNumeric,
    /// The identifier was zero or negative.
    #[error("user id must be positive")]
    NotPositive,
}

/// Opaque, stable user identifier assigned by storage at creation.
///
/// # Examples
/// ```
/// use user_service::domain::UserId;
///
/// let id: UserId = "42".parse().expect("numeric id");
/// assert_eq!(id.get(), 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(i64);

impl UserId {
    /// Construct an identifier from a raw storage value.
    pub fn new(raw: i64) -> Result<Self, UserIdError> {
        if raw <= 0 {
            return Err(UserIdError::NotPositive);
        }
        Ok(Self(raw))
    }

    /// Raw integer value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = UserIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.parse::<i64>().map_err(|_| UserIdError::NotNumeric)?;
        Self::new(raw)
    }
}

/// Persisted user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Storage-assigned identifier.
    pub id: UserId,
    /// Phone number, unique across all users.
    pub phone: String,
    /// Display name.
    pub name: String,
    /// Irreversible password hash.
    pub password_hash: PasswordHash,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last profile update, if any.
    pub updated_at: Option<DateTime<Utc>>,
    /// Number of successful logins.
    pub login_count: i64,
}

impl User {
    /// Public profile view of the account.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            name: self.name.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Values required to create a user row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub phone: String,
    pub name: String,
    pub password_hash: PasswordHash,
}

/// Column-level profile changes. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub phone: Option<String>,
    pub name: Option<String>,
}

impl ProfileChanges {
    /// Build changes from raw request values, treating empty strings as
    /// "keep the stored value".
    ///
    /// # Examples
    /// ```
    /// use user_service::domain::ProfileChanges;
    ///
    /// let changes = ProfileChanges::from_optional_fields("", "halo halo");
    /// assert_eq!(changes.phone, None);
    /// assert_eq!(changes.name.as_deref(), Some("halo halo"));
    /// ```
    pub fn from_optional_fields(phone: &str, name: &str) -> Self {
        let non_empty = |value: &str| (!value.is_empty()).then(|| value.to_owned());
        Self {
            phone: non_empty(phone),
            name: non_empty(name),
        }
    }
}

/// Name and phone pair returned by profile use cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub phone: String,
}
