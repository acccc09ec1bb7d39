//! Driven port for user account persistence.
//!
//! Every operation is one atomic unit of work in the adapter. Phone number
//! uniqueness is enforced by the store at write time and reported as
//! [`UserPersistenceError::Duplicate`], never as a generic query failure.

use async_trait::async_trait;

use crate::domain::{NewUser, ProfileChanges, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// A write would give two users the same phone number.
        Duplicate { message: String } => "user repository rejected duplicate: {message}",
        /// The targeted user row does not exist.
        NotFound { message: String } => "user not found: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user and return the stored row.
    async fn create(&self, user: &NewUser) -> Result<User, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by phone number.
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, UserPersistenceError>;

    /// Apply column-level profile changes, refresh the update timestamp and
    /// return the stored row.
    ///
    /// Returns [`UserPersistenceError::NotFound`] when no row matches `id`.
    async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges,
    ) -> Result<User, UserPersistenceError>;

    /// Add one to the login counter.
    ///
    /// Returns [`UserPersistenceError::NotFound`] when no row matches `id`.
    async fn increment_login_count(&self, id: UserId) -> Result<(), UserPersistenceError>;
}
