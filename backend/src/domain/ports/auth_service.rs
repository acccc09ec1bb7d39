//! Driving port for the registration, login and profile use cases.
//!
//! Inbound adapters hand raw request values to this port and receive either a
//! typed outcome or a domain [`Error`]. Request constructors trim surrounding
//! whitespace so every adapter applies the same normalisation.

use async_trait::async_trait;

use crate::domain::credentials::Password;
use crate::domain::{Error, UserId, UserProfile};

/// Input for [`AuthService::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub phone: String,
    pub name: String,
    pub password: Password,
}

impl RegisterRequest {
    /// Build a request from raw values, trimming each one.
    pub fn new(phone: &str, name: &str, password: &str) -> Self {
        Self {
            phone: phone.trim().to_owned(),
            name: name.trim().to_owned(),
            password: Password::new(password.trim()),
        }
    }
}

/// Input for [`AuthService::login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub phone: String,
    pub password: Password,
}

impl LoginRequest {
    /// Build a request from raw values, trimming each one.
    pub fn new(phone: &str, password: &str) -> Self {
        Self {
            phone: phone.trim().to_owned(),
            password: Password::new(password.trim()),
        }
    }
}

/// Successful login result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub user_id: UserId,
    pub token: String,
}

/// Input for [`AuthService::update_profile`]. Empty fields keep the stored
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateProfileRequest {
    pub phone: String,
    pub name: String,
}

impl UpdateProfileRequest {
    /// Build a request from raw values, trimming each one.
    pub fn new(phone: &str, name: &str) -> Self {
        Self {
            phone: phone.trim().to_owned(),
            name: name.trim().to_owned(),
        }
    }
}

/// Domain use-case port for credential and session handling.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account and return its identifier.
    async fn register(&self, request: RegisterRequest) -> Result<UserId, Error>;

    /// Check credentials and issue a session token.
    async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, Error>;

    /// Verify the session token in an `Authorization` header without
    /// touching storage.
    async fn authenticate(&self, authorization: &str) -> Result<UserId, Error>;

    /// Return the profile of the user named by the `Authorization` header.
    async fn fetch_profile(&self, authorization: &str) -> Result<UserProfile, Error>;

    /// Update the profile of the user named by the `Authorization` header.
    async fn update_profile(
        &self,
        authorization: &str,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile, Error>;
}
