//! Registration, login and profile use cases.
//!
//! [`UserAuthService`] implements the [`AuthService`] driving port by
//! composing the validator, the credential hasher, the token service and a
//! [`UserRepository`]. Each use case is a fixed pipeline that stops at the
//! first failing stage.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::credentials::{
    CredentialHasher, HashingError, Password, PasswordHash, Verification,
};
use crate::domain::ports::{
    AuthService, LoginOutcome, LoginRequest, RegisterRequest, UpdateProfileRequest,
    UserPersistenceError, UserRepository,
};
use crate::domain::token::{TokenError, TokenService};
use crate::domain::validation::{
    ValidationReport, validate_name, validate_password, validate_phone,
};
use crate::domain::{Error, NewUser, ProfileChanges, TraceId, User, UserId, UserProfile};

/// Message returned for every rejected login.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "invalid phone number or password";
/// Message returned when a phone number is already taken.
pub const DUPLICATE_PHONE_MESSAGE: &str = "phone number already registered";
/// Message returned when a verified token names a user that no longer exists.
pub const USER_NOT_FOUND_MESSAGE: &str = "user not found";

/// Credential and session service implementing the [`AuthService`] port.
#[derive(Clone)]
pub struct UserAuthService<R> {
    users: Arc<R>,
    hasher: CredentialHasher,
    tokens: TokenService,
}

impl<R> UserAuthService<R> {
    /// Create a new service over the given repository.
    pub fn new(users: Arc<R>, hasher: CredentialHasher, tokens: TokenService) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }
}

impl<R> UserAuthService<R>
where
    R: UserRepository,
{
    fn map_persistence_error(error: UserPersistenceError) -> Error {
        match error {
            UserPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserPersistenceError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserPersistenceError::Duplicate { .. } => Error::duplicate_data(DUPLICATE_PHONE_MESSAGE),
            UserPersistenceError::NotFound { .. } => Error::forbidden(USER_NOT_FOUND_MESSAGE),
        }
    }

    fn map_hashing_error(error: HashingError) -> Error {
        Error::internal(format!("password hashing failed: {error}"))
    }

    fn map_token_error(error: TokenError) -> Error {
        match error {
            TokenError::EmptySecret | TokenError::Signing { .. } => {
                Error::internal(format!("session token unavailable: {error}"))
            }
            TokenError::MalformedHeader
            | TokenError::InvalidAlgorithm
            | TokenError::Expired
            | TokenError::InvalidToken { .. }
            | TokenError::InvalidSubject => Error::forbidden(error.to_string()),
        }
    }

    fn invalid_credentials() -> Error {
        Error::invalid_request(INVALID_CREDENTIALS_MESSAGE)
    }

    /// Run CPU-bound hashing work off the async executor, keeping the
    /// request trace id in scope for anything it logs.
    async fn run_blocking<F, T>(work: F) -> Result<T, Error>
    where
        F: FnOnce() -> Result<T, HashingError> + Send + 'static,
        T: Send + 'static,
    {
        let outcome = TraceId::spawn_blocking(work)
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?;
        outcome.map_err(Self::map_hashing_error)
    }

    async fn hash_password(&self, password: Password) -> Result<PasswordHash, Error> {
        let hasher = self.hasher.clone();
        Self::run_blocking(move || hasher.hash(&password)).await
    }

    async fn verify_password(
        &self,
        password: Password,
        hash: PasswordHash,
    ) -> Result<Verification, Error> {
        let hasher = self.hasher.clone();
        Self::run_blocking(move || hasher.verify(&password, &hash)).await
    }

    fn verify_session(&self, authorization: &str) -> Result<UserId, Error> {
        self.tokens
            .verify(authorization)
            .map(|claims| claims.user_id)
            .map_err(|err| {
                warn!(error = %err, "session token rejected");
                Self::map_token_error(err)
            })
    }

    async fn load_user(&self, id: UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| {
                warn!(user_id = %id, "token names an unknown user");
                Error::forbidden(USER_NOT_FOUND_MESSAGE)
            })
    }

    fn validate_registration(request: &RegisterRequest) -> Result<(), Error> {
        let mut report = validate_phone(&request.phone);
        report.extend(validate_name(&request.name));
        report.extend(validate_password(request.password.expose()));
        report.into_result()
    }

    fn validate_update(request: &UpdateProfileRequest) -> Result<(), Error> {
        let mut report = ValidationReport::default();
        if !request.phone.is_empty() {
            report.extend(validate_phone(&request.phone));
        }
        if !request.name.is_empty() {
            report.extend(validate_name(&request.name));
        }
        report.into_result()
    }
}

#[async_trait]
impl<R> AuthService for UserAuthService<R>
where
    R: UserRepository + 'static,
{
    async fn register(&self, request: RegisterRequest) -> Result<UserId, Error> {
        Self::validate_registration(&request)?;

        // Advisory only; the store's uniqueness constraint is authoritative.
        if self
            .users
            .find_by_phone(&request.phone)
            .await
            .map_err(Self::map_persistence_error)?
            .is_some()
        {
            return Err(Error::duplicate_data(DUPLICATE_PHONE_MESSAGE));
        }

        let RegisterRequest {
            phone,
            name,
            password,
        } = request;
        let password_hash = self.hash_password(password).await?;
        let user = self
            .users
            .create(&NewUser {
                phone,
                name,
                password_hash,
            })
            .await
            .map_err(Self::map_persistence_error)?;

        info!(user_id = %user.id, "user registered");
        Ok(user.id)
    }

    async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, Error> {
        let LoginRequest { phone, password } = request;
        let Some(user) = self
            .users
            .find_by_phone(&phone)
            .await
            .map_err(Self::map_persistence_error)?
        else {
            warn!("login rejected: unknown phone number");
            return Err(Self::invalid_credentials());
        };

        match self
            .verify_password(password, user.password_hash.clone())
            .await?
        {
            Verification::Match => {}
            Verification::Mismatch => {
                warn!(user_id = %user.id, "login rejected: password mismatch");
                return Err(Self::invalid_credentials());
            }
        }

        let token = self.tokens.issue(user.id).map_err(Self::map_token_error)?;
        self.users
            .increment_login_count(user.id)
            .await
            .map_err(Self::map_persistence_error)?;

        info!(user_id = %user.id, "user logged in");
        Ok(LoginOutcome {
            user_id: user.id,
            token,
        })
    }

    async fn authenticate(&self, authorization: &str) -> Result<UserId, Error> {
        self.verify_session(authorization)
    }

    async fn fetch_profile(&self, authorization: &str) -> Result<UserProfile, Error> {
        let user_id = self.verify_session(authorization)?;
        let user = self.load_user(user_id).await?;
        Ok(user.profile())
    }

    async fn update_profile(
        &self,
        authorization: &str,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile, Error> {
        let user_id = self.verify_session(authorization)?;
        Self::validate_update(&request)?;

        let changes = ProfileChanges::from_optional_fields(&request.phone, &request.name);
        let user = self
            .users
            .update_profile(user_id, &changes)
            .await
            .map_err(Self::map_persistence_error)?;

        info!(user_id = %user_id, "profile updated");
        Ok(user.profile())
    }
}

#[cfg(test)]
#[path = "auth_service_tests.rs"]
mod tests;
