//! Domain ports for the hexagonal boundary.
//!
//! `AuthService` is the driving port called by inbound adapters.
//! `UserRepository` is the driven port implemented by persistence adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_service;
mod user_repository;

#[cfg(test)]
pub use auth_service::MockAuthService;
pub use auth_service::{
    AuthService, LoginOutcome, LoginRequest, RegisterRequest, UpdateProfileRequest,
};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
