//! Domain types and use cases.
//!
//! Purpose: hold the transport-agnostic core of the service. Inbound
//! adapters call the [`ports::AuthService`] driving port; persistence
//! adapters implement [`ports::UserRepository`].
//!
//! Public surface:
//! - Error / ErrorCode: failure envelope shared by every adapter.
//! - User / UserId / NewUser / ProfileChanges / UserProfile: account model.
//! - CredentialHasher / PasswordHash: one-way password storage.
//! - TokenService / SessionClaims: stateless session tokens.
//! - UserAuthService: register, login, fetch and update use cases.

pub mod auth_service;
pub mod credentials;
pub mod error;
pub mod ports;
pub mod token;
pub mod trace_id;
pub mod user;
pub mod validation;

pub use self::auth_service::UserAuthService;
pub use self::credentials::{CredentialHasher, HashingCost, Password, PasswordHash};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::token::{MAX_TOKEN_TTL, SessionClaims, TokenError, TokenService};
pub use self::trace_id::TraceId;
pub use self::user::{NewUser, ProfileChanges, User, UserId, UserIdError, UserProfile};
pub use self::validation::ValidationReport;
