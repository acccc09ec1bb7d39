//! PostgreSQL persistence adapter using Diesel ORM.
//!
//! Diesel row structs (`models.rs`) and table definitions (`schema.rs`) are
//! internal; only the repository, the pool and the migration runner are
//! exported. Database errors are mapped to [`UserPersistenceError`] before
//! leaving this module.
//!
//! [`UserPersistenceError`]: crate::domain::ports::UserPersistenceError

mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
