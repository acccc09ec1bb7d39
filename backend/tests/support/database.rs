//! PostgreSQL provisioning for the Diesel suites.
//!
//! The suites run only when `USER_SERVICE_TEST_DATABASE_URL` points at a
//! reachable server. Without it each test prints a skip marker and returns.

use user_service::outbound::persistence::{
    DbPool, DieselUserRepository, PoolConfig, run_pending_migrations,
};
use uuid::Uuid;

pub const DATABASE_URL_VAR: &str = "USER_SERVICE_TEST_DATABASE_URL";

/// Read the test database URL, printing a skip marker when it is unset.
pub fn database_url() -> Option<String> {
    match std::env::var(DATABASE_URL_VAR) {
        Ok(url) if !url.trim().is_empty() => Some(url),
        _ => {
            eprintln!("SKIP-TEST-DATABASE: {DATABASE_URL_VAR} is not set");
            None
        }
    }
}

/// Migrate the database and build a repository over a small pool.
pub async fn repository(database_url: String) -> DieselUserRepository {
    let migrate_url = database_url.clone();
    tokio::task::spawn_blocking(move || run_pending_migrations(&migrate_url))
        .await
        .expect("migration task joins")
        .expect("migrations apply");

    let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(2))
        .await
        .expect("pool builds");
    DieselUserRepository::new(pool)
}

/// A valid phone number no other test run is likely to use.
pub fn unique_phone() -> String {
    let digits = Uuid::new_v4().as_u128() % 10_000_000_000;
    format!("+62{digits:010}")
}
