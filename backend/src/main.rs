//! User service entry-point: settings, migrations, pool and HTTP server.

mod server;

use std::sync::Arc;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, create_server};
use user_service::config::ServiceSettings;
use user_service::domain::UserAuthService;
use user_service::inbound::http::health::HealthState;
use user_service::outbound::persistence::{DbPool, DieselUserRepository, run_pending_migrations};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServiceSettings::load_from_iter(std::env::args_os())
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let pool_config = settings.pool_config().map_err(std::io::Error::other)?;
    let hasher = settings.credential_hasher().map_err(std::io::Error::other)?;
    let tokens = settings.token_service().map_err(std::io::Error::other)?;

    let database_url = pool_config.database_url().to_owned();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&database_url))
        .await
        .map_err(|e| std::io::Error::other(format!("migration task failed: {e}")))?
        .map_err(std::io::Error::other)?;
    info!(applied, "database schema up to date");

    let pool = DbPool::new(pool_config)
        .await
        .map_err(std::io::Error::other)?;
    let users = Arc::new(DieselUserRepository::new(pool));
    let auth = Arc::new(UserAuthService::new(users, hasher, tokens));

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, ServerConfig::new(bind_addr, auth))?;
    info!(%bind_addr, "user service listening");
    server.await
}
