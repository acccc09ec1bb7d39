//! Service settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `USER_SERVICE_*` environment variables or a
//! configuration file. Optional fields fall back to the defaults below.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{CredentialHasher, HashingCost, MAX_TOKEN_TTL, TokenService};
use crate::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Problems with the loaded settings that prevent startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("missing required setting: {name}")]
    Missing { name: &'static str },
    #[error("invalid setting {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Runtime configuration for the user service.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(prefix = "USER_SERVICE")]
pub struct ServiceSettings {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// HMAC secret used to sign session tokens.
    pub jwt_secret: Option<String>,
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Session token lifetime in seconds.
    pub token_ttl_secs: Option<u64>,
    /// Argon2 memory cost in KiB.
    pub hash_memory_kib: Option<u32>,
    /// Argon2 pass count.
    pub hash_iterations: Option<u32>,
    /// Argon2 lane count.
    pub hash_parallelism: Option<u32>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Pool checkout timeout in seconds.
    pub db_connect_timeout_secs: Option<u64>,
}

impl ServiceSettings {
    /// Return the database URL.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Missing`] when unset or blank.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        required("database_url", self.database_url.as_deref())
    }

    /// Return the token signing secret.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Missing`] when unset or empty.
    pub fn jwt_secret(&self) -> Result<&str, SettingsError> {
        required("jwt_secret", self.jwt_secret.as_deref())
    }

    /// Parse the bind address, falling back to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Invalid`] when the value is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::Invalid {
            name: "bind_addr",
            message: err.to_string(),
        })
    }

    /// Token lifetime, defaulting to one day and capped at [`MAX_TOKEN_TTL`].
    pub fn token_ttl(&self) -> Duration {
        let secs = self.token_ttl_secs.unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        Duration::from_secs(secs).min(MAX_TOKEN_TTL)
    }

    /// Argon2 cost, with unset fields taken from the crate defaults.
    pub fn hashing_cost(&self) -> HashingCost {
        let defaults = HashingCost::default();
        HashingCost {
            memory_kib: self.hash_memory_kib.unwrap_or(defaults.memory_kib),
            iterations: self.hash_iterations.unwrap_or(defaults.iterations),
            parallelism: self.hash_parallelism.unwrap_or(defaults.parallelism),
        }
    }

    /// Build the credential hasher.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Invalid`] when argon2 rejects the cost parameters.
    pub fn credential_hasher(&self) -> Result<CredentialHasher, SettingsError> {
        CredentialHasher::new(self.hashing_cost()).map_err(|err| SettingsError::Invalid {
            name: "hash_*",
            message: err.to_string(),
        })
    }

    /// Build the session token service from the signing secret and TTL.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Missing`] without a secret.
    pub fn token_service(&self) -> Result<TokenService, SettingsError> {
        let secret = self.jwt_secret()?;
        TokenService::new(secret.as_bytes(), self.token_ttl()).map_err(|err| {
            SettingsError::Invalid {
                name: "jwt_secret",
                message: err.to_string(),
            }
        })
    }

    /// Build the connection pool configuration.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Missing`] without a database URL.
    pub fn pool_config(&self) -> Result<PoolConfig, SettingsError> {
        Ok(PoolConfig::new(self.database_url()?)
            .with_max_size(
                self.db_max_connections
                    .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            )
            .with_connection_timeout(Duration::from_secs(
                self.db_connect_timeout_secs
                    .unwrap_or(DEFAULT_DB_CONNECT_TIMEOUT_SECS),
            )))
    }
}

fn required<'a>(name: &'static str, value: Option<&'a str>) -> Result<&'a str, SettingsError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SettingsError::Missing { name }),
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing and derived components.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 9] = [
        "USER_SERVICE_DATABASE_URL",
        "USER_SERVICE_JWT_SECRET",
        "USER_SERVICE_BIND_ADDR",
        "USER_SERVICE_TOKEN_TTL_SECS",
        "USER_SERVICE_HASH_MEMORY_KIB",
        "USER_SERVICE_HASH_ITERATIONS",
        "USER_SERVICE_HASH_PARALLELISM",
        "USER_SERVICE_DB_MAX_CONNECTIONS",
        "USER_SERVICE_DB_CONNECT_TIMEOUT_SECS",
    ];

    fn load_from_empty_args() -> ServiceSettings {
        ServiceSettings::load_from_iter([OsString::from("user-service")])
            .expect("config should load")
    }

    fn env_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(env_with(&[]));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr(),
            Ok("0.0.0.0:8080".parse().expect("valid address"))
        );
        assert_eq!(settings.token_ttl(), Duration::from_secs(86_400));
        assert_eq!(settings.hashing_cost(), HashingCost::default());
        assert_eq!(
            settings.database_url(),
            Err(SettingsError::Missing {
                name: "database_url"
            })
        );
        assert!(settings.token_service().is_err());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("USER_SERVICE_DATABASE_URL", "postgres://db/users"),
            ("USER_SERVICE_JWT_SECRET", "s3cret"),
            ("USER_SERVICE_BIND_ADDR", "127.0.0.1:9000"),
            ("USER_SERVICE_TOKEN_TTL_SECS", "60"),
            ("USER_SERVICE_HASH_MEMORY_KIB", "8"),
            ("USER_SERVICE_HASH_ITERATIONS", "1"),
            ("USER_SERVICE_DB_MAX_CONNECTIONS", "3"),
        ]));

        let settings = load_from_empty_args();
        assert_eq!(settings.database_url(), Ok("postgres://db/users"));
        assert_eq!(settings.jwt_secret(), Ok("s3cret"));
        assert_eq!(
            settings.bind_addr(),
            Ok("127.0.0.1:9000".parse().expect("valid address"))
        );
        assert_eq!(settings.token_ttl(), Duration::from_secs(60));
        assert_eq!(settings.hashing_cost().memory_kib, 8);
        assert_eq!(settings.hashing_cost().iterations, 1);
        let pool = settings.pool_config().expect("pool config");
        assert_eq!(pool.max_size(), 3);
        assert_eq!(pool.connection_timeout(), Duration::from_secs(30));
        assert!(settings.token_service().is_ok());
        assert!(settings.credential_hasher().is_ok());
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    fn blank_secret_is_missing(#[case] secret: Option<&str>) {
        let settings = ServiceSettings {
            jwt_secret: secret.map(str::to_owned),
            ..ServiceSettings::default()
        };

        assert_eq!(
            settings.jwt_secret(),
            Err(SettingsError::Missing { name: "jwt_secret" })
        );
    }

    #[rstest]
    fn huge_token_lifetime_is_capped() {
        let _guard = lock_env(env_with(&[
            ("USER_SERVICE_JWT_SECRET", "s3cret"),
            ("USER_SERVICE_TOKEN_TTL_SECS", "18446744073709551615"),
        ]));

        let settings = load_from_empty_args();
        assert_eq!(settings.token_ttl(), MAX_TOKEN_TTL);
        let tokens = settings.token_service().expect("token service");
        let id = crate::domain::UserId::new(1).expect("positive id");
        let token = tokens.issue(id).expect("signing succeeds");
        assert!(tokens.verify(&format!("Bearer {token}")).is_ok());
    }

    #[rstest]
    fn default_settings_match_an_empty_load() {
        let _guard = lock_env(env_with(&[]));

        let loaded = load_from_empty_args();
        let defaults = ServiceSettings::default();
        assert_eq!(loaded.token_ttl(), defaults.token_ttl());
        assert_eq!(loaded.bind_addr(), defaults.bind_addr());
        assert_eq!(loaded.hashing_cost(), defaults.hashing_cost());
        assert!(loaded.jwt_secret.is_none());
    }

    #[rstest]
    fn malformed_bind_address_is_invalid() {
        let _guard = lock_env(env_with(&[("USER_SERVICE_BIND_ADDR", "not-an-address")]));

        let settings = load_from_empty_args();
        assert!(matches!(
            settings.bind_addr(),
            Err(SettingsError::Invalid {
                name: "bind_addr",
                ..
            })
        ));
    }
}
