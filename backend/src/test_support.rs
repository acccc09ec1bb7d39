//! Test utilities for the user service crate.
//!
//! Shared by unit tests in `src/` and integration tests in `tests/`. Only
//! compiled for tests or with the `test-support` feature.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::credentials::{CredentialHasher, HashingCost};
use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{NewUser, ProfileChanges, TokenService, User, UserAuthService, UserId};

/// Signing secret used by test token services.
pub const TEST_SIGNING_SECRET: &[u8] = b"test-support-signing-secret";

/// Credential hasher at the smallest cost Argon2 accepts.
pub fn fast_hasher() -> CredentialHasher {
    match CredentialHasher::new(HashingCost {
        memory_kib: argon2::Params::MIN_M_COST,
        iterations: argon2::Params::MIN_T_COST,
        parallelism: argon2::Params::MIN_P_COST,
    }) {
        Ok(hasher) => hasher,
        Err(err) => panic!("minimum argon2 cost must be accepted: {err}"),
    }
}

/// Token service signing with [`TEST_SIGNING_SECRET`] and a one hour lifetime.
pub fn test_token_service() -> TokenService {
    match TokenService::new(TEST_SIGNING_SECRET, Duration::from_secs(3600)) {
        Ok(tokens) => tokens,
        Err(err) => panic!("test signing secret must be accepted: {err}"),
    }
}

/// Auth service over a fresh in-memory repository.
pub fn in_memory_auth_service() -> (
    UserAuthService<InMemoryUserRepository>,
    Arc<InMemoryUserRepository>,
) {
    let users = Arc::new(InMemoryUserRepository::default());
    let service = UserAuthService::new(users.clone(), fast_hasher(), test_token_service());
    (service, users)
}

#[derive(Debug, Default)]
struct Store {
    next_id: i64,
    rows: BTreeMap<i64, User>,
}

impl Store {
    fn phone_taken(&self, phone: &str, except: Option<UserId>) -> bool {
        self.rows
            .values()
            .any(|user| user.phone == phone && Some(user.id) != except)
    }
}

/// In-memory [`UserRepository`] enforcing phone uniqueness under one lock.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    store: Mutex<Store>,
}

impl InMemoryUserRepository {
    fn lock(&self) -> Result<MutexGuard<'_, Store>, UserPersistenceError> {
        self.store
            .lock()
            .map_err(|_| UserPersistenceError::connection("in-memory store poisoned"))
    }

    /// Snapshot of a stored user, bypassing the port.
    pub fn get(&self, id: UserId) -> Option<User> {
        self.lock()
            .ok()
            .and_then(|store| store.rows.get(&id.get()).cloned())
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.lock().map(|store| store.rows.len()).unwrap_or_default()
    }

    /// True when no users are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, UserPersistenceError> {
        let mut store = self.lock()?;
        if store.phone_taken(&user.phone, None) {
            return Err(UserPersistenceError::duplicate(format!(
                "phone {} already exists",
                user.phone
            )));
        }

        store.next_id += 1;
        let id = UserId::new(store.next_id)
            .map_err(|err| UserPersistenceError::query(err.to_string()))?;
        let created = User {
            id,
            phone: user.phone.clone(),
            name: user.name.clone(),
            password_hash: user.password_hash.clone(),
            created_at: Utc::now(),
            updated_at: None,
            login_count: 0,
        };
        store.rows.insert(id.get(), created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.lock()?.rows.get(&id.get()).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .lock()?
            .rows
            .values()
            .find(|user| user.phone == phone)
            .cloned())
    }

    async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges,
    ) -> Result<User, UserPersistenceError> {
        let mut store = self.lock()?;
        if let Some(phone) = changes.phone.as_deref() {
            if store.phone_taken(phone, Some(id)) {
                return Err(UserPersistenceError::duplicate(format!(
                    "phone {phone} already exists"
                )));
            }
        }

        let user = store
            .rows
            .get_mut(&id.get())
            .ok_or_else(|| UserPersistenceError::not_found(format!("id {id}")))?;
        if let Some(phone) = &changes.phone {
            user.phone.clone_from(phone);
        }
        if let Some(name) = &changes.name {
            user.name.clone_from(name);
        }
        user.updated_at = Some(Utc::now());
        Ok(user.clone())
    }

    async fn increment_login_count(&self, id: UserId) -> Result<(), UserPersistenceError> {
        let mut store = self.lock()?;
        let user = store
            .rows
            .get_mut(&id.get())
            .ok_or_else(|| UserPersistenceError::not_found(format!("id {id}")))?;
        user.login_count += 1;
        Ok(())
    }
}
