//! One-way password hashing and verification.
//!
//! Hashes are Argon2id PHC strings with a random per-password salt. Cost
//! parameters are configurable; the defaults are the argon2 crate's
//! recommended values.

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::{PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString};
use zeroize::Zeroizing;

const SALT_LEN: usize = 16;

/// Errors raised while hashing or parsing stored hashes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashingError {
    /// Cost parameters were rejected by the algorithm.
    #[error("invalid hashing parameters: {message}")]
    InvalidParams { message: String },
    /// The operating system random source failed.
    #[error("failed to generate salt: {message}")]
    Salt { message: String },
    /// Hash computation failed.
    #[error("failed to hash password: {message}")]
    Hash { message: String },
    /// A stored hash is not a valid PHC string.
    #[error("stored password hash is malformed: {message}")]
    MalformedHash { message: String },
}

/// Outcome of comparing a plaintext password with a stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Match,
    Mismatch,
}

/// Plaintext password held only for the duration of one use case.
///
/// The buffer is zeroed on drop and the value never appears in `Debug`
/// output.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Wrap a plaintext password.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Borrow the plaintext.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Irreversible password hash in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a stored hash string without parsing it.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// PHC string suitable for storage.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingCost {
    /// Memory size in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for HashingCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Salted one-way password hasher.
///
/// # Examples
/// ```
/// use user_service::domain::credentials::{CredentialHasher, HashingCost, Password, Verification};
///
/// let hasher = CredentialHasher::new(HashingCost::default()).expect("default cost is valid");
/// let password = Password::new("Password1!");
/// let hash = hasher.hash(&password).expect("hashing succeeds");
/// assert_eq!(hasher.verify(&password, &hash).expect("hash parses"), Verification::Match);
/// ```
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Build a hasher with the given cost.
    pub fn new(cost: HashingCost) -> Result<Self, HashingError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|err| HashingError::InvalidParams {
                message: err.to_string(),
            })?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(&self, password: &Password) -> Result<PasswordHash, HashingError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        getrandom::getrandom(&mut salt_bytes).map_err(|err| HashingError::Salt {
            message: err.to_string(),
        })?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|err| HashingError::Salt {
            message: err.to_string(),
        })?;

        let phc = self
            .argon2()
            .hash_password(password.expose().as_bytes(), &salt)
            .map_err(|err| HashingError::Hash {
                message: err.to_string(),
            })?;
        Ok(PasswordHash(phc.to_string()))
    }

    /// Compare a plaintext password against a stored hash.
    ///
    /// A mismatch is a normal outcome. Only an unparseable stored hash is an
    /// error. The comparison itself is constant time.
    pub fn verify(
        &self,
        password: &Password,
        hash: &PasswordHash,
    ) -> Result<Verification, HashingError> {
        let parsed = PhcHash::new(hash.as_str()).map_err(|err| HashingError::MalformedHash {
            message: err.to_string(),
        })?;
        // Parameters embedded in the PHC string take precedence over ours, so
        // hashes made under an older cost still verify.
        match self
            .argon2()
            .verify_password(password.expose().as_bytes(), &parsed)
        {
            Ok(()) => Ok(Verification::Match),
            Err(password_hash::Error::Password) => Ok(Verification::Mismatch),
            Err(err) => Err(HashingError::MalformedHash {
                message: err.to_string(),
            }),
        }
    }
}
