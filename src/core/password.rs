use crate::error::{AppError, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::rngs::OsRng;
use std::fmt::Debug;

/// A one-way, salted password hashing capability.
///
/// Implementations are CPU-bound; callers run them on the blocking pool.
pub trait PasswordScheme: Debug + Send + Sync + 'static {
    /// Hashes `password` with a fresh salt and returns a self-describing hash string.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if hashing fails.
    fn hash(&self, password: &str) -> Result<String>;

    /// Checks `password` against a hash produced by [`PasswordScheme::hash`].
    ///
    /// # Errors
    /// Returns `AppError::Internal` if the stored hash cannot be parsed.
    fn verify(&self, password: &str, password_hash: &str) -> Result<bool>;

    /// A valid hash of an unguessable password. Login verifies against it when the
    /// username does not exist so both failure paths cost the same.
    fn dummy_hash(&self) -> &str;
}

#[derive(Clone, Debug)]
pub struct Argon2Scheme {
    params: Params,
    dummy_hash: String,
}

impl Argon2Scheme {
    /// Builds an Argon2id scheme with the given cost parameters.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if the parameters are out of range.
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None).map_err(|e| {
            tracing::error!(error = %e, "Invalid Argon2 parameters");
            AppError::Internal
        })?;

        let mut scheme = Self { params, dummy_hash: String::new() };
        scheme.dummy_hash = scheme.hash(&crate::core::token::generate_opaque_token())?;
        Ok(scheme)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordScheme for Argon2Scheme {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash =
            self.argon2().hash_password(password.as_bytes(), &salt).map_err(|_| AppError::Internal)?.to_string();
        Ok(password_hash)
    }

    fn verify(&self, password: &str, password_hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(password_hash).map_err(|_| AppError::Internal)?;
        Ok(self.argon2().verify_password(password.as_bytes(), &parsed_hash).is_ok())
    }

    fn dummy_hash(&self) -> &str {
        &self.dummy_hash
    }
}
