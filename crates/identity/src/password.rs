//! Password hashing boundary.
//!
//! Argon2id with per-hash random salts, stored as PHC strings. Callers only
//! ever see the hash newtype and the compare boolean; algorithm parameters
//! stay behind this module.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::password_hash::rand_core::OsRng;
use argon2::Argon2;
use thiserror::Error;

use crate::user::PasswordHashString;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Hashes and compares credentials.
///
/// `compare` answers only yes/no: a malformed stored hash is an error, a
/// mismatching password is `Ok(false)`.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, raw: &str) -> Result<PasswordHashString, PasswordError>;
    fn compare(&self, raw: &str, hash: &PasswordHashString) -> Result<bool, PasswordError>;
}

/// Argon2id hasher with library-default parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, raw: &str) -> Result<PasswordHashString, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?;
        Ok(PasswordHashString::new(hash.to_string()))
    }

    fn compare(&self, raw: &str, hash: &PasswordHashString) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash.as_str())
            .map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
        match Argon2::default().verify_password(raw.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_compare_accepts_the_password() {
        let hasher = Argon2Hasher::new();
        let hash = hasher.hash("correct horse battery staple").unwrap();

        assert!(hash.as_str().starts_with("$argon2id$"));
        assert!(hasher.compare("correct horse battery staple", &hash).unwrap());
    }

    #[test]
    fn wrong_password_compares_false_not_error() {
        let hasher = Argon2Hasher::new();
        let hash = hasher.hash("correct horse battery staple").unwrap();

        assert!(!hasher.compare("tr0ub4dor&3", &hash).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        let hasher = Argon2Hasher::new();
        let first = hasher.hash("same password").unwrap();
        let second = hasher.hash("same password").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        let hasher = Argon2Hasher::new();
        let result = hasher.compare("anything", &PasswordHashString::new("not-a-phc-string"));
        assert!(matches!(result, Err(PasswordError::MalformedHash(_))));
    }
}
