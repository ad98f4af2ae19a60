//! User repository boundary.
//!
//! This is the contract the rest of the system programs against; the SQL
//! implementation lives with the application, not here.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use tallyboard_core::UserId;

use crate::user::{NewUser, UserRecord};

/// Repository operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("email is already registered")]
    DuplicateEmail,

    #[error("signup payload is invalid: {0}")]
    InvalidSignup(String),

    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// Stores and looks up users.
///
/// Email lookup is case-insensitive; emails are unique.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user and return the stored record.
    async fn signup(&self, new_user: NewUser) -> Result<UserRecord, RepositoryError>;

    /// Look up a user by email. `None` is not an error.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError>;
}

/// In-memory user repository.
///
/// Intended for tests/dev. Keyed by lowercased email.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn signup(&self, new_user: NewUser) -> Result<UserRecord, RepositoryError> {
        new_user
            .validate()
            .map_err(|e| RepositoryError::InvalidSignup(e.to_string()))?;

        let key = new_user.email.to_lowercase();
        let mut users = self
            .users
            .write()
            .map_err(|_| RepositoryError::Unavailable("lock poisoned".to_string()))?;

        if users.contains_key(&key) {
            return Err(RepositoryError::DuplicateEmail);
        }

        let record = UserRecord {
            id: UserId::new(),
            name: new_user.name,
            email: new_user.email,
            role: new_user.role,
            password_hash: new_user.password_hash,
        };
        users.insert(key, record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let users = self
            .users
            .read()
            .map_err(|_| RepositoryError::Unavailable("lock poisoned".to_string()))?;
        Ok(users.get(&email.to_lowercase()).cloned())
    }
}
