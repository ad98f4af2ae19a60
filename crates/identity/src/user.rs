//! User records at the persistence boundary.

use serde::{Deserialize, Serialize};

use tallyboard_core::{DomainError, DomainResult, Role, UserId};

/// A password hash in PHC string form.
///
/// Opaque to everything except the hasher that produced it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for PasswordHashString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Hashes stay out of logs and debug output.
        f.write_str("PasswordHashString(<redacted>)")
    }
}

/// A stored user, as returned by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: PasswordHashString,
}

/// Signup payload. The password arrives already hashed; raw credentials
/// never reach the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: PasswordHashString,
}

impl NewUser {
    /// Deterministically validate the signup fields.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name must not be empty"));
        }
        validate_email(&self.email)
    }
}

pub(crate) fn validate_email(email: &str) -> DomainResult<()> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(DomainError::validation("email must contain '@'"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(DomainError::validation("email is malformed"));
    }
    Ok(())
}
