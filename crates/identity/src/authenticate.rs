//! Credential authentication flow (signup and login).

use thiserror::Error;

use tallyboard_core::{DomainError, Role};

use crate::password::{CredentialHasher, PasswordError};
use crate::repository::{RepositoryError, UserRepository};
use crate::user::{NewUser, UserRecord};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Signs users up and checks their credentials.
///
/// The session core consumes only the outcome: a [`UserRecord`] to project
/// a principal from, or `None`.
pub struct Authenticator<R, H> {
    repo: R,
    hasher: H,
}

impl<R, H> Authenticator<R, H>
where
    R: UserRepository,
    H: CredentialHasher,
{
    pub fn new(repo: R, hasher: H) -> Self {
        Self { repo, hasher }
    }

    /// Register a new user with a raw password.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        role: Role,
        password: &str,
    ) -> Result<UserRecord, AuthError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            ))
            .into());
        }

        let password_hash = self.hasher.hash(password)?;
        let record = self
            .repo
            .signup(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                role,
                password_hash,
            })
            .await?;

        tracing::info!(user = %record.id, "user signed up");
        Ok(record)
    }

    /// Check credentials against the stored hash.
    ///
    /// Unknown email and wrong password are both `None`: callers cannot
    /// tell which, and must not try to.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, AuthError> {
        let Some(record) = self.repo.find_by_email(email).await? else {
            return Ok(None);
        };

        if self.hasher.compare(password, &record.password_hash)? {
            tracing::info!(user = %record.id, "login succeeded");
            Ok(Some(record))
        } else {
            tracing::debug!("login failed: credential mismatch");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::password::Argon2Hasher;
    use crate::repository::InMemoryUserRepository;

    fn authenticator() -> Authenticator<InMemoryUserRepository, Argon2Hasher> {
        Authenticator::new(InMemoryUserRepository::new(), Argon2Hasher::new())
    }

    #[tokio::test]
    async fn signup_then_login_round_trips() {
        let auth = authenticator();
        let record = auth
            .signup("Alice Smith", "alice@example.com", Role::Admin, "hunter22")
            .await
            .unwrap();

        let logged_in = auth.login("alice@example.com", "hunter22").await.unwrap();
        assert_eq!(logged_in, Some(record));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let auth = authenticator();
        auth.signup("Alice Smith", "alice@example.com", Role::User, "hunter22")
            .await
            .unwrap();

        let wrong_password = auth.login("alice@example.com", "wrong").await.unwrap();
        let unknown_email = auth.login("bob@example.com", "hunter22").await.unwrap();
        assert_eq!(wrong_password, unknown_email);
        assert_eq!(wrong_password, None);
    }

    #[tokio::test]
    async fn short_password_is_rejected_at_signup() {
        let auth = authenticator();
        let result = auth
            .signup("Alice Smith", "alice@example.com", Role::User, "short")
            .await;
        assert!(matches!(result, Err(AuthError::Invalid(_))));
    }
}
