//! Unit-of-work boundary.
//!
//! Transactional scoping for repository operations. Backends map `begin`/
//! `commit`/`rollback` onto their native transactions; [`with_transaction`]
//! wraps the three into a scoped helper so callers cannot forget to settle
//! a transaction.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::repository::RepositoryError;

/// Future returned by transactional work.
pub type TxFuture<'t, T> = Pin<Box<dyn Future<Output = Result<T, RepositoryError>> + Send + 't>>;

/// Transaction lifecycle contract.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Tx: Send;

    async fn begin(&self) -> Result<Self::Tx, RepositoryError>;
    async fn commit(&self, tx: Self::Tx) -> Result<(), RepositoryError>;
    async fn rollback(&self, tx: Self::Tx) -> Result<(), RepositoryError>;
}

/// Run `work` inside a transaction.
///
/// Commits on success, rolls back on failure. A rollback failure is
/// swallowed; the original error wins.
pub async fn with_transaction<U, T, F>(uow: &U, work: F) -> Result<T, RepositoryError>
where
    U: UnitOfWork,
    F: for<'t> FnOnce(&'t mut U::Tx) -> TxFuture<'t, T>,
{
    let mut tx = uow.begin().await?;
    match work(&mut tx).await {
        Ok(value) => {
            uow.commit(tx).await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback(tx).await {
                tracing::warn!(error = %rollback_err, "transaction rollback failed");
            }
            Err(err)
        }
    }
}

/// The in-memory repository has no real transactions; every operation is
/// already atomic under its lock.
#[async_trait]
impl UnitOfWork for crate::repository::InMemoryUserRepository {
    type Tx = ();

    async fn begin(&self) -> Result<Self::Tx, RepositoryError> {
        Ok(())
    }

    async fn commit(&self, _tx: Self::Tx) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn rollback(&self, _tx: Self::Tx) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tallyboard_core::Role;

    use crate::repository::{InMemoryUserRepository, UserRepository};
    use crate::user::{NewUser, PasswordHashString};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Alice Smith".to_string(),
            email: email.to_string(),
            role: Role::User,
            password_hash: PasswordHashString::new("$argon2id$stub"),
        }
    }

    #[tokio::test]
    async fn work_runs_inside_the_transaction_scope() {
        let repo = InMemoryUserRepository::new();

        let record = with_transaction(&repo, |_tx| {
            let repo = &repo;
            Box::pin(async move { repo.signup(new_user("alice@example.com")).await })
                as TxFuture<'_, _>
        })
        .await
        .unwrap();

        assert_eq!(record.email, "alice@example.com");
        assert!(repo.find_by_email("alice@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failures_propagate_after_rollback() {
        let repo = InMemoryUserRepository::new();
        repo.signup(new_user("alice@example.com")).await.unwrap();

        let result: Result<(), _> = with_transaction(&repo, |_tx| {
            let repo = &repo;
            Box::pin(async move {
                repo.signup(new_user("alice@example.com")).await?;
                Ok(())
            }) as TxFuture<'_, _>
        })
        .await;

        assert_eq!(result, Err(RepositoryError::DuplicateEmail));
    }
}
