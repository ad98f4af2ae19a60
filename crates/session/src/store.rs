//! Session token persistence boundary.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Session store operation error (operational, never a policy outcome).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    #[error("session store rejected the write: {0}")]
    WriteRejected(String),
}

/// Persists the current session token as an opaque string.
///
/// The store is scoped to one session identity (one cookie, one client);
/// there is no cross-session shared state behind this trait. Side effects
/// happen only on `set`/`delete`, and `set` overwrites any prior value
/// atomically from the caller's point of view (last-writer-wins).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current token, if any. The store does not interpret it.
    async fn get(&self) -> Result<Option<String>, StoreError>;

    /// Store a token, replacing any prior value.
    async fn set(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Drop the stored token. Deleting an absent entry is a no-op.
    async fn delete(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    async fn get(&self) -> Result<Option<String>, StoreError> {
        (**self).get().await
    }

    async fn set(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        (**self).set(token, expires_at).await
    }

    async fn delete(&self) -> Result<(), StoreError> {
        (**self).delete().await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// In-memory session store.
///
/// Intended for tests/dev. Tracks a mutation counter so tests can assert
/// that read paths stay side-effect-free.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    slot: RwLock<Option<StoredToken>>,
    mutations: AtomicU64,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set`/`delete` calls so far.
    pub fn write_count(&self) -> u64 {
        self.mutations.load(Ordering::Relaxed)
    }

    /// Expiry recorded with the current token, if any.
    pub fn stored_expiry(&self) -> Option<DateTime<Utc>> {
        self.slot
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().map(|s| s.expires_at))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self) -> Result<Option<String>, StoreError> {
        let slot = self
            .slot
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(slot.as_ref().map(|s| s.token.clone()))
    }

    async fn set(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut slot = self
            .slot
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        *slot = Some(StoredToken {
            token: token.to_string(),
            expires_at,
        });
        self.mutations.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn delete(&self) -> Result<(), StoreError> {
        let mut slot = self
            .slot
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        *slot = None;
        self.mutations.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
