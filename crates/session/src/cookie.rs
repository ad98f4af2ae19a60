//! Cookie-backed session store adapter.
//!
//! The adapter owns cookie *attribute* policy; the actual header plumbing
//! (reading the request cookie, writing the response `Set-Cookie`) lives
//! behind the [`CookieJar`] capability trait and belongs to the HTTP layer.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tallyboard_core::Clock;

use crate::store::{SessionStore, StoreError};

/// Default name of the session cookie.
pub const DEFAULT_COOKIE_NAME: &str = "tallyboard_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
        }
    }
}

/// Attributes attached to every write of the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    pub http_only: bool,
    pub same_site: SameSite,
    pub secure: bool,
    pub path: String,
    /// Remaining lifetime in seconds, floored at 0.
    pub max_age_secs: i64,
}

/// One named cookie on the current request/response pair.
pub trait CookieJar: Send + Sync {
    fn read(&self, name: &str) -> Option<String>;
    fn write(&self, name: &str, value: &str, attributes: &CookieAttributes);
    /// Clearing an absent cookie is a no-op.
    fn clear(&self, name: &str);
}

impl<J: CookieJar + ?Sized> CookieJar for std::sync::Arc<J> {
    fn read(&self, name: &str) -> Option<String> {
        (**self).read(name)
    }

    fn write(&self, name: &str, value: &str, attributes: &CookieAttributes) {
        (**self).write(name, value, attributes)
    }

    fn clear(&self, name: &str) {
        (**self).clear(name)
    }
}

/// Session store backed by a single HTTP cookie.
///
/// `secure` should be true in production; the `max_age` of every write is
/// derived from the token expiry against the injected clock.
pub struct CookieSessionStore<J, K> {
    jar: J,
    clock: K,
    name: String,
    same_site: SameSite,
    secure: bool,
}

impl<J: CookieJar, K: Clock> CookieSessionStore<J, K> {
    pub fn new(
        jar: J,
        clock: K,
        name: impl Into<String>,
        same_site: SameSite,
        secure: bool,
    ) -> Self {
        Self {
            jar,
            clock,
            name: name.into(),
            same_site,
            secure,
        }
    }

    fn attributes(&self, expires_at: DateTime<Utc>) -> CookieAttributes {
        let max_age_secs = (expires_at - self.clock.now()).num_seconds().max(0);
        CookieAttributes {
            http_only: true,
            same_site: self.same_site,
            secure: self.secure,
            path: "/".to_string(),
            max_age_secs,
        }
    }
}

#[async_trait]
impl<J: CookieJar, K: Clock> SessionStore for CookieSessionStore<J, K> {
    async fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(self.jar.read(&self.name))
    }

    async fn set(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        let attributes = self.attributes(expires_at);
        self.jar.write(&self.name, token, &attributes);
        Ok(())
    }

    async fn delete(&self) -> Result<(), StoreError> {
        self.jar.clear(&self.name);
        Ok(())
    }
}

/// In-memory cookie jar.
///
/// Intended for tests/dev. Remembers the attributes of the last write per
/// cookie so tests can assert on them.
#[derive(Debug, Default)]
pub struct InMemoryCookieJar {
    cookies: RwLock<HashMap<String, (String, CookieAttributes)>>,
}

impl InMemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attributes_of(&self, name: &str) -> Option<CookieAttributes> {
        self.cookies
            .read()
            .ok()
            .and_then(|cookies| cookies.get(name).map(|(_, attrs)| attrs.clone()))
    }
}

impl CookieJar for InMemoryCookieJar {
    fn read(&self, name: &str) -> Option<String> {
        self.cookies
            .read()
            .ok()
            .and_then(|cookies| cookies.get(name).map(|(value, _)| value.clone()))
    }

    fn write(&self, name: &str, value: &str, attributes: &CookieAttributes) {
        if let Ok(mut cookies) = self.cookies.write() {
            cookies.insert(name.to_string(), (value.to_string(), attributes.clone()));
        }
    }

    fn clear(&self, name: &str) {
        if let Ok(mut cookies) = self.cookies.write() {
            cookies.remove(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;
    use tallyboard_core::FixedClock;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn store_at(
        now: DateTime<Utc>,
    ) -> CookieSessionStore<Arc<InMemoryCookieJar>, Arc<FixedClock>> {
        CookieSessionStore::new(
            Arc::new(InMemoryCookieJar::new()),
            Arc::new(FixedClock::at(now)),
            DEFAULT_COOKIE_NAME,
            SameSite::Lax,
            true,
        )
    }

    #[tokio::test]
    async fn set_writes_hardened_attributes() {
        let store = store_at(t0());
        store
            .set("tok-1", t0() + Duration::seconds(900))
            .await
            .unwrap();

        let attrs = store.jar.attributes_of(DEFAULT_COOKIE_NAME).unwrap();
        assert!(attrs.http_only);
        assert!(attrs.secure);
        assert_eq!(attrs.same_site, SameSite::Lax);
        assert_eq!(attrs.path, "/");
        assert_eq!(attrs.max_age_secs, 900);
    }

    #[tokio::test]
    async fn max_age_is_floored_at_zero() {
        let store = store_at(t0());
        store
            .set("tok-1", t0() - Duration::seconds(30))
            .await
            .unwrap();

        let attrs = store.jar.attributes_of(DEFAULT_COOKIE_NAME).unwrap();
        assert_eq!(attrs.max_age_secs, 0);
    }

    #[tokio::test]
    async fn get_and_delete_round_trip_through_the_jar() {
        let store = store_at(t0());
        assert_eq!(store.get().await.unwrap(), None);

        store
            .set("tok-1", t0() + Duration::seconds(900))
            .await
            .unwrap();
        assert_eq!(store.get().await.unwrap(), Some("tok-1".to_string()));

        store.delete().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);

        // Clearing again is a no-op.
        store.delete().await.unwrap();
    }
}
