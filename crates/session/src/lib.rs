//! `tallyboard-session` — session lifecycle core.
//!
//! Everything that decides whether an authenticated session continues, must
//! be rotated (fresh token, stable identity), or must be terminated:
//!
//! - [`SessionPolicy`]: the pure lifecycle decision function
//! - [`TokenCodec`] / [`JwtCodec`]: the signed-token contract and its
//!   HS256 implementation
//! - [`SessionStore`]: the opaque token persistence contract, with an
//!   in-memory implementation and a cookie-backed adapter
//! - [`SessionService`]: the orchestration of the three, owning error
//!   translation between codec failures and lifecycle outcomes
//!
//! This crate is intentionally decoupled from HTTP and storage engines; the
//! transport (cookie plumbing) and persistence sit behind capability traits.

pub mod claims;
pub mod codec;
pub mod config;
pub mod cookie;
pub mod jwt;
pub mod policy;
pub mod principal;
pub mod service;
pub mod store;

pub use claims::{ClaimsShapeError, SessionClaims};
pub use codec::{CodecError, TokenCodec};
pub use config::{ConfigError, SessionConfig, SigningConfig};
pub use cookie::{CookieAttributes, CookieJar, CookieSessionStore, InMemoryCookieJar, SameSite};
pub use jwt::JwtCodec;
pub use policy::{LifecycleDecision, SessionPolicy, TerminationReason};
pub use principal::SessionPrincipal;
pub use service::{Rotation, SessionError, SessionService, Verification};
pub use store::{InMemorySessionStore, SessionStore, StoreError};
