//! Session claims model (transport-agnostic).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tallyboard_core::{Role, SessionId, TokenId, UserId};

use crate::principal::SessionPrincipal;

/// The decoded, validated token payload.
///
/// A claims value is created by `establish()` and read-only thereafter:
/// rotation never mutates an existing value, it computes a new one via
/// [`SessionClaims::rotated`] and the old token becomes permanently invalid
/// once the store holds its successor.
///
/// `sid` identifies the logical session and survives rotation; `jti`
/// identifies one physical token and is regenerated on every issuance.
/// `auth_time` is the immutable session start: it is copied forward
/// unchanged on every rotation and never derived from `iat`, so the
/// absolute-age ceiling holds across any number of rotations.
///
/// All instants are whole seconds (the wire format is unix seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Role granted to the subject.
    pub role: Role,

    /// Logical session identifier (stable across rotations).
    pub sid: SessionId,

    /// Physical token identifier (fresh per issuance).
    pub jti: TokenId,

    /// Issued-at.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub iat: DateTime<Utc>,

    /// Not-before. Always equals `iat` for issued tokens.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub nbf: DateTime<Utc>,

    /// Expiry.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,

    /// Original establish time of the logical session.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub auth_time: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimsShapeError {
    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("nbf is outside [iat, exp]")]
    NotBeforeOutOfRange,

    #[error("token validity window exceeds the session duration")]
    WindowTooLong,

    #[error("session start is later than issued-at")]
    SessionStartInFuture,
}

impl SessionClaims {
    /// Claims for a brand-new logical session.
    ///
    /// Generates a fresh `sid` and `jti`; `iat`, `nbf` and `auth_time` are
    /// all `now`.
    pub fn establish(principal: SessionPrincipal, now: DateTime<Utc>, duration: Duration) -> Self {
        let now = truncate_subsec(now);
        Self {
            sub: principal.user_id,
            role: principal.role,
            sid: SessionId::new(),
            jti: TokenId::new(),
            iat: now,
            nbf: now,
            exp: now + duration,
            auth_time: now,
        }
    }

    /// Claims for the next token of the same logical session.
    ///
    /// Carries `sub`, `role`, `sid` and `auth_time` forward unchanged and
    /// mints a fresh `jti` over a new validity window.
    pub fn rotated(&self, now: DateTime<Utc>, duration: Duration) -> Self {
        let now = truncate_subsec(now);
        Self {
            sub: self.sub,
            role: self.role,
            sid: self.sid,
            jti: TokenId::new(),
            iat: now,
            nbf: now,
            exp: now + duration,
            auth_time: self.auth_time,
        }
    }

    /// Project the principal back out of the claims.
    pub fn principal(&self) -> SessionPrincipal {
        SessionPrincipal::new(self.sub, self.role)
    }

    /// Deterministically validate the structural claim invariants.
    ///
    /// Role validity is enforced by the closed enum at deserialization time;
    /// this checks the time-window invariants against the configured maximum
    /// validity (`exp - iat` must never exceed the session duration).
    pub fn validate_shape(&self, max_validity: Duration) -> Result<(), ClaimsShapeError> {
        if self.exp <= self.iat {
            return Err(ClaimsShapeError::InvalidTimeWindow);
        }
        if self.nbf < self.iat || self.nbf > self.exp {
            return Err(ClaimsShapeError::NotBeforeOutOfRange);
        }
        if self.exp - self.iat > max_validity {
            return Err(ClaimsShapeError::WindowTooLong);
        }
        if self.auth_time > self.iat {
            return Err(ClaimsShapeError::SessionStartInFuture);
        }
        Ok(())
    }
}

/// Drop sub-second precision so in-memory claims match their wire form.
pub(crate) fn truncate_subsec(t: DateTime<Utc>) -> DateTime<Utc> {
    t - Duration::nanoseconds(i64::from(t.timestamp_subsec_nanos()))
}
