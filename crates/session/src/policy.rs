//! Session lifecycle policy.
//!
//! Pure decision function over claims and a caller-supplied `now`:
//! - No IO
//! - No panics
//! - No hidden time reads

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::claims::SessionClaims;
use crate::config::SessionConfig;

/// Why a session must end.
///
/// Closed set. Reason codes are for logs/telemetry only; at the UI boundary
/// every one of these collapses to "please sign in again".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The token's expiry has passed.
    Expired,
    /// The token is still valid but too close to expiry for the caller to
    /// keep using without rotating (caller-supplied on read-only paths).
    ApproachingExpiry,
    /// The logical session outlived the absolute ceiling.
    AbsoluteLimitExceeded,
    /// Explicit sign-out.
    Logout,
    /// The token failed signature or structural validation.
    InvalidClaims,
    /// No token was presented.
    NoToken,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::Expired => "expired",
            TerminationReason::ApproachingExpiry => "approaching_expiry",
            TerminationReason::AbsoluteLimitExceeded => "absolute_limit_exceeded",
            TerminationReason::Logout => "logout",
            TerminationReason::InvalidClaims => "invalid_claims",
            TerminationReason::NoToken => "no_token",
        }
    }
}

impl core::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating a session against the lifecycle policy.
///
/// These are values, not errors: callers branch on them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LifecycleDecision {
    /// The session is valid as-is; nothing to write.
    Continue,
    /// The session is valid but inside the refresh window; a fresh token
    /// should be issued with this expiry.
    Rotate { new_expiry: DateTime<Utc> },
    /// The session must end.
    Terminate { reason: TerminationReason },
}

/// The lifecycle decision function.
///
/// Constructed from an already-validated [`SessionConfig`]; the ordering
/// invariant `refresh_threshold < session_duration < max_absolute_session`
/// is checked once at startup, never per call.
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    config: SessionConfig,
}

impl SessionPolicy {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Decide whether a session continues, rotates, or terminates.
    ///
    /// The absolute-age ceiling is checked before the refresh window, so a
    /// session that is both near expiry and past the ceiling terminates
    /// rather than rotates.
    pub fn evaluate(
        &self,
        claims: Option<&SessionClaims>,
        now: DateTime<Utc>,
    ) -> LifecycleDecision {
        let Some(claims) = claims else {
            return LifecycleDecision::Terminate {
                reason: TerminationReason::NoToken,
            };
        };

        if claims.validate_shape(self.config.session_duration).is_err() {
            return LifecycleDecision::Terminate {
                reason: TerminationReason::InvalidClaims,
            };
        }

        let time_left = claims.exp - now;
        if time_left <= Duration::zero() {
            return LifecycleDecision::Terminate {
                reason: TerminationReason::Expired,
            };
        }

        let age = now - claims.auth_time;
        if age > self.config.max_absolute_session {
            return LifecycleDecision::Terminate {
                reason: TerminationReason::AbsoluteLimitExceeded,
            };
        }

        if time_left <= self.config.refresh_threshold {
            return LifecycleDecision::Rotate {
                new_expiry: now + self.config.session_duration,
            };
        }

        LifecycleDecision::Continue
    }
}
