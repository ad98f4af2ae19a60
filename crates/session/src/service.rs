//! Session lifecycle orchestration.

use chrono::{DateTime, Utc};
use thiserror::Error;

use tallyboard_core::Clock;

use crate::claims::SessionClaims;
use crate::codec::{CodecError, TokenCodec};
use crate::config::SessionConfig;
use crate::policy::{LifecycleDecision, SessionPolicy, TerminationReason};
use crate::principal::SessionPrincipal;
use crate::store::{SessionStore, StoreError};

/// Operational failure of a session operation.
///
/// Policy outcomes ([`Verification`], [`Rotation`]) are values, not errors;
/// this type carries only the failures callers must treat as faults, so
/// "your session expired" and "we could not talk to the store" stay
/// distinguishable.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store failure: {0}")]
    Store(#[from] StoreError),

    /// Token signing failed. With a validated configuration this indicates
    /// a startup-class problem, not a per-request one.
    #[error("token signing failure: {0}")]
    Signing(CodecError),
}

/// Outcome of [`SessionService::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The session is valid as-is.
    Active { claims: SessionClaims },
    /// The session is valid but due for rotation; verify itself has not
    /// rotated. Invoke [`SessionService::rotate`] on a write path.
    RotationDue {
        claims: SessionClaims,
        new_expiry: DateTime<Utc>,
    },
    /// The session must end; verify itself has not touched the store.
    Terminated { reason: TerminationReason },
}

/// Outcome of [`SessionService::rotate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rotation {
    /// A fresh token was issued and stored.
    Rotated { claims: SessionClaims },
    /// The session was not due for rotation; nothing was written.
    Unchanged { claims: SessionClaims },
    /// The session was terminated instead; the stored token was deleted
    /// (best-effort).
    Terminated { reason: TerminationReason },
}

/// Orchestrates store, codec and policy into the four session operations.
///
/// Dependencies are injected at construction; the service owns no ambient
/// state and reads no global time. Store and codec calls are the only
/// suspension points. The service does not impose deadlines; callers wrap
/// operations in their context's timeout and treat an elapsed deadline as
/// an operational failure.
pub struct SessionService<C, S, K> {
    codec: C,
    store: S,
    clock: K,
    policy: SessionPolicy,
    config: SessionConfig,
}

impl<C, S, K> SessionService<C, S, K>
where
    C: TokenCodec,
    S: SessionStore,
    K: Clock,
{
    /// Wire up a service from an already-validated configuration.
    pub fn new(codec: C, store: S, clock: K, config: SessionConfig) -> Self {
        Self {
            codec,
            store,
            clock,
            policy: SessionPolicy::new(config),
            config,
        }
    }

    /// Start a new logical session for the principal.
    pub async fn establish(
        &self,
        principal: SessionPrincipal,
    ) -> Result<SessionClaims, SessionError> {
        let claims =
            SessionClaims::establish(principal, self.clock.now(), self.config.session_duration);
        let token = self
            .codec
            .encode(&claims)
            .await
            .map_err(SessionError::Signing)?;
        self.store.set(&token, claims.exp).await?;

        tracing::info!(
            user = %claims.sub,
            sid = %claims.sid,
            exp = %claims.exp,
            "session established"
        );
        Ok(claims)
    }

    /// Check the current session without side effects.
    ///
    /// Optimistic verification for read paths: no store writes, ever. A
    /// `RotationDue` or `Terminated` outcome is a decision handed to the
    /// caller; acting on it (rotate / terminate) belongs to write paths.
    pub async fn verify(&self) -> Result<Verification, SessionError> {
        let claims = match self.read_claims().await? {
            Ok(claims) => claims,
            Err(reason) => return Ok(Verification::Terminated { reason }),
        };

        match self.policy.evaluate(Some(&claims), self.clock.now()) {
            LifecycleDecision::Continue => Ok(Verification::Active { claims }),
            LifecycleDecision::Rotate { new_expiry } => {
                Ok(Verification::RotationDue { claims, new_expiry })
            }
            LifecycleDecision::Terminate { reason } => Ok(Verification::Terminated { reason }),
        }
    }

    /// Re-issue the session token if the policy calls for it.
    ///
    /// Idempotent when the session is not due: returns the current claims
    /// unchanged without writing. Concurrent requests sharing one logical
    /// session may both rotate near the expiry boundary; both tokens are
    /// valid and carry the same `sid`, and the store's last write wins.
    /// Rotation is at-least-once, not exactly-once.
    pub async fn rotate(&self) -> Result<Rotation, SessionError> {
        let claims = match self.read_claims().await? {
            Ok(claims) => claims,
            Err(reason) => {
                self.delete_best_effort(reason).await;
                return Ok(Rotation::Terminated { reason });
            }
        };

        let now = self.clock.now();
        match self.policy.evaluate(Some(&claims), now) {
            LifecycleDecision::Continue => Ok(Rotation::Unchanged { claims }),
            LifecycleDecision::Rotate { .. } => {
                let next = claims.rotated(now, self.config.session_duration);
                let token = self
                    .codec
                    .encode(&next)
                    .await
                    .map_err(SessionError::Signing)?;
                self.store.set(&token, next.exp).await?;

                tracing::info!(
                    user = %next.sub,
                    sid = %next.sid,
                    jti = %next.jti,
                    exp = %next.exp,
                    "session rotated"
                );
                Ok(Rotation::Rotated { claims: next })
            }
            LifecycleDecision::Terminate { reason } => {
                self.delete_best_effort(reason).await;
                Ok(Rotation::Terminated { reason })
            }
        }
    }

    /// End the session unconditionally.
    ///
    /// Deleting an absent entry is success, not an error.
    pub async fn terminate(&self, reason: TerminationReason) -> Result<(), SessionError> {
        self.store.delete().await?;
        tracing::info!(reason = %reason, "session terminated");
        Ok(())
    }

    /// Read and decode the stored token.
    ///
    /// Decode failures are swallowed into a termination reason: an
    /// unparsable session means "not authenticated", not a system fault.
    /// Only store failures surface as errors.
    async fn read_claims(
        &self,
    ) -> Result<Result<SessionClaims, TerminationReason>, SessionError> {
        let Some(token) = self.store.get().await? else {
            return Ok(Err(TerminationReason::NoToken));
        };

        match self.codec.decode(&token).await {
            Ok(claims) => Ok(Ok(claims)),
            Err(CodecError::Expired) => Ok(Err(TerminationReason::Expired)),
            Err(err) => {
                tracing::warn!(error = %err, "stored session token failed to decode");
                Ok(Err(TerminationReason::InvalidClaims))
            }
        }
    }

    /// Best-effort cleanup; a failed delete never masks the termination
    /// decision.
    async fn delete_best_effort(&self, reason: TerminationReason) {
        match self.store.delete().await {
            Ok(()) => tracing::info!(reason = %reason, "session terminated"),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    reason = %reason,
                    "failed to delete terminated session"
                );
            }
        }
    }
}
