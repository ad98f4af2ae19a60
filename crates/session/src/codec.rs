//! Token codec contract.

use async_trait::async_trait;
use thiserror::Error;

use crate::claims::SessionClaims;

/// Token codec failure.
///
/// Decode failures are typed values, never exceptions used for control flow:
/// the service swallows them into a termination outcome. `Signing` is the
/// one operational variant: it indicates a misconfigured or failing signer
/// and is surfaced, not swallowed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The token is not even structurally a token (garbage, truncation).
    #[error("token is malformed")]
    Malformed,

    /// The signature does not verify against the configured key.
    #[error("token signature is invalid")]
    SignatureInvalid,

    /// The token's validity window has passed (beyond skew tolerance).
    #[error("token has expired")]
    Expired,

    /// The token verified but its claims fail structural validation.
    #[error("token claims are invalid: {0}")]
    ClaimsInvalid(String),

    /// Signing failed while issuing a token.
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Signs and verifies compact session tokens.
///
/// A capability-set interface: concrete implementations are selected at
/// composition time. Both operations are suspension points; implementations
/// may do CPU-bound crypto or call out to an external signer.
#[async_trait]
pub trait TokenCodec: Send + Sync {
    /// Serialize and sign the claims into a compact token.
    ///
    /// Deterministic given identical claims and signing key; `jti`
    /// freshness is the issuer's concern, not the codec's.
    async fn encode(&self, claims: &SessionClaims) -> Result<String, CodecError>;

    /// Verify the signature and validity window, then structurally validate
    /// every claim field before returning.
    async fn decode(&self, token: &str) -> Result<SessionClaims, CodecError>;
}
