//! HS256 implementation of the token codec.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use tallyboard_core::{Clock, SystemClock};

use crate::claims::SessionClaims;
use crate::codec::{CodecError, TokenCodec};
use crate::config::{SessionConfig, SigningConfig};

/// JWT codec (HS256).
///
/// Signature, issuer and audience checks are delegated to `jsonwebtoken`;
/// the `exp`/`nbf` window is checked against the injected clock with the
/// configured skew tolerance, so the codec never reads system time behind
/// the caller's back.
pub struct JwtCodec<K = SystemClock> {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    leeway: Duration,
    max_validity: Duration,
    clock: K,
}

impl<K: Clock> JwtCodec<K> {
    /// Build a codec from validated signing and timing configuration.
    pub fn new(signing: &SigningConfig, config: &SessionConfig, clock: K) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&signing.issuer]);
        validation.set_audience(&[&signing.audience]);
        // The validity window is checked against the injected clock below.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        Self {
            header: Header::new(Algorithm::HS256),
            encoding_key: EncodingKey::from_secret(signing.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(signing.secret.as_bytes()),
            validation,
            issuer: signing.issuer.clone(),
            audience: signing.audience.clone(),
            leeway: config.clock_skew,
            max_validity: config.session_duration,
            clock,
        }
    }
}

#[async_trait]
impl<K: Clock> TokenCodec for JwtCodec<K> {
    async fn encode(&self, claims: &SessionClaims) -> Result<String, CodecError> {
        let wire = WireClaims::from_claims(claims, &self.issuer, &self.audience);
        jsonwebtoken::encode(&self.header, &wire, &self.encoding_key)
            .map_err(|e| CodecError::Signing(e.to_string()))
    }

    async fn decode(&self, token: &str) -> Result<SessionClaims, CodecError> {
        let data = jsonwebtoken::decode::<WireClaims>(token, &self.decoding_key, &self.validation)
            .map_err(map_decode_error)?;
        let claims = data.claims.into_claims()?;

        let now = self.clock.now();
        if now >= claims.exp + self.leeway {
            return Err(CodecError::Expired);
        }
        if claims.nbf > now + self.leeway {
            return Err(CodecError::ClaimsInvalid("nbf is in the future".into()));
        }

        claims
            .validate_shape(self.max_validity)
            .map_err(|e| CodecError::ClaimsInvalid(e.to_string()))?;

        Ok(claims)
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> CodecError {
    match err.kind() {
        ErrorKind::ExpiredSignature => CodecError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => CodecError::SignatureInvalid,
        ErrorKind::ImmatureSignature => CodecError::ClaimsInvalid("nbf is in the future".into()),
        ErrorKind::InvalidIssuer => CodecError::ClaimsInvalid("issuer mismatch".into()),
        ErrorKind::InvalidAudience => CodecError::ClaimsInvalid("audience mismatch".into()),
        ErrorKind::MissingRequiredClaim(claim) => {
            CodecError::ClaimsInvalid(format!("missing claim '{claim}'"))
        }
        _ => CodecError::Malformed,
    }
}

/// Wire shape of the payload.
///
/// Identifiers and the role travel as strings and are parsed (not just
/// deserialized) on the way in, so a token carrying an unknown role or a
/// non-UUID id fails with a typed claims error rather than a parse panic.
#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    iss: String,
    aud: String,
    sub: String,
    role: String,
    sid: String,
    jti: String,
    iat: i64,
    nbf: i64,
    exp: i64,
    auth_time: i64,
}

impl WireClaims {
    fn from_claims(claims: &SessionClaims, issuer: &str, audience: &str) -> Self {
        Self {
            iss: issuer.to_string(),
            aud: audience.to_string(),
            sub: claims.sub.to_string(),
            role: claims.role.to_string(),
            sid: claims.sid.to_string(),
            jti: claims.jti.to_string(),
            iat: claims.iat.timestamp(),
            nbf: claims.nbf.timestamp(),
            exp: claims.exp.timestamp(),
            auth_time: claims.auth_time.timestamp(),
        }
    }

    fn into_claims(self) -> Result<SessionClaims, CodecError> {
        Ok(SessionClaims {
            sub: parse_claim("sub", &self.sub)?,
            role: parse_claim("role", &self.role)?,
            sid: parse_claim("sid", &self.sid)?,
            jti: parse_claim("jti", &self.jti)?,
            iat: parse_instant("iat", self.iat)?,
            nbf: parse_instant("nbf", self.nbf)?,
            exp: parse_instant("exp", self.exp)?,
            auth_time: parse_instant("auth_time", self.auth_time)?,
        })
    }
}

fn parse_claim<T>(name: &str, raw: &str) -> Result<T, CodecError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.parse()
        .map_err(|e| CodecError::ClaimsInvalid(format!("{name}: {e}")))
}

fn parse_instant(name: &str, secs: i64) -> Result<DateTime<Utc>, CodecError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| CodecError::ClaimsInvalid(format!("{name}: timestamp out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tallyboard_core::{FixedClock, Role, UserId};

    use crate::principal::SessionPrincipal;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn config() -> SessionConfig {
        SessionConfig::new(
            Duration::seconds(900),
            Duration::seconds(120),
            Duration::seconds(2_592_000),
            Duration::seconds(60),
        )
        .unwrap()
    }

    fn signing() -> SigningConfig {
        SigningConfig::new("test-secret", "tallyboard", "tallyboard-dashboard").unwrap()
    }

    fn codec_at(now: DateTime<Utc>) -> (JwtCodec<Arc<FixedClock>>, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::at(now));
        (JwtCodec::new(&signing(), &config(), clock.clone()), clock)
    }

    fn sample_claims() -> SessionClaims {
        SessionClaims::establish(
            SessionPrincipal::new(UserId::new(), Role::Admin),
            t0(),
            Duration::seconds(900),
        )
    }

    #[tokio::test]
    async fn round_trip_preserves_every_claim() {
        let (codec, _) = codec_at(t0());
        let claims = sample_claims();

        let token = codec.encode(&claims).await.unwrap();
        let decoded = codec.decode(&token).await.unwrap();

        assert_eq!(decoded, claims);
    }

    #[tokio::test]
    async fn tampered_payload_fails_signature_verification() {
        let (codec, _) = codec_at(t0());
        let token = codec.encode(&sample_claims()).await.unwrap();

        // Flip one character in the payload segment.
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let payload = &mut parts[1];
        let flipped = if payload.ends_with('A') { 'B' } else { 'A' };
        payload.pop();
        payload.push(flipped);
        let tampered = parts.join(".");

        assert_eq!(
            codec.decode(&tampered).await,
            Err(CodecError::SignatureInvalid)
        );
    }

    #[tokio::test]
    async fn wrong_key_fails_signature_verification() {
        let (codec, _) = codec_at(t0());
        let token = codec.encode(&sample_claims()).await.unwrap();

        let other_signing =
            SigningConfig::new("other-secret", "tallyboard", "tallyboard-dashboard").unwrap();
        let other = JwtCodec::new(&other_signing, &config(), Arc::new(FixedClock::at(t0())));

        assert_eq!(other.decode(&token).await, Err(CodecError::SignatureInvalid));
    }

    #[tokio::test]
    async fn garbage_is_malformed() {
        let (codec, _) = codec_at(t0());
        assert_eq!(
            codec.decode("definitely-not-a-token").await,
            Err(CodecError::Malformed)
        );
    }

    #[tokio::test]
    async fn expiry_respects_skew_tolerance() {
        let (codec, clock) = codec_at(t0());
        let token = codec.encode(&sample_claims()).await.unwrap();

        // One second inside the leeway window: still decodes.
        clock.set(t0() + Duration::seconds(900 + 59));
        assert!(codec.decode(&token).await.is_ok());

        // At exp + leeway: expired.
        clock.set(t0() + Duration::seconds(900 + 60));
        assert_eq!(codec.decode(&token).await, Err(CodecError::Expired));
    }

    #[tokio::test]
    async fn future_nbf_beyond_skew_is_rejected() {
        let (codec, clock) = codec_at(t0());
        let token = codec.encode(&sample_claims()).await.unwrap();

        clock.set(t0() - Duration::seconds(61));
        assert!(matches!(
            codec.decode(&token).await,
            Err(CodecError::ClaimsInvalid(_))
        ));
    }

    #[tokio::test]
    async fn issuer_mismatch_is_claims_invalid() {
        let (codec, _) = codec_at(t0());
        let token = codec.encode(&sample_claims()).await.unwrap();

        let other_signing =
            SigningConfig::new("test-secret", "someone-else", "tallyboard-dashboard").unwrap();
        let other = JwtCodec::new(&other_signing, &config(), Arc::new(FixedClock::at(t0())));

        assert!(matches!(
            other.decode(&token).await,
            Err(CodecError::ClaimsInvalid(_))
        ));
    }

    #[tokio::test]
    async fn unknown_role_is_claims_invalid() {
        let (codec, _) = codec_at(t0());
        let claims = sample_claims();
        let mut wire = WireClaims::from_claims(&claims, "tallyboard", "tallyboard-dashboard");
        wire.role = "root".to_string();

        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &wire,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            codec.decode(&token).await,
            Err(CodecError::ClaimsInvalid(_))
        ));
    }

    #[tokio::test]
    async fn overlong_validity_window_is_claims_invalid() {
        let (codec, _) = codec_at(t0());
        let claims = sample_claims();
        let mut wire = WireClaims::from_claims(&claims, "tallyboard", "tallyboard-dashboard");
        wire.exp = wire.iat + 3600;

        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &wire,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            codec.decode(&token).await,
            Err(CodecError::ClaimsInvalid(_))
        ));
    }
}
