//! Startup configuration for the session core.
//!
//! Everything here is validated once at process start (fail fast); per-call
//! code assumes a well-formed configuration and never re-checks it.

use chrono::Duration;
use thiserror::Error;

/// Environment variable names (the deployment contract).
pub const ENV_SESSION_DURATION: &str = "SESSION_DURATION_SEC";
pub const ENV_REFRESH_THRESHOLD: &str = "SESSION_REFRESH_THRESHOLD_SEC";
pub const ENV_MAX_ABSOLUTE_SESSION: &str = "MAX_ABSOLUTE_SESSION_SEC";
pub const ENV_CLOCK_SKEW: &str = "SESSION_CLOCK_SKEW_SEC";
pub const ENV_SECRET: &str = "SESSION_SECRET";
pub const ENV_ISSUER: &str = "SESSION_ISSUER";
pub const ENV_AUDIENCE: &str = "SESSION_AUDIENCE";

const DEFAULT_CLOCK_SKEW_SEC: i64 = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    #[error("{0} is not a whole number of seconds: '{1}'")]
    InvalidSeconds(&'static str, String),

    #[error("{0} must be a positive number of seconds")]
    NonPositive(&'static str),

    #[error("clock skew must not be negative")]
    NegativeSkew,

    #[error("refresh threshold must be shorter than the session duration")]
    RefreshNotBelowDuration,

    #[error("session duration must be shorter than the absolute session ceiling")]
    DurationNotBelowCeiling,

    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("{0} must not be empty")]
    EmptyVar(&'static str),
}

/// Lifecycle timing configuration.
///
/// Invariant: `refresh_threshold < session_duration < max_absolute_session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Validity window of a single issued token.
    pub session_duration: Duration,
    /// Remaining validity at or below which a token is re-issued.
    pub refresh_threshold: Duration,
    /// Hard ceiling on the age of a logical session, across rotations.
    pub max_absolute_session: Duration,
    /// Tolerated clock skew when verifying `exp`/`nbf` at decode time.
    pub clock_skew: Duration,
}

impl SessionConfig {
    pub fn new(
        session_duration: Duration,
        refresh_threshold: Duration,
        max_absolute_session: Duration,
        clock_skew: Duration,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            session_duration,
            refresh_threshold,
            max_absolute_session,
            clock_skew,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read and validate the timing configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(
            read_seconds(ENV_SESSION_DURATION)?,
            read_seconds(ENV_REFRESH_THRESHOLD)?,
            read_seconds(ENV_MAX_ABSOLUTE_SESSION)?,
            read_seconds_or(ENV_CLOCK_SKEW, DEFAULT_CLOCK_SKEW_SEC)?,
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session_duration <= Duration::zero() {
            return Err(ConfigError::NonPositive(ENV_SESSION_DURATION));
        }
        if self.refresh_threshold <= Duration::zero() {
            return Err(ConfigError::NonPositive(ENV_REFRESH_THRESHOLD));
        }
        if self.max_absolute_session <= Duration::zero() {
            return Err(ConfigError::NonPositive(ENV_MAX_ABSOLUTE_SESSION));
        }
        if self.clock_skew < Duration::zero() {
            return Err(ConfigError::NegativeSkew);
        }
        if self.refresh_threshold >= self.session_duration {
            return Err(ConfigError::RefreshNotBelowDuration);
        }
        if self.session_duration >= self.max_absolute_session {
            return Err(ConfigError::DurationNotBelowCeiling);
        }
        Ok(())
    }
}

/// Token signing configuration.
///
/// A missing or empty secret is a startup-class failure: construction
/// rejects it here so request paths never have to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

impl SigningConfig {
    pub fn new(
        secret: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
        };
        if config.secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if config.issuer.is_empty() {
            return Err(ConfigError::EmptyVar(ENV_ISSUER));
        }
        if config.audience.is_empty() {
            return Err(ConfigError::EmptyVar(ENV_AUDIENCE));
        }
        Ok(config)
    }

    /// Read and validate the signing configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(
            read_string(ENV_SECRET)?,
            read_string(ENV_ISSUER)?,
            read_string(ENV_AUDIENCE)?,
        )
    }
}

fn read_string(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

fn read_seconds(name: &'static str) -> Result<Duration, ConfigError> {
    let raw = read_string(name)?;
    parse_seconds(name, &raw)
}

fn read_seconds_or(name: &'static str, default_secs: i64) -> Result<Duration, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => parse_seconds(name, &raw),
        Err(_) => Ok(Duration::seconds(default_secs)),
    }
}

fn parse_seconds(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<i64>()
        .map(Duration::seconds)
        .map_err(|_| ConfigError::InvalidSeconds(name, raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seconds(n: i64) -> Duration {
        Duration::seconds(n)
    }

    #[test]
    fn valid_ordering_is_accepted() {
        let config = SessionConfig::new(seconds(900), seconds(120), seconds(2_592_000), seconds(60));
        assert!(config.is_ok());
    }

    #[test]
    fn refresh_threshold_must_stay_below_duration() {
        let result = SessionConfig::new(seconds(900), seconds(900), seconds(2_592_000), seconds(60));
        assert_eq!(result, Err(ConfigError::RefreshNotBelowDuration));
    }

    #[test]
    fn duration_must_stay_below_ceiling() {
        let result = SessionConfig::new(seconds(900), seconds(120), seconds(900), seconds(60));
        assert_eq!(result, Err(ConfigError::DurationNotBelowCeiling));
    }

    #[test]
    fn non_positive_windows_are_rejected() {
        let result = SessionConfig::new(seconds(0), seconds(120), seconds(2_592_000), seconds(60));
        assert_eq!(result, Err(ConfigError::NonPositive(ENV_SESSION_DURATION)));

        let result = SessionConfig::new(seconds(900), seconds(120), seconds(2_592_000), seconds(-1));
        assert_eq!(result, Err(ConfigError::NegativeSkew));
    }

    #[test]
    fn empty_secret_is_a_startup_failure() {
        let result = SigningConfig::new("", "tallyboard", "tallyboard-dashboard");
        assert_eq!(result, Err(ConfigError::EmptySecret));
    }

    #[test]
    fn signing_config_accepts_complete_input() {
        let config = SigningConfig::new("dev-secret", "tallyboard", "tallyboard-dashboard");
        assert!(config.is_ok());
    }
}
