//! Environment-driven configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::store::default_credential_path;
use crate::error::AmpgateError;

/// Fallback redirect URI when `SPOTIFY_REDIRECT_URI` is unset.
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
const DEFAULT_IDLE_MINUTES: u64 = 20;
const MAX_IDLE_MINUTES: u64 = 7 * 24 * 60; // one week
const DEFAULT_TICK_SECONDS: u64 = 30;
const DEFAULT_RECOVERY_SECONDS: u64 = 5;
const DEFAULT_SETTLE_MS: u64 = 2000;
const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 8;

/// Settings for the daemon and CLI, loaded from the environment.
///
/// A `.env` file next to the binary is read first when present. The
/// device addresses and OAuth application values are required; the
/// tunables all have defaults.
#[derive(Debug, Clone)]
pub struct AmpgateConfig {
    /// OAuth application id for the streaming service.
    pub client_id: String,
    /// OAuth application secret.
    pub client_secret: String,
    /// Redirect URI registered with the OAuth application.
    pub redirect_uri: String,
    /// Speakers smart plug address (host, or host:port).
    pub speakers_addr: String,
    /// Mixer smart plug address.
    pub mixer_addr: String,
    /// TV host for the JSON-RPC power query.
    pub tv_addr: String,
    /// Where the credential file lives.
    pub credential_path: PathBuf,
    /// Idle minutes before the rig powers off.
    pub idle_minutes: u64,
    /// Pause between polling ticks.
    pub tick_interval: Duration,
    /// Pause after a failed tick, before the next attempt.
    pub recovery_interval: Duration,
    /// Settle time between switching the two chain stages.
    pub settle_delay: Duration,
    /// Per-request timeout for API and device HTTP calls.
    pub http_timeout: Duration,
}

impl AmpgateConfig {
    /// Load from environment variables, reading `.env` first.
    pub fn from_env() -> Result<Self, AmpgateError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let config = Self {
            client_id: require("SPOTIFY_CLIENT_ID")?,
            client_secret: require("SPOTIFY_CLIENT_SECRET")?,
            redirect_uri: std::env::var("SPOTIFY_REDIRECT_URI")
                .unwrap_or_else(|_| DEFAULT_REDIRECT_URI.to_string()),
            speakers_addr: require("SPEAKERS_ADDR")?,
            mixer_addr: require("MIXER_ADDR")?,
            tv_addr: require("TV_ADDR")?,
            credential_path: std::env::var("AMPGATE_CREDENTIAL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_credential_path()),
            idle_minutes: parse_var("AMPGATE_IDLE_MINUTES", DEFAULT_IDLE_MINUTES)?,
            tick_interval: Duration::from_secs(parse_var(
                "AMPGATE_TICK_SECONDS",
                DEFAULT_TICK_SECONDS,
            )?),
            recovery_interval: Duration::from_secs(parse_var(
                "AMPGATE_RECOVERY_SECONDS",
                DEFAULT_RECOVERY_SECONDS,
            )?),
            settle_delay: Duration::from_millis(parse_var("AMPGATE_SETTLE_MS", DEFAULT_SETTLE_MS)?),
            http_timeout: Duration::from_secs(parse_var(
                "AMPGATE_HTTP_TIMEOUT_SECONDS",
                DEFAULT_HTTP_TIMEOUT_SECONDS,
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints. Called by `from_env`, and again
    /// by the CLI after applying flag overrides.
    pub fn validate(&self) -> Result<(), AmpgateError> {
        if self.idle_minutes == 0 {
            return Err(AmpgateError::Configuration(
                "AMPGATE_IDLE_MINUTES must be at least 1".to_string(),
            ));
        }
        if self.idle_minutes > MAX_IDLE_MINUTES {
            return Err(AmpgateError::Configuration(format!(
                "AMPGATE_IDLE_MINUTES must be at most {MAX_IDLE_MINUTES}"
            )));
        }
        if self.tick_interval.is_zero() {
            return Err(AmpgateError::Configuration(
                "AMPGATE_TICK_SECONDS must be at least 1".to_string(),
            ));
        }
        if self.recovery_interval >= self.tick_interval {
            return Err(AmpgateError::Configuration(
                "AMPGATE_RECOVERY_SECONDS must be shorter than AMPGATE_TICK_SECONDS".to_string(),
            ));
        }
        Ok(())
    }
}

fn require(name: &str) -> Result<String, AmpgateError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AmpgateError::Configuration(format!("{name} is not set")))
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, AmpgateError> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            AmpgateError::Configuration(format!("{name} is not a valid number: {raw}"))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AmpgateConfig {
        AmpgateConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            speakers_addr: "10.0.0.11".to_string(),
            mixer_addr: "10.0.0.12".to_string(),
            tv_addr: "10.0.0.13".to_string(),
            credential_path: PathBuf::from("/tmp/credential.toml"),
            idle_minutes: 20,
            tick_interval: Duration::from_secs(30),
            recovery_interval: Duration::from_secs(5),
            settle_delay: Duration::from_millis(2000),
            http_timeout: Duration::from_secs(8),
        }
    }

    #[test]
    fn sample_config_validates() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn zero_idle_minutes_is_rejected() {
        let config = AmpgateConfig {
            idle_minutes: 0,
            ..sample()
        };
        assert!(matches!(
            config.validate(),
            Err(AmpgateError::Configuration(_))
        ));
    }

    #[test]
    fn oversized_idle_minutes_is_rejected() {
        let week = AmpgateConfig {
            idle_minutes: MAX_IDLE_MINUTES,
            ..sample()
        };
        assert!(week.validate().is_ok());

        let config = AmpgateConfig {
            idle_minutes: u64::MAX,
            ..sample()
        };
        assert!(matches!(
            config.validate(),
            Err(AmpgateError::Configuration(_))
        ));
    }

    #[test]
    fn recovery_must_be_shorter_than_tick() {
        let config = AmpgateConfig {
            recovery_interval: Duration::from_secs(30),
            ..sample()
        };
        assert!(matches!(
            config.validate(),
            Err(AmpgateError::Configuration(_))
        ));
    }
}
