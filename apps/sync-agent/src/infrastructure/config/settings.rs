//! Agent Configuration Settings
//!
//! Configuration types for the sync agent, loaded from environment
//! variables. The live feed is optional: without a stream URL the agent
//! falls back to the demo feed so the dashboard still has data.

use std::time::Duration;

use crate::infrastructure::stream::ReconnectConfig;

/// Session token for the data service.
///
/// Wrapped so the token never leaks through `Debug` output or logs.
#[derive(Clone)]
pub struct SessionToken(String);

impl SessionToken {
    /// Create a new session token.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// Get the raw token value.
    #[must_use]
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionToken").field(&"[REDACTED]").finish()
    }
}

/// Live feed reconnection settings.
#[derive(Debug, Clone)]
pub struct ReconnectSettings {
    /// Initial reconnection delay.
    pub delay_initial: Duration,
    /// Maximum reconnection delay.
    pub delay_max: Duration,
    /// Delay multiplier for exponential backoff.
    pub delay_multiplier: f64,
    /// Maximum reconnection attempts before giving up (0 = unlimited).
    pub max_attempts: u32,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            delay_initial: Duration::from_millis(1000),
            delay_max: Duration::from_secs(30),
            delay_multiplier: 2.0,
            max_attempts: 5,
        }
    }
}

impl From<ReconnectSettings> for ReconnectConfig {
    fn from(settings: ReconnectSettings) -> Self {
        Self {
            initial_delay: settings.delay_initial,
            max_delay: settings.delay_max,
            multiplier: settings.delay_multiplier,
            max_attempts: settings.max_attempts,
        }
    }
}

/// Complete agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the data service REST API.
    pub api_base_url: String,
    /// Session token attached to every REST request.
    pub session: SessionToken,
    /// Per-request timeout for the REST API.
    pub api_timeout: Duration,
    /// Live feed WebSocket URL. Absent in demo-only runs.
    pub stream_url: Option<String>,
    /// Optional token for the feed connection.
    pub stream_token: Option<SessionToken>,
    /// Whether the demo feed runs.
    pub demo_feed: bool,
    /// Cadence for background record refreshes (zero disables them).
    pub refresh_interval: Duration,
    /// Health check HTTP port.
    pub health_port: u16,
    /// Live feed reconnection settings.
    pub reconnect: ReconnectSettings,
}

impl AgentConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or
    /// empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = require_env("DESKBOARD_API_BASE_URL")?;
        let session = SessionToken::new(require_env("DESKBOARD_SESSION_TOKEN")?);

        let stream_url = optional_env("DESKBOARD_STREAM_URL");
        let stream_token = optional_env("DESKBOARD_STREAM_TOKEN").map(SessionToken::new);

        // With no live endpoint the demo feed is the only data source,
        // so it defaults on.
        let demo_feed = parse_env_bool("DESKBOARD_DEMO_FEED", stream_url.is_none());

        let reconnect = ReconnectSettings {
            delay_initial: parse_env_duration_millis(
                "DESKBOARD_RECONNECT_DELAY_INITIAL_MS",
                ReconnectSettings::default().delay_initial,
            ),
            delay_max: parse_env_duration_secs(
                "DESKBOARD_RECONNECT_DELAY_MAX_SECS",
                ReconnectSettings::default().delay_max,
            ),
            delay_multiplier: parse_env_f64(
                "DESKBOARD_RECONNECT_DELAY_MULTIPLIER",
                ReconnectSettings::default().delay_multiplier,
            ),
            max_attempts: parse_env_u32(
                "DESKBOARD_RECONNECT_MAX_ATTEMPTS",
                ReconnectSettings::default().max_attempts,
            ),
        };

        Ok(Self {
            api_base_url,
            session,
            api_timeout: parse_env_duration_secs(
                "DESKBOARD_API_TIMEOUT_SECS",
                Duration::from_secs(10),
            ),
            stream_url,
            stream_token,
            demo_feed,
            refresh_interval: parse_env_duration_secs(
                "DESKBOARD_REFRESH_INTERVAL_SECS",
                Duration::from_secs(30),
            ),
            health_port: parse_env_u16("DESKBOARD_HEALTH_PORT", 8082),
            reconnect,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    let value =
        std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))?;
    if value.is_empty() {
        return Err(ConfigError::EmptyValue(key.to_string()));
    }
    Ok(value)
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map_or(default, |v| match v.to_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            _ => default,
        })
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_redacted_debug() {
        let token = SessionToken::new("tok-12345".to_string());
        let debug = format!("{token:?}");
        assert!(!debug.contains("tok-12345"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(token.reveal(), "tok-12345");
    }

    #[test]
    fn reconnect_settings_defaults() {
        let settings = ReconnectSettings::default();
        assert_eq!(settings.delay_initial, Duration::from_millis(1000));
        assert_eq!(settings.delay_max, Duration::from_secs(30));
        assert!((settings.delay_multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(settings.max_attempts, 5);
    }

    #[test]
    fn reconnect_settings_convert_to_stream_config() {
        let config: ReconnectConfig = ReconnectSettings::default().into();
        assert_eq!(config.initial_delay, Duration::from_millis(1000));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert_eq!(config.max_attempts, 5);
    }
}
