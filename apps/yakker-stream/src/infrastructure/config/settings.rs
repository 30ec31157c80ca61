//! Stream Configuration Settings
//!
//! Configuration types for the Yakker stream, loaded from environment
//! variables. Parsing goes through a lookup function so tests can supply
//! their own variables without touching the process environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::infrastructure::yakker::{HeartbeatConfig, ReconnectConfig};

/// Smallest terminal refresh interval honored.
pub const MIN_CLI_REFRESH: Duration = Duration::from_millis(100);

/// Live feed credentials: the `Authorization` header value.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthValue(String);

impl AuthValue {
    /// Wrap an already-stripped header value.
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// The header value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthValue([REDACTED])")
    }
}

/// Feed source settings.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// WebSocket URL (absent only in demo mode).
    pub ws_url: Option<String>,
    /// `Authorization` header value.
    pub auth: Option<AuthValue>,
    /// Replay built-in payloads instead of connecting.
    pub demo: bool,
    /// Pause between demo payloads.
    pub demo_interval: Duration,
    /// Fixed delay between reconnect attempts.
    pub reconnect_delay: Duration,
    /// Heartbeat ping interval.
    pub heartbeat_interval: Duration,
    /// Time allowed for traffic after a ping.
    pub heartbeat_timeout: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            ws_url: None,
            auth: None,
            demo: false,
            demo_interval: Duration::from_secs(1),
            reconnect_delay: Duration::from_secs(3),
            heartbeat_interval: Duration::from_secs(30),
            heartbeat_timeout: Duration::from_secs(15),
        }
    }
}

impl FeedSettings {
    /// Reconnect policy configuration.
    #[must_use]
    pub const fn reconnect(&self) -> ReconnectConfig {
        ReconnectConfig::new(self.reconnect_delay)
    }

    /// Heartbeat configuration.
    #[must_use]
    pub const fn heartbeat(&self) -> HeartbeatConfig {
        HeartbeatConfig::new(self.heartbeat_interval, self.heartbeat_timeout)
    }
}

/// Consumer output settings.
#[derive(Debug, Clone)]
pub struct OutputSettings {
    /// HTTP port.
    pub port: u16,
    /// Print each accepted summary to stderr.
    pub console_echo: bool,
    /// Snapshot file rewrite interval.
    pub snapshot_interval: Duration,
    /// Snapshot template path.
    pub livedata_template: PathBuf,
    /// Snapshot output path.
    pub livedata_path: PathBuf,
    /// Terminal dashboard refresh interval.
    pub cli_refresh: Duration,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            port: 8000,
            console_echo: true,
            snapshot_interval: Duration::from_secs(1),
            livedata_template: PathBuf::from("livedata.xml.template"),
            livedata_path: PathBuf::from("livedata.xml"),
            cli_refresh: Duration::from_millis(250),
        }
    }
}

impl OutputSettings {
    /// Terminal refresh interval, never below [`MIN_CLI_REFRESH`].
    #[must_use]
    pub fn effective_cli_refresh(&self) -> Duration {
        self.cli_refresh.max(MIN_CLI_REFRESH)
    }
}

/// Complete stream configuration.
#[derive(Debug, Clone, Default)]
pub struct StreamConfig {
    /// Feed source settings.
    pub feed: FeedSettings,
    /// Consumer output settings.
    pub output: OutputSettings,
}

impl StreamConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if no feed URL is configured outside demo mode.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if no feed URL is configured outside demo mode.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = EnvReader { lookup };
        let feed_defaults = FeedSettings::default();
        let output_defaults = OutputSettings::default();

        let demo = env.bool("YAKKER_DEMO", feed_defaults.demo);
        let ws_url = env.non_empty("YAKKER_WS_URL");
        if ws_url.is_none() && !demo {
            return Err(ConfigError::MissingEnvVar("YAKKER_WS_URL".to_string()));
        }

        let feed = FeedSettings {
            ws_url,
            auth: env
                .non_empty("YAKKER_AUTH_HEADER")
                .and_then(|raw| extract_auth_value(&raw))
                .map(AuthValue::new),
            demo,
            demo_interval: env.secs_f64("YAKKER_POLL_INTERVAL", feed_defaults.demo_interval),
            reconnect_delay: env.millis("YAKKER_RECONNECT_DELAY_MS", feed_defaults.reconnect_delay),
            heartbeat_interval: env.secs(
                "YAKKER_HEARTBEAT_INTERVAL_SECS",
                feed_defaults.heartbeat_interval,
            ),
            heartbeat_timeout: env.secs(
                "YAKKER_HEARTBEAT_TIMEOUT_SECS",
                feed_defaults.heartbeat_timeout,
            ),
        };

        let output = OutputSettings {
            port: env.parse("YAKKER_PORT", output_defaults.port),
            console_echo: env.bool("YAKKER_CONSOLE_ECHO", output_defaults.console_echo),
            snapshot_interval: env.millis(
                "YAKKER_SNAPSHOT_INTERVAL_MS",
                output_defaults.snapshot_interval,
            ),
            livedata_template: env
                .non_empty("YAKKER_LIVEDATA_TEMPLATE")
                .map_or(output_defaults.livedata_template, PathBuf::from),
            livedata_path: env
                .non_empty("YAKKER_LIVEDATA_PATH")
                .map_or(output_defaults.livedata_path, PathBuf::from),
            cli_refresh: env.secs_f64("YAKKER_CLI_REFRESH", output_defaults.cli_refresh),
        };

        Ok(Self { feed, output })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Strip an optional `Authorization:` prefix (any case) from a raw header.
///
/// Returns `None` for blank input.
#[must_use]
pub fn extract_auth_value(raw: &str) -> Option<String> {
    const PREFIX: &str = "authorization:";

    let trimmed = raw.trim();
    let value = match trimmed.get(..PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(PREFIX) => trimmed[PREFIX.len()..].trim(),
        _ => trimmed,
    };
    (!value.is_empty()).then(|| value.to_string())
}

// =============================================================================
// Variable Parsing
// =============================================================================

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn non_empty(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.non_empty(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn bool(&self, key: &str, default: bool) -> bool {
        match self.non_empty(key).map(|v| v.to_ascii_lowercase()).as_deref() {
            Some("1" | "true" | "yes" | "on") => true,
            Some("0" | "false" | "no" | "off") => false,
            _ => default,
        }
    }

    fn secs(&self, key: &str, default: Duration) -> Duration {
        self.non_empty(key)
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .filter(|d| !d.is_zero())
            .unwrap_or(default)
    }

    fn millis(&self, key: &str, default: Duration) -> Duration {
        self.non_empty(key)
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .filter(|d| !d.is_zero())
            .unwrap_or(default)
    }

    fn secs_f64(&self, key: &str, default: Duration) -> Duration {
        self.non_empty(key)
            .and_then(|v| v.parse::<f64>().ok())
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
            .filter(|d| !d.is_zero())
            .unwrap_or(default)
    }
}
