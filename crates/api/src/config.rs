//! Application configuration loaded from environment variables.

use std::time::Duration;

use resilient::{BreakerConfig, ClientPolicy};

/// Server and downstream-client configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `7000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DOWNSTREAM_TIMEOUT_MS` — per-call read timeout (default: `2000`)
/// - `DOWNSTREAM_MAX_ATTEMPTS` — read attempts incl. first (default: `3`)
/// - `BREAKER_FAILURE_THRESHOLD` — consecutive failures to open (default: `5`)
/// - `BREAKER_COOLDOWN_MS` — open-state cooldown (default: `10000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub downstream_timeout_ms: u64,
    pub downstream_max_attempts: u32,
    pub breaker_failure_threshold: u32,
    pub breaker_cooldown_ms: u64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_parsed("PORT", defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            downstream_timeout_ms: env_parsed(
                "DOWNSTREAM_TIMEOUT_MS",
                defaults.downstream_timeout_ms,
            ),
            downstream_max_attempts: env_parsed(
                "DOWNSTREAM_MAX_ATTEMPTS",
                defaults.downstream_max_attempts,
            ),
            breaker_failure_threshold: env_parsed(
                "BREAKER_FAILURE_THRESHOLD",
                defaults.breaker_failure_threshold,
            ),
            breaker_cooldown_ms: env_parsed("BREAKER_COOLDOWN_MS", defaults.breaker_cooldown_ms),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Per-call policy for the resilient downstream clients.
    pub fn client_policy(&self) -> ClientPolicy {
        ClientPolicy {
            timeout: Duration::from_millis(self.downstream_timeout_ms),
            max_attempts: self.downstream_max_attempts,
            ..ClientPolicy::default()
        }
    }

    /// Circuit breaker configuration for the downstream clients.
    pub fn breaker_config(&self) -> BreakerConfig {
        BreakerConfig {
            failure_threshold: self.breaker_failure_threshold,
            open_timeout: Duration::from_millis(self.breaker_cooldown_ms),
            ..BreakerConfig::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7000,
            log_level: "info".to_string(),
            downstream_timeout_ms: 2000,
            downstream_max_attempts: 3,
            breaker_failure_threshold: 5,
            breaker_cooldown_ms: 10_000,
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
