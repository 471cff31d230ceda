use std::time::Duration;

use crate::retry::RetryConfig;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development; override via
/// environment variables in production embeds.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Audit backend base URL (no trailing slash).
    pub api_url: String,
    /// Pull transport re-fetch interval.
    pub poll_interval: Duration,
    /// Rate-limit retry parameters.
    pub retry: RetryConfig,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                            | Default                 |
    /// |------------------------------------|-------------------------|
    /// | `SITEPULSE_API_URL`                | `http://localhost:3000` |
    /// | `SITEPULSE_POLL_INTERVAL_SECS`     | `3`                     |
    /// | `SITEPULSE_RETRY_MAX_ATTEMPTS`     | `4`                     |
    pub fn from_env() -> Self {
        let api_url =
            std::env::var("SITEPULSE_API_URL").unwrap_or_else(|_| "http://localhost:3000".into());

        let poll_interval_secs: u64 = std::env::var("SITEPULSE_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("SITEPULSE_POLL_INTERVAL_SECS must be a valid u64");

        let max_attempts: u32 = std::env::var("SITEPULSE_RETRY_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("SITEPULSE_RETRY_MAX_ATTEMPTS must be a valid u32");

        Self {
            api_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
            retry: RetryConfig {
                max_attempts,
                ..RetryConfig::default()
            },
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".into(),
            poll_interval: Duration::from_secs(3),
            retry: RetryConfig::default(),
        }
    }
}
