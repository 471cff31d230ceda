//! Bounded backoff for rate-limited requests.
//!
//! The backend answers 429 when the audit pipeline is saturated. Because a
//! human is usually watching a progress bar while these requests run, the
//! backoff is linear-capped rather than exponential: worst-case latency
//! stays bounded. Only 429 is treated as transient; any other non-2xx
//! status fails immediately.

use std::time::Duration;

use crate::error::ClientError;

/// Tunable parameters for the rate-limit retry strategy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the initial attempt (default 4, i.e. 5 sends total).
    pub max_attempts: u32,
    /// Delay before the first retry; grows linearly per attempt.
    pub base_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(2000),
            max_delay: Duration::from_millis(10_000),
        }
    }
}

/// Delay before retry number `attempt` (zero-based), clamped to
/// [`RetryConfig::max_delay`].
pub fn retry_delay(attempt: u32, config: &RetryConfig) -> Duration {
    config
        .base_delay
        .saturating_mul(attempt + 1)
        .min(config.max_delay)
}

/// Executes a single logical request, retrying on 429 with bounded backoff.
#[derive(Debug, Clone, Default)]
pub struct RetryingFetcher {
    config: RetryConfig,
}

impl RetryingFetcher {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Send the request, retrying while the backend rate-limits us.
    ///
    /// * 429 — sleep [`retry_delay`] and retry, up to
    ///   [`RetryConfig::max_attempts`] times, then [`ClientError::RateLimited`].
    /// * any other non-2xx — [`ClientError::RequestFailed`], no retry.
    /// * transport failure — [`ClientError::Network`], no retry.
    pub async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        let mut attempt = 0u32;

        loop {
            let builder = request
                .try_clone()
                .ok_or_else(|| ClientError::Network("request body is not retryable".into()))?;

            let response = builder
                .send()
                .await
                .map_err(|e| ClientError::Network(e.to_string()))?;

            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.config.max_attempts {
                    tracing::warn!(attempt, "Rate limit retries exhausted");
                    return Err(ClientError::RateLimited);
                }
                let delay = retry_delay(attempt, &self.config);
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited, backing off",
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if !status.is_success() {
                return Err(ClientError::RequestFailed {
                    status: status.as_u16(),
                });
            }

            return Ok(response);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_config() -> RetryConfig {
        RetryConfig {
            max_attempts: 4,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    #[test]
    fn delay_grows_linearly() {
        let config = RetryConfig::default();
        assert_eq!(retry_delay(0, &config), Duration::from_millis(2000));
        assert_eq!(retry_delay(1, &config), Duration::from_millis(4000));
        assert_eq!(retry_delay(2, &config), Duration::from_millis(6000));
    }

    #[test]
    fn delay_clamps_at_max() {
        let config = RetryConfig::default();
        assert_eq!(retry_delay(4, &config), Duration::from_millis(10_000));
        assert_eq!(retry_delay(100, &config), Duration::from_millis(10_000));
    }

    #[tokio::test]
    async fn constant_429_sends_exactly_five_requests_then_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/job-1"))
            .respond_with(ResponseTemplate::new(429))
            .expect(5) // 1 initial + 4 retries
            .mount(&server)
            .await;

        let fetcher = RetryingFetcher::new(fast_config());
        let client = reqwest::Client::new();
        let result = fetcher
            .execute(client.get(format!("{}/jobs/job-1", server.uri())))
            .await;

        assert_matches!(result, Err(ClientError::RateLimited));
    }

    #[tokio::test]
    async fn recovers_when_rate_limit_clears() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let fetcher = RetryingFetcher::new(fast_config());
        let client = reqwest::Client::new();
        let response = fetcher.execute(client.get(server.uri())).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn non_429_error_fails_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = RetryingFetcher::new(fast_config());
        let client = reqwest::Client::new();
        let result = fetcher.execute(client.get(server.uri())).await;

        assert_matches!(result, Err(ClientError::RequestFailed { status: 500 }));
    }

    #[tokio::test]
    async fn connection_failure_maps_to_network_error() {
        let fetcher = RetryingFetcher::new(fast_config());
        let client = reqwest::Client::new();
        // Port 9 (discard) is not listening.
        let result = fetcher.execute(client.get("http://127.0.0.1:9/jobs/x")).await;

        assert_matches!(result, Err(ClientError::Network(_)));
    }
}
