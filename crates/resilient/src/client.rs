//! The resilient client: one read call, fully wrapped.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::breaker::{BreakerConfig, CircuitBreaker};
use crate::error::{DownstreamError, error_message};
use crate::transport::Transport;

/// Timeout and retry policy for one downstream service.
#[derive(Debug, Clone)]
pub struct ClientPolicy {
    /// Time budget per attempt.
    pub timeout: Duration,
    /// Total attempts, including the first one. Only retryable outcomes
    /// (timeouts, transport failures, 5xx) consume additional attempts.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub retry_backoff: Duration,
}

impl Default for ClientPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            max_attempts: 3,
            retry_backoff: Duration::from_millis(25),
        }
    }
}

/// Issues reads against one named downstream service, applying the
/// timeout, retry and circuit-breaker policies and translating failures
/// into [`DownstreamError`].
///
/// All calls through one client share the same breaker state; cloning the
/// client shares it too.
#[derive(Clone)]
pub struct ResilientClient {
    service: String,
    transport: Arc<dyn Transport>,
    policy: ClientPolicy,
    breaker: CircuitBreaker,
}

impl ResilientClient {
    pub fn new(
        service: impl Into<String>,
        transport: Arc<dyn Transport>,
        policy: ClientPolicy,
        breaker_config: BreakerConfig,
    ) -> Self {
        let service = service.into();
        let breaker = CircuitBreaker::new(service.clone(), breaker_config);
        Self {
            service,
            transport,
            policy,
            breaker,
        }
    }

    /// The service name this client targets.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The breaker guarding this client, for observability.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Performs a GET for the given path and decodes the JSON body.
    ///
    /// Reads are idempotent, so retryable failures are re-attempted up to
    /// the policy's budget. 404 and 422 return immediately with the
    /// downstream's own message; an open circuit returns `Unavailable`
    /// without touching the transport.
    #[tracing::instrument(skip(self), fields(service = %self.service))]
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DownstreamError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            metrics::counter!("downstream_calls_total").increment(1);

            if !self.breaker.try_acquire().await {
                tracing::warn!(path, "circuit open, short-circuiting call");
                return Err(DownstreamError::Unavailable {
                    service: self.service.clone(),
                    reason: "circuit breaker open".to_string(),
                });
            }

            let error = match self.attempt(path).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            if !error.is_retryable() || attempt >= self.policy.max_attempts {
                metrics::counter!("downstream_call_failures_total").increment(1);
                return Err(error);
            }

            tracing::warn!(
                path,
                attempt,
                error = %error,
                "downstream call failed, retrying"
            );
            tokio::time::sleep(self.policy.retry_backoff).await;
        }
    }

    /// One attempt: timeout, transport call, error translation, breaker
    /// outcome recording.
    async fn attempt<T: DeserializeOwned>(&self, path: &str) -> Result<T, DownstreamError> {
        let call = self.transport.get(path);
        let response = match tokio::time::timeout(self.policy.timeout, call).await {
            Err(_elapsed) => {
                self.breaker.record_failure().await;
                return Err(DownstreamError::Timeout {
                    service: self.service.clone(),
                    timeout_ms: self.policy.timeout.as_millis() as u64,
                });
            }
            Ok(Err(transport_error)) => {
                self.breaker.record_failure().await;
                return Err(DownstreamError::Unavailable {
                    service: self.service.clone(),
                    reason: transport_error.to_string(),
                });
            }
            Ok(Ok(response)) => response,
        };

        match response.status {
            200..=299 => {
                self.breaker.record_success().await;
                serde_json::from_str(&response.body).map_err(|e| DownstreamError::Unknown {
                    service: self.service.clone(),
                    reason: format!("undecodable response body: {e}"),
                })
            }
            404 => {
                self.breaker.record_success().await;
                Err(DownstreamError::NotFound(error_message(
                    404,
                    &response.body,
                )))
            }
            422 => {
                self.breaker.record_success().await;
                Err(DownstreamError::InvalidInput(error_message(
                    422,
                    &response.body,
                )))
            }
            status if status >= 500 => {
                self.breaker.record_failure().await;
                tracing::warn!(path, status, "downstream server error");
                Err(DownstreamError::Unavailable {
                    service: self.service.clone(),
                    reason: format!("HTTP {status}"),
                })
            }
            status => {
                // Remaining 4xx: the service answered, the request was wrong.
                self.breaker.record_success().await;
                tracing::warn!(path, status, "unexpected downstream status");
                Err(DownstreamError::Unknown {
                    service: self.service.clone(),
                    reason: format!("HTTP {status}"),
                })
            }
        }
    }
}
