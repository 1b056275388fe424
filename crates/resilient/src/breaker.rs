//! Per-service circuit breaker.
//!
//! One breaker instance guards all calls to one downstream service. The
//! state machine is the classic three-state breaker:
//!
//! - **Closed**: calls pass through; consecutive failures are counted.
//! - **Open**: calls are rejected immediately, no transport attempt, until
//!   the cooldown elapses.
//! - **HalfOpen**: a bounded number of trial calls are allowed; enough
//!   successes close the circuit, any failure reopens it.
//!
//! The breaker never executes calls itself; the client asks for admission
//! with [`CircuitBreaker::try_acquire`] and reports the outcome with
//! [`CircuitBreaker::record_success`] / [`CircuitBreaker::record_failure`],
//! so retry and error-translation logic stay outside the shared state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Circuit breaker tuning knobs.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures that trip the circuit open.
    pub failure_threshold: u32,
    /// How long the circuit stays open before allowing trial calls.
    pub open_timeout: Duration,
    /// Successful trial calls required to close the circuit again.
    pub success_threshold: u32,
    /// Trial calls admitted while half-open.
    pub half_open_max_calls: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(10),
            success_threshold: 2,
            half_open_max_calls: 3,
        }
    }
}

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    half_open_calls: u32,
    opened_at: Option<Instant>,
}

/// Shared, atomically updated breaker for one downstream service.
#[derive(Clone)]
pub struct CircuitBreaker {
    service: String,
    config: Arc<BreakerConfig>,
    state: Arc<RwLock<BreakerState>>,
}

impl CircuitBreaker {
    /// Creates a closed breaker for the named service.
    pub fn new(service: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            service: service.into(),
            config: Arc::new(config),
            state: Arc::new(RwLock::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                half_open_calls: 0,
                opened_at: None,
            })),
        }
    }

    /// Returns the current state.
    pub async fn state(&self) -> CircuitState {
        self.state.read().await.state
    }

    /// Asks for admission of one call. Returns `false` when the call must
    /// be short-circuited without any transport attempt.
    pub async fn try_acquire(&self) -> bool {
        let mut state = self.state.write().await;

        match state.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                if state.half_open_calls < self.config.half_open_max_calls {
                    state.half_open_calls += 1;
                    true
                } else {
                    false
                }
            }
            CircuitState::Open => {
                let cooled_down = state
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= self.config.open_timeout);
                if cooled_down {
                    tracing::info!(
                        service = %self.service,
                        "circuit breaker transitioning OPEN -> HALF_OPEN"
                    );
                    state.state = CircuitState::HalfOpen;
                    state.success_count = 0;
                    state.half_open_calls = 1;
                    true
                } else {
                    metrics::counter!("circuit_breaker_rejections_total").increment(1);
                    false
                }
            }
        }
    }

    /// Records a successful call outcome.
    pub async fn record_success(&self) {
        let mut state = self.state.write().await;

        match state.state {
            CircuitState::Closed => {
                state.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                state.success_count += 1;
                if state.success_count >= self.config.success_threshold {
                    tracing::info!(
                        service = %self.service,
                        "circuit breaker transitioning HALF_OPEN -> CLOSED"
                    );
                    state.state = CircuitState::Closed;
                    state.failure_count = 0;
                    state.success_count = 0;
                    state.half_open_calls = 0;
                    state.opened_at = None;
                }
            }
            // A straggler from before the circuit opened; ignore.
            CircuitState::Open => {}
        }
    }

    /// Records a failed call outcome.
    pub async fn record_failure(&self) {
        let mut state = self.state.write().await;

        match state.state {
            CircuitState::Closed => {
                state.failure_count += 1;
                if state.failure_count >= self.config.failure_threshold {
                    tracing::warn!(
                        service = %self.service,
                        failures = state.failure_count,
                        "circuit breaker transitioning CLOSED -> OPEN"
                    );
                    state.state = CircuitState::Open;
                    state.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                tracing::warn!(
                    service = %self.service,
                    "circuit breaker transitioning HALF_OPEN -> OPEN (trial failed)"
                );
                state.state = CircuitState::Open;
                state.failure_count = self.config.failure_threshold;
                state.success_count = 0;
                state.half_open_calls = 0;
                state.opened_at = Some(Instant::now());
            }
            CircuitState::Open => {}
        }
    }
}
