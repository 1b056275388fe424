//! Resilient downstream client for the product composite system.
//!
//! Wraps one outbound read call to a named downstream service with a
//! per-call timeout, a bounded retry policy for idempotent reads, and a
//! per-service circuit breaker, translating transport and HTTP failures
//! into the [`DownstreamError`] taxonomy.
//!
//! Writes never pass through this crate; they go out as events on the
//! event channel instead.

pub mod breaker;
pub mod client;
pub mod error;
pub mod transport;

pub use breaker::{BreakerConfig, CircuitBreaker, CircuitState};
pub use client::{ClientPolicy, ResilientClient};
pub use error::{DownstreamError, TransportError};
pub use transport::{HttpTransport, RawResponse, Transport};
