//! Downstream error taxonomy.

use serde::Deserialize;
use thiserror::Error;

/// Errors surfaced by calls to a downstream service.
///
/// `InvalidInput` and `NotFound` carry the downstream's own message
/// verbatim and are never retried. `Timeout` and `Unavailable` count as
/// failures for circuit-breaking purposes; `Unknown` covers everything
/// the taxonomy cannot classify.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownstreamError {
    /// Caller error reported by the downstream (HTTP 422).
    #[error("{0}")]
    InvalidInput(String),

    /// The downstream reported no entity for the request (HTTP 404).
    #[error("{0}")]
    NotFound(String),

    /// The call exceeded its configured time budget.
    #[error("call to {service} timed out after {timeout_ms} ms")]
    Timeout { service: String, timeout_ms: u64 },

    /// The downstream could not be reached, answered 5xx, or the circuit
    /// for it is open.
    #[error("service {service} unavailable: {reason}")]
    Unavailable { service: String, reason: String },

    /// Unclassified failure, including unexpected status codes and
    /// undecodable success bodies.
    #[error("unexpected error from {service}: {reason}")]
    Unknown { service: String, reason: String },
}

impl DownstreamError {
    /// True for outcomes that a read may retry: transport-level failures
    /// and server-side errors, never caller errors.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DownstreamError::Timeout { .. } | DownstreamError::Unavailable { .. }
        )
    }
}

/// Transport-level failure raised below HTTP status semantics.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The connection could not be established or broke mid-call.
    #[error("connection failed: {0}")]
    Connection(String),
}

/// Structured error body sent by the owning services.
///
/// Only the message is interesting here; the rest of the envelope
/// (timestamp, path, status) belongs to the HTTP layer.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}

/// Extracts the downstream's error message from a structured error body,
/// falling back to the raw body or the status code when the body does not
/// parse.
pub(crate) fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => format!("HTTP {status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_extracted_from_structured_body() {
        let body = r#"{"timestamp":"2024-01-01T00:00:00Z","path":"/product/13","httpStatus":404,"message":"No product found for productId: 13"}"#;
        assert_eq!(error_message(404, body), "No product found for productId: 13");
    }

    #[test]
    fn message_falls_back_to_raw_body() {
        assert_eq!(error_message(404, "gone"), "gone");
    }

    #[test]
    fn message_falls_back_to_status() {
        assert_eq!(error_message(502, ""), "HTTP 502");
    }

    #[test]
    fn retryable_classification() {
        assert!(
            DownstreamError::Timeout {
                service: "product".to_string(),
                timeout_ms: 100
            }
            .is_retryable()
        );
        assert!(
            DownstreamError::Unavailable {
                service: "product".to_string(),
                reason: "HTTP 500".to_string()
            }
            .is_retryable()
        );
        assert!(!DownstreamError::NotFound("nope".to_string()).is_retryable());
        assert!(!DownstreamError::InvalidInput("bad".to_string()).is_retryable());
    }
}
