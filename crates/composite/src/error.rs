use event_channel::ChannelError;
use resilient::DownstreamError;
use thiserror::Error;

/// Errors surfaced by composite operations.
///
/// Critical-leg downstream errors pass through verbatim; best-effort leg
/// failures never appear here, they degrade inside the orchestrator.
#[derive(Debug, Error)]
pub enum CompositeError {
    /// Caller error detected before any downstream call.
    #[error("{0}")]
    InvalidInput(String),

    /// Error from the critical (product) leg of the read path.
    #[error(transparent)]
    Downstream(#[from] DownstreamError),

    /// A write-path event could not be enqueued.
    #[error(transparent)]
    Channel(#[from] ChannelError),
}
