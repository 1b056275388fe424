use thiserror::Error;

/// Errors raised when handing an event to a channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The consuming side of the channel has gone away.
    #[error("event channel for {resource} is closed")]
    Closed { resource: String },

    /// The event payload could not be serialized.
    #[error("failed to encode event payload: {0}")]
    Encode(#[from] serde_json::Error),
}
