//! Event channel for write propagation.
//!
//! Each resource type (product, recommendation, review) gets its own
//! ordered channel carrying immutable CREATE/DELETE events from the
//! composite side to the owning service. Delivery is at-least-once:
//! consumers must tolerate redelivery, the channel only guarantees FIFO
//! order for events sharing a routing key.

pub mod channel;
pub mod error;
pub mod event;

pub use channel::{EventChannel, EventReceiver, InMemoryEventChannel};
pub use error::ChannelError;
pub use event::{Event, EventType};
