// crates/table-sampler-broker/src/publisher/channel.rs
// ============================================================================
// Module: Table Sampler Channel Publisher
// Description: Channel-based publisher for in-process delivery.
// Purpose: Send published messages through a Tokio mpsc channel.
// Dependencies: table-sampler-core, tokio
// ============================================================================

//! ## Overview
//! [`ChannelPublisher`] enqueues one [`OutboundMessage`] per publish without
//! blocking. A full queue or a dropped receiver fails the publish.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use table_sampler_core::PublishError;
use table_sampler_core::Publisher;
use tokio::sync::mpsc;
use tokio::sync::mpsc::Receiver;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;

use crate::publisher::OutboundMessage;

// ============================================================================
// SECTION: Channel Publisher
// ============================================================================

/// Channel-based message publisher.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    /// Sender feeding the consumer.
    sender: Sender<OutboundMessage>,
}

impl ChannelPublisher {
    /// Wraps an existing sender.
    #[must_use]
    pub const fn new(sender: Sender<OutboundMessage>) -> Self {
        Self {
            sender,
        }
    }

    /// Creates a publisher and the receiver draining it.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, Receiver<OutboundMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(sender), receiver)
    }
}

impl Publisher for ChannelPublisher {
    fn publish(&self, topic: &str, message: &Value) -> Result<(), PublishError> {
        let outbound = OutboundMessage {
            topic: topic.to_string(),
            message: message.clone(),
        };
        self.sender.try_send(outbound).map_err(|err| match err {
            TrySendError::Full(_) => PublishError::Transport("channel full".to_string()),
            TrySendError::Closed(_) => PublishError::Closed,
        })
    }
}
