// crates/table-sampler-broker/src/publisher/mod.rs
// ============================================================================
// Module: Table Sampler Publishers
// Description: Reference message transports for sampler commands.
// Purpose: Deliver published commands and error records to local consumers.
// Dependencies: table-sampler-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! Every publisher implements [`table_sampler_core::Publisher`]:
//! - [`ChannelPublisher`] enqueues [`OutboundMessage`] values on a Tokio channel.
//! - [`LogPublisher`] writes one JSON line per message.
//! - [`CallbackPublisher`] hands messages to a user function.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod callback;
mod channel;
mod log;

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use callback::CallbackPublisher;
pub use channel::ChannelPublisher;
pub use log::LogPublisher;

// ============================================================================
// SECTION: Outbound Message
// ============================================================================

/// Message emitted by channel-based publishers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Destination topic.
    pub topic: String,
    /// JSON message body.
    pub message: Value,
}
