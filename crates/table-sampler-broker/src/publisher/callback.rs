// crates/table-sampler-broker/src/publisher/callback.rs
// ============================================================================
// Module: Table Sampler Callback Publisher
// Description: Callback-based publisher for synchronous delivery.
// Purpose: Invoke a user-provided function with published messages.
// Dependencies: table-sampler-core, std
// ============================================================================

//! ## Overview
//! [`CallbackPublisher`] forwards each message to a user-supplied function and
//! returns its result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use table_sampler_core::PublishError;
use table_sampler_core::Publisher;

// ============================================================================
// SECTION: Callback Publisher
// ============================================================================

/// Callback-based message publisher.
#[derive(Clone)]
pub struct CallbackPublisher {
    /// Handler invoked with the topic and message.
    handler: Arc<CallbackHandler>,
}

/// Callback handler signature used by the publisher.
type CallbackHandler = dyn Fn(&str, &Value) -> Result<(), PublishError> + Send + Sync;

impl CallbackPublisher {
    /// Creates a callback publisher from a handler function.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<(), PublishError> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl Publisher for CallbackPublisher {
    fn publish(&self, topic: &str, message: &Value) -> Result<(), PublishError> {
        (self.handler)(topic, message)
    }
}
