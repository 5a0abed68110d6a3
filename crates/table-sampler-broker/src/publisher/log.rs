// crates/table-sampler-broker/src/publisher/log.rs
// ============================================================================
// Module: Table Sampler Log Publisher
// Description: Log-only publisher for message records.
// Purpose: Persist published messages without delivering them.
// Dependencies: serde_json, std
// ============================================================================

//! ## Overview
//! `LogPublisher` writes a `{"topic", "message"}` JSON line for each publish.
//! Nothing is delivered to consumers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use serde_json::Value;
use serde_json::json;
use table_sampler_core::PublishError;
use table_sampler_core::Publisher;

// ============================================================================
// SECTION: Log Publisher
// ============================================================================

/// Log-only message publisher.
pub struct LogPublisher<W: Write + Send> {
    /// Output writer for message records.
    writer: Mutex<W>,
}

impl<W: Write + Send> LogPublisher<W> {
    /// Creates a log publisher.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the writer, consuming the publisher.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Transport`] when the writer mutex is poisoned.
    pub fn into_inner(self) -> Result<W, PublishError> {
        self.writer
            .into_inner()
            .map_err(|_| PublishError::Transport("log writer mutex poisoned".to_string()))
    }
}

impl<W: Write + Send> Publisher for LogPublisher<W> {
    fn publish(&self, topic: &str, message: &Value) -> Result<(), PublishError> {
        let record = json!({
            "topic": topic,
            "message": message,
        });
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| PublishError::Transport("log writer mutex poisoned".to_string()))?;
        serde_json::to_writer(&mut *guard, &record)
            .map_err(|err| PublishError::Encode(err.to_string()))?;
        guard.write_all(b"\n").map_err(|err| PublishError::Transport(err.to_string()))?;
        drop(guard);
        Ok(())
    }
}
