// crates/table-sampler-core/src/core/event.rs
// ============================================================================
// Module: Table Sampler Events
// Description: Structured log events emitted while processing commands.
// Purpose: Give hosts one JSON-serializable record per notable condition.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Events are plain serializable records; sinks decide where they go. Each
//! event carries a stable `event` identifier so downstream pipelines can
//! filter without parsing `message`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::command::CommandType;
use crate::core::table::TableReference;

// ============================================================================
// SECTION: Event Identifiers
// ============================================================================

/// Command accepted for processing.
pub const EVENT_COMMAND_RECEIVED: &str = "command_received";
/// Command handled successfully.
pub const EVENT_COMMAND_COMPLETED: &str = "command_completed";
/// Command handling failed.
pub const EVENT_COMMAND_FAILED: &str = "command_failed";
/// Storage document had unusable fields.
pub const EVENT_MALFORMED_DOCUMENT: &str = "malformed_document";
/// One table failed inside a prefix.
pub const EVENT_TABLE_FAILED: &str = "table_failed";
/// Sampling lock aborted a run.
pub const EVENT_SAMPLING_INTERRUPTED: &str = "sampling_interrupted";
/// Resource removed by START cleanup.
pub const EVENT_CLEANUP: &str = "cleanup";
/// Table sample finished.
pub const EVENT_SAMPLE_DONE: &str = "sample_done";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    /// Routine progress.
    Info,
    /// Degraded but recoverable condition.
    Warning,
    /// Failed unit of work.
    Error,
}

/// Structured sampler log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SamplerEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Severity.
    pub level: EventLevel,
    /// Command type being processed, when any.
    pub command: Option<&'static str>,
    /// Table concerned, when any.
    pub table: Option<String>,
    /// Human-readable detail.
    pub message: String,
}

impl SamplerEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(event: &'static str, level: EventLevel, message: impl Into<String>) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            level,
            command: None,
            table: None,
            message: message.into(),
        }
    }

    /// Creates an info event.
    #[must_use]
    pub fn info(event: &'static str, message: impl Into<String>) -> Self {
        Self::new(event, EventLevel::Info, message)
    }

    /// Creates a warning event.
    #[must_use]
    pub fn warning(event: &'static str, message: impl Into<String>) -> Self {
        Self::new(event, EventLevel::Warning, message)
    }

    /// Creates an error event.
    #[must_use]
    pub fn error(event: &'static str, message: impl Into<String>) -> Self {
        Self::new(event, EventLevel::Error, message)
    }

    /// Tags the event with a command type.
    #[must_use]
    pub fn with_command(mut self, command: CommandType) -> Self {
        self.command = Some(command.as_str());
        self
    }

    /// Tags the event with a table.
    #[must_use]
    pub fn with_table(mut self, table: &TableReference) -> Self {
        self.table = Some(table.to_string());
        self
    }
}
