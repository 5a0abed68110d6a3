// crates/table-sampler-core/src/core/command.rs
// ============================================================================
// Module: Table Sampler Commands
// Description: Tagged command messages exchanged over the message transport.
// Purpose: Define the immutable workflow messages and their wire envelope.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Commands drive the sampling workflow through four stages:
//! `START` → `SAMPLE_POLICY_PREFIX` → `SAMPLE_START` → `SAMPLE_DONE`.
//! Each stage builds a fresh successor; commands are never mutated after
//! construction. On the wire a command is a JSON object tagged by `type` and
//! carrying the originating trigger's `timestamp`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::table::TableReference;
use crate::core::table::TableSample;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Command Type
// ============================================================================

/// Discriminant of a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    /// Workflow trigger.
    Start,
    /// Process one `project/dataset/` prefix of the policy bucket.
    SamplePolicyPrefix,
    /// Sample one table.
    SampleStart,
    /// Terminal report of one table sample.
    SampleDone,
}

impl CommandType {
    /// All command types in workflow order.
    pub const ALL: [Self; 4] = [Self::Start, Self::SamplePolicyPrefix, Self::SampleStart, Self::SampleDone];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::SamplePolicyPrefix => "SAMPLE_POLICY_PREFIX",
            Self::SampleStart => "SAMPLE_START",
            Self::SampleDone => "SAMPLE_DONE",
        }
    }

    /// Resolves a wire name.
    #[must_use]
    pub fn from_wire(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == raw)
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Command Payloads
// ============================================================================

/// Workflow trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartCommand {
    /// Trigger time.
    pub timestamp: Timestamp,
}

/// Request to process one storage prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyPrefixCommand {
    /// Trigger time.
    pub timestamp: Timestamp,
    /// Prefix of the form `project/dataset/`.
    pub prefix: String,
}

/// Request to sample one table into its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleStartCommand {
    /// Trigger time.
    pub timestamp: Timestamp,
    /// Compliant sample request for the source table.
    pub sample_request: TableSample,
    /// Table receiving the sample.
    pub target_table: TableReference,
}

/// Terminal report for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleDoneCommand {
    /// Trigger time.
    pub timestamp: Timestamp,
    /// Request that was executed.
    pub sample_request: TableSample,
    /// Table that received the sample.
    pub target_table: TableReference,
    /// Time the sample started.
    pub start_timestamp: Timestamp,
    /// Time the sample finished.
    pub end_timestamp: Timestamp,
    /// Failure description, when the sample failed.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Rows present in the target after the sample.
    #[serde(default)]
    pub amount_inserted: Option<u64>,
}

impl SampleDoneCommand {
    /// Builds the report for `start` from its execution outcome.
    #[must_use]
    pub fn from_start(
        start: &SampleStartCommand,
        start_timestamp: Timestamp,
        end_timestamp: Timestamp,
        outcome: Result<u64, String>,
    ) -> Self {
        let (amount_inserted, error_message) = match outcome {
            Ok(amount) => (Some(amount), None),
            Err(message) => (None, Some(message)),
        };
        Self {
            timestamp: start.timestamp,
            sample_request: start.sample_request.clone(),
            target_table: start.target_table.clone(),
            start_timestamp,
            end_timestamp,
            error_message,
            amount_inserted,
        }
    }

    /// Returns true when the sample failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.error_message.is_some()
    }
}

// ============================================================================
// SECTION: Command
// ============================================================================

/// Workflow message tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Workflow trigger.
    Start(StartCommand),
    /// Prefix processing request.
    SamplePolicyPrefix(PolicyPrefixCommand),
    /// Table sample request.
    SampleStart(SampleStartCommand),
    /// Table sample report.
    SampleDone(SampleDoneCommand),
}

impl Command {
    /// Returns the command discriminant.
    #[must_use]
    pub const fn command_type(&self) -> CommandType {
        match self {
            Self::Start(_) => CommandType::Start,
            Self::SamplePolicyPrefix(_) => CommandType::SamplePolicyPrefix,
            Self::SampleStart(_) => CommandType::SampleStart,
            Self::SampleDone(_) => CommandType::SampleDone,
        }
    }

    /// Returns the trigger timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> Timestamp {
        match self {
            Self::Start(command) => command.timestamp,
            Self::SamplePolicyPrefix(command) => command.timestamp,
            Self::SampleStart(command) => command.timestamp,
            Self::SampleDone(command) => command.timestamp,
        }
    }

    /// Returns the source table for table-scoped commands.
    #[must_use]
    pub const fn table(&self) -> Option<&TableReference> {
        match self {
            Self::Start(_) | Self::SamplePolicyPrefix(_) => None,
            Self::SampleStart(command) => Some(&command.sample_request.table_reference),
            Self::SampleDone(command) => Some(&command.sample_request.table_reference),
        }
    }

    /// Serializes the command into its wire envelope.
    ///
    /// # Errors
    ///
    /// Returns the serializer error when the command cannot be rendered.
    pub fn to_message(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Decodes a wire envelope.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingType`] without a string `type`,
    /// [`DecodeError::UnsupportedType`] for an unknown `type`, and
    /// [`DecodeError::Invalid`] when the payload does not match its type.
    pub fn decode(message: &Value) -> Result<Self, DecodeError> {
        let raw_type = message.get("type").and_then(Value::as_str).ok_or(DecodeError::MissingType)?;
        let command_type = CommandType::from_wire(raw_type)
            .ok_or_else(|| DecodeError::UnsupportedType(raw_type.to_string()))?;
        Self::deserialize(message)
            .map_err(|err| DecodeError::Invalid(format!("{command_type}: {err}")))
    }

    /// Decodes a raw message body.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Invalid`] for invalid JSON and any
    /// [`Command::decode`] error otherwise.
    pub fn decode_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let message: Value =
            serde_json::from_slice(bytes).map_err(|err| DecodeError::Invalid(err.to_string()))?;
        Self::decode(&message)
    }
}

impl From<StartCommand> for Command {
    fn from(command: StartCommand) -> Self {
        Self::Start(command)
    }
}

impl From<PolicyPrefixCommand> for Command {
    fn from(command: PolicyPrefixCommand) -> Self {
        Self::SamplePolicyPrefix(command)
    }
}

impl From<SampleStartCommand> for Command {
    fn from(command: SampleStartCommand) -> Self {
        Self::SampleStart(command)
    }
}

impl From<SampleDoneCommand> for Command {
    fn from(command: SampleDoneCommand) -> Self {
        Self::SampleDone(command)
    }
}

/// Command envelope decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Message lacks a string `type` field.
    #[error("command message has no type")]
    MissingType,
    /// Message names an unknown command type.
    #[error("unsupported command type: {0}")]
    UnsupportedType(String),
    /// Payload does not match its declared type.
    #[error("invalid command message: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Error Record
// ============================================================================

/// Payload published to the error channel when processing fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Serialized command, or the raw message when it could not be decoded.
    pub command: Value,
    /// Failure description.
    pub error: String,
}

impl ErrorRecord {
    /// Creates an error record.
    #[must_use]
    pub fn new(command: Value, error: impl Into<String>) -> Self {
        Self {
            command,
            error: error.into(),
        }
    }
}
