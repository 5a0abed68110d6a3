// crates/table-sampler-core/src/runtime/error.rs
// ============================================================================
// Module: Table Sampler Processing Errors
// Description: Error taxonomy surfaced by command handlers.
// Purpose: Distinguish interruption, validation, collaborator and per-table failures.
// Dependencies: crate::core, crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! [`ProcessError`] is what `process()` returns to the message transport. The
//! transport decides whether to retry or dead-letter; handlers never retry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::command::DecodeError;
use crate::core::error::ValueError;
use crate::interfaces::ObjectStoreError;
use crate::interfaces::PublishError;
use crate::interfaces::TransferError;
use crate::interfaces::WarehouseError;

// ============================================================================
// SECTION: Table Failures
// ============================================================================

/// Failure of one table inside a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFailure {
    /// Table that failed, as `project.dataset.table`.
    pub table: String,
    /// Failure description.
    pub error: String,
}

/// Renders accumulated per-table failures.
fn describe_failures(failures: &[TableFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("{}: {}", failure.table, failure.error))
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// SECTION: Process Error
// ============================================================================

/// Errors returned by command handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    /// Sampling lock is present; the run was deliberately paused.
    #[error("sampling interrupted: lock object {0} is present")]
    Interrupted(String),
    /// Command type is not known.
    #[error("unsupported command type: {0}")]
    UnsupportedCommand(String),
    /// Command message could not be decoded.
    #[error(transparent)]
    Decode(DecodeError),
    /// Value object validation failed.
    #[error(transparent)]
    Value(#[from] ValueError),
    /// Object store failure.
    #[error(transparent)]
    ObjectStore(#[from] ObjectStoreError),
    /// Warehouse failure.
    #[error(transparent)]
    Warehouse(#[from] WarehouseError),
    /// Transfer service failure.
    #[error(transparent)]
    Transfer(#[from] TransferError),
    /// Message publishing failure.
    #[error(transparent)]
    Publish(#[from] PublishError),
    /// Dataset location could not be resolved.
    #[error("location lookup failed: {0}")]
    Location(String),
    /// One or more tables of a prefix failed.
    #[error("{} table(s) failed: {}", .0.len(), describe_failures(.0))]
    TableFailures(Vec<TableFailure>),
}

impl ProcessError {
    /// Returns true for the deliberate sampling-lock interruption.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted(_))
    }
}

impl From<DecodeError> for ProcessError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnsupportedType(kind) => Self::UnsupportedCommand(kind),
            other => Self::Decode(other),
        }
    }
}
