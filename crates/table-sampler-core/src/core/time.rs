// crates/table-sampler-core/src/core/time.rs
// ============================================================================
// Module: Table Sampler Time Model
// Description: Positive timestamps carried by every command.
// Purpose: Propagate the trigger time through the workflow deterministically.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every command carries the timestamp of the trigger that started its
//! workflow. Handlers propagate it unchanged; wall-clock time is only read
//! through the [`crate::interfaces::Clock`] seam.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::ValueError;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Unix epoch seconds, strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Timestamp(u64);

impl Timestamp {
    /// Smallest valid timestamp.
    pub const MIN: Self = Self(1);

    /// Creates a validated timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidTimestamp`] for zero.
    pub fn new(seconds: u64) -> Result<Self, ValueError> {
        if seconds == 0 {
            return Err(ValueError::InvalidTimestamp("timestamp must be positive".to_string()));
        }
        Ok(Self(seconds))
    }

    /// Returns the epoch seconds.
    #[must_use]
    pub const fn as_secs(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for Timestamp {
    type Error = ValueError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Timestamp> for u64 {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
