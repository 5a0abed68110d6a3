// crates/table-sampler-core/src/core/error.rs
// ============================================================================
// Module: Table Sampler Value Errors
// Description: Validation errors raised while constructing value objects.
// Purpose: Give every fatal input violation a distinct, typed error.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Value objects validate on construction. Violations are fatal to the unit of
//! work that produced them and are never silently coerced.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Value Errors
// ============================================================================

/// Validation failures for sampler value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Count is not a valid amount.
    #[error("invalid count: {0}")]
    InvalidCount(String),
    /// Percentage falls outside (0, 100].
    #[error("invalid percentage: {0}")]
    InvalidPercentage(String),
    /// Identifier is empty or contains forbidden characters.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    /// Enum value is not one of the known variants.
    #[error("invalid enum value: {0}")]
    InvalidEnum(String),
    /// Sorted sample spec is missing its sort properties.
    #[error("sorted sample spec requires properties")]
    MissingSortProperties,
    /// Table reference does not match the policy scope.
    #[error("table reference mismatch (policy {policy}, sample {sample})")]
    TableMismatch {
        /// Table the policy is scoped to.
        policy: String,
        /// Table named by the sample request.
        sample: String,
    },
    /// Command timestamp is not a positive integer.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
