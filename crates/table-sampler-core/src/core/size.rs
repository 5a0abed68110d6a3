// crates/table-sampler-core/src/core/size.rs
// ============================================================================
// Module: Table Sampler Sizes
// Description: Count and percentage amounts for limits and sample requests.
// Purpose: Provide validated amounts and their row-count arithmetic.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`SizeSpec`] expresses an amount of rows as an absolute count, a
//! percentage of the table, or both. Percentages are validated to lie in
//! `(0, 100]`; counts are unsigned so negative amounts cannot be represented.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::core::document::Document;
use crate::core::document::DocumentIssues;
use crate::core::document::field_path;
use crate::core::document::object_fields;
use crate::core::document::read_field;
use crate::core::error::ValueError;
use crate::core::patch::Patch;

// ============================================================================
// SECTION: Percentage
// ============================================================================

/// Percentage of a table in `(0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Percentage(f64);

impl Percentage {
    /// Creates a validated percentage.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidPercentage`] outside `(0, 100]`.
    pub fn new(value: f64) -> Result<Self, ValueError> {
        if value.is_finite() && value > 0.0 && value <= 100.0 {
            Ok(Self(value))
        } else {
            Err(ValueError::InvalidPercentage(format!("{value} is outside (0, 100]")))
        }
    }

    /// Returns the raw percentage value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Returns `floor(rows * percentage / 100)`, never above `rows`.
    #[must_use]
    pub fn floor_of(self, rows: u64) -> u64 {
        float_to_rows(self.scaled(rows).floor()).min(rows)
    }

    /// Returns `ceil(rows * percentage / 100)`, never above `rows`.
    #[must_use]
    pub fn ceil_of(self, rows: u64) -> u64 {
        float_to_rows(self.scaled(rows).ceil()).min(rows)
    }

    /// Returns `rows * percentage / 100` as a float.
    #[allow(clippy::cast_precision_loss, reason = "Row counts fit f64 for sampling purposes.")]
    fn scaled(self, rows: u64) -> f64 {
        rows as f64 * self.0 / 100.0
    }
}

impl TryFrom<f64> for Percentage {
    type Error = ValueError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for f64 {
    fn from(value: Percentage) -> Self {
        value.0
    }
}

/// Converts a non-negative whole float into a row count.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Input is a floored or ceiled non-negative value; `as` saturates."
)]
fn float_to_rows(value: f64) -> u64 {
    if value <= 0.0 { 0 } else { value as u64 }
}

// ============================================================================
// SECTION: Size Spec
// ============================================================================

/// Amount of rows expressed as a count, a percentage, or both.
///
/// # Invariants
/// - Both fields absent means "unspecified" and only appears while merging.
/// - `count == 0` is representable for compliant output of empty tables;
///   documents must carry positive counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeSpec {
    /// Absolute row count.
    #[serde(default)]
    pub count: Option<u64>,
    /// Percentage of the table's rows.
    #[serde(default)]
    pub percentage: Option<Percentage>,
}

impl SizeSpec {
    /// Creates a size spec from optional parts.
    #[must_use]
    pub const fn new(count: Option<u64>, percentage: Option<Percentage>) -> Self {
        Self {
            count,
            percentage,
        }
    }

    /// Creates a count-only size spec.
    #[must_use]
    pub const fn from_count(count: u64) -> Self {
        Self::new(Some(count), None)
    }

    /// Creates a percentage-only size spec.
    #[must_use]
    pub const fn from_percentage(percentage: Percentage) -> Self {
        Self::new(None, Some(percentage))
    }
}

impl Patch for SizeSpec {
    fn is_empty(&self) -> bool {
        self.count.is_none() && self.percentage.is_none()
    }
}

impl Document for SizeSpec {
    fn parse_document(value: &Value, path: &str, issues: &mut DocumentIssues) -> Option<Self> {
        let fields = object_fields(value, path, issues)?;
        let count = read_field::<u64>(fields, "count", path, issues).and_then(|count| {
            if count == 0 {
                issues.push(field_path(path, "count"), "count must be a positive integer");
                None
            } else {
                Some(count)
            }
        });
        let percentage = read_field::<Percentage>(fields, "percentage", path, issues);
        Some(Self::new(count, percentage))
    }

    fn to_document(&self) -> Value {
        json!({
            "count": self.count,
            "percentage": self.percentage.map(Percentage::value),
        })
    }
}
