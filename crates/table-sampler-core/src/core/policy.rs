// crates/table-sampler-core/src/core/policy.rs
// ============================================================================
// Module: Table Sampler Policies
// Description: Sampling policies, their resolution cascade, and compliance.
// Purpose: Bound every sample request by the limit of its resolved policy.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Policy`] carries a `limit` and a `default_sample`. Policies compose by
//! field merge: a table-specific policy inherits only the parts it omits from
//! the bucket default, which in turn inherits from [`Policy::fallback`].
//!
//! [`compliant_sample`] turns a request into an absolute row count that
//! respects the policy limit:
//! - the limit takes the tightest of its count and percentage;
//! - the request takes the widest of its count and percentage;
//! - the result is the smaller of the two, expressed as a count only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::core::document::Document;
use crate::core::document::DocumentIssues;
use crate::core::document::object_fields;
use crate::core::document::read_document_field;
use crate::core::error::ValueError;
use crate::core::patch::Patch;
use crate::core::patch::PatchMode;
use crate::core::patch::is_vacant;
use crate::core::patch::merge_field;
use crate::core::patch::patch_field;
use crate::core::sample::Sample;
use crate::core::sample::SampleSpec;
use crate::core::size::SizeSpec;
use crate::core::table::TableReference;
use crate::core::table::TableSample;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Limit and default sample governing one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Maximum amount that may be sampled.
    #[serde(default)]
    pub limit: Option<SizeSpec>,
    /// Sample used when no specific request exists.
    #[serde(default)]
    pub default_sample: Option<Sample>,
}

impl Policy {
    /// Creates a policy from its parts.
    #[must_use]
    pub const fn new(limit: Option<SizeSpec>, default_sample: Option<Sample>) -> Self {
        Self {
            limit,
            default_sample,
        }
    }

    /// Returns the hardcoded minimal policy: one row, random.
    ///
    /// This is the last fallback of every resolution cascade so that any table
    /// resolves to a bounded policy even when storage objects are missing.
    #[must_use]
    pub const fn fallback() -> Self {
        Self {
            limit: Some(SizeSpec::from_count(1)),
            default_sample: Some(Sample::new(Some(SizeSpec::from_count(1)), Some(SampleSpec::random()))),
        }
    }

    /// Computes the compliant version of `sample` for a table of `row_count` rows.
    #[must_use]
    pub fn compliant_sample(&self, sample: &Sample, row_count: u64) -> Sample {
        compliant_sample(self, sample, row_count)
    }

    /// Returns the row limit for a table of `row_count` rows.
    #[must_use]
    pub fn count_limit(&self, row_count: u64) -> u64 {
        let Some(limit) = self.limit else {
            return row_count;
        };
        let mut bound = limit.count.unwrap_or(row_count);
        if let Some(percentage) = limit.percentage {
            bound = bound.min(percentage.floor_of(row_count));
        }
        bound
    }
}

impl Patch for Policy {
    const MODE: PatchMode = PatchMode::Merge;

    fn is_empty(&self) -> bool {
        is_vacant(self.limit.as_ref()) && is_vacant(self.default_sample.as_ref())
    }

    fn merge_fields(&self, fallback: &Self) -> Self {
        Self {
            limit: patch_field(self.limit.as_ref(), fallback.limit.as_ref()),
            default_sample: merge_field(
                self.default_sample.as_ref(),
                fallback.default_sample.as_ref(),
            ),
        }
    }
}

impl Document for Policy {
    fn parse_document(value: &Value, path: &str, issues: &mut DocumentIssues) -> Option<Self> {
        let fields = object_fields(value, path, issues)?;
        Some(Self {
            limit: read_document_field(fields, "limit", path, issues),
            default_sample: read_document_field(fields, "default_sample", path, issues),
        })
    }

    fn to_document(&self) -> Value {
        json!({
            "limit": self.limit.as_ref().map(Document::to_document),
            "default_sample": self.default_sample.as_ref().map(Document::to_document),
        })
    }
}

// ============================================================================
// SECTION: Compliance
// ============================================================================

/// Returns the amount requested by `sample` for a table of `row_count` rows.
#[must_use]
pub fn requested_count(sample: &Sample, row_count: u64) -> u64 {
    let Some(size) = sample.size else {
        return 0;
    };
    let mut amount = size.count.unwrap_or(0);
    if let Some(percentage) = size.percentage {
        amount = amount.max(percentage.ceil_of(row_count));
    }
    amount
}

/// Adjusts `sample` so that it respects `policy` for a table of `row_count` rows.
///
/// The result keeps the request's spec and carries an absolute count only.
/// The count never exceeds `row_count`, so an empty table yields zero rows.
#[must_use]
pub fn compliant_sample(policy: &Policy, sample: &Sample, row_count: u64) -> Sample {
    let count =
        policy.count_limit(row_count).min(requested_count(sample, row_count)).min(row_count);
    Sample::new(Some(SizeSpec::from_count(count)), sample.spec.clone())
}

// ============================================================================
// SECTION: Table Policy
// ============================================================================

/// Fully resolved policy scoped to one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePolicy {
    /// Table the policy applies to.
    pub table_reference: TableReference,
    /// Resolved policy.
    pub policy: Policy,
}

impl TablePolicy {
    /// Binds a policy to a table.
    #[must_use]
    pub const fn new(table_reference: TableReference, policy: Policy) -> Self {
        Self {
            table_reference,
            policy,
        }
    }

    /// Returns the policy's default sample bound to this table.
    #[must_use]
    pub fn default_table_sample(&self) -> TableSample {
        TableSample::new(
            self.table_reference.clone(),
            self.policy.default_sample.clone().unwrap_or_default(),
        )
    }

    /// Computes the compliant version of a table-bound request.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::TableMismatch`] when the request names another table.
    pub fn compliant_sample(
        &self,
        request: &TableSample,
        row_count: u64,
    ) -> Result<TableSample, ValueError> {
        if request.table_reference != self.table_reference {
            return Err(ValueError::TableMismatch {
                policy: self.table_reference.to_string(),
                sample: request.table_reference.to_string(),
            });
        }
        Ok(TableSample::new(
            self.table_reference.clone(),
            self.policy.compliant_sample(&request.sample, row_count),
        ))
    }
}
