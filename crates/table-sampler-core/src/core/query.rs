// crates/table-sampler-core/src/core/query.rs
// ============================================================================
// Module: Table Sampler Query Plans
// Description: Typed sampling plans handed to the warehouse collaborator.
// Purpose: Decide between probabilistic, random-order and sorted sampling.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The warehouse renders and runs the physical statement; this module only
//! decides which statement shape to use:
//! - random samples on physical tables use a probabilistic clause with a
//!   percent derived from the wanted amount, clamped to `[1, 100]`;
//! - random samples on views (or tables reporting zero physical rows) fall
//!   back to a full scan with random ordering;
//! - sorted samples scan ordered by a validated column.
//!
//! Every plan carries an explicit row limit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::sample::ColumnName;
use crate::core::sample::SampleKind;
use crate::core::sample::SortDirection;
use crate::core::sample::SortProperties;
use crate::core::table::TableSample;

// ============================================================================
// SECTION: Table Info
// ============================================================================

/// Physical metadata of a source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Physical row count; zero for views.
    pub num_rows: u64,
    /// True when the table is a view.
    pub is_view: bool,
    /// Physical location of the table.
    pub location: Option<String>,
}

// ============================================================================
// SECTION: Sample Query
// ============================================================================

/// Statement shape for one sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SampleQuery {
    /// Probabilistic sampling clause followed by a limit.
    TableSample {
        /// Percent of storage blocks to read, in `[1, 100]`.
        percent: u8,
        /// Maximum rows inserted.
        limit: u64,
    },
    /// Full scan ordered randomly.
    RandomOrder {
        /// Maximum rows inserted.
        limit: u64,
    },
    /// Full scan ordered by a column.
    Sorted {
        /// Column to order by.
        column: ColumnName,
        /// Ordering direction.
        direction: SortDirection,
        /// Maximum rows inserted.
        limit: u64,
    },
}

impl SampleQuery {
    /// Returns the row limit of the plan.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        match self {
            Self::TableSample {
                limit, ..
            }
            | Self::RandomOrder {
                limit,
            }
            | Self::Sorted {
                limit, ..
            } => *limit,
        }
    }
}

// ============================================================================
// SECTION: Planning
// ============================================================================

/// Returns `ceil(amount / rows * 100)` clamped to `[1, 100]`.
///
/// An empty table yields 100.
#[must_use]
pub fn tablesample_percent(amount: u64, rows: u64) -> u8 {
    if rows == 0 {
        return 100;
    }
    let percent = (u128::from(amount) * 100).div_ceil(u128::from(rows)).clamp(1, 100);
    u8::try_from(percent).unwrap_or(100)
}

/// Plans a random sample of `amount` rows.
#[must_use]
pub fn plan_random(amount: u64, info: &TableInfo) -> SampleQuery {
    if info.is_view || info.num_rows == 0 {
        return SampleQuery::RandomOrder {
            limit: amount,
        };
    }
    SampleQuery::TableSample {
        percent: tablesample_percent(amount, info.num_rows),
        limit: amount,
    }
}

/// Plans a sorted sample of `amount` rows.
#[must_use]
pub fn plan_sorted(amount: u64, properties: &SortProperties) -> SampleQuery {
    SampleQuery::Sorted {
        column: properties.by.clone(),
        direction: properties.direction,
        limit: amount,
    }
}

/// Plans the statement for a compliant table sample.
///
/// Sorted specs always carry properties; a sorted kind without them is
/// planned as a random sample.
#[must_use]
pub fn plan_sample(request: &TableSample, info: &TableInfo) -> SampleQuery {
    let amount = request.sample.count();
    let sort = request.sample.spec.as_ref().and_then(|spec| spec.properties());
    match (request.sample.kind(), sort) {
        (SampleKind::Sorted, Some(properties)) => plan_sorted(amount, properties),
        _ => plan_random(amount, info),
    }
}
