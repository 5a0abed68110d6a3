// crates/table-sampler-core/tests/query_plan.rs
// ============================================================================
// Module: Query Planning Tests
// Description: Statement shapes chosen for compliant samples.
// Purpose: Validate percent derivation and the view fallback.
// Dependencies: table-sampler-core, proptest
// ============================================================================

//! ## Overview
//! Random samples read a percentage of storage blocks unless the source is a
//! view or reports no physical rows; sorted samples always scan in order.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use proptest::prelude::*;
use table_sampler_core::ColumnName;
use table_sampler_core::Sample;
use table_sampler_core::SampleQuery;
use table_sampler_core::SampleSpec;
use table_sampler_core::SizeSpec;
use table_sampler_core::SortDirection;
use table_sampler_core::SortProperties;
use table_sampler_core::TableInfo;
use table_sampler_core::TableSample;
use table_sampler_core::plan_sample;
use table_sampler_core::tablesample_percent;

use crate::common::table;

fn request(count: u64, spec: SampleSpec) -> TableSample {
    TableSample::new(table("p", "d", "t"), Sample::new(Some(SizeSpec::from_count(count)), Some(spec)))
}

fn info(num_rows: u64, is_view: bool) -> TableInfo {
    TableInfo {
        num_rows,
        is_view,
        location: Some("EU".to_string()),
    }
}

/// Tests the percent derivation and its clamping.
#[test]
fn tablesample_percent_rounds_up_and_clamps() {
    assert_eq!(tablesample_percent(25, 1_000), 3);
    assert_eq!(tablesample_percent(1, 1_000_000), 1);
    assert_eq!(tablesample_percent(0, 1_000), 1);
    assert_eq!(tablesample_percent(5_000, 1_000), 100);
    assert_eq!(tablesample_percent(10, 0), 100);
}

/// Tests that random samples of physical tables use the sampling clause.
#[test]
fn random_sample_of_table_uses_tablesample() {
    let plan = plan_sample(&request(50, SampleSpec::random()), &info(1_000, false));
    assert_eq!(plan, SampleQuery::TableSample { percent: 5, limit: 50 });
}

/// Tests that views fall back to a randomly ordered full scan.
#[test]
fn random_sample_of_view_uses_random_order() {
    let plan = plan_sample(&request(50, SampleSpec::random()), &info(0, true));
    assert_eq!(plan, SampleQuery::RandomOrder { limit: 50 });
}

/// Tests that sorted samples order by their column.
#[test]
fn sorted_sample_orders_by_column() {
    let spec = SampleSpec::sorted(SortProperties::new(
        ColumnName::new("updated_at").unwrap(),
        SortDirection::Desc,
    ));
    let plan = plan_sample(&request(10, spec), &info(1_000, false));
    assert_eq!(
        plan,
        SampleQuery::Sorted {
            column: ColumnName::new("updated_at").unwrap(),
            direction: SortDirection::Desc,
            limit: 10,
        }
    );
}

/// Tests that a request without size plans a zero-row sample.
#[test]
fn missing_size_plans_zero_rows() {
    let request = TableSample::new(table("p", "d", "t"), Sample::default());
    assert_eq!(plan_sample(&request, &info(1_000, false)).limit(), 0);
}

proptest! {
    /// Tests that the derived percent is always a valid sampling percentage.
    #[test]
    fn percent_is_within_bounds(amount in 0_u64 .. u64::MAX / 200, rows in 0_u64 .. u64::MAX / 200) {
        let percent = tablesample_percent(amount, rows);
        prop_assert!((1 ..= 100).contains(&percent));
    }

    /// Tests that the sampled fraction covers the requested amount.
    #[test]
    fn percent_covers_amount(rows in 1_u64 .. 10_000_000, amount in 0_u64 .. 10_000_000) {
        prop_assume!(amount <= rows);
        let percent = u128::from(tablesample_percent(amount, rows));
        prop_assert!(percent * u128::from(rows) >= u128::from(amount) * 100);
    }
}
