// crates/table-sampler-core/tests/cross_location.rs
// ============================================================================
// Module: Cross-Location Sampling Tests
// Description: Staging tables and transfers between locations.
// Purpose: Validate the staging lifecycle around transfers.
// Dependencies: table-sampler-core, serde_json
// ============================================================================

//! ## Overview
//! Sources in one location sampled into targets in another are staged next
//! to the source and moved by the transfer service.

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

use serde_json::json;
use table_sampler_core::Command;
use table_sampler_core::InMemoryTransferService;
use table_sampler_core::InMemoryWarehouse;
use table_sampler_core::NoopEventSink;
use table_sampler_core::PolicyPrefixCommand;
use table_sampler_core::ProcessError;
use table_sampler_core::Sample;
use table_sampler_core::SampleDoneCommand;
use table_sampler_core::SampleSpec;
use table_sampler_core::SampleStartCommand;
use table_sampler_core::SamplerSettings;
use table_sampler_core::SizeSpec;
use table_sampler_core::TableReference;
use table_sampler_core::TableSample;
use table_sampler_core::TransferStatus;
use table_sampler_core::runtime::QueryExecutor;

use crate::common::Harness;
use crate::common::TARGET_PROJECT;
use crate::common::TRIGGER_SECS;
use crate::common::settings;
use crate::common::table;
use crate::common::ts;

fn us_settings() -> SamplerSettings {
    let mut settings = settings();
    settings.target_location = Some("US".to_string());
    settings
}

fn staging() -> TableReference {
    table(TARGET_PROJECT, "sales_staging", "orders")
}

fn target() -> TableReference {
    table(TARGET_PROJECT, "sales", "orders")
}

/// Seeds an EU source with policy and request, then samples its prefix.
fn sample_eu_source(harness: &Harness) -> Result<(), ProcessError> {
    let source = table("src", "sales", "orders");
    harness.add_source(&source, "EU", 1_000);
    harness.put_policy(&source.object_path(), &json!({"limit": {"count": 100}}));
    harness.put_request(&source.object_path(), &json!({"size": {"count": 100}}));
    harness.processor.process(&Command::SamplePolicyPrefix(PolicyPrefixCommand {
        timestamp: ts(TRIGGER_SECS),
        prefix: "src/sales/".to_string(),
    }))?;
    let start = harness.commands().into_iter().find(|command| matches!(command, Command::SampleStart(_)));
    harness.processor.process(&start.unwrap())
}

fn done_of(harness: &Harness) -> SampleDoneCommand {
    harness
        .commands()
        .into_iter()
        .find_map(|command| match command {
            Command::SampleDone(done) => Some(done),
            _ => None,
        })
        .unwrap()
}

/// Tests that a completed transfer drops its staging table.
#[test]
fn completed_transfer_drops_staging() {
    let harness = Harness::with(us_settings(), InMemoryTransferService::new());

    sample_eu_source(&harness).unwrap();

    let requests = harness.transfers.requests().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].display_name, "table-sampler:sample-project.sales.orders");
    assert_eq!(requests[0].source, staging().with_location(Some("EU")));
    assert_eq!(requests[0].target, target().with_location(Some("US")));
    let inserts = harness.warehouse.inserts().unwrap();
    assert_eq!(inserts[0].target, staging().with_location(Some("EU")));
    assert_eq!(harness.warehouse.table(&staging()).unwrap(), None);
    assert!(harness.warehouse.table(&target()).unwrap().is_some());
    assert_eq!(done_of(&harness).amount_inserted, Some(100));
}

/// Tests that a transfer still running keeps its staging table.
#[test]
fn running_transfer_keeps_staging() {
    let transfers = InMemoryTransferService::new().with_status(TransferStatus::Started);
    let harness = Harness::with(us_settings(), transfers);

    sample_eu_source(&harness).unwrap();

    assert_eq!(harness.warehouse.table(&staging()).unwrap().unwrap().rows, 100);
    assert_eq!(done_of(&harness).amount_inserted, Some(100));
}

/// Tests that a rejected transfer drops staging and reports the failure.
#[test]
fn rejected_transfer_fails_sample() {
    let harness = Harness::with(us_settings(), InMemoryTransferService::new().rejecting());

    let err = sample_eu_source(&harness).unwrap_err();

    assert!(matches!(err, ProcessError::Transfer(_)));
    assert_eq!(harness.warehouse.table(&staging()).unwrap(), None);
    let done = done_of(&harness);
    assert!(done.is_failure());
    assert_eq!(done.amount_inserted, None);
}

/// Tests that same-location samples skip staging.
#[test]
fn same_location_skips_transfer() {
    let mut settings = settings();
    settings.target_location = Some("eu".to_string());
    let harness = Harness::with(settings, InMemoryTransferService::new());

    sample_eu_source(&harness).unwrap();

    assert!(harness.transfers.requests().unwrap().is_empty());
    assert_eq!(harness.warehouse.table(&target()).unwrap().unwrap().rows, 100);
}

/// Tests executor outcomes when staging is configured to be kept.
#[test]
fn executor_keeps_staging_when_configured() {
    let warehouse = InMemoryWarehouse::new();
    let transfers = InMemoryTransferService::new();
    let mut settings = us_settings();
    settings.drop_staging_after_transfer = false;
    let source = table("src", "sales", "orders");
    warehouse.add_dataset("src", "sales", Some("EU")).unwrap();
    warehouse.add_table(&source, 10).unwrap();
    let executor = QueryExecutor::new(&warehouse, &transfers, &NoopEventSink, &settings);
    let command = SampleStartCommand {
        timestamp: ts(TRIGGER_SECS),
        sample_request: TableSample::new(
            source.clone(),
            Sample::new(Some(SizeSpec::from_count(4)), Some(SampleSpec::random())),
        ),
        target_table: executor.target_table(&source.with_location(Some("EU"))).unwrap(),
    };

    let outcome = executor.execute(&command).unwrap();

    assert_eq!(outcome.amount_inserted, 4);
    assert_eq!(outcome.staging_table, Some(staging().with_location(Some("EU"))));
    assert_eq!(outcome.transfer.unwrap().status, TransferStatus::Completed);
}

/// Tests that labels are normalized into the label alphabet.
#[test]
fn table_labels_are_normalized() {
    let warehouse = InMemoryWarehouse::new();
    let transfers = InMemoryTransferService::new();
    let settings = settings();
    let executor = QueryExecutor::new(&warehouse, &transfers, &NoopEventSink, &settings);
    let source = table("Src-Project", "d", "t").with_location(Some("asia:east 1"));

    let labels = executor.table_labels(&source);

    assert_eq!(labels.get("source_project").map(String::as_str), Some("src-project"));
    assert_eq!(labels.get("source_location").map(String::as_str), Some("asia_east_1"));
    assert_eq!(labels.get("managed_by").map(String::as_str), Some("table-sampler"));
}
