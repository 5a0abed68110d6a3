// crates/table-sampler-core/tests/commands.rs
// ============================================================================
// Module: Command Envelope Tests
// Description: Wire envelope encoding and decoding.
// Purpose: Validate the tagged command format and its rejection paths.
// Dependencies: table-sampler-core, serde_json
// ============================================================================

//! ## Overview
//! Commands travel as JSON objects tagged by `type`; these tests pin the wire
//! shape and the decode failures.

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
use table_sampler_core::CommandType;
use table_sampler_core::DecodeError;
use table_sampler_core::Sample;
use table_sampler_core::SampleDoneCommand;
use table_sampler_core::SampleSpec;
use table_sampler_core::SampleStartCommand;
use table_sampler_core::SizeSpec;
use table_sampler_core::StartCommand;
use table_sampler_core::TableSample;

use crate::common::table;
use crate::common::ts;

fn sample_start() -> SampleStartCommand {
    SampleStartCommand {
        timestamp: ts(1_700_000_000),
        sample_request: TableSample::new(
            table("src", "sales", "orders").with_location(Some("EU")),
            Sample::new(Some(SizeSpec::from_count(25)), Some(SampleSpec::random())),
        ),
        target_table: table("dst", "sales", "orders").with_location(Some("EU")),
    }
}

/// Tests that a start trigger decodes from its minimal envelope.
#[test]
fn start_trigger_decodes() {
    let command = Command::decode(&json!({"type": "START", "timestamp": 42})).unwrap();
    assert_eq!(command, Command::Start(StartCommand { timestamp: ts(42) }));
    assert_eq!(command.command_type(), CommandType::Start);
    assert_eq!(command.table(), None);
}

/// Tests the wire shape of a sample start command.
#[test]
fn sample_start_wire_shape() {
    let message = Command::from(sample_start()).to_message().unwrap();
    assert_eq!(message["type"], "SAMPLE_START");
    assert_eq!(message["timestamp"], 1_700_000_000);
    assert_eq!(message["sample_request"]["table_reference"]["project_id"], "src");
    assert_eq!(message["sample_request"]["table_reference"]["location"], "EU");
    assert_eq!(message["sample_request"]["sample"]["size"]["count"], 25);
    assert_eq!(message["sample_request"]["sample"]["spec"]["type"], "random");
    assert_eq!(message["target_table"]["project_id"], "dst");

    let decoded = Command::decode(&message).unwrap();
    assert_eq!(decoded, Command::SampleStart(sample_start()));
}

/// Tests that the done report carries the start payload and its outcome.
#[test]
fn sample_done_reports_outcome() {
    let start = sample_start();
    let done = SampleDoneCommand::from_start(&start, ts(10), ts(12), Ok(25));
    assert_eq!(done.timestamp, start.timestamp);
    assert_eq!(done.amount_inserted, Some(25));
    assert!(!done.is_failure());

    let failed = SampleDoneCommand::from_start(&start, ts(10), ts(12), Err("boom".to_string()));
    assert!(failed.is_failure());
    assert_eq!(failed.amount_inserted, None);
    let message = Command::from(failed).to_message().unwrap();
    assert_eq!(message["error_message"], "boom");
    assert!(message["amount_inserted"].is_null());
}

/// Tests that unknown and missing types are distinguished.
#[test]
fn unknown_types_are_rejected() {
    let err = Command::decode(&json!({"type": "SAMPLE_EVERYTHING", "timestamp": 1})).unwrap_err();
    assert_eq!(err, DecodeError::UnsupportedType("SAMPLE_EVERYTHING".to_string()));

    let err = Command::decode(&json!({"timestamp": 1})).unwrap_err();
    assert_eq!(err, DecodeError::MissingType);
}

/// Tests that a zero timestamp is rejected.
#[test]
fn zero_timestamp_is_rejected() {
    let err = Command::decode(&json!({"type": "START", "timestamp": 0})).unwrap_err();
    assert!(matches!(err, DecodeError::Invalid(message) if message.starts_with("START")));
}

/// Tests that invalid table identifiers are rejected on decode.
#[test]
fn invalid_table_identifier_is_rejected() {
    let mut message = Command::from(sample_start()).to_message().unwrap();
    message["target_table"]["dataset_id"] = json!("bad.dataset");
    assert!(matches!(Command::decode(&message), Err(DecodeError::Invalid(_))));
}

/// Tests that raw bytes decode and invalid JSON is reported.
#[test]
fn raw_bytes_decode() {
    let command = Command::decode_bytes(br#"{"type":"SAMPLE_POLICY_PREFIX","timestamp":5,"prefix":"p/d/"}"#)
        .unwrap();
    assert_eq!(command.command_type(), CommandType::SamplePolicyPrefix);
    assert!(matches!(Command::decode_bytes(b"not json"), Err(DecodeError::Invalid(_))));
}

/// Tests that every command type round-trips its wire name.
#[test]
fn wire_names_resolve() {
    for kind in CommandType::ALL {
        assert_eq!(CommandType::from_wire(kind.as_str()), Some(kind));
    }
    assert_eq!(CommandType::from_wire("start"), None);
}
