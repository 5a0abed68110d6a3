// crates/table-sampler-core/tests/processor.rs
// ============================================================================
// Module: Command Processor Tests
// Description: End-to-end workflow scenarios over in-memory collaborators.
// Purpose: Validate the command state machine and its failure reporting.
// Dependencies: table-sampler-core, serde_json
// ============================================================================

//! ## Overview
//! Each scenario seeds storage and the warehouse, feeds commands to the
//! processor and inspects published messages, warehouse state and events.

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
use table_sampler_core::BuildError;
use table_sampler_core::Command;
use table_sampler_core::CommandProcessor;
use table_sampler_core::CommandType;
use table_sampler_core::InMemoryObjectStore;
use table_sampler_core::InMemoryWarehouse;
use table_sampler_core::Labels;
use table_sampler_core::PolicyPrefixCommand;
use table_sampler_core::ProcessError;
use table_sampler_core::RecordingPublisher;
use table_sampler_core::Sample;
use table_sampler_core::SampleDoneCommand;
use table_sampler_core::SampleQuery;
use table_sampler_core::SampleSpec;
use table_sampler_core::SampleStartCommand;
use table_sampler_core::SizeSpec;
use table_sampler_core::StartCommand;
use table_sampler_core::TableSample;
use table_sampler_core::TransferConfig;
use table_sampler_core::TransferService;
use table_sampler_core::Warehouse;
use table_sampler_core::core::event::EVENT_SAMPLING_INTERRUPTED;
use table_sampler_core::core::event::EVENT_TABLE_FAILED;
use table_sampler_core::runtime::executor::MANAGED_LABEL_KEY;
use table_sampler_core::runtime::executor::MANAGED_LABEL_VALUE;

use crate::common::Harness;
use crate::common::TARGET_PROJECT;
use crate::common::TRIGGER_SECS;
use crate::common::table;
use crate::common::ts;

fn start() -> Command {
    Command::Start(StartCommand { timestamp: ts(TRIGGER_SECS) })
}

fn prefix(prefix: &str) -> Command {
    Command::SamplePolicyPrefix(PolicyPrefixCommand {
        timestamp: ts(TRIGGER_SECS),
        prefix: prefix.to_string(),
    })
}

fn sample_starts(commands: &[Command]) -> Vec<&SampleStartCommand> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::SampleStart(start) => Some(start),
            _ => None,
        })
        .collect()
}

fn sample_dones(commands: &[Command]) -> Vec<&SampleDoneCommand> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::SampleDone(done) => Some(done),
            _ => None,
        })
        .collect()
}

/// Processes `trigger` and every command it transitively publishes.
fn run_to_completion(harness: &Harness, trigger: &Command) {
    harness.processor.process(trigger).unwrap();
    let mut processed = 0;
    loop {
        let commands = harness.commands();
        if processed == commands.len() {
            break;
        }
        for command in &commands[processed ..] {
            harness.processor.process(command).unwrap();
        }
        processed = commands.len();
    }
}

// ============================================================================
// SECTION: START
// ============================================================================

/// Tests that the sampling lock stops a run before anything is listed.
#[test]
fn sampling_lock_interrupts_start() {
    let harness = Harness::new();
    harness.put_policy("p/d/a.json", &json!({}));
    harness.store.put_object("requests", "sampling.lock", b"paused".to_vec()).unwrap();

    let err = harness.processor.process(&start()).unwrap_err();

    assert!(err.is_interrupted());
    assert_eq!(harness.store.list_calls(), 0);
    assert!(harness.commands().is_empty());
    assert_eq!(harness.events.events_named(EVENT_SAMPLING_INTERRUPTED).len(), 1);
    let errors = harness.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].command["type"], "START");
}

/// Tests that START emits one prefix command per dataset prefix.
#[test]
fn start_fans_out_dataset_prefixes() {
    let harness = Harness::new();
    for path in ["p/d1/a.json", "p/d1/b.json", "p/d2/c.json", "default_policy.json"] {
        harness.put_policy(path, &json!({}));
    }

    harness.processor.process(&start()).unwrap();

    assert_eq!(harness.commands(), vec![prefix("p/d1/"), prefix("p/d2/")]);
}

/// Tests that START removes the sample tables and transfers of a previous run.
#[test]
fn start_cleans_up_previous_run() {
    let harness = Harness::new();
    let source = table("src", "sales", "orders");
    harness.add_source(&source, "EU", 10);
    let stale = table(TARGET_PROJECT, "sales", "orders");
    let unmanaged = table(TARGET_PROJECT, "manual", "orders");
    harness.warehouse.add_dataset(TARGET_PROJECT, "sales", Some("EU")).unwrap();
    harness.warehouse.add_dataset(TARGET_PROJECT, "manual", Some("EU")).unwrap();
    let managed = Labels::from([(MANAGED_LABEL_KEY.to_string(), MANAGED_LABEL_VALUE.to_string())]);
    harness.warehouse.create_table_like(&source, &stale, &managed, true).unwrap();
    harness.warehouse.create_table_like(&source, &unmanaged, &Labels::new(), true).unwrap();
    harness
        .transfers
        .add_config(TARGET_PROJECT, TransferConfig {
            config_id: "cfg-1".to_string(),
            display_name: "table-sampler:sample-project.sales.orders".to_string(),
        })
        .unwrap();
    harness
        .transfers
        .add_config(TARGET_PROJECT, TransferConfig {
            config_id: "cfg-2".to_string(),
            display_name: "nightly export".to_string(),
        })
        .unwrap();

    harness.processor.process(&start()).unwrap();

    assert_eq!(harness.warehouse.table(&stale).unwrap(), None);
    assert!(!harness.warehouse.has_dataset(TARGET_PROJECT, "sales").unwrap());
    assert!(harness.warehouse.table(&unmanaged).unwrap().is_some());
    assert!(harness.warehouse.has_dataset(TARGET_PROJECT, "manual").unwrap());
    let remaining = harness.transfers.list_transfer_configs(TARGET_PROJECT).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].config_id, "cfg-2");
}

// ============================================================================
// SECTION: SAMPLE_POLICY_PREFIX
// ============================================================================

/// Tests that a prefix emits compliant sample starts for its tables.
#[test]
fn prefix_emits_compliant_sample_starts() {
    let harness = Harness::new();
    let source = table("src", "sales", "orders");
    harness.add_source(&source, "EU", 1_000);
    harness.put_policy("default_policy.json", &json!({"limit": {"count": 100}}));
    harness.put_policy("src/sales/orders.json", &json!({}));
    harness.put_request("src/sales/orders.json", &json!({"size": {"percentage": 50}}));

    harness.processor.process(&prefix("src/sales/")).unwrap();

    let commands = harness.commands();
    let starts = sample_starts(&commands);
    assert_eq!(starts.len(), 1);
    let start = starts[0];
    assert_eq!(start.timestamp, ts(TRIGGER_SECS));
    assert_eq!(start.sample_request.table_reference, source.with_location(Some("EU")));
    assert_eq!(start.sample_request.sample.size, Some(SizeSpec::from_count(100)));
    assert_eq!(start.target_table, table(TARGET_PROJECT, "sales", "orders").with_location(Some("EU")));
}

/// Tests that one failing table does not stop its siblings.
#[test]
fn failing_table_is_isolated() {
    let harness = Harness::new();
    for name in ["a", "b", "c"] {
        let source = table("p", "d", name);
        harness.add_source(&source, "EU", 100);
        harness.put_policy(&source.object_path(), &json!({}));
    }
    harness.warehouse.fail_row_count(&table("p", "d", "b")).unwrap();

    let err = harness.processor.process(&prefix("p/d/")).unwrap_err();

    let ProcessError::TableFailures(failures) = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].table, "p.d.b");
    let commands = harness.commands();
    let started: Vec<_> = sample_starts(&commands)
        .into_iter()
        .map(|start| start.sample_request.table_reference.table_id().to_string())
        .collect();
    assert_eq!(started, vec!["a", "c"]);
    assert_eq!(harness.events.events_named(EVENT_TABLE_FAILED).len(), 1);
    assert_eq!(harness.errors().len(), 1);
}

// ============================================================================
// SECTION: SAMPLE_START
// ============================================================================

/// Tests the whole pipeline from trigger to done report.
#[test]
fn pipeline_samples_every_table() {
    let harness = Harness::new();
    let orders = table("src", "sales", "orders");
    let users = table("src", "crm", "users");
    harness.add_source(&orders, "EU", 1_000);
    harness.add_source(&users, "EU", 40);
    harness.put_policy("default_policy.json", &json!({"limit": {"count": 100}}));
    harness.put_policy(&orders.object_path(), &json!({}));
    harness.put_policy(
        &users.object_path(),
        &json!({"default_sample": {"size": {"percentage": 50}}}),
    );
    harness.put_request(&orders.object_path(), &json!({"size": {"count": 250}}));

    run_to_completion(&harness, &start());

    let commands = harness.commands();
    let dones = sample_dones(&commands);
    assert_eq!(dones.len(), 2);
    for done in &dones {
        assert!(!done.is_failure());
        assert_eq!(done.timestamp, ts(TRIGGER_SECS));
    }
    let orders_target = table(TARGET_PROJECT, "sales", "orders");
    let users_target = table(TARGET_PROJECT, "crm", "users");
    let orders_entry = harness.warehouse.table(&orders_target).unwrap().unwrap();
    assert_eq!(orders_entry.rows, 100);
    assert_eq!(orders_entry.labels.get(MANAGED_LABEL_KEY).map(String::as_str), Some(MANAGED_LABEL_VALUE));
    assert_eq!(orders_entry.labels.get("source_location").map(String::as_str), Some("eu"));
    assert_eq!(harness.warehouse.table(&users_target).unwrap().unwrap().rows, 20);
    assert!(harness.errors().is_empty());
}

/// Tests that random samples of views scan with random ordering.
#[test]
fn view_sample_uses_random_order() {
    let harness = Harness::new();
    let view = table("src", "reports", "daily");
    harness.warehouse.add_dataset("src", "reports", Some("EU")).unwrap();
    harness.warehouse.add_view(&view, 500).unwrap();
    harness.put_policy("default_policy.json", &json!({"limit": {"count": 1000}}));
    harness.put_policy(&view.object_path(), &json!({}));
    harness.put_request(&view.object_path(), &json!({"size": {"count": 50}, "spec": {"type": "random"}}));

    run_to_completion(&harness, &prefix("src/reports/"));

    let inserts = harness.warehouse.inserts().unwrap();
    assert_eq!(inserts.len(), 1);
    assert_eq!(inserts[0].query, SampleQuery::RandomOrder { limit: 50 });
    let commands = harness.commands();
    assert_eq!(sample_dones(&commands)[0].amount_inserted, Some(50));
}

/// Tests that an empty table produces an empty target and no insert.
#[test]
fn empty_table_creates_empty_target() {
    let harness = Harness::new();
    let source = table("src", "sales", "empty");
    harness.add_source(&source, "EU", 0);
    harness.put_policy(&source.object_path(), &json!({"limit": {"count": 10}}));
    harness.put_request(&source.object_path(), &json!({"size": {"count": 10}}));

    run_to_completion(&harness, &prefix("src/sales/"));

    assert!(harness.warehouse.inserts().unwrap().is_empty());
    let target = table(TARGET_PROJECT, "sales", "empty");
    assert_eq!(harness.warehouse.table(&target).unwrap().unwrap().rows, 0);
    let commands = harness.commands();
    assert_eq!(sample_dones(&commands)[0].amount_inserted, Some(0));
}

/// Tests that a failed sample still reports SAMPLE_DONE with its error.
#[test]
fn failed_sample_reports_done_with_error() {
    let harness = Harness::new();
    let command = Command::SampleStart(SampleStartCommand {
        timestamp: ts(TRIGGER_SECS),
        sample_request: TableSample::new(
            table("src", "sales", "missing"),
            Sample::new(Some(SizeSpec::from_count(5)), Some(SampleSpec::random())),
        ),
        target_table: table(TARGET_PROJECT, "sales", "missing"),
    });

    let err = harness.processor.process(&command).unwrap_err();

    assert!(matches!(err, ProcessError::Warehouse(_)));
    let commands = harness.commands();
    let dones = sample_dones(&commands);
    assert_eq!(dones.len(), 1);
    assert_eq!(dones[0].error_message.as_deref(), Some(err.to_string().as_str()));
    assert_eq!(dones[0].start_timestamp, ts(common::CLOCK_SECS));
    let errors = harness.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].command, command.to_message().unwrap());
}

// ============================================================================
// SECTION: Message Handling
// ============================================================================

/// Tests that unknown command types are rejected and reported raw.
#[test]
fn unknown_command_is_reported() {
    let harness = Harness::new();
    let raw = json!({"type": "SAMPLE_EVERYTHING", "timestamp": 1});

    let err = harness.processor.process_message(&raw).unwrap_err();

    assert_eq!(err, ProcessError::UnsupportedCommand("SAMPLE_EVERYTHING".to_string()));
    let errors = harness.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].command, raw);
    assert!(harness.commands().is_empty());
}

/// Tests that SAMPLE_DONE is terminal.
#[test]
fn sample_done_publishes_nothing() {
    let harness = Harness::new();
    let start = SampleStartCommand {
        timestamp: ts(TRIGGER_SECS),
        sample_request: TableSample::new(table("src", "d", "t"), Sample::default()),
        target_table: table(TARGET_PROJECT, "d", "t"),
    };
    let done = SampleDoneCommand::from_start(&start, ts(1), ts(2), Ok(0));
    harness.processor.process(&Command::SampleDone(done)).unwrap();
    assert!(harness.publisher.messages().unwrap().is_empty());
    assert!(
        harness
            .events
            .events()
            .iter()
            .any(|event| event.command == Some(CommandType::SampleDone.as_str()))
    );
}

/// Tests that the builder requires its collaborators.
#[test]
fn builder_requires_collaborators() {
    let result = CommandProcessor::builder()
        .settings(common::settings())
        .warehouse(InMemoryWarehouse::new())
        .publisher(RecordingPublisher::new())
        .build();
    assert!(matches!(result, Err(BuildError::MissingCollaborator("object store"))));

    let result = CommandProcessor::builder()
        .settings(common::settings())
        .object_store(InMemoryObjectStore::new())
        .warehouse(InMemoryWarehouse::new())
        .publisher(RecordingPublisher::new())
        .build();
    assert!(matches!(result, Err(BuildError::MissingCollaborator("transfer service"))));
}
