// crates/table-sampler-broker/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared helpers for table-sampler-broker tests.
// Purpose: Seed file-backed buckets and build local pipelines.
// Dependencies: table-sampler-broker, table-sampler-core, tempfile
// ============================================================================

//! ## Overview
//! Provides a temp-dir backed object store and a pipeline wired to in-memory
//! warehouse and transfer collaborators.

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
    dead_code,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use serde_json::Value;
use table_sampler_broker::DEFAULT_QUEUE_CAPACITY;
use table_sampler_broker::FileObjectStore;
use table_sampler_broker::LocalPipeline;
use table_sampler_core::Command;
use table_sampler_core::CommandProcessor;
use table_sampler_core::FixedClock;
use table_sampler_core::InMemoryTransferService;
use table_sampler_core::InMemoryWarehouse;
use table_sampler_core::RecordingEventSink;
use table_sampler_core::SamplerSettings;
use table_sampler_core::StartCommand;
use table_sampler_core::TableReference;
use table_sampler_core::Timestamp;
use tempfile::TempDir;

/// Policy bucket used by fixtures.
pub const POLICY_BUCKET: &str = "policies";
/// Request bucket used by fixtures.
pub const REQUEST_BUCKET: &str = "requests";
/// Target project used by fixtures.
pub const TARGET_PROJECT: &str = "sample-project";

/// File store rooted in a temp dir that lives as long as the fixture.
pub struct StoreFixture {
    /// Keeps the directory alive.
    pub dir: TempDir,
    /// Store under test.
    pub store: FileObjectStore,
}

impl StoreFixture {
    /// Creates an empty store.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = FileObjectStore::new(dir.path());
        Self {
            dir,
            store,
        }
    }

    /// Writes a JSON document.
    pub fn put_json(&self, bucket: &str, path: &str, document: &Value) {
        self.store.write_object(bucket, path, &serde_json::to_vec(document).unwrap()).unwrap();
    }
}

/// Pipeline over a file store and in-memory warehouse.
pub struct PipelineFixture {
    /// Policy and request buckets.
    pub files: StoreFixture,
    /// Warehouse shared with the processor.
    pub warehouse: InMemoryWarehouse,
    /// Events recorded by the processor.
    pub events: RecordingEventSink,
    /// Pipeline under test.
    pub pipeline: LocalPipeline,
}

impl PipelineFixture {
    /// Builds a pipeline with fixture settings.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Builds a pipeline whose queue holds `capacity` messages.
    pub fn with_capacity(capacity: usize) -> Self {
        let files = StoreFixture::new();
        let warehouse = InMemoryWarehouse::new();
        let events = RecordingEventSink::new();
        let builder = CommandProcessor::builder()
            .settings(SamplerSettings::new(POLICY_BUCKET, REQUEST_BUCKET, TARGET_PROJECT))
            .object_store(files.store.clone())
            .warehouse(warehouse.clone())
            .transfers(InMemoryTransferService::new())
            .events(events.clone())
            .clock(FixedClock(ts(1_700_000_100)));
        let pipeline = LocalPipeline::with_capacity(builder, capacity).unwrap();
        Self {
            files,
            warehouse,
            events,
            pipeline,
        }
    }

    /// Registers a source table in `location`.
    pub fn add_source(&self, reference: &TableReference, location: &str, rows: u64) {
        self.warehouse
            .add_dataset(reference.project_id(), reference.dataset_id(), Some(location))
            .unwrap();
        self.warehouse.add_table(reference, rows).unwrap();
    }
}

/// Returns a timestamp.
pub fn ts(seconds: u64) -> Timestamp {
    Timestamp::new(seconds).unwrap()
}

/// Returns a table reference without location.
pub fn table(project: &str, dataset: &str, table: &str) -> TableReference {
    TableReference::new(project, dataset, table).unwrap()
}

/// Returns a START trigger.
pub fn start() -> Command {
    Command::Start(StartCommand {
        timestamp: ts(1_700_000_000),
    })
}
