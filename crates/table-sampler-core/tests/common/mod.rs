// crates/table-sampler-core/tests/common/mod.rs
// ============================================================================
// Module: Table Sampler Test Fixtures
// Description: Shared builders for in-memory sampler scenarios.
// Purpose: Wire a processor to inspectable in-memory collaborators.
// Dependencies: table-sampler-core, serde_json
// ============================================================================

//! ## Overview
//! Fixtures keep a handle on every in-memory collaborator so tests can seed
//! storage and the warehouse, then assert on published messages and events.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

use serde_json::Value;
use table_sampler_core::Command;
use table_sampler_core::CommandProcessor;
use table_sampler_core::ErrorRecord;
use table_sampler_core::FixedClock;
use table_sampler_core::InMemoryObjectStore;
use table_sampler_core::InMemoryTransferService;
use table_sampler_core::InMemoryWarehouse;
use table_sampler_core::RecordingEventSink;
use table_sampler_core::RecordingPublisher;
use table_sampler_core::SamplerSettings;
use table_sampler_core::TableReference;
use table_sampler_core::Timestamp;

/// Policy bucket used by fixtures.
pub const POLICY_BUCKET: &str = "policies";
/// Request bucket used by fixtures.
pub const REQUEST_BUCKET: &str = "requests";
/// Target project used by fixtures.
pub const TARGET_PROJECT: &str = "sample-project";
/// Trigger time used by fixtures.
pub const TRIGGER_SECS: u64 = 1_700_000_000;
/// Clock time used by fixtures.
pub const CLOCK_SECS: u64 = 1_700_000_100;

/// Returns a timestamp.
pub fn ts(seconds: u64) -> Timestamp {
    Timestamp::new(seconds).unwrap()
}

/// Returns a table reference without location.
pub fn table(project: &str, dataset: &str, table: &str) -> TableReference {
    TableReference::new(project, dataset, table).unwrap()
}

/// Returns fixture settings.
pub fn settings() -> SamplerSettings {
    SamplerSettings::new(POLICY_BUCKET, REQUEST_BUCKET, TARGET_PROJECT)
}

/// Processor wired to in-memory collaborators.
pub struct Harness {
    /// Policy and request storage.
    pub store: InMemoryObjectStore,
    /// Warehouse.
    pub warehouse: InMemoryWarehouse,
    /// Transfer service.
    pub transfers: InMemoryTransferService,
    /// Publisher.
    pub publisher: RecordingPublisher,
    /// Event sink.
    pub events: RecordingEventSink,
    /// Processor under test.
    pub processor: CommandProcessor,
}

impl Harness {
    /// Builds a harness with fixture settings.
    pub fn new() -> Self {
        Self::with(settings(), InMemoryTransferService::new())
    }

    /// Builds a harness with custom settings and transfer service.
    pub fn with(settings: SamplerSettings, transfers: InMemoryTransferService) -> Self {
        let store = InMemoryObjectStore::new();
        let warehouse = InMemoryWarehouse::new();
        let publisher = RecordingPublisher::new();
        let events = RecordingEventSink::new();
        let processor = CommandProcessor::builder()
            .settings(settings)
            .object_store(store.clone())
            .warehouse(warehouse.clone())
            .transfers(transfers.clone())
            .publisher(publisher.clone())
            .events(events.clone())
            .clock(FixedClock(ts(CLOCK_SECS)))
            .build()
            .unwrap();
        Self {
            store,
            warehouse,
            transfers,
            publisher,
            events,
            processor,
        }
    }

    /// Stores a policy document.
    pub fn put_policy(&self, path: &str, document: &Value) {
        self.store.put_json(POLICY_BUCKET, path, document).unwrap();
    }

    /// Stores a sample request document.
    pub fn put_request(&self, path: &str, document: &Value) {
        self.store.put_json(REQUEST_BUCKET, path, document).unwrap();
    }

    /// Registers a source table in `location`.
    pub fn add_source(&self, reference: &TableReference, location: &str, rows: u64) {
        self.warehouse
            .add_dataset(reference.project_id(), reference.dataset_id(), Some(location))
            .unwrap();
        self.warehouse.add_table(reference, rows).unwrap();
    }

    /// Returns the commands published to the command topic.
    pub fn commands(&self) -> Vec<Command> {
        let topic = self.processor.settings().command_topic.clone();
        self.publisher.commands_on(&topic).unwrap()
    }

    /// Returns the error records published to the error topic.
    pub fn errors(&self) -> Vec<ErrorRecord> {
        let topic = self.processor.settings().error_topic.clone();
        self.publisher
            .messages_on(&topic)
            .unwrap()
            .into_iter()
            .map(|message| serde_json::from_value(message).unwrap())
            .collect()
    }
}
