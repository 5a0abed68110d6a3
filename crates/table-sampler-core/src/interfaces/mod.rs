// crates/table-sampler-core/src/interfaces/mod.rs
// ============================================================================
// Module: Table Sampler Interfaces
// Description: Collaborator contracts for storage, warehouse, transfer and messaging.
// Purpose: Keep the sampler runtime independent of any specific cloud backend.
// Dependencies: crate::core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The runtime talks to the outside world only through these traits. Every
//! trait is `Send + Sync` so one set of collaborators can be shared across
//! handler invocations. Implementations must fail closed: an operation that
//! cannot be completed returns an error rather than a partial result.
//!
//! Calls are synchronous from the point of view of one command invocation and
//! are never retried here; retries belong to the message transport.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::core::event::SamplerEvent;
use crate::core::query::SampleQuery;
use crate::core::query::TableInfo;
use crate::core::table::TableReference;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Table labels keyed by label name.
pub type Labels = BTreeMap<String, String>;

// ============================================================================
// SECTION: Object Store
// ============================================================================

/// Object store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectStoreError {
    /// Object store I/O error.
    #[error("object store io error: {0}")]
    Io(String),
    /// Object path or bucket is invalid.
    #[error("object store invalid path: {0}")]
    Invalid(String),
    /// Object exceeds the configured size limit.
    #[error("object store object too large: {0}")]
    TooLarge(String),
    /// Object store reported an error.
    #[error("object store error: {0}")]
    Store(String),
}

/// Lazily produced object paths.
pub type ObjectListing<'a> = Box<dyn Iterator<Item = Result<String, ObjectStoreError>> + 'a>;

/// Hierarchical key-value store holding policy and request documents.
pub trait ObjectStore: Send + Sync {
    /// Lists object paths in `bucket`, optionally restricted to `prefix`.
    ///
    /// Listings are recursive and produced lazily; callers filter the paths.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the listing cannot be started.
    fn list_objects<'a>(
        &'a self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> Result<ObjectListing<'a>, ObjectStoreError>;

    /// Reads an object, returning `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the object exists but cannot be read.
    fn read_object(&self, bucket: &str, path: &str) -> Result<Option<Vec<u8>>, ObjectStoreError>;

    /// Returns true when the object exists.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when existence cannot be determined.
    fn object_exists(&self, bucket: &str, path: &str) -> Result<bool, ObjectStoreError> {
        Ok(self.read_object(bucket, path)?.is_some())
    }
}

// ============================================================================
// SECTION: Warehouse
// ============================================================================

/// Warehouse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WarehouseError {
    /// Table or dataset does not exist.
    #[error("warehouse object not found: {0}")]
    NotFound(String),
    /// Metadata lookup failed.
    #[error("warehouse metadata error: {0}")]
    Metadata(String),
    /// Query execution failed.
    #[error("warehouse query error: {0}")]
    Query(String),
    /// Warehouse reported an error.
    #[error("warehouse error: {0}")]
    Warehouse(String),
}

/// Query engine and metadata service holding the sampled tables.
pub trait Warehouse: Send + Sync {
    /// Returns the physical location of a dataset.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] when the dataset cannot be described.
    fn dataset_location(&self, project_id: &str, dataset_id: &str)
    -> Result<String, WarehouseError>;

    /// Counts the rows of a table or view.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] when the count query fails.
    fn row_count(&self, table: &TableReference) -> Result<u64, WarehouseError>;

    /// Returns the physical metadata of a table.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] when the table cannot be described.
    fn table_info(&self, table: &TableReference) -> Result<TableInfo, WarehouseError>;

    /// Creates a dataset when it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] when the dataset cannot be created.
    fn ensure_dataset(
        &self,
        project_id: &str,
        dataset_id: &str,
        location: Option<&str>,
    ) -> Result<(), WarehouseError>;

    /// Creates `target` with the schema of `source` and the given labels.
    ///
    /// With `recreate` set, an existing `target` is dropped first; otherwise an
    /// existing `target` is kept.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] when the table cannot be created.
    fn create_table_like(
        &self,
        source: &TableReference,
        target: &TableReference,
        labels: &Labels,
        recreate: bool,
    ) -> Result<(), WarehouseError>;

    /// Inserts rows selected from `source` by `query` into `target`.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] when the statement fails.
    fn insert_sample(
        &self,
        source: &TableReference,
        target: &TableReference,
        query: &SampleQuery,
    ) -> Result<(), WarehouseError>;

    /// Drops a table, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] when the drop fails.
    fn drop_table(&self, table: &TableReference) -> Result<bool, WarehouseError>;

    /// Lists tables in `project_id` carrying every label in `labels`.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] when the listing fails.
    fn list_labeled_tables(
        &self,
        project_id: &str,
        labels: &Labels,
    ) -> Result<Vec<TableReference>, WarehouseError>;

    /// Returns true when the dataset holds no tables.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] when the dataset cannot be inspected.
    fn dataset_is_empty(&self, project_id: &str, dataset_id: &str) -> Result<bool, WarehouseError>;

    /// Deletes an empty dataset.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] when the dataset cannot be deleted.
    fn delete_dataset(&self, project_id: &str, dataset_id: &str) -> Result<(), WarehouseError>;
}

// ============================================================================
// SECTION: Transfer Service
// ============================================================================

/// Cross-location transfer errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Transfer could not be started.
    #[error("transfer start failed: {0}")]
    Start(String),
    /// Transfer configuration could not be read or changed.
    #[error("transfer config error: {0}")]
    Config(String),
}

/// Cross-location copy of one staging table into its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Display name identifying the configuration.
    pub display_name: String,
    /// Staging table co-located with the source.
    pub source: TableReference,
    /// Target table in the target location.
    pub target: TableReference,
    /// Topic notified when the transfer completes.
    pub notification_topic: Option<String>,
}

/// Progress of a started transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// Transfer runs asynchronously.
    Started,
    /// Transfer finished before returning.
    Completed,
}

/// Handle returned for a started transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Transfer configuration identifier.
    pub config_id: String,
    /// Transfer progress.
    pub status: TransferStatus,
}

/// Existing transfer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Transfer configuration identifier.
    pub config_id: String,
    /// Display name given at creation.
    pub display_name: String,
}

/// Service copying tables across physical locations.
pub trait TransferService: Send + Sync {
    /// Starts a transfer.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError`] when the transfer cannot be started.
    fn start_transfer(&self, request: &TransferRequest) -> Result<TransferReceipt, TransferError>;

    /// Lists transfer configurations in a project.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError`] when configurations cannot be listed.
    fn list_transfer_configs(&self, project_id: &str) -> Result<Vec<TransferConfig>, TransferError>;

    /// Deletes a transfer configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError`] when the configuration cannot be deleted.
    fn delete_transfer_config(&self, config_id: &str) -> Result<(), TransferError>;
}

// ============================================================================
// SECTION: Publisher
// ============================================================================

/// Message publishing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// Message could not be encoded.
    #[error("publish encode error: {0}")]
    Encode(String),
    /// Transport rejected the message.
    #[error("publish transport error: {0}")]
    Transport(String),
    /// Transport is closed.
    #[error("publish channel closed")]
    Closed,
}

/// Message transport publishing JSON messages to named topics.
pub trait Publisher: Send + Sync {
    /// Publishes a message to a topic.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when the message is not accepted.
    fn publish(&self, topic: &str, message: &Value) -> Result<(), PublishError>;
}

// ============================================================================
// SECTION: Event Sink
// ============================================================================

/// Destination for structured sampler events.
pub trait EventSink: Send + Sync {
    /// Records an event. Sinks never fail the caller.
    fn record(&self, event: &SamplerEvent);
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Wall-clock source for sample start and end times.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}
