// crates/table-sampler-core/src/runtime/memory.rs
// ============================================================================
// Module: Table Sampler In-Memory Collaborators
// Description: In-memory object store, warehouse, transfer service and sinks.
// Purpose: Run the full workflow deterministically without external services.
// Dependencies: crate::core, crate::interfaces, serde_json
// ============================================================================

//! ## Overview
//! These implementations back tests and local runs. They are cheap to clone:
//! clones share state, so a test can keep a handle while the processor owns
//! another. They are not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use serde_json::Value;

use crate::core::command::Command;
use crate::core::event::SamplerEvent;
use crate::core::query::SampleQuery;
use crate::core::query::TableInfo;
use crate::core::table::TableReference;
use crate::interfaces::EventSink;
use crate::interfaces::Labels;
use crate::interfaces::ObjectListing;
use crate::interfaces::ObjectStore;
use crate::interfaces::ObjectStoreError;
use crate::interfaces::PublishError;
use crate::interfaces::Publisher;
use crate::interfaces::TransferConfig;
use crate::interfaces::TransferError;
use crate::interfaces::TransferReceipt;
use crate::interfaces::TransferRequest;
use crate::interfaces::TransferService;
use crate::interfaces::TransferStatus;
use crate::interfaces::Warehouse;
use crate::interfaces::WarehouseError;

// ============================================================================
// SECTION: Object Store
// ============================================================================

/// In-memory object store keyed by bucket and path.
#[derive(Debug, Default, Clone)]
pub struct InMemoryObjectStore {
    /// Objects keyed by `(bucket, path)`.
    objects: Arc<Mutex<BTreeMap<(String, String), Vec<u8>>>>,
    /// Number of listing calls made.
    list_calls: Arc<AtomicUsize>,
    /// Number of read calls made.
    read_calls: Arc<AtomicUsize>,
}

impl InMemoryObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::Store`] when the store lock is poisoned.
    pub fn put_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: impl Into<Vec<u8>>,
    ) -> Result<(), ObjectStoreError> {
        self.lock()?.insert((bucket.to_string(), path.to_string()), bytes.into());
        Ok(())
    }

    /// Stores a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when encoding fails or the lock is poisoned.
    pub fn put_json(&self, bucket: &str, path: &str, value: &Value) -> Result<(), ObjectStoreError> {
        let bytes = serde_json::to_vec(value).map_err(|err| ObjectStoreError::Invalid(err.to_string()))?;
        self.put_object(bucket, path, bytes)
    }

    /// Removes an object, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::Store`] when the store lock is poisoned.
    pub fn remove_object(&self, bucket: &str, path: &str) -> Result<bool, ObjectStoreError> {
        Ok(self.lock()?.remove(&(bucket.to_string(), path.to_string())).is_some())
    }

    /// Returns the number of listing calls made so far.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Returns the number of read calls made so far.
    #[must_use]
    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    /// Locks the object map.
    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<(String, String), Vec<u8>>>, ObjectStoreError> {
        self.objects
            .lock()
            .map_err(|_| ObjectStoreError::Store("object store mutex poisoned".to_string()))
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn list_objects<'a>(
        &'a self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> Result<ObjectListing<'a>, ObjectStoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let prefix = prefix.unwrap_or_default();
        let paths: Vec<String> = self
            .lock()?
            .keys()
            .filter(|(stored_bucket, path)| stored_bucket == bucket && path.starts_with(prefix))
            .map(|(_, path)| path.clone())
            .collect();
        Ok(Box::new(paths.into_iter().map(Ok)))
    }

    fn read_object(&self, bucket: &str, path: &str) -> Result<Option<Vec<u8>>, ObjectStoreError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock()?.get(&(bucket.to_string(), path.to_string())).cloned())
    }

    fn object_exists(&self, bucket: &str, path: &str) -> Result<bool, ObjectStoreError> {
        Ok(self.lock()?.contains_key(&(bucket.to_string(), path.to_string())))
    }
}

// ============================================================================
// SECTION: Warehouse
// ============================================================================

/// Stored table state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    /// Table reference as registered.
    pub reference: TableReference,
    /// Row count.
    pub rows: u64,
    /// True for views.
    pub is_view: bool,
    /// Labels attached at creation.
    pub labels: Labels,
}

/// Recorded sample insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertRecord {
    /// Table sampled from.
    pub source: TableReference,
    /// Table inserted into.
    pub target: TableReference,
    /// Plan used.
    pub query: SampleQuery,
    /// Rows inserted.
    pub rows: u64,
}

/// Mutable warehouse state.
#[derive(Debug, Default)]
struct WarehouseState {
    /// Dataset locations keyed by `(project, dataset)`.
    datasets: BTreeMap<(String, String), Option<String>>,
    /// Tables keyed by fully-qualified id.
    tables: BTreeMap<String, TableEntry>,
    /// Tables whose row count query fails.
    failing_tables: BTreeSet<String>,
    /// Inserts in execution order.
    inserts: Vec<InsertRecord>,
    /// Number of dataset location lookups.
    location_calls: usize,
}

/// In-memory warehouse holding row counts and labels only.
#[derive(Debug, Default, Clone)]
pub struct InMemoryWarehouse {
    /// Shared warehouse state.
    state: Arc<Mutex<WarehouseState>>,
}

impl InMemoryWarehouse {
    /// Creates an empty warehouse.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a dataset at a location.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::Warehouse`] when the state lock is poisoned.
    pub fn add_dataset(
        &self,
        project_id: &str,
        dataset_id: &str,
        location: Option<&str>,
    ) -> Result<(), WarehouseError> {
        self.lock()?
            .datasets
            .insert((project_id.to_string(), dataset_id.to_string()), location.map(str::to_string));
        Ok(())
    }

    /// Registers a physical table, creating its dataset when needed.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::Warehouse`] when the state lock is poisoned.
    pub fn add_table(&self, reference: &TableReference, rows: u64) -> Result<(), WarehouseError> {
        self.insert_entry(reference, rows, false)
    }

    /// Registers a view reporting `rows` logical rows.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::Warehouse`] when the state lock is poisoned.
    pub fn add_view(&self, reference: &TableReference, rows: u64) -> Result<(), WarehouseError> {
        self.insert_entry(reference, rows, true)
    }

    /// Makes row count queries for `reference` fail.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::Warehouse`] when the state lock is poisoned.
    pub fn fail_row_count(&self, reference: &TableReference) -> Result<(), WarehouseError> {
        self.lock()?.failing_tables.insert(reference.fully_qualified_id());
        Ok(())
    }

    /// Returns the stored state of a table.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::Warehouse`] when the state lock is poisoned.
    pub fn table(&self, reference: &TableReference) -> Result<Option<TableEntry>, WarehouseError> {
        Ok(self.lock()?.tables.get(&reference.fully_qualified_id()).cloned())
    }

    /// Returns true when the dataset exists.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::Warehouse`] when the state lock is poisoned.
    pub fn has_dataset(&self, project_id: &str, dataset_id: &str) -> Result<bool, WarehouseError> {
        Ok(self.lock()?.datasets.contains_key(&(project_id.to_string(), dataset_id.to_string())))
    }

    /// Returns the inserts executed so far.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::Warehouse`] when the state lock is poisoned.
    pub fn inserts(&self) -> Result<Vec<InsertRecord>, WarehouseError> {
        Ok(self.lock()?.inserts.clone())
    }

    /// Returns the number of dataset location lookups made so far.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::Warehouse`] when the state lock is poisoned.
    pub fn location_calls(&self) -> Result<usize, WarehouseError> {
        Ok(self.lock()?.location_calls)
    }

    /// Inserts a table entry and its dataset.
    fn insert_entry(
        &self,
        reference: &TableReference,
        rows: u64,
        is_view: bool,
    ) -> Result<(), WarehouseError> {
        let mut state = self.lock()?;
        state
            .datasets
            .entry(dataset_key(reference))
            .or_insert_with(|| reference.location().map(str::to_string));
        state.tables.insert(reference.fully_qualified_id(), TableEntry {
            reference: reference.clone(),
            rows,
            is_view,
            labels: Labels::new(),
        });
        Ok(())
    }

    /// Locks the warehouse state.
    fn lock(&self) -> Result<MutexGuard<'_, WarehouseState>, WarehouseError> {
        self.state
            .lock()
            .map_err(|_| WarehouseError::Warehouse("warehouse mutex poisoned".to_string()))
    }
}

/// Returns the `(project, dataset)` key of a table.
fn dataset_key(reference: &TableReference) -> (String, String) {
    (reference.project_id().to_string(), reference.dataset_id().to_string())
}

/// Returns the rows a plan would insert from a table of `rows` rows.
fn planned_rows(query: &SampleQuery, rows: u64) -> u64 {
    let available = match query {
        SampleQuery::TableSample {
            percent, ..
        } => (u128::from(rows) * u128::from(*percent)).div_ceil(100),
        SampleQuery::RandomOrder {
            ..
        }
        | SampleQuery::Sorted {
            ..
        } => u128::from(rows),
    };
    u64::try_from(available).unwrap_or(rows).min(query.limit())
}

impl Warehouse for InMemoryWarehouse {
    fn dataset_location(&self, project_id: &str, dataset_id: &str) -> Result<String, WarehouseError> {
        let mut state = self.lock()?;
        state.location_calls += 1;
        match state.datasets.get(&(project_id.to_string(), dataset_id.to_string())) {
            Some(Some(location)) => Ok(location.clone()),
            Some(None) => Err(WarehouseError::Metadata(format!(
                "dataset {project_id}.{dataset_id} has no location"
            ))),
            None => Err(WarehouseError::NotFound(format!("dataset {project_id}.{dataset_id}"))),
        }
    }

    fn row_count(&self, table: &TableReference) -> Result<u64, WarehouseError> {
        let state = self.lock()?;
        let key = table.fully_qualified_id();
        if state.failing_tables.contains(&key) {
            return Err(WarehouseError::Query(format!("row count failed for {key}")));
        }
        state
            .tables
            .get(&key)
            .map(|entry| entry.rows)
            .ok_or_else(|| WarehouseError::NotFound(format!("table {key}")))
    }

    fn table_info(&self, table: &TableReference) -> Result<TableInfo, WarehouseError> {
        let state = self.lock()?;
        let key = table.fully_qualified_id();
        let entry =
            state.tables.get(&key).ok_or_else(|| WarehouseError::NotFound(format!("table {key}")))?;
        let location = state.datasets.get(&dataset_key(table)).cloned().flatten();
        Ok(TableInfo {
            num_rows: if entry.is_view { 0 } else { entry.rows },
            is_view: entry.is_view,
            location,
        })
    }

    fn ensure_dataset(
        &self,
        project_id: &str,
        dataset_id: &str,
        location: Option<&str>,
    ) -> Result<(), WarehouseError> {
        self.lock()?
            .datasets
            .entry((project_id.to_string(), dataset_id.to_string()))
            .or_insert_with(|| location.map(str::to_string));
        Ok(())
    }

    fn create_table_like(
        &self,
        source: &TableReference,
        target: &TableReference,
        labels: &Labels,
        recreate: bool,
    ) -> Result<(), WarehouseError> {
        let mut state = self.lock()?;
        let source_key = source.fully_qualified_id();
        if !state.tables.contains_key(&source_key) {
            return Err(WarehouseError::NotFound(format!("table {source_key}")));
        }
        if !state.datasets.contains_key(&dataset_key(target)) {
            return Err(WarehouseError::NotFound(format!(
                "dataset {}.{}",
                target.project_id(),
                target.dataset_id()
            )));
        }
        let target_key = target.fully_qualified_id();
        if recreate {
            state.tables.remove(&target_key);
        }
        state.tables.entry(target_key).or_insert_with(|| TableEntry {
            reference: target.clone(),
            rows: 0,
            is_view: false,
            labels: labels.clone(),
        });
        Ok(())
    }

    fn insert_sample(
        &self,
        source: &TableReference,
        target: &TableReference,
        query: &SampleQuery,
    ) -> Result<(), WarehouseError> {
        let mut state = self.lock()?;
        let source_key = source.fully_qualified_id();
        let source_rows = state
            .tables
            .get(&source_key)
            .map(|entry| entry.rows)
            .ok_or_else(|| WarehouseError::NotFound(format!("table {source_key}")))?;
        let rows = planned_rows(query, source_rows);
        let target_key = target.fully_qualified_id();
        let entry = state
            .tables
            .get_mut(&target_key)
            .ok_or_else(|| WarehouseError::NotFound(format!("table {target_key}")))?;
        entry.rows = entry.rows.saturating_add(rows);
        state.inserts.push(InsertRecord {
            source: source.clone(),
            target: target.clone(),
            query: query.clone(),
            rows,
        });
        Ok(())
    }

    fn drop_table(&self, table: &TableReference) -> Result<bool, WarehouseError> {
        Ok(self.lock()?.tables.remove(&table.fully_qualified_id()).is_some())
    }

    fn list_labeled_tables(
        &self,
        project_id: &str,
        labels: &Labels,
    ) -> Result<Vec<TableReference>, WarehouseError> {
        let state = self.lock()?;
        Ok(state
            .tables
            .values()
            .filter(|entry| entry.reference.project_id() == project_id)
            .filter(|entry| labels.iter().all(|(key, value)| entry.labels.get(key) == Some(value)))
            .map(|entry| entry.reference.clone())
            .collect())
    }

    fn dataset_is_empty(&self, project_id: &str, dataset_id: &str) -> Result<bool, WarehouseError> {
        let state = self.lock()?;
        Ok(!state.tables.values().any(|entry| {
            entry.reference.project_id() == project_id && entry.reference.dataset_id() == dataset_id
        }))
    }

    fn delete_dataset(&self, project_id: &str, dataset_id: &str) -> Result<(), WarehouseError> {
        self.lock()?
            .datasets
            .remove(&(project_id.to_string(), dataset_id.to_string()))
            .map(|_| ())
            .ok_or_else(|| WarehouseError::NotFound(format!("dataset {project_id}.{dataset_id}")))
    }
}

// ============================================================================
// SECTION: Transfer Service
// ============================================================================

/// Mutable transfer service state.
#[derive(Debug, Default)]
struct TransferState {
    /// Configurations keyed by project, then config id.
    configs: BTreeMap<String, BTreeMap<String, TransferConfig>>,
    /// Requests in submission order.
    requests: Vec<TransferRequest>,
    /// Next config sequence number.
    next_id: u64,
}

/// In-memory transfer service that records requests.
#[derive(Debug, Clone)]
pub struct InMemoryTransferService {
    /// Shared state.
    state: Arc<Mutex<TransferState>>,
    /// Status reported for started transfers.
    status: TransferStatus,
    /// Reject every start request.
    reject_starts: bool,
}

impl Default for InMemoryTransferService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTransferService {
    /// Creates a service whose transfers complete immediately.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TransferState::default())),
            status: TransferStatus::Completed,
            reject_starts: false,
        }
    }

    /// Reports `status` for every started transfer.
    #[must_use]
    pub fn with_status(mut self, status: TransferStatus) -> Self {
        self.status = status;
        self
    }

    /// Rejects every start request.
    #[must_use]
    pub fn rejecting(mut self) -> Self {
        self.reject_starts = true;
        self
    }

    /// Registers an existing configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Config`] when the state lock is poisoned.
    pub fn add_config(&self, project_id: &str, config: TransferConfig) -> Result<(), TransferError> {
        self.lock()?
            .configs
            .entry(project_id.to_string())
            .or_default()
            .insert(config.config_id.clone(), config);
        Ok(())
    }

    /// Returns the requests submitted so far.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Config`] when the state lock is poisoned.
    pub fn requests(&self) -> Result<Vec<TransferRequest>, TransferError> {
        Ok(self.lock()?.requests.clone())
    }

    /// Locks the transfer state.
    fn lock(&self) -> Result<MutexGuard<'_, TransferState>, TransferError> {
        self.state
            .lock()
            .map_err(|_| TransferError::Config("transfer service mutex poisoned".to_string()))
    }
}

impl TransferService for InMemoryTransferService {
    fn start_transfer(&self, request: &TransferRequest) -> Result<TransferReceipt, TransferError> {
        let mut state = self.lock()?;
        state.requests.push(request.clone());
        if self.reject_starts {
            return Err(TransferError::Start(format!("transfer rejected: {}", request.display_name)));
        }
        state.next_id += 1;
        let config_id = format!("transfer-{}", state.next_id);
        state.configs.entry(request.target.project_id().to_string()).or_default().insert(
            config_id.clone(),
            TransferConfig {
                config_id: config_id.clone(),
                display_name: request.display_name.clone(),
            },
        );
        Ok(TransferReceipt {
            config_id,
            status: self.status,
        })
    }

    fn list_transfer_configs(&self, project_id: &str) -> Result<Vec<TransferConfig>, TransferError> {
        Ok(self
            .lock()?
            .configs
            .get(project_id)
            .map(|configs| configs.values().cloned().collect())
            .unwrap_or_default())
    }

    fn delete_transfer_config(&self, config_id: &str) -> Result<(), TransferError> {
        let mut state = self.lock()?;
        let removed = state.configs.values_mut().any(|configs| configs.remove(config_id).is_some());
        if removed {
            Ok(())
        } else {
            Err(TransferError::Config(format!("unknown transfer config: {config_id}")))
        }
    }
}

// ============================================================================
// SECTION: Publisher
// ============================================================================

/// Publisher that records every message in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingPublisher {
    /// Published `(topic, message)` pairs in order.
    messages: Arc<Mutex<Vec<(String, Value)>>>,
}

impl RecordingPublisher {
    /// Creates an empty publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every published `(topic, message)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Transport`] when the lock is poisoned.
    pub fn messages(&self) -> Result<Vec<(String, Value)>, PublishError> {
        Ok(self.lock()?.clone())
    }

    /// Returns the messages published to `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Transport`] when the lock is poisoned.
    pub fn messages_on(&self, topic: &str) -> Result<Vec<Value>, PublishError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|(published, _)| published == topic)
            .map(|(_, message)| message.clone())
            .collect())
    }

    /// Returns the decodable commands published to `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Transport`] when the lock is poisoned.
    pub fn commands_on(&self, topic: &str) -> Result<Vec<Command>, PublishError> {
        Ok(self
            .messages_on(topic)?
            .iter()
            .filter_map(|message| Command::decode(message).ok())
            .collect())
    }

    /// Locks the message list.
    fn lock(&self) -> Result<MutexGuard<'_, Vec<(String, Value)>>, PublishError> {
        self.messages
            .lock()
            .map_err(|_| PublishError::Transport("recording publisher mutex poisoned".to_string()))
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, topic: &str, message: &Value) -> Result<(), PublishError> {
        self.lock()?.push((topic.to_string(), message.clone()));
        Ok(())
    }
}

// ============================================================================
// SECTION: Event Sinks
// ============================================================================

/// Event sink that discards events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn record(&self, _event: &SamplerEvent) {}
}

/// Event sink that keeps events in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingEventSink {
    /// Recorded events in order.
    events: Arc<Mutex<Vec<SamplerEvent>>>,
}

impl RecordingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events; empty when the lock is poisoned.
    #[must_use]
    pub fn events(&self) -> Vec<SamplerEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns the recorded events with identifier `event`.
    #[must_use]
    pub fn events_named(&self, event: &str) -> Vec<SamplerEvent> {
        self.events().into_iter().filter(|recorded| recorded.event == event).collect()
    }
}

impl EventSink for RecordingEventSink {
    fn record(&self, event: &SamplerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
