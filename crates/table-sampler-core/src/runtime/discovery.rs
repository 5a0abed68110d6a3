// crates/table-sampler-core/src/runtime/discovery.rs
// ============================================================================
// Module: Table Sampler Discovery
// Description: Policy and sample request discovery over the object store layout.
// Purpose: Resolve effective table policies and requests from storage documents.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Storage layout:
//! - `<default policy object>` in the policy bucket holds the default policy.
//! - `project/dataset/table.json` in the policy bucket overrides it per table.
//! - `project/dataset/table.json` in the request bucket holds a sample request.
//! - `<sampling lock object>` in the request bucket pauses sampling.
//!
//! Resolution cascade, evaluated on every lookup:
//! fallback policy → bucket default → table-specific policy. Malformed
//! documents degrade field by field and each issue is logged as a warning.
//! Only dataset locations are cached, per `(project, dataset)`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::document::Document;
use crate::core::document::DocumentIssues;
use crate::core::document::from_document_bytes;
use crate::core::event::EVENT_MALFORMED_DOCUMENT;
use crate::core::event::SamplerEvent;
use crate::core::patch::Patch;
use crate::core::policy::Policy;
use crate::core::policy::TablePolicy;
use crate::core::sample::Sample;
use crate::core::table::TableReference;
use crate::core::table::TableSample;
use crate::interfaces::EventSink;
use crate::interfaces::ObjectStore;
use crate::interfaces::ObjectStoreError;
use crate::interfaces::Warehouse;
use crate::runtime::error::ProcessError;
use crate::runtime::settings::SamplerSettings;

// ============================================================================
// SECTION: Location Cache
// ============================================================================

/// Dataset locations cached per `(project, dataset)`.
///
/// Entries are never invalidated; locations do not change within a run.
#[derive(Debug, Default)]
pub struct LocationCache {
    /// Cached locations.
    entries: Mutex<BTreeMap<(String, String), String>>,
}

impl LocationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the location of a dataset, asking the warehouse on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Location`] when the cache is poisoned and
    /// [`ProcessError::Warehouse`] when the lookup fails.
    pub fn resolve(
        &self,
        warehouse: &dyn Warehouse,
        project_id: &str,
        dataset_id: &str,
    ) -> Result<String, ProcessError> {
        let key = (project_id.to_string(), dataset_id.to_string());
        if let Some(location) = self.lock()?.get(&key) {
            return Ok(location.clone());
        }
        let location = warehouse.dataset_location(project_id, dataset_id)?;
        self.lock()?.insert(key, location.clone());
        Ok(location)
    }

    /// Returns the number of cached datasets.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Location`] when the cache is poisoned.
    pub fn cached_datasets(&self) -> Result<usize, ProcessError> {
        Ok(self.lock()?.len())
    }

    /// Locks the cache.
    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<(String, String), String>>, ProcessError> {
        self.entries
            .lock()
            .map_err(|_| ProcessError::Location("location cache mutex poisoned".to_string()))
    }
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// Read-only view over the policy and request buckets.
pub struct Discovery<'a> {
    /// Storage holding both buckets.
    store: &'a dyn ObjectStore,
    /// Warehouse used for location lookups.
    warehouse: &'a dyn Warehouse,
    /// Sink for malformed document warnings.
    events: &'a dyn EventSink,
    /// Bucket and object names.
    settings: &'a SamplerSettings,
    /// Shared dataset location cache.
    locations: &'a LocationCache,
}

impl<'a> Discovery<'a> {
    /// Creates a discovery view.
    #[must_use]
    pub fn new(
        store: &'a dyn ObjectStore,
        warehouse: &'a dyn Warehouse,
        events: &'a dyn EventSink,
        settings: &'a SamplerSettings,
        locations: &'a LocationCache,
    ) -> Self {
        Self {
            store,
            warehouse,
            events,
            settings,
            locations,
        }
    }

    /// Returns true when the sampling lock object exists.
    ///
    /// Only existence is checked; the object content is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when existence cannot be determined.
    pub fn sampling_locked(&self) -> Result<bool, ObjectStoreError> {
        self.store.object_exists(&self.settings.request_bucket, &self.settings.sampling_lock_object)
    }

    /// Resolves the bucket default policy on top of [`Policy::fallback`].
    ///
    /// An unreadable or absent default yields the fallback policy; a
    /// partially malformed default keeps its valid fields.
    #[must_use]
    pub fn default_policy(&self) -> Policy {
        let bucket = &self.settings.policy_bucket;
        let path = &self.settings.default_policy_object;
        let parsed = match self.store.read_object(bucket, path) {
            Ok(Some(bytes)) => self.parse::<Policy>(&bytes, bucket, path),
            Ok(None) => Policy::default(),
            Err(err) => {
                self.warn_document(bucket, path, &format!("unreadable: {err}"));
                Policy::default()
            }
        };
        parsed.patch_with(&Policy::fallback())
    }

    /// Returns the distinct `project/dataset/` prefixes holding table policies.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the listing fails.
    pub fn policy_prefixes(&self) -> Result<Vec<String>, ObjectStoreError> {
        let mut prefixes = BTreeSet::new();
        for path in self.store.list_objects(&self.settings.policy_bucket, None)? {
            if let Some(table) = TableReference::from_object_path(&path?) {
                prefixes.insert(table.dataset_prefix());
            }
        }
        Ok(prefixes.into_iter().collect())
    }

    /// Returns the tables with a policy document under `prefix`.
    ///
    /// Table-shaped paths with invalid identifiers are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the listing fails.
    pub fn table_references(&self, prefix: &str) -> Result<Vec<TableReference>, ObjectStoreError> {
        let bucket = &self.settings.policy_bucket;
        let mut tables = Vec::new();
        for path in self.store.list_objects(bucket, Some(prefix))? {
            let path = path?;
            if !path.starts_with(prefix) {
                continue;
            }
            match TableReference::from_object_path(&path) {
                Some(table) => tables.push(table),
                None if TableReference::is_table_object_path(&path) => {
                    self.warn_document(bucket, &path, "invalid table identifier in path");
                }
                None => {}
            }
        }
        Ok(tables)
    }

    /// Resolves the effective policy of `table` and pins it to its dataset location.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] when the policy cannot be read or the location
    /// cannot be resolved.
    pub fn resolve_table_policy(
        &self,
        table: &TableReference,
        default: &Policy,
    ) -> Result<TablePolicy, ProcessError> {
        let bucket = &self.settings.policy_bucket;
        let path = table.object_path();
        let specific = match self.store.read_object(bucket, &path)? {
            Some(bytes) => self.parse::<Policy>(&bytes, bucket, &path),
            None => Policy::default(),
        };
        let location =
            self.locations.resolve(self.warehouse, table.project_id(), table.dataset_id())?;
        Ok(TablePolicy::new(table.with_location(Some(&location)), specific.patch_with(default)))
    }

    /// Resolves the sample request of a table, deferring to the policy default.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the request exists but cannot be read.
    pub fn resolve_sample_request(
        &self,
        table_policy: &TablePolicy,
    ) -> Result<TableSample, ObjectStoreError> {
        let bucket = &self.settings.request_bucket;
        let path = table_policy.table_reference.object_path();
        let requested = match self.store.read_object(bucket, &path)? {
            Some(bytes) => self.parse::<Sample>(&bytes, bucket, &path),
            None => Sample::default(),
        };
        let fallback = table_policy.policy.default_sample.clone().unwrap_or_default();
        Ok(TableSample::new(table_policy.table_reference.clone(), requested.patch_with(&fallback)))
    }

    /// Parses a document and logs its issues.
    fn parse<T: Document + Default>(&self, bytes: &[u8], bucket: &str, path: &str) -> T {
        let mut issues = DocumentIssues::new();
        let parsed = from_document_bytes::<T>(bytes, &mut issues);
        for issue in issues.iter() {
            self.warn_document(bucket, path, &format!("{}: {}", issue.path, issue.message));
        }
        parsed
    }

    /// Logs one malformed document warning.
    fn warn_document(&self, bucket: &str, path: &str, detail: &str) {
        self.events
            .record(&SamplerEvent::warning(EVENT_MALFORMED_DOCUMENT, format!("{bucket}/{path}: {detail}")));
    }
}
