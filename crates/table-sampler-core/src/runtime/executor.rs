// crates/table-sampler-core/src/runtime/executor.rs
// ============================================================================
// Module: Table Sampler Query Executor
// Description: Materializes compliant samples into target tables.
// Purpose: Drive table lifecycle, staging and cross-location transfers.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`QueryExecutor`] turns a `SAMPLE_START` command into warehouse calls:
//! 1. describe the source and plan the statement;
//! 2. (re)create the target with the source schema and the standard labels;
//! 3. insert the sample and re-count the rows actually written.
//!
//! When the source and target locations differ, the sample is written to a
//! staging table co-located with the source and a transfer moves it to the
//! target. A staging table is dropped when its transfer fails to start, and
//! after a completed transfer when configured; otherwise the next `START`
//! cleanup removes it through its labels.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::core::command::SampleStartCommand;
use crate::core::error::ValueError;
use crate::core::event::EVENT_CLEANUP;
use crate::core::event::SamplerEvent;
use crate::core::query::SampleQuery;
use crate::core::query::plan_sample;
use crate::core::table::TableReference;
use crate::interfaces::EventSink;
use crate::interfaces::Labels;
use crate::interfaces::TransferReceipt;
use crate::interfaces::TransferRequest;
use crate::interfaces::TransferService;
use crate::interfaces::TransferStatus;
use crate::interfaces::Warehouse;
use crate::runtime::error::ProcessError;
use crate::runtime::settings::SamplerSettings;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Label marking every table created by the sampler.
pub const MANAGED_LABEL_KEY: &str = "managed_by";
/// Value of [`MANAGED_LABEL_KEY`].
pub const MANAGED_LABEL_VALUE: &str = "table-sampler";
/// Label carrying the source project.
pub const SOURCE_PROJECT_LABEL_KEY: &str = "source_project";
/// Label carrying the source location.
pub const SOURCE_LOCATION_LABEL_KEY: &str = "source_location";
/// Display name prefix of sampler transfer configurations.
pub const TRANSFER_DISPLAY_PREFIX: &str = "table-sampler:";
/// Maximum label value length.
const MAX_LABEL_VALUE_LENGTH: usize = 63;

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of one executed sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleOutcome {
    /// Rows present in the written table after the insert.
    pub amount_inserted: u64,
    /// Staging table left in place for an asynchronous transfer.
    pub staging_table: Option<TableReference>,
    /// Transfer started for a cross-location sample.
    pub transfer: Option<TransferReceipt>,
}

/// Resources removed by the START cleanup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Labeled tables dropped.
    pub tables_dropped: usize,
    /// Datasets deleted because the drops emptied them.
    pub datasets_deleted: usize,
    /// Sampler transfer configurations deleted.
    pub transfer_configs_deleted: usize,
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Sample materialization over the warehouse and transfer collaborators.
pub struct QueryExecutor<'a> {
    /// Warehouse holding sources and targets.
    warehouse: &'a dyn Warehouse,
    /// Cross-location transfer service.
    transfers: &'a dyn TransferService,
    /// Sink for cleanup events.
    events: &'a dyn EventSink,
    /// Target and staging settings.
    settings: &'a SamplerSettings,
}

impl<'a> QueryExecutor<'a> {
    /// Creates an executor.
    #[must_use]
    pub fn new(
        warehouse: &'a dyn Warehouse,
        transfers: &'a dyn TransferService,
        events: &'a dyn EventSink,
        settings: &'a SamplerSettings,
    ) -> Self {
        Self {
            warehouse,
            transfers,
            events,
            settings,
        }
    }

    /// Returns the target of `source`: same dataset and table in the target project.
    ///
    /// The location is the configured target location, else the source location.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] when the target project id is invalid.
    pub fn target_table(&self, source: &TableReference) -> Result<TableReference, ValueError> {
        let location = self.settings.target_location.as_deref().or_else(|| source.location());
        Ok(source.with_project(&self.settings.target_project)?.with_location(location))
    }

    /// Returns the staging table for a cross-location sample.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] when the staging dataset id is invalid.
    pub fn staging_table(
        &self,
        source: &TableReference,
        target: &TableReference,
    ) -> Result<TableReference, ValueError> {
        let dataset = format!("{}{}", target.dataset_id(), self.settings.staging_dataset_suffix);
        Ok(target.with_dataset(dataset)?.with_location(source.location()))
    }

    /// Labels shared by every sampler table; START cleanup selects on them.
    #[must_use]
    pub fn managed_labels(&self) -> Labels {
        let mut labels = self.settings.labels.clone();
        labels.insert(MANAGED_LABEL_KEY.to_string(), MANAGED_LABEL_VALUE.to_string());
        labels
    }

    /// Labels attached to tables created for `source`.
    #[must_use]
    pub fn table_labels(&self, source: &TableReference) -> Labels {
        let mut labels = self.managed_labels();
        labels.insert(SOURCE_PROJECT_LABEL_KEY.to_string(), label_value(source.project_id()));
        if let Some(location) = source.location() {
            labels.insert(SOURCE_LOCATION_LABEL_KEY.to_string(), label_value(location));
        }
        labels
    }

    /// Executes one sample command.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] when any warehouse or transfer call fails.
    pub fn execute(&self, command: &SampleStartCommand) -> Result<SampleOutcome, ProcessError> {
        let info = self.warehouse.table_info(&command.sample_request.table_reference)?;
        let source = match command.sample_request.table_reference.location() {
            Some(_) => command.sample_request.table_reference.clone(),
            None => command.sample_request.table_reference.with_location(info.location.as_deref()),
        };
        let target = &command.target_table;
        let query = plan_sample(&command.sample_request, &info);
        let labels = self.table_labels(&source);

        if !locations_differ(source.location(), target.location()) {
            let amount_inserted =
                self.materialize(&source, target, &labels, &query, self.settings.recreate_table)?;
            return Ok(SampleOutcome {
                amount_inserted,
                staging_table: None,
                transfer: None,
            });
        }
        self.execute_cross_location(&source, target, &labels, &query)
    }

    /// Samples through a staging table and transfers it to the target location.
    fn execute_cross_location(
        &self,
        source: &TableReference,
        target: &TableReference,
        labels: &Labels,
        query: &SampleQuery,
    ) -> Result<SampleOutcome, ProcessError> {
        let staging = self.staging_table(source, target)?;
        let amount_inserted = self.materialize(source, &staging, labels, query, true)?;
        self.warehouse.ensure_dataset(target.project_id(), target.dataset_id(), target.location())?;
        self.warehouse.create_table_like(source, target, labels, self.settings.recreate_table)?;

        let request = TransferRequest {
            display_name: format!("{TRANSFER_DISPLAY_PREFIX}{}", target.fully_qualified_id()),
            source: staging.clone(),
            target: target.clone(),
            notification_topic: self.settings.transfer_notification_topic.clone(),
        };
        let receipt = match self.transfers.start_transfer(&request) {
            Ok(receipt) => receipt,
            Err(err) => {
                self.drop_staging(&staging);
                return Err(err.into());
            }
        };
        let keep_staging = receipt.status == TransferStatus::Started
            || !self.settings.drop_staging_after_transfer;
        if !keep_staging {
            self.drop_staging(&staging);
        }
        Ok(SampleOutcome {
            amount_inserted,
            staging_table: keep_staging.then_some(staging),
            transfer: Some(receipt),
        })
    }

    /// Creates `table`, inserts the sample and returns its resulting row count.
    fn materialize(
        &self,
        source: &TableReference,
        table: &TableReference,
        labels: &Labels,
        query: &SampleQuery,
        recreate: bool,
    ) -> Result<u64, ProcessError> {
        self.warehouse.ensure_dataset(table.project_id(), table.dataset_id(), table.location())?;
        self.warehouse.create_table_like(source, table, labels, recreate)?;
        if query.limit() > 0 {
            self.warehouse.insert_sample(source, table, query)?;
        }
        Ok(self.warehouse.row_count(table)?)
    }

    /// Drops a staging table, logging instead of failing.
    fn drop_staging(&self, staging: &TableReference) {
        let event = match self.warehouse.drop_table(staging) {
            Ok(_) => SamplerEvent::info(EVENT_CLEANUP, "dropped staging table").with_table(staging),
            Err(err) => {
                SamplerEvent::warning(EVENT_CLEANUP, format!("staging table drop failed: {err}"))
                    .with_table(staging)
            }
        };
        self.events.record(&event);
    }

    /// Removes the tables, datasets and transfer configurations of a previous run.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] on the first failing warehouse or transfer call.
    pub fn cleanup_previous_run(&self) -> Result<CleanupReport, ProcessError> {
        let project = self.settings.target_project.as_str();
        let mut report = CleanupReport::default();
        let mut touched_datasets = BTreeSet::new();

        for table in self.warehouse.list_labeled_tables(project, &self.managed_labels())? {
            if self.warehouse.drop_table(&table)? {
                report.tables_dropped += 1;
                self.events.record(
                    &SamplerEvent::info(EVENT_CLEANUP, "dropped sample table").with_table(&table),
                );
            }
            touched_datasets.insert(table.dataset_id().to_string());
        }
        for dataset in touched_datasets {
            if self.warehouse.dataset_is_empty(project, &dataset)? {
                self.warehouse.delete_dataset(project, &dataset)?;
                report.datasets_deleted += 1;
                self.events.record(&SamplerEvent::info(
                    EVENT_CLEANUP,
                    format!("deleted empty dataset {project}.{dataset}"),
                ));
            }
        }
        for config in self.transfers.list_transfer_configs(project)? {
            if config.display_name.starts_with(TRANSFER_DISPLAY_PREFIX) {
                self.transfers.delete_transfer_config(&config.config_id)?;
                report.transfer_configs_deleted += 1;
                self.events.record(&SamplerEvent::info(
                    EVENT_CLEANUP,
                    format!("deleted transfer config {}", config.config_id),
                ));
            }
        }
        Ok(report)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when both locations are known and differ.
fn locations_differ(source: Option<&str>, target: Option<&str>) -> bool {
    match (source, target) {
        (Some(source), Some(target)) => !source.eq_ignore_ascii_case(target),
        _ => false,
    }
}

/// Normalizes a value into the label alphabet `[a-z0-9_-]`.
fn label_value(raw: &str) -> String {
    raw.chars()
        .map(|ch| {
            let lower = ch.to_ascii_lowercase();
            if lower.is_ascii_lowercase() || lower.is_ascii_digit() || lower == '_' || lower == '-' {
                lower
            } else {
                '_'
            }
        })
        .take(MAX_LABEL_VALUE_LENGTH)
        .collect()
}
