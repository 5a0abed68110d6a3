// crates/table-sampler-core/src/runtime/processor.rs
// ============================================================================
// Module: Table Sampler Command Processor
// Description: Command state machine driving the sampling workflow.
// Purpose: Dispatch commands, publish successors and report failures.
// Dependencies: crate::core, crate::interfaces, serde_json, thiserror
// ============================================================================

//! ## Overview
//! One invocation processes one command:
//! - `START`: abort on the sampling lock, clean up the previous run, then emit
//!   one `SAMPLE_POLICY_PREFIX` per `project/dataset/` prefix.
//! - `SAMPLE_POLICY_PREFIX`: resolve every table under the prefix and emit one
//!   `SAMPLE_START` per table. Table failures are isolated and reported
//!   together once every table was attempted.
//! - `SAMPLE_START`: execute the sample and emit `SAMPLE_DONE`, also when the
//!   sample failed.
//! - `SAMPLE_DONE`: terminal; logged.
//!
//! Any handler failure is published to the error topic as an
//! [`ErrorRecord`] and then returned to the transport, which owns retries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::core::command::Command;
use crate::core::command::CommandType;
use crate::core::command::ErrorRecord;
use crate::core::command::PolicyPrefixCommand;
use crate::core::command::SampleDoneCommand;
use crate::core::command::SampleStartCommand;
use crate::core::command::StartCommand;
use crate::core::event::EVENT_CLEANUP;
use crate::core::event::EVENT_COMMAND_COMPLETED;
use crate::core::event::EVENT_COMMAND_FAILED;
use crate::core::event::EVENT_COMMAND_RECEIVED;
use crate::core::event::EVENT_SAMPLE_DONE;
use crate::core::event::EVENT_SAMPLING_INTERRUPTED;
use crate::core::event::EVENT_TABLE_FAILED;
use crate::core::event::SamplerEvent;
use crate::core::policy::Policy;
use crate::core::table::TableReference;
use crate::core::time::Timestamp;
use crate::interfaces::Clock;
use crate::interfaces::EventSink;
use crate::interfaces::ObjectStore;
use crate::interfaces::PublishError;
use crate::interfaces::Publisher;
use crate::interfaces::TransferService;
use crate::interfaces::Warehouse;
use crate::runtime::clock::SystemClock;
use crate::runtime::discovery::Discovery;
use crate::runtime::discovery::LocationCache;
use crate::runtime::error::ProcessError;
use crate::runtime::error::TableFailure;
use crate::runtime::executor::QueryExecutor;
use crate::runtime::memory::NoopEventSink;
use crate::runtime::settings::SamplerSettings;

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Errors returned while assembling a processor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A required collaborator was not supplied.
    #[error("processor collaborator is not configured: {0}")]
    MissingCollaborator(&'static str),
}

/// Builder for a [`CommandProcessor`].
#[derive(Default)]
pub struct CommandProcessorBuilder {
    /// Runtime settings.
    settings: Option<SamplerSettings>,
    /// Policy and request storage.
    store: Option<Arc<dyn ObjectStore>>,
    /// Warehouse holding the tables.
    warehouse: Option<Arc<dyn Warehouse>>,
    /// Cross-location transfer service.
    transfers: Option<Arc<dyn TransferService>>,
    /// Message transport.
    publisher: Option<Arc<dyn Publisher>>,
    /// Structured event sink.
    events: Option<Arc<dyn EventSink>>,
    /// Wall clock.
    clock: Option<Arc<dyn Clock>>,
}

impl CommandProcessorBuilder {
    /// Sets the runtime settings.
    #[must_use]
    pub fn settings(mut self, settings: SamplerSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Sets the object store.
    #[must_use]
    pub fn object_store(mut self, store: impl ObjectStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Sets the warehouse.
    #[must_use]
    pub fn warehouse(mut self, warehouse: impl Warehouse + 'static) -> Self {
        self.warehouse = Some(Arc::new(warehouse));
        self
    }

    /// Sets the transfer service.
    #[must_use]
    pub fn transfers(mut self, transfers: impl TransferService + 'static) -> Self {
        self.transfers = Some(Arc::new(transfers));
        self
    }

    /// Sets the publisher.
    #[must_use]
    pub fn publisher(mut self, publisher: impl Publisher + 'static) -> Self {
        self.publisher = Some(Arc::new(publisher));
        self
    }

    /// Sets a shared publisher.
    #[must_use]
    pub fn shared_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Sets the event sink; events are discarded when unset.
    #[must_use]
    pub fn events(mut self, events: impl EventSink + 'static) -> Self {
        self.events = Some(Arc::new(events));
        self
    }

    /// Sets a shared event sink.
    #[must_use]
    pub fn shared_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// Sets the clock; the system clock is used when unset.
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Builds the processor.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingCollaborator`] when a required part is unset.
    pub fn build(self) -> Result<CommandProcessor, BuildError> {
        Ok(CommandProcessor {
            settings: self.settings.ok_or(BuildError::MissingCollaborator("settings"))?,
            store: self.store.ok_or(BuildError::MissingCollaborator("object store"))?,
            warehouse: self.warehouse.ok_or(BuildError::MissingCollaborator("warehouse"))?,
            transfers: self.transfers.ok_or(BuildError::MissingCollaborator("transfer service"))?,
            publisher: self.publisher.ok_or(BuildError::MissingCollaborator("publisher"))?,
            events: self.events.unwrap_or_else(|| Arc::new(NoopEventSink)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            locations: LocationCache::new(),
        })
    }
}

// ============================================================================
// SECTION: Processor
// ============================================================================

/// Command state machine for the sampling workflow.
pub struct CommandProcessor {
    /// Runtime settings.
    settings: SamplerSettings,
    /// Policy and request storage.
    store: Arc<dyn ObjectStore>,
    /// Warehouse holding the tables.
    warehouse: Arc<dyn Warehouse>,
    /// Cross-location transfer service.
    transfers: Arc<dyn TransferService>,
    /// Message transport.
    publisher: Arc<dyn Publisher>,
    /// Structured event sink.
    events: Arc<dyn EventSink>,
    /// Wall clock.
    clock: Arc<dyn Clock>,
    /// Dataset location cache shared by invocations.
    locations: LocationCache,
}

impl CommandProcessor {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> CommandProcessorBuilder {
        CommandProcessorBuilder::default()
    }

    /// Returns the runtime settings.
    #[must_use]
    pub const fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    /// Decodes and processes one raw message.
    ///
    /// Undecodable messages are reported to the error topic with the raw
    /// message before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] when decoding or handling fails.
    pub fn process_message(&self, message: &Value) -> Result<(), ProcessError> {
        match Command::decode(message) {
            Ok(command) => self.process(&command),
            Err(err) => {
                let err = ProcessError::from(err);
                self.events.record(&SamplerEvent::error(EVENT_COMMAND_FAILED, err.to_string()));
                self.report_failure(message.clone(), &err);
                Err(err)
            }
        }
    }

    /// Processes one command.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] after publishing an error record.
    pub fn process(&self, command: &Command) -> Result<(), ProcessError> {
        let kind = command.command_type();
        self.events.record(&with_table(
            SamplerEvent::info(EVENT_COMMAND_RECEIVED, format!("timestamp {}", command.timestamp()))
                .with_command(kind),
            command.table(),
        ));
        let result = match command {
            Command::Start(start) => self.handle_start(start),
            Command::SamplePolicyPrefix(prefix) => self.handle_policy_prefix(prefix),
            Command::SampleStart(start) => self.handle_sample_start(start),
            Command::SampleDone(done) => {
                self.handle_sample_done(done);
                Ok(())
            }
        };
        match &result {
            Ok(()) => self.events.record(&with_table(
                SamplerEvent::info(EVENT_COMMAND_COMPLETED, "command completed").with_command(kind),
                command.table(),
            )),
            Err(err) => {
                self.events.record(&with_table(
                    SamplerEvent::error(EVENT_COMMAND_FAILED, err.to_string()).with_command(kind),
                    command.table(),
                ));
                let message = command.to_message().unwrap_or(Value::Null);
                self.report_failure(message, err);
            }
        }
        result
    }

    /// Handles `START`.
    fn handle_start(&self, command: &StartCommand) -> Result<(), ProcessError> {
        let discovery = self.discovery();
        if discovery.sampling_locked()? {
            self.events.record(
                &SamplerEvent::warning(EVENT_SAMPLING_INTERRUPTED, "sampling lock present")
                    .with_command(CommandType::Start),
            );
            return Err(ProcessError::Interrupted(self.settings.sampling_lock_object.clone()));
        }
        let report = self.executor().cleanup_previous_run()?;
        self.events.record(
            &SamplerEvent::info(
                EVENT_CLEANUP,
                format!(
                    "previous run removed: {} tables, {} datasets, {} transfer configs",
                    report.tables_dropped, report.datasets_deleted, report.transfer_configs_deleted
                ),
            )
            .with_command(CommandType::Start),
        );
        for prefix in discovery.policy_prefixes()? {
            self.publish(PolicyPrefixCommand {
                timestamp: command.timestamp,
                prefix,
            })?;
        }
        Ok(())
    }

    /// Handles `SAMPLE_POLICY_PREFIX`.
    fn handle_policy_prefix(&self, command: &PolicyPrefixCommand) -> Result<(), ProcessError> {
        let discovery = self.discovery();
        let default = discovery.default_policy();
        let mut failures = Vec::new();
        for table in discovery.table_references(&command.prefix)? {
            let outcome = self
                .sample_start_for(&discovery, &table, &default, command.timestamp)
                .and_then(|start| self.publish(start));
            if let Err(err) = outcome {
                self.events.record(
                    &SamplerEvent::error(EVENT_TABLE_FAILED, err.to_string())
                        .with_command(CommandType::SamplePolicyPrefix)
                        .with_table(&table),
                );
                failures.push(TableFailure {
                    table: table.fully_qualified_id(),
                    error: err.to_string(),
                });
            }
        }
        if failures.is_empty() { Ok(()) } else { Err(ProcessError::TableFailures(failures)) }
    }

    /// Builds the `SAMPLE_START` command of one table.
    fn sample_start_for(
        &self,
        discovery: &Discovery<'_>,
        table: &TableReference,
        default: &Policy,
        timestamp: Timestamp,
    ) -> Result<SampleStartCommand, ProcessError> {
        let table_policy = discovery.resolve_table_policy(table, default)?;
        let request = discovery.resolve_sample_request(&table_policy)?;
        let row_count = self.warehouse.row_count(&table_policy.table_reference)?;
        let compliant = table_policy.compliant_sample(&request, row_count)?;
        let target_table = self.executor().target_table(&compliant.table_reference)?;
        Ok(SampleStartCommand {
            timestamp,
            sample_request: compliant,
            target_table,
        })
    }

    /// Handles `SAMPLE_START`.
    fn handle_sample_start(&self, command: &SampleStartCommand) -> Result<(), ProcessError> {
        let start_timestamp = self.clock.now();
        let outcome = self.executor().execute(command);
        let end_timestamp = self.clock.now();
        let report = outcome
            .as_ref()
            .map(|outcome| outcome.amount_inserted)
            .map_err(ToString::to_string);
        self.publish(SampleDoneCommand::from_start(command, start_timestamp, end_timestamp, report))?;
        outcome.map(|_| ())
    }

    /// Handles `SAMPLE_DONE`.
    fn handle_sample_done(&self, command: &SampleDoneCommand) {
        let table = &command.sample_request.table_reference;
        let event = match (&command.error_message, command.amount_inserted) {
            (Some(message), _) => SamplerEvent::error(EVENT_SAMPLE_DONE, message.clone()),
            (None, amount) => SamplerEvent::info(
                EVENT_SAMPLE_DONE,
                format!(
                    "inserted {} of {} requested rows into {}",
                    amount.unwrap_or(0),
                    command.sample_request.sample.count(),
                    command.target_table
                ),
            ),
        };
        self.events.record(
            &event.with_command(CommandType::SampleDone).with_table(table),
        );
    }

    /// Publishes a successor command to the command topic.
    fn publish(&self, command: impl Into<Command>) -> Result<(), ProcessError> {
        let message = command
            .into()
            .to_message()
            .map_err(|err| PublishError::Encode(err.to_string()))?;
        self.publisher.publish(&self.settings.command_topic, &message)?;
        Ok(())
    }

    /// Publishes an error record; a failing error channel is only logged.
    fn report_failure(&self, command: Value, err: &ProcessError) {
        let record = ErrorRecord::new(command, err.to_string());
        let published = serde_json::to_value(&record)
            .map_err(|encode| PublishError::Encode(encode.to_string()))
            .and_then(|message| self.publisher.publish(&self.settings.error_topic, &message));
        if let Err(publish_err) = published {
            self.events.record(&SamplerEvent::error(
                EVENT_COMMAND_FAILED,
                format!("error record not published: {publish_err}"),
            ));
        }
    }

    /// Returns a discovery view over the collaborators.
    fn discovery(&self) -> Discovery<'_> {
        Discovery::new(
            self.store.as_ref(),
            self.warehouse.as_ref(),
            self.events.as_ref(),
            &self.settings,
            &self.locations,
        )
    }

    /// Returns an executor over the collaborators.
    fn executor(&self) -> QueryExecutor<'_> {
        QueryExecutor::new(
            self.warehouse.as_ref(),
            self.transfers.as_ref(),
            self.events.as_ref(),
            &self.settings,
        )
    }
}

/// Tags an event with an optional table.
fn with_table(event: SamplerEvent, table: Option<&TableReference>) -> SamplerEvent {
    match table {
        Some(table) => event.with_table(table),
        None => event,
    }
}
