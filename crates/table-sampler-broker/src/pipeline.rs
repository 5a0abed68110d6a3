// crates/table-sampler-broker/src/pipeline.rs
// ============================================================================
// Module: Table Sampler Local Pipeline
// Description: In-process delivery loop for published commands.
// Purpose: Run the whole sampling workflow inside one process.
// Dependencies: table-sampler-core, tokio
// ============================================================================

//! ## Overview
//! [`LocalPipeline`] owns a [`CommandProcessor`] whose publisher is a
//! [`ChannelPublisher`]. Messages published to the command topic are fed back
//! into [`CommandProcessor::process_message`] in publish order until the
//! queue is empty; messages on any other topic are handed back to the caller.
//! A failing message never stops the loop.
//!
//! The queue is drained only between messages and publishing never blocks, so
//! the messages published while handling one command must fit in the queue
//! capacity. A `START` over more dataset prefixes than the capacity, or a
//! prefix with more tables, fails with [`PublishError::Transport`] on the
//! first message that does not fit; messages queued before it still run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use table_sampler_core::BuildError;
use table_sampler_core::Command;
use table_sampler_core::CommandProcessor;
use table_sampler_core::CommandProcessorBuilder;
use table_sampler_core::ProcessError;
use table_sampler_core::PublishError;
use tokio::sync::mpsc::Receiver;

use crate::publisher::ChannelPublisher;
use crate::publisher::OutboundMessage;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default queue capacity, the largest fan-out of a single command.
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

// ============================================================================
// SECTION: Report
// ============================================================================

/// Outcome of one delivery loop run.
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Command messages handed to the processor.
    pub processed: usize,
    /// Errors returned by the processor, in processing order.
    pub failures: Vec<ProcessError>,
    /// Messages published to other topics, such as error records.
    pub forwarded: Vec<OutboundMessage>,
}

impl PipelineReport {
    /// Returns true when every processed message succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the forwarded messages published to `topic`.
    pub fn forwarded_on<'a>(&'a self, topic: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.forwarded
            .iter()
            .filter(move |outbound| outbound.topic == topic)
            .map(|outbound| &outbound.message)
    }
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Single-process delivery loop around a command processor.
///
/// One command may publish at most the queue capacity of messages; see the
/// module overview.
pub struct LocalPipeline {
    /// Processor publishing into `receiver`.
    processor: CommandProcessor,
    /// Queue of published messages.
    receiver: Receiver<OutboundMessage>,
}

impl LocalPipeline {
    /// Builds the processor with a channel publisher of [`DEFAULT_QUEUE_CAPACITY`].
    ///
    /// Any publisher already set on `builder` is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] when a collaborator is missing.
    pub fn new(builder: CommandProcessorBuilder) -> Result<Self, BuildError> {
        Self::with_capacity(builder, DEFAULT_QUEUE_CAPACITY)
    }

    /// Builds the processor with a channel publisher of `capacity` messages.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] when a collaborator is missing.
    pub fn with_capacity(
        builder: CommandProcessorBuilder,
        capacity: usize,
    ) -> Result<Self, BuildError> {
        let (publisher, receiver) = ChannelPublisher::bounded(capacity);
        let processor = builder.publisher(publisher).build()?;
        Ok(Self {
            processor,
            receiver,
        })
    }

    /// Returns the processor.
    #[must_use]
    pub const fn processor(&self) -> &CommandProcessor {
        &self.processor
    }

    /// Processes `message`, then every command it causes.
    pub fn submit(&mut self, message: &Value) -> PipelineReport {
        let mut report = PipelineReport::default();
        self.process_into(message, &mut report);
        self.drain_into(&mut report);
        report
    }

    /// Encodes and submits `command`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Encode`] when the command cannot be encoded.
    pub fn submit_command(&mut self, command: &Command) -> Result<PipelineReport, PublishError> {
        let message = command.to_message().map_err(|err| PublishError::Encode(err.to_string()))?;
        Ok(self.submit(&message))
    }

    /// Processes queued messages until the queue is empty.
    pub fn drain(&mut self) -> PipelineReport {
        let mut report = PipelineReport::default();
        self.drain_into(&mut report);
        report
    }

    /// Drains the queue into `report`.
    fn drain_into(&mut self, report: &mut PipelineReport) {
        while let Ok(outbound) = self.receiver.try_recv() {
            if outbound.topic == self.processor.settings().command_topic {
                self.process_into(&outbound.message, report);
            } else {
                report.forwarded.push(outbound);
            }
        }
    }

    /// Processes one command message into `report`.
    fn process_into(&self, message: &Value, report: &mut PipelineReport) {
        report.processed += 1;
        if let Err(err) = self.processor.process_message(message) {
            report.failures.push(err);
        }
    }
}
