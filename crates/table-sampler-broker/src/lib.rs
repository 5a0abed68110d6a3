// crates/table-sampler-broker/src/lib.rs
// ============================================================================
// Module: Table Sampler Broker Library
// Description: Reference transports, event sinks and storage for the sampler.
// Purpose: Run the sampling workflow in one process without cloud services.
// Dependencies: table-sampler-core, table-sampler-config, serde_json, tokio
// ============================================================================

//! ## Overview
//! Table sampler broker provides ready-made [`Publisher`] implementations,
//! JSON-lines [`EventSink`] implementations, the directory-backed
//! [`FileObjectStore`] and the [`LocalPipeline`] delivery loop that feeds
//! published commands back into a [`CommandProcessor`].
//! Invariants:
//! - Publishers return `Ok` only after the message was accepted.
//! - Object reads are capped at [`MAX_OBJECT_BYTES`].
//! - Object paths never escape their bucket directory.
//!
//! [`Publisher`]: table_sampler_core::Publisher
//! [`EventSink`]: table_sampler_core::EventSink
//! [`CommandProcessor`]: table_sampler_core::CommandProcessor

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod events;
pub mod pipeline;
pub mod publisher;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use events::EventSinkError;
pub use events::FileEventSink;
pub use events::StderrEventSink;
pub use events::event_sink_for;
pub use pipeline::DEFAULT_QUEUE_CAPACITY;
pub use pipeline::LocalPipeline;
pub use pipeline::PipelineReport;
pub use publisher::CallbackPublisher;
pub use publisher::ChannelPublisher;
pub use publisher::LogPublisher;
pub use publisher::OutboundMessage;
pub use store::FileObjectStore;
pub use store::MAX_OBJECT_BYTES;
