// crates/table-sampler-core/src/runtime/mod.rs
// ============================================================================
// Module: Table Sampler Runtime
// Description: Discovery, command processing and query execution.
// Purpose: Run the sampling workflow against injected collaborators.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the command state machine and the logic it
//! delegates to. Collaborators are injected once through
//! [`CommandProcessorBuilder`]; no module keeps global state.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod clock;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod memory;
pub mod processor;
pub mod settings;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clock::FixedClock;
pub use clock::SystemClock;
pub use discovery::Discovery;
pub use discovery::LocationCache;
pub use error::ProcessError;
pub use error::TableFailure;
pub use executor::CleanupReport;
pub use executor::QueryExecutor;
pub use executor::SampleOutcome;
pub use memory::InMemoryObjectStore;
pub use memory::InMemoryTransferService;
pub use memory::InMemoryWarehouse;
pub use memory::NoopEventSink;
pub use memory::RecordingEventSink;
pub use memory::RecordingPublisher;
pub use processor::BuildError;
pub use processor::CommandProcessor;
pub use processor::CommandProcessorBuilder;
pub use settings::SamplerSettings;
