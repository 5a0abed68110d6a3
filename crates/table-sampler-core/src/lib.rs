// crates/table-sampler-core/src/lib.rs
// ============================================================================
// Module: Table Sampler Core Library
// Description: Public API surface for the table sampler core.
// Purpose: Expose value objects, collaborator interfaces and the runtime.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Table sampler core resolves per-table sampling policies, computes
//! policy-compliant sample sizes and drives the asynchronous command workflow
//! that writes samples into target tables. Storage, warehouse, transfer and
//! messaging backends are reached only through the traits in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::Clock;
pub use interfaces::EventSink;
pub use interfaces::Labels;
pub use interfaces::ObjectListing;
pub use interfaces::ObjectStore;
pub use interfaces::ObjectStoreError;
pub use interfaces::PublishError;
pub use interfaces::Publisher;
pub use interfaces::TransferConfig;
pub use interfaces::TransferError;
pub use interfaces::TransferReceipt;
pub use interfaces::TransferRequest;
pub use interfaces::TransferService;
pub use interfaces::TransferStatus;
pub use interfaces::Warehouse;
pub use interfaces::WarehouseError;
pub use runtime::BuildError;
pub use runtime::CommandProcessor;
pub use runtime::CommandProcessorBuilder;
pub use runtime::FixedClock;
pub use runtime::InMemoryObjectStore;
pub use runtime::InMemoryTransferService;
pub use runtime::InMemoryWarehouse;
pub use runtime::NoopEventSink;
pub use runtime::ProcessError;
pub use runtime::RecordingEventSink;
pub use runtime::RecordingPublisher;
pub use runtime::SamplerSettings;
pub use runtime::SystemClock;
