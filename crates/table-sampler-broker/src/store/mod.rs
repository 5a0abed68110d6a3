// crates/table-sampler-broker/src/store/mod.rs
// ============================================================================
// Module: Table Sampler Object Stores
// Description: Reference object store backends.
// Purpose: Serve policy and request documents from local storage.
// Dependencies: table-sampler-core
// ============================================================================

//! ## Overview
//! Object store backends for running the sampler outside a cloud bucket
//! service. [`FileObjectStore`] maps each bucket to a directory.

mod file;

pub use file::FileObjectStore;
pub use file::MAX_OBJECT_BYTES;
