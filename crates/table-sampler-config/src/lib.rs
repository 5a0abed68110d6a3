// crates/table-sampler-config/src/lib.rs
// ============================================================================
// Module: Table Sampler Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for table-sampler.toml semantics.
// Dependencies: table-sampler-core, serde, toml
// ============================================================================

//! ## Overview
//! `table-sampler-config` defines the configuration model for the table
//! sampler. Validation is strict and fail-closed; a validated config converts
//! into the core [`table_sampler_core::SamplerSettings`] handed to the
//! processor.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
