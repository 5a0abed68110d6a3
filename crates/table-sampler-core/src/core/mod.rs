// crates/table-sampler-core/src/core/mod.rs
// ============================================================================
// Module: Table Sampler Core Types
// Description: Value objects, merge protocol, compliance and command model.
// Purpose: Provide immutable, serializable types shared by every sampler stage.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Core types describe what may be sampled (policies), what is requested
//! (samples), where (table references), and the messages that drive the
//! workflow (commands). All values are immutable once constructed.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod command;
pub mod document;
pub mod error;
pub mod event;
pub mod patch;
pub mod policy;
pub mod query;
pub mod sample;
pub mod size;
pub mod table;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use command::Command;
pub use command::CommandType;
pub use command::DecodeError;
pub use command::ErrorRecord;
pub use command::PolicyPrefixCommand;
pub use command::SampleDoneCommand;
pub use command::SampleStartCommand;
pub use command::StartCommand;
pub use document::Document;
pub use document::DocumentIssues;
pub use document::ParseIssue;
pub use document::from_document;
pub use document::from_document_bytes;
pub use error::ValueError;
pub use event::EventLevel;
pub use event::SamplerEvent;
pub use patch::Patch;
pub use patch::PatchMode;
pub use policy::Policy;
pub use policy::TablePolicy;
pub use policy::compliant_sample;
pub use query::SampleQuery;
pub use query::TableInfo;
pub use query::plan_random;
pub use query::plan_sample;
pub use query::plan_sorted;
pub use query::tablesample_percent;
pub use sample::ColumnName;
pub use sample::Sample;
pub use sample::SampleKind;
pub use sample::SampleSpec;
pub use sample::SortDirection;
pub use sample::SortProperties;
pub use size::Percentage;
pub use size::SizeSpec;
pub use table::TableReference;
pub use table::TableSample;
pub use time::Timestamp;
