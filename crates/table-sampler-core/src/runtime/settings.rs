// crates/table-sampler-core/src/runtime/settings.rs
// ============================================================================
// Module: Table Sampler Runtime Settings
// Description: Process-wide settings passed into the command processor.
// Purpose: Replace hidden global configuration with one explicit value.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! [`SamplerSettings`] is built once at process start (usually from the TOML
//! configuration) and handed to the processor by value. Handlers only read it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::interfaces::Labels;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default object holding the bucket-wide default policy.
pub const DEFAULT_POLICY_OBJECT: &str = "default_policy.json";
/// Default object whose presence pauses sampling.
pub const DEFAULT_SAMPLING_LOCK_OBJECT: &str = "sampling.lock";
/// Default topic carrying workflow commands.
pub const DEFAULT_COMMAND_TOPIC: &str = "table-sampler-commands";
/// Default topic carrying error records.
pub const DEFAULT_ERROR_TOPIC: &str = "table-sampler-errors";
/// Default suffix appended to staging dataset ids.
pub const DEFAULT_STAGING_DATASET_SUFFIX: &str = "_staging";

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Runtime settings shared by every handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerSettings {
    /// Bucket holding the default and table-specific policies.
    pub policy_bucket: String,
    /// Bucket holding sample requests and the sampling lock.
    pub request_bucket: String,
    /// Object path of the default policy in the policy bucket.
    pub default_policy_object: String,
    /// Object path of the sampling lock in the request bucket.
    pub sampling_lock_object: String,
    /// Topic for workflow commands.
    pub command_topic: String,
    /// Topic for error records.
    pub error_topic: String,
    /// Topic notified by cross-location transfers.
    pub transfer_notification_topic: Option<String>,
    /// Project receiving sampled tables.
    pub target_project: String,
    /// Location of target tables; the source location when absent.
    pub target_location: Option<String>,
    /// Extra labels attached to every table the sampler creates.
    pub labels: Labels,
    /// Drop existing target tables before sampling.
    pub recreate_table: bool,
    /// Suffix appended to the dataset id of staging tables.
    pub staging_dataset_suffix: String,
    /// Drop staging tables once their transfer reports completion.
    pub drop_staging_after_transfer: bool,
}

impl SamplerSettings {
    /// Creates settings with default object names, topics and staging options.
    #[must_use]
    pub fn new(
        policy_bucket: impl Into<String>,
        request_bucket: impl Into<String>,
        target_project: impl Into<String>,
    ) -> Self {
        Self {
            policy_bucket: policy_bucket.into(),
            request_bucket: request_bucket.into(),
            default_policy_object: DEFAULT_POLICY_OBJECT.to_string(),
            sampling_lock_object: DEFAULT_SAMPLING_LOCK_OBJECT.to_string(),
            command_topic: DEFAULT_COMMAND_TOPIC.to_string(),
            error_topic: DEFAULT_ERROR_TOPIC.to_string(),
            transfer_notification_topic: None,
            target_project: target_project.into(),
            target_location: None,
            labels: Labels::new(),
            recreate_table: true,
            staging_dataset_suffix: DEFAULT_STAGING_DATASET_SUFFIX.to_string(),
            drop_staging_after_transfer: true,
        }
    }
}
