// crates/table-sampler-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for the table sampler configuration. The example is
//! validated by the test suite so it cannot drift from the model.

/// Returns a canonical example `table-sampler.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[storage]
policy_bucket = "acme-sampling-policies"
request_bucket = "acme-sampling-requests"
default_policy_object = "default_policy.json"
sampling_lock_object = "sampling.lock"

[topics]
command = "table-sampler-commands"
error = "table-sampler-errors"
# transfer_notification = "table-sampler-transfers"

[target]
project = "acme-samples"
location = "EU"
recreate_table = true

[target.labels]
team = "data-platform"
env = "staging"

[staging]
dataset_suffix = "_staging"
drop_after_transfer = true

[logging]
sink = "file"
path = "table-sampler-events.jsonl"
"#,
    )
}
