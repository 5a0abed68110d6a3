// crates/table-sampler-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for table-sampler-config.
// =============================================================================

//! ## Overview
//! Minimal TOML fixtures, temporary config files and the invalid-config
//! assertion.

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::fs;
use std::path::PathBuf;

use table_sampler_config::ConfigError;
use table_sampler_config::SamplerConfig;
use tempfile::TempDir;

/// Smallest valid configuration.
pub const MINIMAL_TOML: &str = r#"
[storage]
policy_bucket = "policies"
request_bucket = "requests"

[target]
project = "samples"
"#;

/// Returns the minimal config with all defaults applied.
pub fn minimal_config() -> Result<SamplerConfig, ConfigError> {
    SamplerConfig::from_toml(MINIMAL_TOML)
}

/// Writes `content` to a config file inside a fresh temp dir.
pub fn write_config(content: &[u8]) -> Result<(TempDir, PathBuf), String> {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("table-sampler.toml");
    fs::write(&path, content).map_err(|err| err.to_string())?;
    Ok((dir, path))
}

/// Checks that `result` failed with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
