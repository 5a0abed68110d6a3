// crates/table-sampler-config/src/config.rs
// ============================================================================
// Module: Table Sampler Configuration
// Description: Configuration loading and validation for the table sampler.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: table-sampler-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed; the processor never starts
//! with a partially understood config.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use table_sampler_core::SamplerSettings;
use table_sampler_core::runtime::settings::DEFAULT_COMMAND_TOPIC;
use table_sampler_core::runtime::settings::DEFAULT_ERROR_TOPIC;
use table_sampler_core::runtime::settings::DEFAULT_POLICY_OBJECT;
use table_sampler_core::runtime::settings::DEFAULT_SAMPLING_LOCK_OBJECT;
use table_sampler_core::runtime::settings::DEFAULT_STAGING_DATASET_SUFFIX;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "table-sampler.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "TABLE_SAMPLER_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of bucket, object and topic names.
pub(crate) const MAX_NAME_LENGTH: usize = 1024;
/// Maximum number of extra labels.
pub(crate) const MAX_LABELS: usize = 64;
/// Maximum length of a label key or value.
pub(crate) const MAX_LABEL_LENGTH: usize = 63;
/// Characters never accepted in project ids and locations.
const FORBIDDEN_IDENTIFIER_CHARS: &[char] = &['.', '/', '@', '`'];

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Table sampler configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerConfig {
    /// Policy and request storage.
    pub storage: StorageConfig,
    /// Message topics.
    #[serde(default)]
    pub topics: TopicsConfig,
    /// Target project for sampled tables.
    pub target: TargetConfig,
    /// Cross-location staging.
    #[serde(default)]
    pub staging: StagingConfig,
    /// Structured event logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SamplerConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is the explicit `path`, else `TABLE_SAMPLER_CONFIG`, else
    /// `table-sampler.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.validate()?;
        self.topics.validate()?;
        self.target.validate()?;
        self.staging.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Converts the configuration into processor settings.
    #[must_use]
    pub fn settings(&self) -> SamplerSettings {
        let mut settings = SamplerSettings::new(
            self.storage.policy_bucket.trim(),
            self.storage.request_bucket.trim(),
            self.target.project.trim(),
        );
        settings.default_policy_object = self.storage.default_policy_object.trim().to_string();
        settings.sampling_lock_object = self.storage.sampling_lock_object.trim().to_string();
        settings.command_topic = self.topics.command.trim().to_string();
        settings.error_topic = self.topics.error.trim().to_string();
        settings.transfer_notification_topic =
            self.topics.transfer_notification.as_deref().map(str::trim).map(str::to_string);
        settings.target_location =
            self.target.location.as_deref().map(str::trim).map(str::to_string);
        settings.labels.clone_from(&self.target.labels);
        settings.recreate_table = self.target.recreate_table;
        settings.staging_dataset_suffix = self.staging.dataset_suffix.clone();
        settings.drop_staging_after_transfer = self.staging.drop_after_transfer;
        settings
    }
}

/// Policy and request bucket layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Bucket holding the default and table-specific policies.
    pub policy_bucket: String,
    /// Bucket holding sample requests and the sampling lock.
    pub request_bucket: String,
    /// Object holding the bucket default policy.
    #[serde(default = "default_policy_object")]
    pub default_policy_object: String,
    /// Object whose presence pauses sampling.
    #[serde(default = "default_sampling_lock_object")]
    pub sampling_lock_object: String,
}

impl StorageConfig {
    /// Validates storage names.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_name("storage.policy_bucket", &self.policy_bucket)?;
        validate_name("storage.request_bucket", &self.request_bucket)?;
        validate_object_name("storage.default_policy_object", &self.default_policy_object)?;
        validate_object_name("storage.sampling_lock_object", &self.sampling_lock_object)?;
        Ok(())
    }
}

/// Message topics.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopicsConfig {
    /// Topic carrying workflow commands.
    #[serde(default = "default_command_topic")]
    pub command: String,
    /// Topic carrying error records.
    #[serde(default = "default_error_topic")]
    pub error: String,
    /// Topic notified by cross-location transfers.
    #[serde(default)]
    pub transfer_notification: Option<String>,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            command: default_command_topic(),
            error: default_error_topic(),
            transfer_notification: None,
        }
    }
}

impl TopicsConfig {
    /// Validates topic names.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_name("topics.command", &self.command)?;
        validate_name("topics.error", &self.error)?;
        if self.command.trim() == self.error.trim() {
            return Err(ConfigError::Invalid(
                "topics.command and topics.error must differ".to_string(),
            ));
        }
        if let Some(topic) = &self.transfer_notification {
            validate_name("topics.transfer_notification", topic)?;
        }
        Ok(())
    }
}

/// Target project and table options.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Project receiving sampled tables.
    pub project: String,
    /// Location of target tables; the source location when absent.
    #[serde(default)]
    pub location: Option<String>,
    /// Extra labels attached to every created table.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Drop existing target tables before sampling.
    #[serde(default = "default_true")]
    pub recreate_table: bool,
}

impl TargetConfig {
    /// Validates the target project, location and labels.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_identifier("target.project", &self.project)?;
        if let Some(location) = &self.location {
            validate_identifier("target.location", location)?;
        }
        if self.labels.len() > MAX_LABELS {
            return Err(ConfigError::Invalid(format!(
                "target.labels exceeds {MAX_LABELS} entries"
            )));
        }
        for (key, value) in &self.labels {
            validate_label("target.labels key", key)?;
            if !key.starts_with(|ch: char| ch.is_ascii_lowercase()) {
                return Err(ConfigError::Invalid(format!(
                    "target.labels key must start with a lowercase letter: {key}"
                )));
            }
            validate_label("target.labels value", value)?;
        }
        Ok(())
    }
}

/// Cross-location staging options.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagingConfig {
    /// Suffix appended to the dataset id of staging tables.
    #[serde(default = "default_staging_suffix")]
    pub dataset_suffix: String,
    /// Drop staging tables once their transfer reports completion.
    #[serde(default = "default_true")]
    pub drop_after_transfer: bool,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            dataset_suffix: default_staging_suffix(),
            drop_after_transfer: true,
        }
    }
}

impl StagingConfig {
    /// Validates the staging suffix.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset_suffix.is_empty() {
            return Err(ConfigError::Invalid("staging.dataset_suffix must be non-empty".to_string()));
        }
        if !self.dataset_suffix.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return Err(ConfigError::Invalid(
                "staging.dataset_suffix must match [A-Za-z0-9_]+".to_string(),
            ));
        }
        Ok(())
    }
}

/// Destination of structured sampler events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogSink {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Events are discarded.
    None,
}

/// Structured event logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Event destination.
    #[serde(default)]
    pub sink: LogSink,
    /// Log file path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl LoggingConfig {
    /// Validates the sink and its path.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (LogSink::File, Some(path)) => validate_path_string("logging.path", path),
            (LogSink::File, None) => {
                Err(ConfigError::Invalid("logging sink \"file\" requires path".to_string()))
            }
            (LogSink::Stderr | LogSink::None, Some(_)) => Err(ConfigError::Invalid(
                "logging.path is only valid with sink \"file\"".to_string(),
            )),
            (LogSink::Stderr | LogSink::None, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from an explicit path or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a bucket or topic name.
fn validate_name(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    if trimmed.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
        return Err(ConfigError::Invalid(format!("{field} must not contain whitespace")));
    }
    Ok(())
}

/// Validates an object path inside a bucket.
fn validate_object_name(field: &str, value: &str) -> Result<(), ConfigError> {
    validate_name(field, value)?;
    let trimmed = value.trim();
    if trimmed.starts_with('/') || trimmed.contains('\\') {
        return Err(ConfigError::Invalid(format!(
            "{field} must be a relative path without backslashes"
        )));
    }
    if trimmed.split('/').any(|segment| segment.is_empty() || segment == "..") {
        return Err(ConfigError::Invalid(format!("{field} contains an invalid segment")));
    }
    Ok(())
}

/// Validates a project id or location.
fn validate_identifier(field: &str, value: &str) -> Result<(), ConfigError> {
    validate_name(field, value)?;
    if value.trim().contains(FORBIDDEN_IDENTIFIER_CHARS) {
        return Err(ConfigError::Invalid(format!("{field} contains forbidden characters")));
    }
    Ok(())
}

/// Validates a label key or value.
fn validate_label(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() || value.len() > MAX_LABEL_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "{field} must be 1..={MAX_LABEL_LENGTH} characters: {value}"
        )));
    }
    if !value.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-')
    {
        return Err(ConfigError::Invalid(format!("{field} must match [a-z0-9_-]: {value}")));
    }
    Ok(())
}

/// Default policy object name.
fn default_policy_object() -> String {
    DEFAULT_POLICY_OBJECT.to_string()
}

/// Default sampling lock object name.
fn default_sampling_lock_object() -> String {
    DEFAULT_SAMPLING_LOCK_OBJECT.to_string()
}

/// Default command topic.
fn default_command_topic() -> String {
    DEFAULT_COMMAND_TOPIC.to_string()
}

/// Default error topic.
fn default_error_topic() -> String {
    DEFAULT_ERROR_TOPIC.to_string()
}

/// Default staging dataset suffix.
fn default_staging_suffix() -> String {
    DEFAULT_STAGING_DATASET_SUFFIX.to_string()
}

/// Serde default for flags that are on unless disabled.
const fn default_true() -> bool {
    true
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    #[test]
    fn object_names_reject_traversal() {
        assert!(validate_object_name("f", "locks/sampling.lock").is_ok());
        assert!(validate_object_name("f", "../sampling.lock").is_err());
        assert!(validate_object_name("f", "/sampling.lock").is_err());
        assert!(validate_object_name("f", "a//b").is_err());
    }

    #[test]
    fn labels_are_lowercase() {
        assert!(validate_label("l", "data-platform_1").is_ok());
        assert!(validate_label("l", "Team").is_err());
        assert!(validate_label("l", "").is_err());
        assert!(validate_label("l", &"a".repeat(MAX_LABEL_LENGTH + 1)).is_err());
    }

    #[test]
    fn identifiers_reject_separators() {
        assert!(validate_identifier("p", "acme-samples").is_ok());
        assert!(validate_identifier("p", "acme.samples").is_err());
        assert!(validate_identifier("p", "  ").is_err());
    }

    #[test]
    fn path_components_are_limited() {
        let long = "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        assert!(validate_path_string("p", &format!("./{long}")).is_err());
        assert!(validate_path(Path::new("./events.jsonl")).is_ok());
    }
}
