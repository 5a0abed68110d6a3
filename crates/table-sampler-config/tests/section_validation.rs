//! Section validation tests for table-sampler-config.
// crates/table-sampler-config/tests/section_validation.rs
// =============================================================================
// Module: Section Validation Tests
// Description: Validate storage, topic, target, staging and logging constraints.
// Purpose: Ensure each section rejects values the runtime cannot use.
// =============================================================================

use table_sampler_config::LogSink;

mod common;

type TestResult = Result<(), String>;

#[test]
fn storage_rejects_blank_bucket() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.request_bucket = "   ".to_string();
    common::assert_invalid(config.validate(), "storage.request_bucket must be non-empty")
}

#[test]
fn storage_rejects_absolute_lock_object() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.sampling_lock_object = "/sampling.lock".to_string();
    common::assert_invalid(config.validate(), "storage.sampling_lock_object")
}

#[test]
fn topics_must_differ() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.topics.error = config.topics.command.clone();
    common::assert_invalid(config.validate(), "must differ")
}

#[test]
fn target_rejects_dotted_project() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.target.project = "acme.samples".to_string();
    common::assert_invalid(config.validate(), "target.project contains forbidden characters")
}

#[test]
fn target_rejects_uppercase_labels() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.target.labels.insert("team".to_string(), "DataPlatform".to_string());
    common::assert_invalid(config.validate(), "target.labels value")
}

#[test]
fn target_rejects_too_many_labels() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    for index in 0 .. 65 {
        config.target.labels.insert(format!("label{index}"), "x".to_string());
    }
    common::assert_invalid(config.validate(), "exceeds 64 entries")
}

#[test]
fn staging_rejects_dotted_suffix() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.staging.dataset_suffix = ".stage".to_string();
    common::assert_invalid(config.validate(), "staging.dataset_suffix")
}

#[test]
fn file_sink_requires_path() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.logging.sink = LogSink::File;
    common::assert_invalid(config.validate(), "requires path")?;
    config.logging.path = Some("events.jsonl".to_string());
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn stderr_sink_rejects_path() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.logging.path = Some("events.jsonl".to_string());
    common::assert_invalid(config.validate(), "only valid with sink")
}

#[test]
fn settings_trim_names() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.target.location = Some(" US ".to_string());
    config.topics.transfer_notification = Some("transfers ".to_string());
    let settings = config.settings();
    if settings.target_location.as_deref() != Some("US")
        || settings.transfer_notification_topic.as_deref() != Some("transfers")
    {
        return Err(format!("names were not trimmed: {settings:?}"));
    }
    Ok(())
}
