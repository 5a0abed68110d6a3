// crates/table-sampler-broker/src/events.rs
// ============================================================================
// Module: Table Sampler Event Sinks
// Description: JSON-lines sinks for structured sampler events.
// Purpose: Route sampler events to stderr or an append-only file.
// Dependencies: table-sampler-core, table-sampler-config, serde_json
// ============================================================================

//! ## Overview
//! Each event is serialized as one JSON object per line. Sinks never fail the
//! caller: serialization and write errors drop the event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use table_sampler_config::LogSink;
use table_sampler_config::LoggingConfig;
use table_sampler_core::EventSink;
use table_sampler_core::NoopEventSink;
use table_sampler_core::SamplerEvent;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Event sink construction errors.
#[derive(Debug, Error)]
pub enum EventSinkError {
    /// Log file could not be opened.
    #[error("event log io error: {0}")]
    Io(String),
    /// Logging configuration cannot produce a sink.
    #[error("event log config error: {0}")]
    Config(String),
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Event sink writing JSON lines to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrEventSink;

impl EventSink for StderrEventSink {
    fn record(&self, event: &SamplerEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Event sink appending JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log file in append mode, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`EventSinkError::Io`] when the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, EventSinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| EventSinkError::Io(format!("{}: {err}", path.display())))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl EventSink for FileEventSink {
    fn record(&self, event: &SamplerEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

// ============================================================================
// SECTION: Factory
// ============================================================================

/// Builds the event sink selected by the logging configuration.
///
/// # Errors
///
/// Returns [`EventSinkError`] when the file sink has no path or cannot be opened.
pub fn event_sink_for(config: &LoggingConfig) -> Result<Arc<dyn EventSink>, EventSinkError> {
    match config.sink {
        LogSink::Stderr => Ok(Arc::new(StderrEventSink)),
        LogSink::None => Ok(Arc::new(NoopEventSink)),
        LogSink::File => {
            let path = config
                .path
                .as_deref()
                .ok_or_else(|| EventSinkError::Config("file sink requires path".to_string()))?;
            Ok(Arc::new(FileEventSink::new(Path::new(path))?))
        }
    }
}
