// crates/table-sampler-core/src/core/document.rs
// ============================================================================
// Module: Table Sampler Documents
// Description: Lenient JSON document parsing for policies and sample requests.
// Purpose: Degrade malformed storage objects to less specific values.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Policy and sample request objects are read from storage and may be
//! malformed. Parsing is field by field: a field that fails to convert becomes
//! absent and a [`ParseIssue`] is recorded, so a bad field never discards its
//! siblings. Callers decide how to surface the collected issues.
//!
//! Strict (fail-fast) decoding of the same types is available through their
//! serde implementations and is used for command messages.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Path label used for the document root.
pub const ROOT_PATH: &str = "$";

// ============================================================================
// SECTION: Issues
// ============================================================================

/// A single field that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    /// Dotted path of the offending field.
    pub path: String,
    /// Human-readable reason.
    pub message: String,
}

/// Issues collected while parsing one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentIssues {
    /// Issues in encounter order.
    issues: Vec<ParseIssue>,
}

impl DocumentIssues {
    /// Creates an empty issue collector.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            issues: Vec::new(),
        }
    }

    /// Records an issue at `path`.
    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ParseIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Returns true when no issue was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns the number of recorded issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Iterates over recorded issues.
    pub fn iter(&self) -> impl Iterator<Item = &ParseIssue> {
        self.issues.iter()
    }

    /// Consumes the collector and returns the issues.
    #[must_use]
    pub fn into_vec(self) -> Vec<ParseIssue> {
        self.issues
    }
}

// ============================================================================
// SECTION: Document Trait
// ============================================================================

/// Lenient two-way conversion between a value object and a JSON document.
pub trait Document: Sized {
    /// Parses a document value located at `path`.
    ///
    /// Returns `None` when the value cannot yield a usable object at all.
    fn parse_document(value: &Value, path: &str, issues: &mut DocumentIssues) -> Option<Self>;

    /// Renders the value as a document with explicit nulls for absent fields.
    fn to_document(&self) -> Value;
}

/// Parses a document value, falling back to the empty value.
#[must_use]
pub fn from_document<T: Document + Default>(value: &Value, issues: &mut DocumentIssues) -> T {
    T::parse_document(value, ROOT_PATH, issues).unwrap_or_default()
}

/// Parses raw document bytes, falling back to the empty value on any failure.
#[must_use]
pub fn from_document_bytes<T: Document + Default>(bytes: &[u8], issues: &mut DocumentIssues) -> T {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => from_document(&value, issues),
        Err(err) => {
            issues.push(ROOT_PATH, format!("invalid json: {err}"));
            T::default()
        }
    }
}

// ============================================================================
// SECTION: Field Helpers
// ============================================================================

/// Returns the object fields of `value`, recording an issue otherwise.
pub(crate) fn object_fields<'a>(
    value: &'a Value,
    path: &str,
    issues: &mut DocumentIssues,
) -> Option<&'a Map<String, Value>> {
    if let Value::Object(fields) = value {
        return Some(fields);
    }
    issues.push(path, "expected an object");
    None
}

/// Joins a parent path and a field name.
pub(crate) fn field_path(parent: &str, name: &str) -> String {
    format!("{parent}.{name}")
}

/// Reads a leaf field through its serde implementation.
///
/// Absent and null fields yield `None` without an issue.
pub(crate) fn read_field<T: DeserializeOwned>(
    fields: &Map<String, Value>,
    name: &str,
    path: &str,
    issues: &mut DocumentIssues,
) -> Option<T> {
    let value = fields.get(name).filter(|value| !value.is_null())?;
    match T::deserialize(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            issues.push(field_path(path, name), err.to_string());
            None
        }
    }
}

/// Reads a nested document field.
pub(crate) fn read_document_field<T: Document>(
    fields: &Map<String, Value>,
    name: &str,
    path: &str,
    issues: &mut DocumentIssues,
) -> Option<T> {
    let value = fields.get(name).filter(|value| !value.is_null())?;
    T::parse_document(value, &field_path(path, name), issues)
}
