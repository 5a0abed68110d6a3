// crates/table-sampler-core/src/core/table.rs
// ============================================================================
// Module: Table Sampler Table References
// Description: Physical table identifiers and table-bound sample requests.
// Purpose: Name tables consistently across storage paths and commands.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`TableReference`] names a physical table as `project.dataset.table`,
//! optionally pinned to a location. References are immutable; derived
//! references (for example a target in another project) are built with the
//! `with_*` helpers. The storage layout maps a reference to the object path
//! `project/dataset/table.json`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::ValueError;
use crate::core::sample::Sample;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Object suffix for policy and request documents.
pub const DOCUMENT_SUFFIX: &str = ".json";
/// Maximum length of a single identifier segment.
pub const MAX_SEGMENT_LENGTH: usize = 1024;
/// Characters that may not appear inside an identifier segment.
const FORBIDDEN_SEGMENT_CHARS: &[char] = &['.', '/', '@', '`'];

// ============================================================================
// SECTION: Table Reference
// ============================================================================

/// Unvalidated wire form of [`TableReference`].
#[derive(Deserialize)]
struct RawTableReference {
    /// Project identifier.
    project_id: String,
    /// Dataset identifier.
    dataset_id: String,
    /// Table identifier.
    table_id: String,
    /// Optional location.
    #[serde(default)]
    location: Option<String>,
}

/// Identifier of a physical table.
///
/// # Invariants
/// - Project, dataset and table ids are trimmed, non-empty and free of `.`,
///   `/`, `@`, backticks, whitespace and control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawTableReference")]
pub struct TableReference {
    /// Project identifier.
    project_id: String,
    /// Dataset identifier.
    dataset_id: String,
    /// Table identifier.
    table_id: String,
    /// Physical location, when known.
    location: Option<String>,
}

impl TableReference {
    /// Creates a validated table reference without a location.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidIdentifier`] when any segment is invalid.
    pub fn new(
        project_id: impl AsRef<str>,
        dataset_id: impl AsRef<str>,
        table_id: impl AsRef<str>,
    ) -> Result<Self, ValueError> {
        Ok(Self {
            project_id: validate_segment("project_id", project_id.as_ref())?,
            dataset_id: validate_segment("dataset_id", dataset_id.as_ref())?,
            table_id: validate_segment("table_id", table_id.as_ref())?,
            location: None,
        })
    }

    /// Parses a storage object path of the form `project/dataset/table.json`.
    ///
    /// Returns `None` for paths of any other shape and for segments with
    /// surrounding whitespace. A returned reference maps back to `path`
    /// through [`Self::object_path`].
    #[must_use]
    pub fn from_object_path(path: &str) -> Option<Self> {
        let [project, dataset, table] = object_path_segments(path)?;
        if [project, dataset, table].iter().any(|segment| segment.trim() != *segment) {
            return None;
        }
        Self::new(project, dataset, table).ok()
    }

    /// Returns true when `path` has the `project/dataset/table.json` shape,
    /// whether or not its segments are valid identifiers.
    #[must_use]
    pub fn is_table_object_path(path: &str) -> bool {
        object_path_segments(path).is_some()
    }

    /// Returns the project identifier.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Returns the dataset identifier.
    #[must_use]
    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    /// Returns the table identifier.
    #[must_use]
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// Returns the location, when known.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Returns `project.dataset.table`.
    #[must_use]
    pub fn fully_qualified_id(&self) -> String {
        format!("{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }

    /// Returns the storage object path `project/dataset/table.json`.
    #[must_use]
    pub fn object_path(&self) -> String {
        format!("{}/{}/{}{DOCUMENT_SUFFIX}", self.project_id, self.dataset_id, self.table_id)
    }

    /// Returns the dataset-level storage prefix `project/dataset/`.
    #[must_use]
    pub fn dataset_prefix(&self) -> String {
        format!("{}/{}/", self.project_id, self.dataset_id)
    }

    /// Returns a copy in another project.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidIdentifier`] when the project id is invalid.
    pub fn with_project(&self, project_id: impl AsRef<str>) -> Result<Self, ValueError> {
        Ok(Self {
            project_id: validate_segment("project_id", project_id.as_ref())?,
            ..self.clone()
        })
    }

    /// Returns a copy in another dataset.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidIdentifier`] when the dataset id is invalid.
    pub fn with_dataset(&self, dataset_id: impl AsRef<str>) -> Result<Self, ValueError> {
        Ok(Self {
            dataset_id: validate_segment("dataset_id", dataset_id.as_ref())?,
            ..self.clone()
        })
    }

    /// Returns a copy pinned to `location` (or unpinned for `None`).
    #[must_use]
    pub fn with_location(&self, location: Option<&str>) -> Self {
        Self {
            location: location.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string),
            ..self.clone()
        }
    }
}

impl TryFrom<RawTableReference> for TableReference {
    type Error = ValueError;

    fn try_from(raw: RawTableReference) -> Result<Self, Self::Error> {
        let reference = Self::new(raw.project_id, raw.dataset_id, raw.table_id)?;
        Ok(reference.with_location(raw.location.as_deref()))
    }
}

impl fmt::Display for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project_id, self.dataset_id, self.table_id)?;
        if let Some(location) = &self.location {
            write!(f, "@{location}")?;
        }
        Ok(())
    }
}

/// Splits `project/dataset/table.json` into its three raw segments.
fn object_path_segments(path: &str) -> Option<[&str; 3]> {
    let stem = path.strip_suffix(DOCUMENT_SUFFIX)?;
    let mut segments = stem.split('/');
    let (project, dataset, table) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }
    Some([project, dataset, table])
}

/// Validates and trims one identifier segment.
fn validate_segment(field: &str, raw: &str) -> Result<String, ValueError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValueError::InvalidIdentifier(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_SEGMENT_LENGTH {
        return Err(ValueError::InvalidIdentifier(format!("{field} exceeds max length")));
    }
    if trimmed.chars().any(|ch| {
        FORBIDDEN_SEGMENT_CHARS.contains(&ch) || ch.is_whitespace() || ch.is_control()
    }) {
        return Err(ValueError::InvalidIdentifier(format!(
            "{field} contains forbidden characters: {trimmed}"
        )));
    }
    Ok(trimmed.to_string())
}

// ============================================================================
// SECTION: Table Sample
// ============================================================================

/// Sample request bound to a specific table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSample {
    /// Table to sample from.
    pub table_reference: TableReference,
    /// Sampling intent.
    pub sample: Sample,
}

impl TableSample {
    /// Binds a sample to a table.
    #[must_use]
    pub const fn new(table_reference: TableReference, sample: Sample) -> Self {
        Self {
            table_reference,
            sample,
        }
    }
}
