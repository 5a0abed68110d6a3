// crates/table-sampler-core/src/core/sample.rs
// ============================================================================
// Module: Table Sampler Samples
// Description: Sampling intent: how many rows and in which order.
// Purpose: Model sample requests independently of any specific table.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Sample`] pairs a [`SizeSpec`] with a [`SampleSpec`]. The [`SampleSpec`] selects a
//! random sample or a sample sorted by a validated column. Enum values are
//! looked up case-insensitively through static variant tables.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use serde_json::Value;
use serde_json::json;

use crate::core::document::Document;
use crate::core::document::DocumentIssues;
use crate::core::document::object_fields;
use crate::core::document::read_document_field;
use crate::core::document::read_field;
use crate::core::error::ValueError;
use crate::core::patch::Patch;
use crate::core::patch::is_vacant;
use crate::core::patch::patch_field;
use crate::core::size::SizeSpec;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum column name length accepted for sorted samples.
pub const MAX_COLUMN_NAME_LENGTH: usize = 300;

// ============================================================================
// SECTION: Enum Lookup
// ============================================================================

/// Finds a variant by case-insensitive name in a static table.
fn lookup_variant<T: Copy>(table: &[(&str, T)], raw: &str) -> Option<T> {
    let wanted = raw.trim();
    table.iter().find(|(name, _)| name.eq_ignore_ascii_case(wanted)).map(|(_, variant)| *variant)
}

// ============================================================================
// SECTION: Sample Kind
// ============================================================================

/// Sampling strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum SampleKind {
    /// Probabilistic sample.
    #[default]
    Random,
    /// First rows ordered by a column.
    Sorted,
}

/// Variant table for [`SampleKind`].
const SAMPLE_KIND_VARIANTS: &[(&str, SampleKind)] =
    &[("random", SampleKind::Random), ("sorted", SampleKind::Sorted)];

impl SampleKind {
    /// Parses a kind case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidEnum`] for unknown names.
    pub fn parse(raw: &str) -> Result<Self, ValueError> {
        lookup_variant(SAMPLE_KIND_VARIANTS, raw)
            .ok_or_else(|| ValueError::InvalidEnum(format!("unknown sample type: {raw}")))
    }

    /// Returns the canonical wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Sorted => "sorted",
        }
    }
}

impl TryFrom<String> for SampleKind {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl Serialize for SampleKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Sort Direction
// ============================================================================

/// Ordering direction for sorted samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// Variant table for [`SortDirection`].
const SORT_DIRECTION_VARIANTS: &[(&str, SortDirection)] =
    &[("ASC", SortDirection::Asc), ("DESC", SortDirection::Desc)];

impl SortDirection {
    /// Parses a direction case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidEnum`] for unknown names.
    pub fn parse(raw: &str) -> Result<Self, ValueError> {
        lookup_variant(SORT_DIRECTION_VARIANTS, raw)
            .ok_or_else(|| ValueError::InvalidEnum(format!("unknown sort direction: {raw}")))
    }

    /// Returns the canonical wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl TryFrom<String> for SortDirection {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl Serialize for SortDirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Column Name
// ============================================================================

/// Column identifier that is safe to interpolate into a statement.
///
/// # Invariants
/// - Trimmed, non-empty, at most [`MAX_COLUMN_NAME_LENGTH`] characters.
/// - Matches `[A-Za-z_][A-Za-z0-9_]*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnName(String);

impl ColumnName {
    /// Creates a validated column name.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidIdentifier`] when validation fails.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValueError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValueError::InvalidIdentifier("column name is empty".to_string()));
        }
        if trimmed.len() > MAX_COLUMN_NAME_LENGTH {
            return Err(ValueError::InvalidIdentifier(format!(
                "column name exceeds {MAX_COLUMN_NAME_LENGTH} characters"
            )));
        }
        let mut chars = trimmed.chars();
        let leading_ok = chars.next().is_some_and(|first| first.is_ascii_alphabetic() || first == '_');
        if !leading_ok || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return Err(ValueError::InvalidIdentifier(format!("invalid column name: {trimmed}")));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the column name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ColumnName {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ColumnName> for String {
    fn from(value: ColumnName) -> Self {
        value.0
    }
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Sample Spec
// ============================================================================

/// Sort column and direction for sorted samples.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortProperties {
    /// Column to order by.
    pub by: ColumnName,
    /// Ordering direction.
    pub direction: SortDirection,
}

impl SortProperties {
    /// Creates sort properties.
    #[must_use]
    pub const fn new(by: ColumnName, direction: SortDirection) -> Self {
        Self {
            by,
            direction,
        }
    }
}

/// Unvalidated wire form of [`SampleSpec`].
#[derive(Deserialize)]
struct RawSampleSpec {
    /// Sampling strategy; random when absent.
    #[serde(rename = "type", default)]
    kind: SampleKind,
    /// Sort properties.
    #[serde(default)]
    properties: Option<SortProperties>,
}

/// Sampling strategy plus its parameters.
///
/// # Invariants
/// - `properties` is present iff `kind` is [`SampleKind::Sorted`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSampleSpec")]
pub struct SampleSpec {
    /// Sampling strategy.
    #[serde(rename = "type")]
    kind: SampleKind,
    /// Sort properties for sorted samples.
    properties: Option<SortProperties>,
}

impl SampleSpec {
    /// Creates a sample spec, enforcing the kind/properties invariant.
    ///
    /// Properties given for a random spec are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::MissingSortProperties`] for a sorted spec without properties.
    pub fn new(kind: SampleKind, properties: Option<SortProperties>) -> Result<Self, ValueError> {
        match kind {
            SampleKind::Random => Ok(Self::random()),
            SampleKind::Sorted => properties
                .map(Self::sorted)
                .ok_or(ValueError::MissingSortProperties),
        }
    }

    /// Creates a random sample spec.
    #[must_use]
    pub const fn random() -> Self {
        Self {
            kind: SampleKind::Random,
            properties: None,
        }
    }

    /// Creates a sorted sample spec.
    #[must_use]
    pub const fn sorted(properties: SortProperties) -> Self {
        Self {
            kind: SampleKind::Sorted,
            properties: Some(properties),
        }
    }

    /// Returns the sampling strategy.
    #[must_use]
    pub const fn kind(&self) -> SampleKind {
        self.kind
    }

    /// Returns the sort properties for sorted specs.
    #[must_use]
    pub const fn properties(&self) -> Option<&SortProperties> {
        self.properties.as_ref()
    }
}

impl TryFrom<RawSampleSpec> for SampleSpec {
    type Error = ValueError;

    fn try_from(raw: RawSampleSpec) -> Result<Self, Self::Error> {
        Self::new(raw.kind, raw.properties)
    }
}

impl Patch for SampleSpec {
    fn is_empty(&self) -> bool {
        false
    }
}

impl Document for SampleSpec {
    fn parse_document(value: &Value, path: &str, issues: &mut DocumentIssues) -> Option<Self> {
        let fields = object_fields(value, path, issues)?;
        let kind = if fields.get("type").is_none_or(Value::is_null) {
            SampleKind::Random
        } else {
            read_field::<SampleKind>(fields, "type", path, issues)?
        };
        let properties = read_field::<SortProperties>(fields, "properties", path, issues);
        match Self::new(kind, properties) {
            Ok(spec) => Some(spec),
            Err(err) => {
                issues.push(path, err.to_string());
                None
            }
        }
    }

    fn to_document(&self) -> Value {
        json!({
            "type": self.kind.as_str(),
            "properties": self.properties.as_ref().map(|properties| json!({
                "by": properties.by.as_str(),
                "direction": properties.direction.as_str(),
            })),
        })
    }
}

// ============================================================================
// SECTION: Sample
// ============================================================================

/// Sampling intent independent of any table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Requested amount.
    #[serde(default)]
    pub size: Option<SizeSpec>,
    /// Sampling strategy.
    #[serde(default)]
    pub spec: Option<SampleSpec>,
}

impl Sample {
    /// Creates a sample from its parts.
    #[must_use]
    pub const fn new(size: Option<SizeSpec>, spec: Option<SampleSpec>) -> Self {
        Self {
            size,
            spec,
        }
    }

    /// Returns the strategy, defaulting to random.
    #[must_use]
    pub fn kind(&self) -> SampleKind {
        self.spec.as_ref().map_or(SampleKind::Random, SampleSpec::kind)
    }

    /// Returns the absolute count requested, zero when absent.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.size.and_then(|size| size.count).unwrap_or(0)
    }
}

impl Patch for Sample {
    fn is_empty(&self) -> bool {
        is_vacant(self.size.as_ref()) && is_vacant(self.spec.as_ref())
    }

    fn merge_fields(&self, fallback: &Self) -> Self {
        Self {
            size: patch_field(self.size.as_ref(), fallback.size.as_ref()),
            spec: patch_field(self.spec.as_ref(), fallback.spec.as_ref()),
        }
    }
}

impl Document for Sample {
    fn parse_document(value: &Value, path: &str, issues: &mut DocumentIssues) -> Option<Self> {
        let fields = object_fields(value, path, issues)?;
        Some(Self {
            size: read_document_field(fields, "size", path, issues),
            spec: read_document_field(fields, "spec", path, issues),
        })
    }

    fn to_document(&self) -> Value {
        json!({
            "size": self.size.as_ref().map(Document::to_document),
            "spec": self.spec.as_ref().map(Document::to_document),
        })
    }
}
