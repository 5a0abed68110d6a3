// crates/table-sampler-core/src/core/patch.rs
// ============================================================================
// Module: Table Sampler Patch Protocol
// Description: Null-filling composition of two values of the same type.
// Purpose: Combine specific values with their fallbacks without mutation.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Every value object can be patched with a fallback of the same type. Two
//! strategies exist and are selected per type through [`Patch::MODE`]:
//!
//! - [`PatchMode::Substitution`]: an empty value is replaced by the fallback as
//!   a whole; a non-empty value is kept as a whole.
//! - [`PatchMode::Merge`]: absent fields are filled from the fallback field by
//!   field. Only [`crate::core::Policy`] uses this mode.
//!
//! Both strategies return a new value and leave their inputs untouched.

// ============================================================================
// SECTION: Patch Mode
// ============================================================================

/// Strategy used by [`Patch::patch_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchMode {
    /// Whole-object replacement when empty.
    Substitution,
    /// Field-by-field fill of absent fields.
    Merge,
}

// ============================================================================
// SECTION: Patch Trait
// ============================================================================

/// Composition of a value with a fallback of the same type.
pub trait Patch: Clone {
    /// Strategy applied by [`Patch::patch_with`].
    const MODE: PatchMode = PatchMode::Substitution;

    /// Returns true when every field is absent.
    fn is_empty(&self) -> bool;

    /// Fills absent fields from `fallback`, keeping present ones.
    ///
    /// Types without nested fields keep `self` unchanged.
    #[must_use]
    fn merge_fields(&self, _fallback: &Self) -> Self {
        self.clone()
    }

    /// Patches `self` with `fallback` according to [`Patch::MODE`].
    #[must_use]
    fn patch_with(&self, fallback: &Self) -> Self {
        match Self::MODE {
            PatchMode::Substitution => {
                if self.is_empty() {
                    fallback.clone()
                } else {
                    self.clone()
                }
            }
            PatchMode::Merge => self.merge_fields(fallback),
        }
    }
}

// ============================================================================
// SECTION: Field Helpers
// ============================================================================

/// Returns true when an optional field is absent or holds an empty value.
#[must_use]
pub fn is_vacant<T: Patch>(field: Option<&T>) -> bool {
    field.is_none_or(Patch::is_empty)
}

/// Patches an optional field with its fallback using the field type's mode.
#[must_use]
pub fn patch_field<T: Patch>(value: Option<&T>, fallback: Option<&T>) -> Option<T> {
    match (value, fallback) {
        (Some(value), Some(fallback)) => Some(value.patch_with(fallback)),
        (Some(value), None) => Some(value.clone()),
        (None, fallback) => fallback.cloned(),
    }
}

/// Field-merges an optional field with its fallback regardless of mode.
#[must_use]
pub fn merge_field<T: Patch>(value: Option<&T>, fallback: Option<&T>) -> Option<T> {
    match (value, fallback) {
        (Some(value), Some(fallback)) => Some(value.merge_fields(fallback)),
        (Some(value), None) => Some(value.clone()),
        (None, fallback) => fallback.cloned(),
    }
}
