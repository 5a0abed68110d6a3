// crates/table-sampler-core/src/runtime/clock.rs
// ============================================================================
// Module: Table Sampler Clocks
// Description: System and fixed clock implementations.
// Purpose: Supply sample start/end times through an injectable seam.
// Dependencies: crate::interfaces, time
// ============================================================================

//! ## Overview
//! [`SystemClock`] reads UTC wall-clock time; [`FixedClock`] returns a constant
//! and keeps tests deterministic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::OffsetDateTime;

use crate::core::time::Timestamp;
use crate::interfaces::Clock;

// ============================================================================
// SECTION: Clocks
// ============================================================================

/// UTC wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let seconds = OffsetDateTime::now_utc().unix_timestamp();
        u64::try_from(seconds)
            .ok()
            .and_then(|seconds| Timestamp::new(seconds).ok())
            .unwrap_or(Timestamp::MIN)
    }
}

/// Clock returning a constant time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}
