//! # Innate Primitives
//!
//! Hardcoded runtime constants for the Lineal CORE.
//!
//! The engine starts with zero data but fixed domain knowledge.
//! These primitives are compiled into the binary and are immutable at
//! runtime; configuration may override the rule thresholds but the
//! defaults live here, in one place.

/// Default iteration budget for the convergence pipeline.
///
/// The built-in rule set stabilizes in two iterations on well-formed
/// data; five leaves headroom for rule chains (burial -> death -> age).
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Oldest verified human lifespan in years (Jeanne Calment).
///
/// A person without a death record whose age would exceed this is
/// flagged as implausibly old.
pub const DEFAULT_DEATH_AGE_MAX: u32 = 122;

/// Minimum age at death used when inferring a death window from birth.
pub const DEFAULT_DEATH_AGE_MIN: u32 = 0;

/// Youngest plausible age for a mother at a child's birth.
pub const DEFAULT_MOTHER_AGE_MIN: u32 = 11;

/// Oldest plausible age for a mother at a child's birth.
pub const DEFAULT_MOTHER_AGE_MAX: u32 = 66;

/// Youngest plausible age for a father at a child's birth.
pub const DEFAULT_FATHER_AGE_MIN: u32 = 12;

/// Oldest plausible age for a father at a child's birth.
pub const DEFAULT_FATHER_AGE_MAX: u32 = 93;

/// Maximum days between a death and the recorded burial.
///
/// Burial customarily follows death within days; two weeks is a
/// conservative window for historical records.
pub const DEFAULT_BURIAL_TO_DEATH_MAX_DAYS: u32 = 14;

/// Default confidence attached to a death inferred from a burial.
pub const DEFAULT_DEATH_FROM_BURIAL_CONFIDENCE: f64 = 0.6;

/// Default confidence attached to parent/child bound tightening.
pub const DEFAULT_PARENT_CHILD_CONFIDENCE: f64 = 0.5;

/// Default confidence attached to a death inferred from implausible age.
pub const DEFAULT_IMPLAUSIBLE_AGE_CONFIDENCE: f64 = 0.7;

// =============================================================================
// SNAPSHOT FORMAT
// =============================================================================

/// Magic bytes for the Lineal snapshot format header.
///
/// - File Header = Magic Bytes ("LNEA") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"LNEA";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum allowed payload size for the snapshot format.
///
/// Validated BEFORE deserialization so a corrupted length cannot drive
/// an allocation-based memory exhaustion.
pub const MAX_SNAPSHOT_PAYLOAD_SIZE: usize = 256 * 1024 * 1024; // 256 MB

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of persons accepted in a single run.
pub const MAX_PEOPLE_PER_RUN: usize = 1_000_000;

/// Maximum length for person identifiers.
pub const MAX_ID_LENGTH: usize = 256;

/// Maximum length for place names and issue messages.
pub const MAX_TEXT_LENGTH: usize = 4096;

/// Bounds accepted for calendar years.
///
/// GEDCOM records predating year 1 or beyond this horizon are treated
/// as malformed by the record layer.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;
