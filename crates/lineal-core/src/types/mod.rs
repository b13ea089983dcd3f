//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the Lineal enrichment
//! engine:
//! - Person and event identifiers (`PersonId`, `EventTag`)
//! - The data-quality finding model (`Issue`, `Severity`)
//! - The derivation record attached to every inference (`Provenance`)
//! - Confidence values (`Confidence`)
//! - Error types (`LinealError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module implement `Ord` where they are used as map
//! keys, so every collection in the engine iterates in a stable order.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Stable external identifier for a person record.
///
/// Carries the source system's cross-reference id (a GEDCOM xref such
/// as `@I42@`). The engine never synthesizes ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    /// Create a new person id from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed identifier for a life event kind.
///
/// A closed enum rather than free-form strings: every rule and every
/// overlay map is keyed by one of these, and `Ord` gives deterministic
/// iteration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EventTag {
    Birth,
    Baptism,
    Death,
    Burial,
    Marriage,
    Residence,
}

impl EventTag {
    /// Lowercase tag name, matching the source record vocabulary.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Birth => "birth",
            Self::Baptism => "baptism",
            Self::Death => "death",
            Self::Burial => "burial",
            Self::Marriage => "marriage",
            Self::Residence => "residence",
        }
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SEVERITY & ISSUES
// =============================================================================

/// Severity of a data-quality finding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Lowercase severity name, as used in the issue export.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable data-quality finding.
///
/// Issues are expected, non-fatal output: a rule that detects a problem
/// records an Issue rather than raising an error. Messages must be a
/// single line (the issue export is one row per issue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Machine-readable issue kind, e.g. `parent_too_young`.
    pub issue_type: String,
    /// How serious the finding is.
    pub severity: Severity,
    /// Human-readable single-line description.
    pub message: String,
    /// The person the finding is about.
    pub person_id: PersonId,
    /// Other persons involved (e.g. the child for a parent-age issue).
    pub related_person_ids: Vec<PersonId>,
}

impl Issue {
    /// Create a new issue with no related persons.
    ///
    /// Newlines in the message are replaced with spaces so the issue
    /// export invariant (one row per issue) holds by construction.
    #[must_use]
    pub fn new(
        issue_type: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        person_id: PersonId,
    ) -> Self {
        Self {
            issue_type: issue_type.into(),
            severity,
            message: single_line(message.into()),
            person_id,
            related_person_ids: Vec::new(),
        }
    }

    /// Attach related person ids, preserving the given order.
    #[must_use]
    pub fn with_related(mut self, related: Vec<PersonId>) -> Self {
        self.related_person_ids = related;
        self
    }
}

fn single_line(s: String) -> String {
    if s.contains('\n') || s.contains('\r') {
        s.replace(['\n', '\r'], " ")
    } else {
        s
    }
}

// =============================================================================
// PROVENANCE
// =============================================================================

/// Immutable record of *why* a value was inferred.
///
/// Attached to every inferred event and every tightened bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Stable id of the rule that produced the value.
    pub rule_id: String,
    /// Pipeline iteration (1-based) in which the value was produced.
    pub iteration: u32,
    /// Human-readable derivation note.
    pub note: String,
}

impl Provenance {
    /// Create a new provenance record.
    #[must_use]
    pub fn new(rule_id: impl Into<String>, iteration: u32, note: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            iteration,
            note: single_line(note.into()),
        }
    }
}

// =============================================================================
// CONFIDENCE
// =============================================================================

/// Engine trust in an inferred value, in `[0, 1]`.
///
/// Confidence is set by rule configuration, not computed statistically.
/// Values outside the unit interval are a configuration error, rejected
/// before the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Stored data goes through the same gate as configuration.
        let value = f64::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

impl Confidence {
    /// Create a confidence value, rejecting anything outside `[0, 1]`.
    pub fn new(value: f64) -> Result<Self, LinealError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(LinealError::InvalidConfig(format!(
                "confidence {value} outside [0, 1]"
            )))
        }
    }

    /// Get the raw value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Lineal engine.
///
/// - Data-quality problems are NOT errors; they surface as [`Issue`]s.
/// - Configuration problems are detected at rule construction, before
///   any person is processed.
/// - A rule fault aborts the whole run and propagates to the caller.
#[derive(Debug, Error)]
pub enum LinealError {
    /// Invalid configuration (bad threshold combination, confidence
    /// outside [0, 1], zero iteration budget).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A rule id requested by the configuration is not registered.
    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    /// An unexpected defect inside a rule implementation.
    #[error("Rule '{rule_id}' faulted: {message}")]
    RuleFault {
        /// The rule that faulted.
        rule_id: String,
        /// What went wrong.
        message: String,
    },

    /// The input exceeds the per-run person limit.
    #[error("Input of {0} persons exceeds the per-run limit")]
    PersonLimitExceeded(usize),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred (app layer wraps std::io errors here).
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
