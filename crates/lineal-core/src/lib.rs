//! # lineal-core
//!
//! The deterministic enrichment engine for Lineal - THE LOGIC.
//!
//! This crate implements the enrichment CORE: a rule-based, iterative
//! engine that derives missing genealogical facts (event date ranges,
//! places) and flags data-quality problems over an immutable set of
//! person records.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Never mutates a source record; all derived state lives in
//!   per-person overlays
//! - Runs rules to a fixed point under an explicit iteration budget
//! - Is deterministic: identical input and configuration produce
//!   identical overlays, issues and snapshot bytes
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
pub mod dates;
pub mod export;
pub mod formats;
pub mod hooks;
pub mod overlay;
pub mod pipeline;
pub mod primitives;
pub mod record;
pub mod rules;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Confidence, EventTag, Issue, LinealError, PersonId, Provenance, Severity,
};

// =============================================================================
// RE-EXPORTS: Enrichment Engine
// =============================================================================

pub use config::{
    DeathFromBurialConfig, EnrichmentConfig, ImplausibleAgeConfig, ParentChildBoundsConfig,
};
pub use dates::{DateRange, GenDate};
pub use export::{ISSUES_CSV_HEADER, RunSummary, issues_to_csv};
pub use hooks::{NoopHooks, RunHooks};
pub use overlay::{EnrichedPerson, InferredEvent, TightenOutcome};
pub use pipeline::{EnrichmentPipeline, RunResult, TerminationReason};
pub use record::{LifeEvent, ParentRole, Person, Sex};
pub use rules::{EnrichmentRule, RuleContext, RuleRegistry};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{SnapshotHeader, result_from_bytes, result_to_bytes};
