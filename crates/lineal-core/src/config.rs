//! # Configuration
//!
//! Typed, validated configuration for the enrichment pipeline.
//!
//! Each rule gets its own config struct with its thresholds, its
//! confidence, and whether it may write inferred event dates (versus
//! only bounds and issues). Validation runs once, at construction,
//! before any person is processed: an invalid threshold combination
//! never reaches a rule.

use crate::primitives::{
    DEFAULT_BURIAL_TO_DEATH_MAX_DAYS, DEFAULT_DEATH_AGE_MAX, DEFAULT_DEATH_AGE_MIN,
    DEFAULT_DEATH_FROM_BURIAL_CONFIDENCE, DEFAULT_FATHER_AGE_MAX, DEFAULT_FATHER_AGE_MIN,
    DEFAULT_IMPLAUSIBLE_AGE_CONFIDENCE, DEFAULT_MAX_ITERATIONS, DEFAULT_MOTHER_AGE_MAX,
    DEFAULT_MOTHER_AGE_MIN, DEFAULT_PARENT_CHILD_CONFIDENCE, MAX_YEAR, MIN_YEAR,
};
use crate::types::{Confidence, LinealError};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// PER-RULE CONFIGS
// =============================================================================

/// Tunables for the death-from-burial rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeathFromBurialConfig {
    /// Maximum days between death and the recorded burial.
    pub max_days: u32,
    /// Confidence attached to the inferred death event.
    pub confidence: f64,
    /// Whether the rule may write an inferred death event at all.
    pub infer_event_dates: bool,
}

impl Default for DeathFromBurialConfig {
    fn default() -> Self {
        Self {
            max_days: DEFAULT_BURIAL_TO_DEATH_MAX_DAYS,
            confidence: DEFAULT_DEATH_FROM_BURIAL_CONFIDENCE,
            infer_event_dates: true,
        }
    }
}

impl DeathFromBurialConfig {
    /// Validate threshold combinations.
    pub fn validate(&self) -> Result<(), LinealError> {
        Confidence::new(self.confidence)?;
        Ok(())
    }
}

/// Tunables for the parent/child age-bound rule.
///
/// Ages are role-specific: gestation bounds the mother's age range
/// more tightly than the father's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParentChildBoundsConfig {
    /// Youngest plausible age for a mother at a child's birth.
    pub mother_age_min: u32,
    /// Oldest plausible age for a mother at a child's birth.
    pub mother_age_max: u32,
    /// Youngest plausible age for a father at a child's birth.
    pub father_age_min: u32,
    /// Oldest plausible age for a father at a child's birth.
    pub father_age_max: u32,
    /// Confidence attached to tightened bounds.
    pub confidence: f64,
    /// Whether the rule may tighten date bounds (issues are always on).
    pub infer_event_dates: bool,
}

impl Default for ParentChildBoundsConfig {
    fn default() -> Self {
        Self {
            mother_age_min: DEFAULT_MOTHER_AGE_MIN,
            mother_age_max: DEFAULT_MOTHER_AGE_MAX,
            father_age_min: DEFAULT_FATHER_AGE_MIN,
            father_age_max: DEFAULT_FATHER_AGE_MAX,
            confidence: DEFAULT_PARENT_CHILD_CONFIDENCE,
            infer_event_dates: true,
        }
    }
}

impl ParentChildBoundsConfig {
    /// Validate threshold combinations.
    ///
    /// Ages above the supported year range would overflow the year
    /// arithmetic in the rule, so they are rejected here with the rest
    /// of the threshold checks.
    pub fn validate(&self) -> Result<(), LinealError> {
        if self.mother_age_min > self.mother_age_max {
            return Err(LinealError::InvalidConfig(format!(
                "mother_age_min {} > mother_age_max {}",
                self.mother_age_min, self.mother_age_max
            )));
        }
        if self.father_age_min > self.father_age_max {
            return Err(LinealError::InvalidConfig(format!(
                "father_age_min {} > father_age_max {}",
                self.father_age_min, self.father_age_max
            )));
        }
        for (name, value) in [
            ("mother_age_max", self.mother_age_max),
            ("father_age_max", self.father_age_max),
        ] {
            if value > MAX_YEAR as u32 {
                return Err(LinealError::InvalidConfig(format!(
                    "{name} {value} exceeds supported maximum {MAX_YEAR}"
                )));
            }
        }
        Confidence::new(self.confidence)?;
        Ok(())
    }
}

/// Tunables for the implausible-age rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImplausibleAgeConfig {
    /// Oldest plausible age; older undeceased persons are flagged.
    pub death_age_max: u32,
    /// Earliest plausible age at death for the inferred window.
    pub death_age_min: u32,
    /// The "today" used for age-if-alive. Defaults to the wall-clock
    /// year but is explicit so runs are reproducible.
    pub current_year: i32,
    /// Confidence attached to the inferred death event.
    pub confidence: f64,
    /// Whether the rule may infer a death event, or only flag.
    pub infer_event_dates: bool,
}

impl Default for ImplausibleAgeConfig {
    fn default() -> Self {
        Self {
            death_age_max: DEFAULT_DEATH_AGE_MAX,
            death_age_min: DEFAULT_DEATH_AGE_MIN,
            current_year: chrono::Utc::now().year(),
            confidence: DEFAULT_IMPLAUSIBLE_AGE_CONFIDENCE,
            infer_event_dates: true,
        }
    }
}

impl ImplausibleAgeConfig {
    /// Validate threshold combinations.
    pub fn validate(&self) -> Result<(), LinealError> {
        if self.death_age_min > self.death_age_max {
            return Err(LinealError::InvalidConfig(format!(
                "death_age_min {} > death_age_max {}",
                self.death_age_min, self.death_age_max
            )));
        }
        if self.death_age_max > MAX_YEAR as u32 {
            return Err(LinealError::InvalidConfig(format!(
                "death_age_max {} exceeds supported maximum {MAX_YEAR}",
                self.death_age_max
            )));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&self.current_year) {
            return Err(LinealError::InvalidConfig(format!(
                "current_year {} outside supported range",
                self.current_year
            )));
        }
        Confidence::new(self.confidence)?;
        Ok(())
    }
}

// =============================================================================
// ENRICHMENT CONFIG
// =============================================================================

/// Complete configuration for an enrichment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichmentConfig {
    /// Iteration budget for the convergence loop.
    pub max_iterations: u32,
    /// Per-rule on/off switches. Absent means enabled.
    pub rules_enabled: BTreeMap<String, bool>,
    /// Death-from-burial rule settings.
    pub death_from_burial: DeathFromBurialConfig,
    /// Parent/child bounds rule settings.
    pub parent_child_bounds: ParentChildBoundsConfig,
    /// Implausible-age rule settings.
    pub implausible_age: ImplausibleAgeConfig,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            rules_enabled: BTreeMap::new(),
            death_from_burial: DeathFromBurialConfig::default(),
            parent_child_bounds: ParentChildBoundsConfig::default(),
            implausible_age: ImplausibleAgeConfig::default(),
        }
    }
}

impl EnrichmentConfig {
    /// Configuration with compiled-in defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Is a rule enabled? Default: enabled unless explicitly false.
    #[must_use]
    pub fn rule_enabled(&self, rule_id: &str) -> bool {
        self.rules_enabled.get(rule_id).copied().unwrap_or(true)
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), LinealError> {
        if self.max_iterations == 0 {
            return Err(LinealError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        self.death_from_burial.validate()?;
        self.parent_child_bounds.validate()?;
        self.implausible_age.validate()?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
