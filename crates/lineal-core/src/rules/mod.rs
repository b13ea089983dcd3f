//! # Enrichment Rules
//!
//! The rule contract, the static rule registry, and the built-in rules.
//!
//! A rule reads the full overlay map, writes inferred events, tightened
//! bounds, place overrides and issues through the overlay's narrow
//! mutation API, and reports whether it changed anything. Rules must be
//! idempotent: re-applied to a stable overlay with no new evidence they
//! return `false` and record nothing.
//!
//! ## Registry
//!
//! Rules are registered explicitly, at startup, into a [`RuleRegistry`]
//! keyed by stable string id. Registration order is execution order;
//! there is no import-order-dependent self-registration, so results are
//! reproducible across runs with identical inputs and configuration.

pub mod death_from_burial;
pub mod implausible_age;
pub mod parent_child_bounds;

use crate::config::EnrichmentConfig;
use crate::hooks::RunHooks;
use crate::overlay::EnrichedPerson;
use crate::record::Person;
use crate::types::{Issue, LinealError, PersonId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// How often rule loops report progress, in persons.
pub(crate) const PROGRESS_STRIDE: usize = 100;

// =============================================================================
// RULE CONTRACT
// =============================================================================

/// Read-only context handed to every rule invocation.
pub struct RuleContext<'a> {
    /// The original, immutable source records.
    pub source: &'a BTreeMap<PersonId, Arc<Person>>,
    /// Pipeline iteration (1-based), for provenance records.
    pub iteration: u32,
    /// Progress hook. Cancellation is the pipeline's job, not the rule's.
    pub hooks: &'a dyn RunHooks,
}

/// The capability contract every enrichment rule implements.
pub trait EnrichmentRule {
    /// Stable id of this rule (registry key and provenance label).
    fn rule_id(&self) -> &'static str;

    /// Apply the rule against the current overlay state.
    ///
    /// Returns `Ok(true)` exactly when the rule wrote a new or
    /// different inferred event, tightened bound, place override or
    /// issue. Malformed input must be reported as an `error`-severity
    /// issue, not an `Err`; an `Err` is a rule fault and aborts the
    /// whole run.
    fn apply(
        &self,
        people: &mut BTreeMap<PersonId, EnrichedPerson>,
        issues: &mut Vec<Issue>,
        ctx: &RuleContext<'_>,
    ) -> Result<bool, LinealError>;
}

/// Record `issue` on the overlay and, when newly recorded there, on the
/// run-level issue sequence.
///
/// Returns whether anything was recorded. The overlay deduplicates, so
/// a rule re-reporting a standing condition is a stable no-op.
pub fn record_issue(
    person: &mut EnrichedPerson,
    run_issues: &mut Vec<Issue>,
    issue: Issue,
) -> bool {
    if person.append_issue(issue.clone()) {
        run_issues.push(issue);
        true
    } else {
        false
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Constructor for a configured rule instance.
pub type RuleConstructor =
    fn(&EnrichmentConfig) -> Result<Box<dyn EnrichmentRule>, LinealError>;

/// Explicit, ordered rule registry.
///
/// Built once at process startup. Execution order is registration
/// order, not configuration-file order.
pub struct RuleRegistry {
    entries: Vec<(&'static str, RuleConstructor)>,
}

impl RuleRegistry {
    /// An empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The registry with all built-in rules, in their canonical order.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        // Order matters: death_from_burial feeds implausible_age.
        registry.entries.push((
            death_from_burial::RULE_ID,
            death_from_burial::DeathFromBurialRule::construct,
        ));
        registry.entries.push((
            parent_child_bounds::RULE_ID,
            parent_child_bounds::ParentChildBoundsRule::construct,
        ));
        registry.entries.push((
            implausible_age::RULE_ID,
            implausible_age::ImplausibleAgeRule::construct,
        ));
        registry
    }

    /// Register a rule constructor under a stable id.
    ///
    /// Fails on duplicate ids: two rules claiming the same id would
    /// make provenance ambiguous.
    pub fn register(
        &mut self,
        rule_id: &'static str,
        constructor: RuleConstructor,
    ) -> Result<(), LinealError> {
        if self.entries.iter().any(|(id, _)| *id == rule_id) {
            return Err(LinealError::InvalidConfig(format!(
                "rule id '{rule_id}' registered twice"
            )));
        }
        self.entries.push((rule_id, constructor));
        Ok(())
    }

    /// Registered rule ids, in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    /// Is a rule id known to this registry?
    #[must_use]
    pub fn contains(&self, rule_id: &str) -> bool {
        self.entries.iter().any(|(id, _)| *id == rule_id)
    }

    /// Construct the execution list for a configuration.
    ///
    /// Enabled rules are instantiated in registration order; each rule
    /// validates its own thresholds during construction. Rule ids named
    /// in `rules_enabled` that no registered rule carries are rejected
    /// (a silently ignored toggle is a configuration error waiting to
    /// be misread).
    pub fn build(
        &self,
        config: &EnrichmentConfig,
    ) -> Result<Vec<Box<dyn EnrichmentRule>>, LinealError> {
        for id in config.rules_enabled.keys() {
            if !self.contains(id) {
                return Err(LinealError::UnknownRule(id.clone()));
            }
        }
        let mut rules = Vec::new();
        for (id, constructor) in &self.entries {
            if config.rule_enabled(id) {
                rules.push(constructor(config)?);
            }
        }
        Ok(rules)
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_register_in_canonical_order() {
        let registry = RuleRegistry::with_builtins();
        assert_eq!(
            registry.ids(),
            vec![
                "death_from_burial",
                "parent_child_bounds",
                "implausible_age"
            ]
        );
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = RuleRegistry::with_builtins();
        let result = registry.register(
            death_from_burial::RULE_ID,
            death_from_burial::DeathFromBurialRule::construct,
        );
        assert!(result.is_err());
    }

    #[test]
    fn build_respects_rule_toggles() {
        let registry = RuleRegistry::with_builtins();
        let mut config = EnrichmentConfig::with_defaults();
        config
            .rules_enabled
            .insert("parent_child_bounds".to_string(), false);

        let rules = registry.build(&config).expect("build");
        let ids: Vec<_> = rules.iter().map(|r| r.rule_id()).collect();
        assert_eq!(ids, vec!["death_from_burial", "implausible_age"]);
    }

    #[test]
    fn build_rejects_unknown_toggle() {
        let registry = RuleRegistry::with_builtins();
        let mut config = EnrichmentConfig::with_defaults();
        config
            .rules_enabled
            .insert("no_such_rule".to_string(), true);

        assert!(matches!(
            registry.build(&config),
            Err(LinealError::UnknownRule(_))
        ));
    }

    #[test]
    fn build_surfaces_invalid_rule_config() {
        let registry = RuleRegistry::with_builtins();
        let mut config = EnrichmentConfig::with_defaults();
        config.parent_child_bounds.mother_age_min = 99;

        assert!(registry.build(&config).is_err());
    }
}
