//! # Convergence Pipeline
//!
//! Drives repeated rule application to a fixed point.
//!
//! `Initialize -> Iterate -> {Converged | BudgetExhausted | Cancelled}`
//!
//! Each iteration applies every enabled rule, in registry order,
//! against the current overlay state; a later rule observes an earlier
//! rule's writes from the same iteration. The pipeline halts when no
//! rule reports a change (converged), when the iteration budget runs
//! out (not an error; results are usable, just not stable), or when
//! the host requests a stop. A rule fault aborts the run and surfaces
//! to the caller.

use crate::config::EnrichmentConfig;
use crate::hooks::{NoopHooks, RunHooks};
use crate::overlay::EnrichedPerson;
use crate::primitives::MAX_PEOPLE_PER_RUN;
use crate::record::Person;
use crate::rules::{EnrichmentRule, RuleContext, RuleRegistry};
use crate::types::{Issue, LinealError, PersonId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// TERMINATION & RESULT
// =============================================================================

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// No enabled rule reported a change across a full iteration.
    Converged,
    /// The iteration budget ran out with changes still outstanding.
    BudgetExhausted,
    /// The host requested a stop; results are partial but consistent.
    Cancelled,
}

impl TerminationReason {
    /// Snake-case name, as used in summaries and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Converged => "converged",
            Self::BudgetExhausted => "budget_exhausted",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a completed run produced. Never mutated after creation.
#[derive(Debug)]
pub struct RunResult {
    /// One overlay per source person.
    pub people: BTreeMap<PersonId, EnrichedPerson>,
    /// All issues, in the order rules recorded them.
    pub issues: Vec<Issue>,
    /// Iterations actually executed.
    pub iterations: u32,
    /// How many times each rule ran, by rule id.
    pub rule_runs: BTreeMap<String, u64>,
    /// Why the run ended.
    pub termination: TerminationReason,
}

// =============================================================================
// PIPELINE
// =============================================================================

/// The enrichment pipeline: a rule list and an iteration budget.
pub struct EnrichmentPipeline {
    max_iterations: u32,
    rules: Vec<Box<dyn EnrichmentRule>>,
}

impl EnrichmentPipeline {
    /// Create a pipeline from an explicit rule list.
    pub fn new(
        max_iterations: u32,
        rules: Vec<Box<dyn EnrichmentRule>>,
    ) -> Result<Self, LinealError> {
        if max_iterations == 0 {
            return Err(LinealError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            max_iterations,
            rules,
        })
    }

    /// Create a pipeline with the built-in registry and a validated
    /// configuration.
    pub fn from_config(config: &EnrichmentConfig) -> Result<Self, LinealError> {
        config.validate()?;
        let rules = RuleRegistry::with_builtins().build(config)?;
        Self::new(config.max_iterations, rules)
    }

    /// Ids of the rules this pipeline will execute, in order.
    #[must_use]
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.rule_id()).collect()
    }

    /// Run to a fixed point with no hooks.
    pub fn run(
        &self,
        source: &BTreeMap<PersonId, Arc<Person>>,
    ) -> Result<RunResult, LinealError> {
        self.run_with_hooks(source, &NoopHooks)
    }

    /// Run to a fixed point.
    ///
    /// The source records are shared, never copied and never mutated;
    /// every person gets a fresh overlay. Cancellation is checked once
    /// per iteration, so a stop request still finishes the iteration
    /// in flight.
    pub fn run_with_hooks(
        &self,
        source: &BTreeMap<PersonId, Arc<Person>>,
        hooks: &dyn RunHooks,
    ) -> Result<RunResult, LinealError> {
        if source.len() > MAX_PEOPLE_PER_RUN {
            return Err(LinealError::PersonLimitExceeded(source.len()));
        }

        // Initialize: wrap every source person into a fresh overlay.
        let mut people: BTreeMap<PersonId, EnrichedPerson> = source
            .iter()
            .map(|(id, person)| (id.clone(), EnrichedPerson::new(Arc::clone(person))))
            .collect();
        let mut issues: Vec<Issue> = Vec::new();
        let mut rule_runs: BTreeMap<String, u64> = BTreeMap::new();

        let mut iterations = 0;
        let mut termination = TerminationReason::BudgetExhausted;

        for iteration in 1..=self.max_iterations {
            if hooks.stop_requested() {
                termination = TerminationReason::Cancelled;
                break;
            }
            hooks.report_step(
                &format!("Enrichment iteration {iteration}/{}", self.max_iterations),
                iteration as usize,
                self.max_iterations as usize,
            );

            let ctx = RuleContext {
                source,
                iteration,
                hooks,
            };
            let mut any_changed = false;
            for rule in &self.rules {
                let changed = rule.apply(&mut people, &mut issues, &ctx)?;
                *rule_runs.entry(rule.rule_id().to_string()).or_insert(0) += 1;
                any_changed |= changed;
            }

            iterations = iteration;
            if !any_changed {
                termination = TerminationReason::Converged;
                break;
            }
        }

        Ok(RunResult {
            people,
            issues,
            iterations,
            rule_runs,
            termination,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
