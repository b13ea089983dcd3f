//! # Implausible-Age Rule
//!
//! A person with a known (or inferred) birth, no death event, and an
//! age-if-alive beyond the configured maximum is almost certainly dead
//! and missing the record. The rule flags the person with an
//! `implausible_age` warning and, when inference is enabled, infers a
//! death window of `[birth + death_age_min, birth + death_age_max]`
//! years and tightens the death bound accordingly.

use crate::config::{EnrichmentConfig, ImplausibleAgeConfig};
use crate::dates::DateRange;
use crate::overlay::{EnrichedPerson, InferredEvent, TightenOutcome};
use crate::rules::{record_issue, EnrichmentRule, RuleContext, PROGRESS_STRIDE};
use crate::types::{Confidence, EventTag, Issue, LinealError, PersonId, Provenance, Severity};
use std::collections::BTreeMap;

/// Stable id of this rule.
pub const RULE_ID: &str = "implausible_age";

/// See module docs.
pub struct ImplausibleAgeRule {
    max_age_years: u32,
    min_death_age_years: u32,
    current_year: i32,
    confidence: Confidence,
    infer_event_dates: bool,
}

impl ImplausibleAgeRule {
    /// Create a rule instance, validating its configuration.
    pub fn new(config: ImplausibleAgeConfig) -> Result<Self, LinealError> {
        config.validate()?;
        Ok(Self {
            max_age_years: config.death_age_max,
            min_death_age_years: config.death_age_min,
            current_year: config.current_year,
            confidence: Confidence::new(config.confidence)?,
            infer_event_dates: config.infer_event_dates,
        })
    }

    /// Registry constructor.
    pub fn construct(
        config: &EnrichmentConfig,
    ) -> Result<Box<dyn EnrichmentRule>, LinealError> {
        Ok(Box::new(Self::new(config.implausible_age.clone())?))
    }
}

impl EnrichmentRule for ImplausibleAgeRule {
    fn rule_id(&self) -> &'static str {
        RULE_ID
    }

    fn apply(
        &self,
        people: &mut BTreeMap<PersonId, EnrichedPerson>,
        issues: &mut Vec<Issue>,
        ctx: &RuleContext<'_>,
    ) -> Result<bool, LinealError> {
        let mut changed = false;
        let total = people.len();

        for (idx, (person_id, person)) in people.iter_mut().enumerate() {
            if idx % PROGRESS_STRIDE == 0 {
                ctx.hooks
                    .report_step(&format!("Applying {RULE_ID}"), idx, total);
            }

            // A death event, explicit or already inferred, settles it.
            if person.has_event(EventTag::Death) {
                continue;
            }
            let Some(birth_date) = person.get_event_date(EventTag::Birth) else {
                continue;
            };

            let age_if_alive = self.current_year - birth_date.year;
            if age_if_alive <= self.max_age_years as i32 {
                continue;
            }

            let mut message = format!(
                "Person would be {age_if_alive} years old if alive today (born {}), \
                 exceeding the maximum plausible age of {}",
                birth_date, self.max_age_years
            );
            if self.infer_event_dates {
                message.push_str("; inferring a death date range");
            }
            let issue = Issue::new(
                "implausible_age",
                Severity::Warning,
                message,
                person_id.clone(),
            );
            changed |= record_issue(person, issues, issue);

            if !self.infer_event_dates {
                continue;
            }
            let death_range = DateRange::spanning_years(
                birth_date,
                self.min_death_age_years as i32,
                self.max_age_years as i32,
            );
            if death_range.is_unbounded() {
                continue;
            }
            let provenance = Provenance::new(
                RULE_ID,
                ctx.iteration,
                format!("Age if alive would be {age_if_alive} years"),
            );

            match person.tighten_bound(EventTag::Death, death_range, &provenance) {
                TightenOutcome::Tightened => changed = true,
                TightenOutcome::Unchanged => {}
                TightenOutcome::Conflict(new_issue) => {
                    if let Some(conflict) = new_issue {
                        issues.push(conflict);
                        changed = true;
                    }
                }
            }

            let event = InferredEvent {
                tag: EventTag::Death,
                date_range: Some(death_range),
                place: None,
                confidence: self.confidence,
                provenance,
            };
            if person.set_inferred_event(event) {
                changed = true;
            }
        }

        Ok(changed)
    }
}

// =============================================================================
// TESTS
// =============================================================================
