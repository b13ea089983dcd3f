//! # Death-From-Burial Rule
//!
//! A burial record is strong evidence of a death shortly before it.
//! For a person with a dated burial and no death event (explicit or
//! inferred), this rule infers a death event in the window
//! `[burial - max_days, burial]` and carries the burial place over.
//!
//! The lower bound is left open when the burial date lacks day
//! precision: day arithmetic on `1850` or `JAN 1850` would be a guess.

use crate::config::{DeathFromBurialConfig, EnrichmentConfig};
use crate::dates::DateRange;
use crate::overlay::{EnrichedPerson, InferredEvent};
use crate::rules::{record_issue, EnrichmentRule, RuleContext, PROGRESS_STRIDE};
use crate::types::{Confidence, EventTag, Issue, LinealError, PersonId, Provenance, Severity};
use std::collections::BTreeMap;

/// Stable id of this rule.
pub const RULE_ID: &str = "death_from_burial";

/// See module docs.
pub struct DeathFromBurialRule {
    max_days: u32,
    confidence: Confidence,
    infer_event_dates: bool,
}

impl DeathFromBurialRule {
    /// Create a rule instance, validating its configuration.
    pub fn new(config: DeathFromBurialConfig) -> Result<Self, LinealError> {
        config.validate()?;
        Ok(Self {
            max_days: config.max_days,
            confidence: Confidence::new(config.confidence)?,
            infer_event_dates: config.infer_event_dates,
        })
    }

    /// Registry constructor.
    pub fn construct(
        config: &EnrichmentConfig,
    ) -> Result<Box<dyn EnrichmentRule>, LinealError> {
        Ok(Box::new(Self::new(config.death_from_burial.clone())?))
    }
}

impl EnrichmentRule for DeathFromBurialRule {
    fn rule_id(&self) -> &'static str {
        RULE_ID
    }

    fn apply(
        &self,
        people: &mut BTreeMap<PersonId, EnrichedPerson>,
        issues: &mut Vec<Issue>,
        ctx: &RuleContext<'_>,
    ) -> Result<bool, LinealError> {
        if !self.infer_event_dates {
            // This rule has nothing to say without event inference.
            return Ok(false);
        }

        let mut changed = false;
        let total = people.len();

        for (idx, (person_id, person)) in people.iter_mut().enumerate() {
            if idx % PROGRESS_STRIDE == 0 {
                ctx.hooks
                    .report_step(&format!("Applying {RULE_ID}"), idx, total);
            }

            // Never overwrite an existing death, explicit or inferred.
            if person.has_event(EventTag::Death) {
                continue;
            }
            let Some(burial) = person.explicit_event(EventTag::Burial) else {
                continue;
            };
            let Some(burial_date) = burial.date else {
                continue;
            };
            let burial_place = burial.place.clone();

            let death_range = DateRange::ending_at(burial_date, self.max_days);
            let event = InferredEvent {
                tag: EventTag::Death,
                date_range: Some(death_range),
                place: burial_place,
                confidence: self.confidence,
                provenance: Provenance::new(
                    RULE_ID,
                    ctx.iteration,
                    format!("Inferred death from burial on {burial_date}"),
                ),
            };

            if person.set_inferred_event(event) {
                changed = true;
                let issue = Issue::new(
                    "inferred_death_from_burial",
                    Severity::Info,
                    format!("Inferred death event {death_range} from burial on {burial_date}"),
                    person_id.clone(),
                );
                record_issue(person, issues, issue);
            }
        }

        Ok(changed)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::GenDate;
    use crate::hooks::NoopHooks;
    use crate::record::{LifeEvent, Person};
    use std::sync::Arc;

    fn setup(
        person: Person,
    ) -> (
        BTreeMap<PersonId, Arc<Person>>,
        BTreeMap<PersonId, EnrichedPerson>,
    ) {
        let id = person.id.clone();
        let arc = Arc::new(person);
        let source: BTreeMap<_, _> = [(id.clone(), Arc::clone(&arc))].into();
        let people: BTreeMap<_, _> = [(id, EnrichedPerson::new(arc))].into();
        (source, people)
    }

    fn apply_once(
        rule: &DeathFromBurialRule,
        source: &BTreeMap<PersonId, Arc<Person>>,
        people: &mut BTreeMap<PersonId, EnrichedPerson>,
        issues: &mut Vec<Issue>,
    ) -> bool {
        let ctx = RuleContext {
            source,
            iteration: 1,
            hooks: &NoopHooks,
        };
        rule.apply(people, issues, &ctx).expect("apply")
    }

    #[test]
    fn infers_death_window_from_dated_burial() {
        let burial = GenDate::from_ymd(1950, 1, 10).expect("date");
        let person = Person::new(PersonId::new("@I1@"))
            .with_event(EventTag::Burial, LifeEvent::dated_at(burial, "Aalborg"));
        let (source, mut people) = setup(person);
        let mut issues = Vec::new();

        let rule =
            DeathFromBurialRule::new(DeathFromBurialConfig::default()).expect("rule");
        assert!(apply_once(&rule, &source, &mut people, &mut issues));

        let overlay = people.get(&PersonId::new("@I1@")).expect("overlay");
        let death = overlay
            .inferred_events()
            .get(&EventTag::Death)
            .expect("inferred death");
        let range = death.date_range.expect("range");
        assert_eq!(range.earliest, Some(GenDate::from_ymd(1949, 12, 27).expect("date")));
        assert_eq!(range.latest, Some(burial));
        assert_eq!(death.place.as_deref(), Some("Aalborg"));
        assert_eq!(death.confidence.value(), 0.6);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, "inferred_death_from_burial");
        assert_eq!(issues[0].severity, Severity::Info);
    }

    #[test]
    fn partial_burial_date_leaves_lower_bound_open() {
        let burial = GenDate::from_year(1950).expect("year");
        let person = Person::new(PersonId::new("@I1@"))
            .with_event(EventTag::Burial, LifeEvent::dated(burial));
        let (source, mut people) = setup(person);
        let mut issues = Vec::new();

        let rule =
            DeathFromBurialRule::new(DeathFromBurialConfig::default()).expect("rule");
        assert!(apply_once(&rule, &source, &mut people, &mut issues));

        let overlay = people.get(&PersonId::new("@I1@")).expect("overlay");
        let range = overlay
            .inferred_events()
            .get(&EventTag::Death)
            .and_then(|e| e.date_range)
            .expect("range");
        assert_eq!(range.earliest, None);
        assert_eq!(range.latest, Some(burial));
    }

    #[test]
    fn skips_person_with_explicit_death() {
        let person = Person::new(PersonId::new("@I1@"))
            .with_event(
                EventTag::Burial,
                LifeEvent::dated(GenDate::from_ymd(1950, 1, 10).expect("date")),
            )
            .with_event(
                EventTag::Death,
                LifeEvent::dated(GenDate::from_ymd(1950, 1, 8).expect("date")),
            );
        let (source, mut people) = setup(person);
        let mut issues = Vec::new();

        let rule =
            DeathFromBurialRule::new(DeathFromBurialConfig::default()).expect("rule");
        assert!(!apply_once(&rule, &source, &mut people, &mut issues));
        assert!(issues.is_empty());
    }

    #[test]
    fn second_application_is_stable() {
        let person = Person::new(PersonId::new("@I1@")).with_event(
            EventTag::Burial,
            LifeEvent::dated(GenDate::from_ymd(1950, 1, 10).expect("date")),
        );
        let (source, mut people) = setup(person);
        let mut issues = Vec::new();

        let rule =
            DeathFromBurialRule::new(DeathFromBurialConfig::default()).expect("rule");
        assert!(apply_once(&rule, &source, &mut people, &mut issues));
        assert!(!apply_once(&rule, &source, &mut people, &mut issues));
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn inference_disabled_writes_nothing() {
        let person = Person::new(PersonId::new("@I1@")).with_event(
            EventTag::Burial,
            LifeEvent::dated(GenDate::from_ymd(1950, 1, 10).expect("date")),
        );
        let (source, mut people) = setup(person);
        let mut issues = Vec::new();

        let config = DeathFromBurialConfig {
            infer_event_dates: false,
            ..DeathFromBurialConfig::default()
        };
        let rule = DeathFromBurialRule::new(config).expect("rule");
        assert!(!apply_once(&rule, &source, &mut people, &mut issues));
        let overlay = people.get(&PersonId::new("@I1@")).expect("overlay");
        assert!(overlay.inferred_events().is_empty());
    }
}
