//! # Parent/Child Bounds Rule
//!
//! A child with a known birth constrains when each linked parent can
//! have been born: a parent is at least `min_age` and at most `max_age`
//! years old at the child's birth, with role-specific constants
//! (mothers are bounded by gestation, fathers less tightly).
//!
//! For every such pair the rule intersects the parent's birth bound
//! with `[child_earliest - max_age, child_latest - min_age]`, where
//! the child's birth may itself be a range (explicit, inferred, or a
//! bound tightened in an earlier iteration). When the parent's
//! *recorded* birth falls outside the freshly computed window it
//! additionally emits a `parent_too_young` / `parent_too_old` warning
//! naming both persons.

use crate::config::{EnrichmentConfig, ParentChildBoundsConfig};
use crate::dates::{DateRange, GenDate};
use crate::overlay::{EnrichedPerson, TightenOutcome};
use crate::record::{ParentRole, Sex};
use crate::rules::{record_issue, EnrichmentRule, RuleContext, PROGRESS_STRIDE};
use crate::types::{EventTag, Issue, LinealError, PersonId, Provenance, Severity};
use std::collections::BTreeMap;

/// Stable id of this rule.
pub const RULE_ID: &str = "parent_child_bounds";

/// See module docs.
pub struct ParentChildBoundsRule {
    config: ParentChildBoundsConfig,
}

impl ParentChildBoundsRule {
    /// Create a rule instance, validating its configuration.
    pub fn new(config: ParentChildBoundsConfig) -> Result<Self, LinealError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Registry constructor.
    pub fn construct(
        config: &EnrichmentConfig,
    ) -> Result<Box<dyn EnrichmentRule>, LinealError> {
        Ok(Box::new(Self::new(config.parent_child_bounds.clone())?))
    }

    /// Role constants for a parent: recorded sex wins, the edge role
    /// decides when the sex is unrecorded.
    fn role_bounds(&self, sex: Option<Sex>, edge: ParentRole) -> (u32, u32, &'static str) {
        match (sex, edge) {
            (Some(Sex::Female), _) | (None, ParentRole::Mother) => (
                self.config.mother_age_min,
                self.config.mother_age_max,
                "mother",
            ),
            (Some(Sex::Male), _) | (None, ParentRole::Father) => (
                self.config.father_age_min,
                self.config.father_age_max,
                "father",
            ),
        }
    }
}

impl EnrichmentRule for ParentChildBoundsRule {
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
        let child_ids: Vec<PersonId> = people.keys().cloned().collect();

        for (idx, child_id) in child_ids.iter().enumerate() {
            if idx % PROGRESS_STRIDE == 0 {
                ctx.hooks
                    .report_step(&format!("Applying {RULE_ID}"), idx, total);
            }

            // Read the child first; parents are mutated below, so the
            // child borrow cannot be held across the parent loop.
            let (child_earliest, child_latest, parent_edges) = {
                let Some(child) = people.get(child_id) else {
                    continue;
                };
                let Some(birth) = child.birth_range() else {
                    continue;
                };
                let edges: Vec<(ParentRole, PersonId)> = child
                    .person()
                    .parents()
                    .map(|(role, id)| (role, id.clone()))
                    .collect();
                (
                    birth.earliest.map(|d| d.year),
                    birth.latest.map(|d| d.year),
                    edges,
                )
            };
            if child_latest.is_none() && child_earliest.is_none() {
                continue;
            }

            for (edge_role, parent_id) in parent_edges {
                let Some(parent) = people.get_mut(&parent_id) else {
                    // Dangling parent link: the relationship graph is
                    // given, so this is a data-quality finding.
                    continue;
                };
                let (min_age, max_age, role_name) =
                    self.role_bounds(parent.person().sex, edge_role);

                // Parent at least min_age, at most max_age at the
                // child's birth. Each endpoint of the child's birth
                // range constrains one side; an open side stays open.
                let bound = DateRange::new(
                    child_earliest
                        .and_then(|year| GenDate::from_year(year - max_age as i32).ok()),
                    child_latest
                        .and_then(|year| GenDate::from_year(year - min_age as i32).ok()),
                );
                if bound.is_unbounded() {
                    continue;
                }

                // Flag a recorded birth that contradicts the window.
                if let Some(recorded_birth) =
                    parent.explicit_event(EventTag::Birth).and_then(|e| e.date)
                {
                    if let Some(latest) = bound.latest
                        && recorded_birth > latest
                        && let Some(child_year) = child_latest
                    {
                        let issue = Issue::new(
                            "parent_too_young",
                            Severity::Warning,
                            format!(
                                "{role_name} {parent_id} born {recorded_birth} would be under \
                                 {min_age} at the birth of child {child_id} ({child_year})",
                            ),
                            parent_id.clone(),
                        )
                        .with_related(vec![child_id.clone()]);
                        changed |= record_issue(parent, issues, issue);
                    }
                    if let Some(earliest) = bound.earliest
                        && recorded_birth < earliest
                        && let Some(child_year) = child_earliest
                    {
                        let issue = Issue::new(
                            "parent_too_old",
                            Severity::Warning,
                            format!(
                                "{role_name} {parent_id} born {recorded_birth} would be over \
                                 {max_age} at the birth of child {child_id} ({child_year})",
                            ),
                            parent_id.clone(),
                        )
                        .with_related(vec![child_id.clone()]);
                        changed |= record_issue(parent, issues, issue);
                    }
                }

                if !self.config.infer_event_dates {
                    continue;
                }
                let provenance = Provenance::new(
                    RULE_ID,
                    ctx.iteration,
                    format!(
                        "{role_name} of {child_id}, aged {min_age}..={max_age} at the child's birth"
                    ),
                );
                match parent.tighten_bound(EventTag::Birth, bound, &provenance) {
                    TightenOutcome::Tightened => changed = true,
                    TightenOutcome::Unchanged => {}
                    TightenOutcome::Conflict(new_issue) => {
                        if let Some(issue) = new_issue {
                            issues.push(issue);
                            changed = true;
                        }
                    }
                }
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
    use crate::hooks::NoopHooks;
    use crate::record::{LifeEvent, Person};
    use std::sync::Arc;

    fn y(year: i32) -> GenDate {
        GenDate::from_year(year).expect("year")
    }

    fn family(mother_birth: Option<i32>, child_birth: i32) -> BTreeMap<PersonId, EnrichedPerson> {
        let mother_id = PersonId::new("@M@");
        let child_id = PersonId::new("@C@");

        let mut mother = Person::new(mother_id.clone());
        mother.sex = Some(Sex::Female);
        if let Some(year) = mother_birth {
            mother = mother.with_event(EventTag::Birth, LifeEvent::dated(y(year)));
        }

        let mut child =
            Person::new(child_id.clone()).with_event(EventTag::Birth, LifeEvent::dated(y(child_birth)));
        child.mother = Some(mother_id.clone());

        [
            (mother_id, EnrichedPerson::new(Arc::new(mother))),
            (child_id, EnrichedPerson::new(Arc::new(child))),
        ]
        .into()
    }

    fn apply_once(
        rule: &ParentChildBoundsRule,
        people: &mut BTreeMap<PersonId, EnrichedPerson>,
        issues: &mut Vec<Issue>,
    ) -> bool {
        let source = BTreeMap::new();
        let ctx = RuleContext {
            source: &source,
            iteration: 1,
            hooks: &NoopHooks,
        };
        rule.apply(people, issues, &ctx).expect("apply")
    }

    #[test]
    fn tightens_mother_birth_bound() {
        let mut people = family(None, 1975);
        let mut issues = Vec::new();
        let rule =
            ParentChildBoundsRule::new(ParentChildBoundsConfig::default()).expect("rule");

        assert!(apply_once(&rule, &mut people, &mut issues));

        let mother = people.get(&PersonId::new("@M@")).expect("mother");
        let bound = mother
            .date_bounds()
            .get(&EventTag::Birth)
            .expect("birth bound");
        // mother aged 11..=66 at 1975: born between 1909 and 1964
        assert_eq!(bound.earliest, Some(y(1909)));
        assert_eq!(bound.latest, Some(y(1964)));
        assert!(issues.is_empty());
    }

    #[test]
    fn flags_mother_too_young() {
        let mut people = family(Some(1966), 1975);
        let mut issues = Vec::new();
        let rule =
            ParentChildBoundsRule::new(ParentChildBoundsConfig::default()).expect("rule");

        assert!(apply_once(&rule, &mut people, &mut issues));

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, "parent_too_young");
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].person_id, PersonId::new("@M@"));
        assert_eq!(issues[0].related_person_ids, vec![PersonId::new("@C@")]);
    }

    #[test]
    fn flags_parent_too_old() {
        let mut people = family(Some(1900), 1975);
        let mut issues = Vec::new();
        let rule =
            ParentChildBoundsRule::new(ParentChildBoundsConfig::default()).expect("rule");

        assert!(apply_once(&rule, &mut people, &mut issues));

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, "parent_too_old");
    }

    #[test]
    fn plausible_parent_age_raises_no_issue() {
        let mut people = family(Some(1950), 1975);
        let mut issues = Vec::new();
        let rule =
            ParentChildBoundsRule::new(ParentChildBoundsConfig::default()).expect("rule");

        apply_once(&rule, &mut people, &mut issues);
        assert!(issues.is_empty());
    }

    #[test]
    fn repeated_application_converges() {
        let mut people = family(Some(1966), 1975);
        let mut issues = Vec::new();
        let rule =
            ParentChildBoundsRule::new(ParentChildBoundsConfig::default()).expect("rule");

        assert!(apply_once(&rule, &mut people, &mut issues));
        assert!(!apply_once(&rule, &mut people, &mut issues));
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn unknown_sex_uses_edge_role() {
        let mother_id = PersonId::new("@M@");
        let child_id = PersonId::new("@C@");
        let mother = Person::new(mother_id.clone()); // no sex recorded
        let mut child = Person::new(child_id.clone())
            .with_event(EventTag::Birth, LifeEvent::dated(y(1975)));
        child.mother = Some(mother_id.clone());

        let mut people: BTreeMap<_, _> = [
            (mother_id.clone(), EnrichedPerson::new(Arc::new(mother))),
            (child_id, EnrichedPerson::new(Arc::new(child))),
        ]
        .into();
        let mut issues = Vec::new();
        let rule =
            ParentChildBoundsRule::new(ParentChildBoundsConfig::default()).expect("rule");
        apply_once(&rule, &mut people, &mut issues);

        let bound = people
            .get(&mother_id)
            .and_then(|m| m.date_bounds().get(&EventTag::Birth).copied())
            .expect("bound");
        // Mother edge, so mother constants despite missing sex
        assert_eq!(bound.latest, Some(y(1964)));
    }

    #[test]
    fn bounds_disabled_still_flags() {
        let mut people = family(Some(1966), 1975);
        let mut issues = Vec::new();
        let config = ParentChildBoundsConfig {
            infer_event_dates: false,
            ..ParentChildBoundsConfig::default()
        };
        let rule = ParentChildBoundsRule::new(config).expect("rule");

        assert!(apply_once(&rule, &mut people, &mut issues));
        assert_eq!(issues.len(), 1);
        let mother = people.get(&PersonId::new("@M@")).expect("mother");
        assert!(mother.date_bounds().is_empty());
    }
}
