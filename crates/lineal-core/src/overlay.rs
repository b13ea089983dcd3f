//! # Enrichment Overlay
//!
//! Per-person enrichment state layered on top of an untouched source
//! record.
//!
//! An [`EnrichedPerson`] wraps (never copies, never mutates) its source
//! [`Person`] and accumulates inferred events, tightened date bounds,
//! place overrides and issues. All mutation goes through the narrow API
//! here so the invariants are enforced in one place:
//!
//! - at most one inferred event per tag (last writer wins)
//! - bounds only ever tighten (intersection), never widen
//! - an empty intersection is reported as a conflict, not stored
//! - identical issues are recorded once per overlay

use crate::dates::{DateRange, GenDate};
use crate::record::{LifeEvent, Person};
use crate::types::{Confidence, EventTag, Issue, PersonId, Provenance, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// INFERRED EVENTS
// =============================================================================

/// An event the engine inferred rather than read from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferredEvent {
    /// The event kind.
    pub tag: EventTag,
    /// When the event is believed to have happened.
    pub date_range: Option<DateRange>,
    /// Where the event is believed to have happened.
    pub place: Option<String>,
    /// Engine trust in the inference, set by rule configuration.
    pub confidence: Confidence,
    /// Which rule, at which iteration, produced this.
    pub provenance: Provenance,
}

impl InferredEvent {
    /// True when `other` carries the same inference payload.
    ///
    /// Provenance is deliberately excluded: a rule re-deriving the same
    /// value at a later iteration is not a change, and treating it as
    /// one would keep the pipeline from converging.
    #[must_use]
    pub fn same_inference(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.date_range == other.date_range
            && self.place == other.place
            && self.confidence == other.confidence
    }
}

/// Outcome of a bound-tightening attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum TightenOutcome {
    /// The stored bound is now strictly narrower.
    Tightened,
    /// The proposed bound adds nothing; the stored bound is unchanged.
    Unchanged,
    /// The intersection was empty. The stored bound is unchanged; a
    /// `conflicting_date_bounds` warning was recorded on the overlay.
    /// Carries the issue when it is newly recorded (None when the same
    /// conflict was already reported on this overlay).
    Conflict(Option<Issue>),
}

// =============================================================================
// ENRICHED PERSON
// =============================================================================

/// The per-person overlay: source record plus enrichment state.
///
/// Created once per person at pipeline start; mutated in place by rules
/// across iterations; read-only after the pipeline returns.
#[derive(Debug, Clone)]
pub struct EnrichedPerson {
    person: Arc<Person>,
    inferred_events: BTreeMap<EventTag, InferredEvent>,
    date_bounds: BTreeMap<EventTag, DateRange>,
    place_overrides: BTreeMap<EventTag, String>,
    issues: Vec<Issue>,
}

impl EnrichedPerson {
    /// Wrap a source record in a fresh, empty overlay.
    #[must_use]
    pub fn new(person: Arc<Person>) -> Self {
        Self {
            person,
            inferred_events: BTreeMap::new(),
            date_bounds: BTreeMap::new(),
            place_overrides: BTreeMap::new(),
            issues: Vec::new(),
        }
    }

    /// Rebuild an overlay from stored parts (snapshot import).
    pub(crate) fn from_parts(
        person: Arc<Person>,
        inferred_events: BTreeMap<EventTag, InferredEvent>,
        date_bounds: BTreeMap<EventTag, DateRange>,
        place_overrides: BTreeMap<EventTag, String>,
        issues: Vec<Issue>,
    ) -> Self {
        Self {
            person,
            inferred_events,
            date_bounds,
            place_overrides,
            issues,
        }
    }

    // -------------------------------------------------------------------------
    // Identity & read access
    // -------------------------------------------------------------------------

    /// The person's stable id.
    #[must_use]
    pub fn id(&self) -> &PersonId {
        &self.person.id
    }

    /// The untouched source record.
    #[must_use]
    pub fn person(&self) -> &Person {
        &self.person
    }

    /// Shared handle to the source record.
    #[must_use]
    pub fn person_arc(&self) -> Arc<Person> {
        Arc::clone(&self.person)
    }

    /// Inferred events by tag.
    #[must_use]
    pub fn inferred_events(&self) -> &BTreeMap<EventTag, InferredEvent> {
        &self.inferred_events
    }

    /// Tightened date bounds by tag.
    #[must_use]
    pub fn date_bounds(&self) -> &BTreeMap<EventTag, DateRange> {
        &self.date_bounds
    }

    /// Place overrides by tag.
    #[must_use]
    pub fn place_overrides(&self) -> &BTreeMap<EventTag, String> {
        &self.place_overrides
    }

    /// Issues recorded on this overlay, in insertion order.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    // -------------------------------------------------------------------------
    // Mutation API (rules only)
    // -------------------------------------------------------------------------

    /// Record an inferred event, replacing any existing event for the
    /// tag.
    ///
    /// Last writer in rule order wins. Returns false when the existing
    /// event already carries the same inference (the original
    /// provenance is kept in that case).
    pub fn set_inferred_event(&mut self, event: InferredEvent) -> bool {
        match self.inferred_events.get(&event.tag) {
            Some(existing) if existing.same_inference(&event) => false,
            _ => {
                self.inferred_events.insert(event.tag, event);
                true
            }
        }
    }

    /// Intersect the stored bound for `tag` with `bound`.
    ///
    /// Bounds are monotone: the stored range never widens. An empty
    /// intersection is a data conflict; it is reported as a warning
    /// issue and the stored bound stays as it was.
    pub fn tighten_bound(
        &mut self,
        tag: EventTag,
        bound: DateRange,
        provenance: &Provenance,
    ) -> TightenOutcome {
        let current = self.date_bounds.get(&tag).copied();
        let tightened = match current {
            Some(existing) => existing.intersect(&bound),
            None => bound,
        };
        if tightened.is_empty() {
            let issue = Issue::new(
                "conflicting_date_bounds",
                Severity::Warning,
                format!(
                    "Conflicting {tag} bounds: {} vs {} intersect to an empty range (rule {})",
                    current.unwrap_or_else(DateRange::unbounded),
                    bound,
                    provenance.rule_id,
                ),
                self.person.id.clone(),
            );
            let recorded = self.append_issue(issue.clone());
            return TightenOutcome::Conflict(recorded.then_some(issue));
        }
        if current == Some(tightened) {
            return TightenOutcome::Unchanged;
        }
        self.date_bounds.insert(tag, tightened);
        TightenOutcome::Tightened
    }

    /// Override the place for `tag`. Returns false when unchanged.
    pub fn override_place(&mut self, tag: EventTag, place: impl Into<String>) -> bool {
        let place = place.into();
        if self.place_overrides.get(&tag) == Some(&place) {
            return false;
        }
        self.place_overrides.insert(tag, place);
        true
    }

    /// Record an issue on this overlay.
    ///
    /// Returns false when an identical issue is already present, which
    /// gives rules per-overlay issue stability: re-reporting a standing
    /// condition is a no-op, so a stable overlay converges.
    pub fn append_issue(&mut self, issue: Issue) -> bool {
        if self.issues.contains(&issue) {
            return false;
        }
        self.issues.push(issue);
        true
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// The explicit (source-recorded) event for a tag, if any.
    #[must_use]
    pub fn explicit_event(&self, tag: EventTag) -> Option<&LifeEvent> {
        self.person.event(tag)
    }

    /// Does this person have an event for `tag`, explicit or inferred?
    #[must_use]
    pub fn has_event(&self, tag: EventTag) -> bool {
        self.explicit_event(tag).is_some() || self.inferred_events.contains_key(&tag)
    }

    /// Best single date for an event.
    ///
    /// Prefers the explicit date; falls back to the earliest bound of
    /// an inferred event's range.
    #[must_use]
    pub fn get_event_date(&self, tag: EventTag) -> Option<GenDate> {
        if let Some(event) = self.explicit_event(tag)
            && let Some(date) = event.date
        {
            return Some(date);
        }
        self.inferred_events
            .get(&tag)
            .and_then(|e| e.date_range)
            .and_then(|r| r.earliest)
    }

    /// Best place for an event.
    ///
    /// Preference order: explicit place, then override, then inferred
    /// event place.
    #[must_use]
    pub fn best_place(&self, tag: EventTag) -> Option<&str> {
        if let Some(event) = self.explicit_event(tag)
            && let Some(place) = &event.place
        {
            return Some(place);
        }
        if let Some(place) = self.place_overrides.get(&tag) {
            return Some(place);
        }
        self.inferred_events
            .get(&tag)
            .and_then(|e| e.place.as_deref())
    }

    /// Best date range for an event.
    ///
    /// Preference order: explicit exact date (as a degenerate range),
    /// then tightened bounds, then an inferred event's range.
    #[must_use]
    pub fn best_date_range(&self, tag: EventTag) -> Option<DateRange> {
        if let Some(event) = self.explicit_event(tag)
            && let Some(date) = event.date
        {
            return Some(DateRange::exact(date));
        }
        if let Some(bound) = self.date_bounds.get(&tag) {
            return Some(*bound);
        }
        self.inferred_events.get(&tag).and_then(|e| e.date_range)
    }

    /// Birth range, falling back to baptism.
    #[must_use]
    pub fn birth_range(&self) -> Option<DateRange> {
        self.best_date_range(EventTag::Birth)
            .or_else(|| self.best_date_range(EventTag::Baptism))
    }

    /// Death range, falling back to burial.
    #[must_use]
    pub fn death_range(&self) -> Option<DateRange> {
        self.best_date_range(EventTag::Death)
            .or_else(|| self.best_date_range(EventTag::Burial))
    }

    /// Is the person known to be deceased (death or burial event)?
    #[must_use]
    pub fn is_deceased(&self) -> bool {
        self.has_event(EventTag::Death) || self.has_event(EventTag::Burial)
    }

    /// Approximate lifespan in whole years, from event years.
    #[must_use]
    pub fn lifespan_years(&self) -> Option<i32> {
        let birth = self.get_event_date(EventTag::Birth)?;
        let death = self
            .get_event_date(EventTag::Death)
            .or_else(|| self.get_event_date(EventTag::Burial))?;
        Some(death.year - birth.year)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LifeEvent;

    fn y(year: i32) -> GenDate {
        GenDate::from_year(year).expect("year")
    }

    fn overlay_with_birth(year: i32) -> EnrichedPerson {
        let person = Person::new(PersonId::new("@I1@"))
            .with_event(EventTag::Birth, LifeEvent::dated(y(year)));
        EnrichedPerson::new(Arc::new(person))
    }

    fn inferred_death(range: DateRange, confidence: f64) -> InferredEvent {
        InferredEvent {
            tag: EventTag::Death,
            date_range: Some(range),
            place: None,
            confidence: Confidence::new(confidence).expect("confidence"),
            provenance: Provenance::new("test_rule", 1, "test"),
        }
    }

    #[test]
    fn set_inferred_event_is_idempotent() {
        let mut overlay = overlay_with_birth(1850);
        let range = DateRange::new(Some(y(1850)), Some(y(1972)));

        assert!(overlay.set_inferred_event(inferred_death(range, 0.7)));
        // Same inference again, different provenance iteration
        let mut again = inferred_death(range, 0.7);
        again.provenance = Provenance::new("test_rule", 2, "test");
        assert!(!overlay.set_inferred_event(again));
        // Original provenance survives
        let stored = overlay
            .inferred_events()
            .get(&EventTag::Death)
            .expect("stored");
        assert_eq!(stored.provenance.iteration, 1);
    }

    #[test]
    fn set_inferred_event_last_writer_wins() {
        let mut overlay = overlay_with_birth(1850);
        let a = DateRange::new(Some(y(1850)), Some(y(1972)));
        let b = DateRange::new(Some(y(1860)), Some(y(1960)));

        assert!(overlay.set_inferred_event(inferred_death(a, 0.7)));
        assert!(overlay.set_inferred_event(inferred_death(b, 0.5)));

        let stored = overlay
            .inferred_events()
            .get(&EventTag::Death)
            .expect("stored");
        assert_eq!(stored.date_range, Some(b));
        assert_eq!(overlay.inferred_events().len(), 1);
    }

    #[test]
    fn tighten_bound_narrows_monotonically() {
        let mut overlay = overlay_with_birth(1850);
        let prov = Provenance::new("test_rule", 1, "test");

        let first = overlay.tighten_bound(
            EventTag::Death,
            DateRange::new(Some(y(1850)), Some(y(1972))),
            &prov,
        );
        assert_eq!(first, TightenOutcome::Tightened);

        let second = overlay.tighten_bound(
            EventTag::Death,
            DateRange::new(Some(y(1860)), None),
            &prov,
        );
        assert_eq!(second, TightenOutcome::Tightened);
        assert_eq!(
            overlay.date_bounds().get(&EventTag::Death),
            Some(&DateRange::new(Some(y(1860)), Some(y(1972))))
        );

        // Re-applying the same bound is a no-op
        let third = overlay.tighten_bound(
            EventTag::Death,
            DateRange::new(Some(y(1860)), None),
            &prov,
        );
        assert_eq!(third, TightenOutcome::Unchanged);
    }

    #[test]
    fn tighten_bound_reports_conflict_once() {
        let mut overlay = overlay_with_birth(1850);
        let prov = Provenance::new("test_rule", 1, "test");

        overlay.tighten_bound(
            EventTag::Death,
            DateRange::new(Some(y(1900)), Some(y(1910))),
            &prov,
        );
        let conflict = overlay.tighten_bound(
            EventTag::Death,
            DateRange::new(Some(y(1950)), Some(y(1960))),
            &prov,
        );
        assert!(matches!(conflict, TightenOutcome::Conflict(Some(_))));
        // Bound unchanged by the conflict
        assert_eq!(
            overlay.date_bounds().get(&EventTag::Death),
            Some(&DateRange::new(Some(y(1900)), Some(y(1910))))
        );
        // Same conflict again: already reported
        let again = overlay.tighten_bound(
            EventTag::Death,
            DateRange::new(Some(y(1950)), Some(y(1960))),
            &prov,
        );
        assert_eq!(again, TightenOutcome::Conflict(None));
        assert_eq!(overlay.issues().len(), 1);
    }

    #[test]
    fn queries_prefer_explicit_over_inferred() {
        let mut overlay = overlay_with_birth(1850);
        overlay.set_inferred_event(InferredEvent {
            tag: EventTag::Birth,
            date_range: Some(DateRange::exact(y(1860))),
            place: Some("Inferred Town".to_string()),
            confidence: Confidence::new(0.5).expect("confidence"),
            provenance: Provenance::new("test_rule", 1, "test"),
        });

        assert_eq!(overlay.get_event_date(EventTag::Birth), Some(y(1850)));
        assert_eq!(
            overlay.best_date_range(EventTag::Birth),
            Some(DateRange::exact(y(1850)))
        );
        assert_eq!(overlay.best_place(EventTag::Birth), Some("Inferred Town"));
    }

    #[test]
    fn death_range_falls_back_to_burial() {
        let person = Person::new(PersonId::new("@I1@"))
            .with_event(EventTag::Burial, LifeEvent::dated(y(1950)));
        let overlay = EnrichedPerson::new(Arc::new(person));

        assert_eq!(overlay.death_range(), Some(DateRange::exact(y(1950))));
        assert!(overlay.is_deceased());
    }

    #[test]
    fn append_issue_deduplicates() {
        let mut overlay = overlay_with_birth(1850);
        let issue = Issue::new(
            "implausible_age",
            Severity::Warning,
            "too old",
            PersonId::new("@I1@"),
        );
        assert!(overlay.append_issue(issue.clone()));
        assert!(!overlay.append_issue(issue));
        assert_eq!(overlay.issues().len(), 1);
    }

    #[test]
    fn lifespan_from_partial_dates() {
        let person = Person::new(PersonId::new("@I1@"))
            .with_event(EventTag::Birth, LifeEvent::dated(y(1850)))
            .with_event(EventTag::Burial, LifeEvent::dated(y(1920)));
        let overlay = EnrichedPerson::new(Arc::new(person));
        assert_eq!(overlay.lifespan_years(), Some(70));
    }
}
