//! # Source Records
//!
//! Immutable person records as handed over by the record-parsing
//! collaborator.
//!
//! The engine never mutates these: the pipeline shares them behind
//! `Arc` and all enrichment lands on the per-person overlay
//! ([`crate::overlay::EnrichedPerson`]). Parent/child/partner edges are
//! given, not inferred.

use crate::dates::GenDate;
use crate::primitives::{MAX_ID_LENGTH, MAX_TEXT_LENGTH};
use crate::types::{EventTag, LinealError, PersonId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// SEX & ROLES
// =============================================================================

/// Recorded sex of a person, where the source states it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Sex {
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "M")]
    Male,
}

/// Which side of a parent edge a person sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRole {
    Mother,
    Father,
}

// =============================================================================
// LIFE EVENTS
// =============================================================================

/// A dated and/or placed life event from the source record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LifeEvent {
    /// When the event happened, at whatever precision the source had.
    #[serde(default)]
    pub date: Option<GenDate>,
    /// Where the event happened.
    #[serde(default)]
    pub place: Option<String>,
}

impl LifeEvent {
    /// Create an event with a date and no place.
    #[must_use]
    pub const fn dated(date: GenDate) -> Self {
        Self {
            date: Some(date),
            place: None,
        }
    }

    /// Create an event with a date and a place.
    #[must_use]
    pub fn dated_at(date: GenDate, place: impl Into<String>) -> Self {
        Self {
            date: Some(date),
            place: Some(place.into()),
        }
    }
}

// =============================================================================
// PERSON
// =============================================================================

/// An immutable person record.
///
/// Events are keyed by tag: the source parser collapses multiple
/// records of the same kind to one before hand-over. Relationship
/// fields hold ids resolvable against the full person map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Stable cross-reference id.
    pub id: PersonId,
    /// Display name, if recorded.
    #[serde(default)]
    pub name: Option<String>,
    /// Recorded sex, if any.
    #[serde(default)]
    pub sex: Option<Sex>,
    /// Dated/placed events keyed by tag.
    #[serde(default)]
    pub events: BTreeMap<EventTag, LifeEvent>,
    /// Father's id, if linked.
    #[serde(default)]
    pub father: Option<PersonId>,
    /// Mother's id, if linked.
    #[serde(default)]
    pub mother: Option<PersonId>,
    /// Children ids, in source order.
    #[serde(default)]
    pub children: Vec<PersonId>,
    /// Spouse/partner ids, in source order.
    #[serde(default)]
    pub partners: Vec<PersonId>,
}

impl Person {
    /// Create a bare person with the given id.
    #[must_use]
    pub fn new(id: PersonId) -> Self {
        Self {
            id,
            name: None,
            sex: None,
            events: BTreeMap::new(),
            father: None,
            mother: None,
            children: Vec::new(),
            partners: Vec::new(),
        }
    }

    /// Record an event, replacing any existing event for the tag.
    #[must_use]
    pub fn with_event(mut self, tag: EventTag, event: LifeEvent) -> Self {
        self.events.insert(tag, event);
        self
    }

    /// Get the recorded event for a tag, if any.
    #[must_use]
    pub fn event(&self, tag: EventTag) -> Option<&LifeEvent> {
        self.events.get(&tag)
    }

    /// Parent edges as (role, id) pairs, father first.
    ///
    /// The role reflects the edge, not the parent's recorded sex; the
    /// two normally agree but rules must tolerate disagreement.
    pub fn parents(&self) -> impl Iterator<Item = (ParentRole, &PersonId)> {
        self.father
            .iter()
            .map(|id| (ParentRole::Father, id))
            .chain(self.mother.iter().map(|id| (ParentRole::Mother, id)))
    }

    /// Validate field lengths against the input limits.
    ///
    /// The record parser is expected to hand over well-formed data;
    /// this is the engine-side backstop.
    pub fn validate(&self) -> Result<(), LinealError> {
        if self.id.as_str().is_empty() || self.id.as_str().len() > MAX_ID_LENGTH {
            return Err(LinealError::DeserializationError(format!(
                "person id '{}' empty or longer than {MAX_ID_LENGTH} bytes",
                self.id
            )));
        }
        for event in self.events.values() {
            if let Some(place) = &event.place
                && place.len() > MAX_TEXT_LENGTH
            {
                return Err(LinealError::DeserializationError(format!(
                    "place name for person '{}' exceeds {MAX_TEXT_LENGTH} bytes",
                    self.id
                )));
            }
            if let Some(date) = event.date {
                date.validate()?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parents_yields_father_then_mother() {
        let mut person = Person::new(PersonId::new("@I1@"));
        person.father = Some(PersonId::new("@I2@"));
        person.mother = Some(PersonId::new("@I3@"));

        let parents: Vec<_> = person.parents().collect();
        assert_eq!(parents.len(), 2);
        assert_eq!(parents[0].0, ParentRole::Father);
        assert_eq!(parents[1].0, ParentRole::Mother);
    }

    #[test]
    fn with_event_replaces_existing() {
        let birth_1850 = LifeEvent::dated(GenDate::from_year(1850).expect("year"));
        let birth_1851 = LifeEvent::dated(GenDate::from_year(1851).expect("year"));
        let person = Person::new(PersonId::new("@I1@"))
            .with_event(EventTag::Birth, birth_1850)
            .with_event(EventTag::Birth, birth_1851.clone());

        assert_eq!(person.event(EventTag::Birth), Some(&birth_1851));
        assert_eq!(person.events.len(), 1);
    }

    #[test]
    fn validate_rejects_empty_id() {
        let person = Person::new(PersonId::new(""));
        assert!(person.validate().is_err());
    }

    #[test]
    fn validate_rejects_day_without_month() {
        let date = GenDate {
            year: 1950,
            month: None,
            day: Some(10),
        };
        let person = Person::new(PersonId::new("@I1@"))
            .with_event(EventTag::Birth, LifeEvent::dated(date));
        assert!(person.validate().is_err());
    }

    #[test]
    fn json_roundtrip_keeps_partial_dates() {
        let person = Person::new(PersonId::new("@I1@")).with_event(
            EventTag::Birth,
            LifeEvent::dated(GenDate::from_year(1850).expect("year")),
        );
        let json = serde_json::to_string(&person).expect("serialize");
        let back: Person = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(person, back);
    }
}
