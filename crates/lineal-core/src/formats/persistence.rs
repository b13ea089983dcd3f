//! # Run Snapshot Persistence
//!
//! Serializes a finished [`RunResult`] to a self-describing byte stream
//! and back:
//!
//! ```text
//! [header_len: u32 LE] [SnapshotHeader (postcard)] [StoredRun (postcard)]
//! ```
//!
//! The header carries magic bytes, the format version, the person count
//! and the payload length, and is validated BEFORE the payload is
//! deserialized so corrupted or hostile input cannot drive unbounded
//! allocation.

use crate::dates::DateRange;
use crate::overlay::{EnrichedPerson, InferredEvent};
use crate::pipeline::{RunResult, TerminationReason};
use crate::primitives::{
    FORMAT_VERSION, MAGIC_BYTES, MAX_PEOPLE_PER_RUN, MAX_SNAPSHOT_PAYLOAD_SIZE,
};
use crate::record::Person;
use crate::types::{EventTag, Issue, LinealError, PersonId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// HEADER
// =============================================================================

/// Header of a run snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Magic bytes identifying the format.
    pub magic: [u8; 4],
    /// Format version for compatibility.
    pub version: u8,
    /// Number of persons in the payload.
    pub person_count: u64,
    /// Length of the payload section in bytes.
    pub payload_len: u64,
}

impl SnapshotHeader {
    /// Header for a payload of `person_count` persons and `payload_len`
    /// bytes.
    #[must_use]
    pub fn new(person_count: u64, payload_len: u64) -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
            person_count,
            payload_len,
        }
    }

    /// Validate magic, version and size limits.
    ///
    /// Error messages are intentionally generic; a malformed file does
    /// not get a map of the format.
    pub fn validate(&self) -> Result<(), LinealError> {
        if self.magic != *MAGIC_BYTES {
            return Err(LinealError::DeserializationError(
                "Invalid file format".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(LinealError::DeserializationError(
                "Unsupported file version".to_string(),
            ));
        }
        if self.person_count > MAX_PEOPLE_PER_RUN as u64 {
            return Err(LinealError::DeserializationError(format!(
                "Person count {} exceeds maximum allowed {}",
                self.person_count, MAX_PEOPLE_PER_RUN
            )));
        }
        if self.payload_len > MAX_SNAPSHOT_PAYLOAD_SIZE as u64 {
            return Err(LinealError::DeserializationError(format!(
                "Payload of {} bytes exceeds maximum allowed {}",
                self.payload_len, MAX_SNAPSHOT_PAYLOAD_SIZE
            )));
        }
        Ok(())
    }
}

// =============================================================================
// STORED FORM
// =============================================================================

/// Overlay in stored form: the source record plus enrichment state,
/// with no sharing (every snapshot is self-contained).
#[derive(Debug, Serialize, Deserialize)]
struct StoredPerson {
    person: Person,
    inferred_events: BTreeMap<EventTag, InferredEvent>,
    date_bounds: BTreeMap<EventTag, DateRange>,
    place_overrides: BTreeMap<EventTag, String>,
    issues: Vec<Issue>,
}

impl StoredPerson {
    fn from_overlay(overlay: &EnrichedPerson) -> Self {
        Self {
            person: overlay.person().clone(),
            inferred_events: overlay.inferred_events().clone(),
            date_bounds: overlay.date_bounds().clone(),
            place_overrides: overlay.place_overrides().clone(),
            issues: overlay.issues().to_vec(),
        }
    }

    fn into_overlay(self) -> EnrichedPerson {
        EnrichedPerson::from_parts(
            Arc::new(self.person),
            self.inferred_events,
            self.date_bounds,
            self.place_overrides,
            self.issues,
        )
    }
}

/// A run result in stored form. BTreeMap keys keep the byte stream
/// deterministic.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRun {
    people: BTreeMap<PersonId, StoredPerson>,
    issues: Vec<Issue>,
    iterations: u32,
    rule_runs: BTreeMap<String, u64>,
    termination: TerminationReason,
}

// =============================================================================
// SERIALIZATION
// =============================================================================

/// Serialize a run result to snapshot bytes.
pub fn result_to_bytes(result: &RunResult) -> Result<Vec<u8>, LinealError> {
    let stored = StoredRun {
        people: result
            .people
            .iter()
            .map(|(id, overlay)| (id.clone(), StoredPerson::from_overlay(overlay)))
            .collect(),
        issues: result.issues.clone(),
        iterations: result.iterations,
        rule_runs: result.rule_runs.clone(),
        termination: result.termination,
    };

    let payload = postcard::to_allocvec(&stored)
        .map_err(|e| LinealError::SerializationError(format!("Payload: {e}")))?;
    if payload.len() > MAX_SNAPSHOT_PAYLOAD_SIZE {
        return Err(LinealError::SerializationError(format!(
            "Payload of {} bytes exceeds maximum allowed {}",
            payload.len(),
            MAX_SNAPSHOT_PAYLOAD_SIZE
        )));
    }

    let header = SnapshotHeader::new(stored.people.len() as u64, payload.len() as u64);
    let header_bytes = postcard::to_allocvec(&header)
        .map_err(|e| LinealError::SerializationError(format!("Header: {e}")))?;

    let mut out = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    out.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Deserialize snapshot bytes back into a run result.
///
/// Header limits are enforced before the payload is touched.
pub fn result_from_bytes(data: &[u8]) -> Result<RunResult, LinealError> {
    if data.len() < 4 {
        return Err(LinealError::DeserializationError(
            "Data too short".to_string(),
        ));
    }
    let header_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < 4 + header_len {
        return Err(LinealError::DeserializationError(
            "Data too short for header".to_string(),
        ));
    }

    let header: SnapshotHeader = postcard::from_bytes(&data[4..4 + header_len])
        .map_err(|e| LinealError::DeserializationError(format!("Header: {e}")))?;
    header.validate()?;

    let payload = &data[4 + header_len..];
    if payload.len() as u64 != header.payload_len {
        return Err(LinealError::DeserializationError(
            "Payload length mismatch".to_string(),
        ));
    }

    let stored: StoredRun = postcard::from_bytes(payload)
        .map_err(|e| LinealError::DeserializationError(format!("Payload: {e}")))?;
    if stored.people.len() as u64 != header.person_count {
        return Err(LinealError::DeserializationError(
            "Person count mismatch".to_string(),
        ));
    }

    Ok(RunResult {
        people: stored
            .people
            .into_iter()
            .map(|(id, person)| (id, person.into_overlay()))
            .collect(),
        issues: stored.issues,
        iterations: stored.iterations,
        rule_runs: stored.rule_runs,
        termination: stored.termination,
    })
}

// =============================================================================
// TESTS
// =============================================================================
