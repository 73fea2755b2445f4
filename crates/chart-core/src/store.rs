//! The `FactLog` trait and its in-memory implementation.
//!
//! Resolvers and the mutation writer depend on this abstraction, not on
//! [`MemoryStore`] directly. There is no delete operation: a logical delete is
//! an appended version whose value is a tombstone.

use std::collections::HashMap;

use tracing::debug;

use crate::fact::{ConceptCode, FactVersion, NewFactVersion, PatientKey};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Append-only, ordered storage of fact versions.
pub trait FactLog {
  /// Append one version, assigning the next sequence number, and return the
  /// stored version.
  fn append(&mut self, input: NewFactVersion) -> &FactVersion;

  /// All versions for a (patient, concept) pair in insertion order. Empty if
  /// there are none.
  fn lookup(&self, patient: &PatientKey, concept: &ConceptCode) -> Vec<&FactVersion>;

  /// All versions for every concept of a patient, in insertion order.
  fn lookup_patient(&self, patient: &PatientKey) -> Vec<&FactVersion>;

  /// Every stored version in insertion order.
  fn versions(&self) -> &[FactVersion];

  fn len(&self) -> usize { self.versions().len() }

  fn is_empty(&self) -> bool { self.len() == 0 }

  /// Append a batch in iteration order; returns the number appended.
  fn extend<I>(&mut self, inputs: I) -> usize
  where
    I: IntoIterator<Item = NewFactVersion>,
    Self: Sized,
  {
    let mut appended = 0;
    for input in inputs {
      self.append(input);
      appended += 1;
    }
    appended
  }
}

// ─── MemoryStore ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
struct PatientIndex {
  all:        Vec<usize>,
  by_concept: HashMap<ConceptCode, Vec<usize>>,
}

/// A fact log held entirely in process memory.
///
/// Versions live in a single vector whose position is the sequence number;
/// the per-patient index stores positions, so lookups preserve insertion
/// order without sorting.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
  versions: Vec<FactVersion>,
  patients: HashMap<PatientKey, PatientIndex>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn resolve_positions(&self, positions: Option<&Vec<usize>>) -> Vec<&FactVersion> {
    positions
      .map(|ps| ps.iter().map(|&p| &self.versions[p]).collect())
      .unwrap_or_default()
  }
}

impl FactLog for MemoryStore {
  fn append(&mut self, input: NewFactVersion) -> &FactVersion {
    let position = self.versions.len();
    let version = FactVersion {
      sequence:         position as u64,
      patient:          input.patient,
      concept:          input.concept,
      value:            input.value,
      valid_time:       input.valid_time,
      transaction_time: input.transaction_time,
    };

    let index = self.patients.entry(version.patient.clone()).or_default();
    index.all.push(position);
    index
      .by_concept
      .entry(version.concept.clone())
      .or_default()
      .push(position);

    debug!(
      sequence = version.sequence,
      patient = %version.patient,
      concept = %version.concept,
      valid_time = %version.valid_time,
      "appended fact version"
    );

    self.versions.push(version);
    &self.versions[position]
  }

  fn lookup(&self, patient: &PatientKey, concept: &ConceptCode) -> Vec<&FactVersion> {
    self.resolve_positions(
      self
        .patients
        .get(patient)
        .and_then(|index| index.by_concept.get(concept)),
    )
  }

  fn lookup_patient(&self, patient: &PatientKey) -> Vec<&FactVersion> {
    self.resolve_positions(self.patients.get(patient).map(|index| &index.all))
  }

  fn versions(&self) -> &[FactVersion] { &self.versions }
}
