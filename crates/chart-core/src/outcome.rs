//! Resolved answers produced by the point and history resolvers.

use std::fmt;

use serde::Serialize;

use crate::{
  fact::{ConceptCode, Measurement},
  time::ValidTime,
};

/// A successful point query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PointOutcome {
  Found {
    value:               Measurement,
    valid_time:          ValidTime,
    concept_description: String,
  },
  /// The visible version at the requested valid time is a tombstone.
  Deleted {
    /// The valid time of the deletion.
    valid_time: ValidTime,
  },
}

impl PointOutcome {
  pub fn value(&self) -> Option<&Measurement> {
    match self {
      Self::Found { value, .. } => Some(value),
      Self::Deleted { .. } => None,
    }
  }

  pub fn is_deleted(&self) -> bool { matches!(self, Self::Deleted { .. }) }
}

impl fmt::Display for PointOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Found { value, valid_time, concept_description } => write!(
        f,
        "*** RESULT: {value} *** (Date: {valid_time}, Concept: {concept_description})"
      ),
      Self::Deleted { .. } => f.write_str("Record was deleted."),
    }
  }
}

/// One visible point on a patient's timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
  pub valid_time:          ValidTime,
  pub concept_code:        ConceptCode,
  pub concept_description: String,
  pub value:               Measurement,
}

impl fmt::Display for HistoryEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}  {}  {}  ({})",
      self.valid_time, self.concept_code, self.value, self.concept_description
    )
  }
}
