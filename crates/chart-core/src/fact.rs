//! Fact versions — the fundamental unit of the Chart store.
//!
//! A fact version is an immutable observation about a patient: one concept,
//! one value, one valid time, recorded at one transaction time. Versions are
//! never updated; corrections and logical deletes are new versions that
//! shadow older ones when resolved at a later transaction time.

use std::{
  fmt,
  hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

use crate::time::{TransactionTime, ValidTime};

/// The literal that marks a tombstone in tabular sources and exports.
pub const TOMBSTONE_LITERAL: &str = "DELETED";

// ─── Patient identity ────────────────────────────────────────────────────────

/// A patient identified by first and last name.
///
/// Equality and hashing are case-insensitive; the original spelling is kept
/// for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientKey {
  first_name: String,
  last_name:  String,
}

impl PatientKey {
  pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
    Self { first_name: first_name.into(), last_name: last_name.into() }
  }

  pub fn first_name(&self) -> &str { &self.first_name }

  pub fn last_name(&self) -> &str { &self.last_name }
}

fn folded(s: &str) -> impl Iterator<Item = char> + '_ {
  s.chars().flat_map(char::to_lowercase)
}

impl PartialEq for PatientKey {
  fn eq(&self, other: &Self) -> bool {
    folded(&self.first_name).eq(folded(&other.first_name))
      && folded(&self.last_name).eq(folded(&other.last_name))
  }
}

impl Eq for PatientKey {}

impl Hash for PatientKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    for c in folded(&self.first_name) {
      c.hash(state);
    }
    // Separator so ("ab", "c") and ("a", "bc") hash apart.
    '\u{0}'.hash(state);
    for c in folded(&self.last_name) {
      c.hash(state);
    }
  }
}

impl fmt::Display for PatientKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.first_name, self.last_name)
  }
}

// ─── Concept ─────────────────────────────────────────────────────────────────

/// A concept identifier such as a LOINC code. Compared exactly.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConceptCode(String);

impl ConceptCode {
  pub fn new(code: impl Into<String>) -> Self { Self(code.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for ConceptCode {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for ConceptCode {
  fn from(s: String) -> Self { Self(s) }
}

impl fmt::Display for ConceptCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── Values ──────────────────────────────────────────────────────────────────

/// A recorded observation value. Source-dependent: numeric when the source
/// text is a finite number, free text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measurement {
  Number(f64),
  Text(String),
}

impl Measurement {
  /// Interpret source text, preferring a numeric reading.
  pub fn parse(raw: &str) -> Self {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
      Ok(n) if n.is_finite() => Self::Number(n),
      _ => Self::Text(trimmed.to_owned()),
    }
  }
}

impl fmt::Display for Measurement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Number(n) => write!(f, "{n}"),
      Self::Text(s) => f.write_str(s),
    }
  }
}

/// The payload of a fact version: either a value, or a tombstone recording a
/// logical delete as of the version's transaction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FactValue {
  Recorded(Measurement),
  Tombstone,
}

impl FactValue {
  /// Interpret a tabular cell; [`TOMBSTONE_LITERAL`] becomes a tombstone.
  pub fn parse(raw: &str) -> Self {
    if raw.trim() == TOMBSTONE_LITERAL {
      Self::Tombstone
    } else {
      Self::Recorded(Measurement::parse(raw))
    }
  }

  pub fn is_tombstone(&self) -> bool { matches!(self, Self::Tombstone) }

  pub fn measurement(&self) -> Option<&Measurement> {
    match self {
      Self::Recorded(m) => Some(m),
      Self::Tombstone => None,
    }
  }
}

impl fmt::Display for FactValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Recorded(m) => m.fmt(f),
      Self::Tombstone => f.write_str(TOMBSTONE_LITERAL),
    }
  }
}

// ─── FactVersion ─────────────────────────────────────────────────────────────

/// An immutable, stored version of an observation. Once appended, no field is
/// ever updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactVersion {
  /// Store-assigned insertion index; breaks exact transaction-time ties.
  pub sequence:         u64,
  pub patient:          PatientKey,
  pub concept:          ConceptCode,
  pub value:            FactValue,
  pub valid_time:       ValidTime,
  pub transaction_time: TransactionTime,
}

// ─── NewFactVersion ──────────────────────────────────────────────────────────

/// Input to [`crate::store::FactLog::append`].
/// `sequence` is always assigned by the store; it is not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewFactVersion {
  pub patient:          PatientKey,
  pub concept:          ConceptCode,
  pub value:            FactValue,
  pub valid_time:       ValidTime,
  pub transaction_time: TransactionTime,
}

impl NewFactVersion {
  pub fn new(
    patient: PatientKey,
    concept: impl Into<ConceptCode>,
    value: FactValue,
    valid_time: ValidTime,
    transaction_time: TransactionTime,
  ) -> Self {
    Self { patient, concept: concept.into(), value, valid_time, transaction_time }
  }
}
