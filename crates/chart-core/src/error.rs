//! Domain outcomes for `chart-core`.
//!
//! None of these indicate a fault in the store. They are the typed answers a
//! resolver or the mutation writer gives when the requested fact cannot be
//! produced, and each carries a stable user-facing message.

use serde::Serialize;
use thiserror::Error;

/// Why a point or history query produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryError {
  #[error("Database is empty.")]
  EmptyStore,

  #[error("No records found for this patient/concept.")]
  NotFound,

  #[error("No data existed at that transaction time.")]
  NoVisibleTransaction,

  #[error("No test found matching valid time criteria.")]
  NoMatchingValidTime,

  #[error("No records found for this patient.")]
  NoRecordsForPatient,

  #[error("No history found in the requested valid-time range.")]
  NoMatchingHistory,
}

/// Why an update or delete was refused. Nothing is appended in either case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationError {
  #[error("Could not find original record.")]
  OriginalNotFound,

  #[error("New value must not be empty.")]
  BlankValue,
}

/// A timestamp string matched none of the accepted layouts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised timestamp: {input:?}")]
pub struct TimeParseError {
  pub input: String,
}
