//! Logical updates and deletes.
//!
//! Both operations locate an existing version to copy identity from and then
//! append a new version; nothing already stored is touched. The base version
//! is found without regard to transaction-time visibility, so it may itself be
//! a version that has since been superseded.

use chrono::Utc;
use tracing::{info, warn};

use crate::{
  error::MutationError,
  fact::{ConceptCode, FactValue, FactVersion, Measurement, NewFactVersion, PatientKey},
  store::FactLog,
  time::{TransactionTime, ValidTime},
};

/// Identifies the observation an update or delete applies to.
#[derive(Debug, Clone)]
pub struct Mutation {
  pub patient:          PatientKey,
  pub concept:          ConceptCode,
  /// A date targets any version on that day; an instant only an exact match.
  /// The appended version carries this valid time verbatim.
  pub target_valid:     ValidTime,
  /// When the change is recorded; defaults to now.
  pub transaction_time: Option<TransactionTime>,
}

/// Record that the targeted observation is logically deleted.
pub fn delete<'s, S>(store: &'s mut S, mutation: &Mutation) -> Result<&'s FactVersion, MutationError>
where
  S: FactLog + ?Sized,
{
  write(store, mutation, FactValue::Tombstone)
}

/// Record a corrected value for the targeted observation. A later update also
/// undoes an earlier delete at the same valid time.
///
/// Blank text is refused: it has no tabular form that reloads as a value.
pub fn update<'s, S>(
  store: &'s mut S,
  mutation: &Mutation,
  new_value: Measurement,
) -> Result<&'s FactVersion, MutationError>
where
  S: FactLog + ?Sized,
{
  if matches!(&new_value, Measurement::Text(text) if text.trim().is_empty()) {
    warn!(patient = %mutation.patient, concept = %mutation.concept, "refusing blank value");
    return Err(MutationError::BlankValue);
  }
  write(store, mutation, FactValue::Recorded(new_value))
}

fn write<'s, S>(
  store: &'s mut S,
  mutation: &Mutation,
  value: FactValue,
) -> Result<&'s FactVersion, MutationError>
where
  S: FactLog + ?Sized,
{
  let Some(base) = store
    .lookup(&mutation.patient, &mutation.concept)
    .into_iter()
    .find(|v| mutation.target_valid.identifies(&v.valid_time))
  else {
    warn!(
      patient = %mutation.patient,
      concept = %mutation.concept,
      valid_time = %mutation.target_valid,
      "no original version to mutate"
    );
    return Err(MutationError::OriginalNotFound);
  };

  let input = NewFactVersion {
    patient: base.patient.clone(),
    concept: base.concept.clone(),
    value,
    valid_time: mutation.target_valid,
    transaction_time: mutation.transaction_time.unwrap_or_else(Utc::now),
  };

  let appended = store.append(input);
  info!(
    sequence = appended.sequence,
    patient = %appended.patient,
    concept = %appended.concept,
    valid_time = %appended.valid_time,
    tombstone = appended.value.is_tombstone(),
    "recorded mutation"
  );
  Ok(appended)
}
