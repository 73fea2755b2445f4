//! Point resolution: the value of one concept for one patient at one valid
//! time, as known at one transaction time.

use tracing::debug;

use crate::{
  dictionary::ConceptDictionary,
  error::QueryError,
  fact::{ConceptCode, FactValue, PatientKey},
  outcome::PointOutcome,
  snapshot::visible_as_of,
  store::FactLog,
  time::{TransactionTime, ValidTime},
};

/// Parameters for [`resolve`].
#[derive(Debug, Clone)]
pub struct PointQuery {
  pub patient:           PatientKey,
  pub concept:           ConceptCode,
  /// A date asks for the latest measurement on that day; an instant asks for
  /// the latest measurement at or before it.
  pub as_of_valid:       ValidTime,
  pub as_of_transaction: TransactionTime,
}

/// Resolve the single visible version for `query`.
///
/// Versions recorded after `as_of_transaction` are ignored. Among the rest,
/// each distinct valid time is represented by its most recently recorded
/// version, and the greatest valid time admitted by `as_of_valid` is chosen.
pub fn resolve<S, D>(
  store: &S,
  dictionary: &D,
  query: &PointQuery,
) -> Result<PointOutcome, QueryError>
where
  S: FactLog + ?Sized,
  D: ConceptDictionary + ?Sized,
{
  if store.is_empty() {
    return Err(QueryError::EmptyStore);
  }

  let versions = store.lookup(&query.patient, &query.concept);
  if versions.is_empty() {
    return Err(QueryError::NotFound);
  }

  let snapshot = visible_as_of(versions, query.as_of_transaction, |v| v.valid_time);
  if snapshot.is_empty() {
    return Err(QueryError::NoVisibleTransaction);
  }

  let chosen = snapshot
    .iter()
    .rev()
    .find(|(valid_time, _)| query.as_of_valid.admits(valid_time))
    .map(|(_, version)| *version)
    .ok_or(QueryError::NoMatchingValidTime)?;

  debug!(
    patient = %query.patient,
    concept = %query.concept,
    sequence = chosen.sequence,
    "resolved point query"
  );

  match &chosen.value {
    FactValue::Tombstone => Ok(PointOutcome::Deleted { valid_time: chosen.valid_time }),
    FactValue::Recorded(value) => Ok(PointOutcome::Found {
      value:               value.clone(),
      valid_time:          chosen.valid_time,
      concept_description: dictionary.describe(&query.concept).into_owned(),
    }),
  }
}
