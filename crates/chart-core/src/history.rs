//! History resolution: the visible timeline of a patient over a valid-time
//! range, as known at one transaction time.

use tracing::debug;

use crate::{
  dictionary::ConceptDictionary,
  error::QueryError,
  fact::{ConceptCode, PatientKey},
  outcome::HistoryEntry,
  snapshot::visible_as_of,
  store::FactLog,
  time::{TransactionTime, ValidTime},
};

/// Parameters for [`resolve_history`].
#[derive(Debug, Clone)]
pub struct HistoryQuery {
  pub patient:           PatientKey,
  /// Restrict the timeline to one concept; `None` means every concept.
  pub concept:           Option<ConceptCode>,
  pub start_valid:       ValidTime,
  /// Inclusive. A date covers the whole day.
  pub end_valid:         ValidTime,
  pub as_of_transaction: TransactionTime,
}

/// Resolve the timeline for `query`, ordered by valid time then concept code.
///
/// Each (concept, valid time) pair contributes its most recently recorded
/// visible version. Pairs whose latest known state is a tombstone are left
/// out of the timeline rather than reported.
pub fn resolve_history<S, D>(
  store: &S,
  dictionary: &D,
  query: &HistoryQuery,
) -> Result<Vec<HistoryEntry>, QueryError>
where
  S: FactLog + ?Sized,
  D: ConceptDictionary + ?Sized,
{
  let mut versions = store.lookup_patient(&query.patient);
  if let Some(concept) = &query.concept {
    versions.retain(|v| v.concept == *concept);
  }
  if versions.is_empty() {
    return Err(QueryError::NoRecordsForPatient);
  }

  // Keyed by (valid time, concept) so the map's order is the output order.
  let snapshot = visible_as_of(versions, query.as_of_transaction, |v| {
    (v.valid_time, v.concept.clone())
  });
  if snapshot.is_empty() {
    return Err(QueryError::NoVisibleTransaction);
  }

  let entries: Vec<HistoryEntry> = snapshot
    .into_iter()
    .filter(|((valid_time, _), _)| valid_time.within(&query.start_valid, &query.end_valid))
    .filter_map(|((valid_time, concept_code), version)| {
      let value = version.value.measurement()?.clone();
      Some(HistoryEntry {
        concept_description: dictionary.describe(&concept_code).into_owned(),
        valid_time,
        concept_code,
        value,
      })
    })
    .collect();

  if entries.is_empty() {
    return Err(QueryError::NoMatchingHistory);
  }

  debug!(patient = %query.patient, entries = entries.len(), "resolved history");
  Ok(entries)
}
