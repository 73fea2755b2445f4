//! End-to-end tests of the resolvers and the mutation writer against an
//! in-memory store.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::{
  dictionary::StaticDictionary,
  error::{MutationError, QueryError},
  fact::{FactValue, Measurement, NewFactVersion, PatientKey},
  history::{HistoryQuery, resolve_history},
  mutate::{self, Mutation},
  outcome::PointOutcome,
  point::{PointQuery, resolve},
  store::{FactLog, MemoryStore},
  time::ValidTime,
};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

fn on(day: u32) -> ValidTime {
  ValidTime::DateOnly(NaiveDate::from_ymd_opt(2024, 1, day).unwrap())
}

fn instant(day: u32, hour: u32) -> ValidTime { ValidTime::Instant(at(day, hour)) }

fn john() -> PatientKey { PatientKey::new("John", "Doe") }

fn observation(
  concept: &str,
  value: &str,
  valid_time: ValidTime,
  recorded: DateTime<Utc>,
) -> NewFactVersion {
  NewFactVersion::new(john(), concept, FactValue::parse(value), valid_time, recorded)
}

/// Scenario store: "John Doe", 11218-5 = 5, valid 2024-01-10, recorded
/// 2024-01-10T09:00.
fn seeded() -> MemoryStore {
  let mut store = MemoryStore::new();
  store.append(observation("11218-5", "5", on(10), at(10, 9)));
  store
}

fn point(store: &MemoryStore, valid: ValidTime, as_of: DateTime<Utc>) -> Result<PointOutcome, QueryError> {
  let query = PointQuery {
    patient:           john(),
    concept:           "11218-5".into(),
    as_of_valid:       valid,
    as_of_transaction: as_of,
  };
  resolve(store, &StaticDictionary::default(), &query)
}

fn mutation(valid: ValidTime, recorded: DateTime<Utc>) -> Mutation {
  Mutation {
    patient:          PatientKey::new("john", "DOE"),
    concept:          "11218-5".into(),
    target_valid:     valid,
    transaction_time: Some(recorded),
  }
}

fn january(store: &MemoryStore, as_of: DateTime<Utc>) -> Result<Vec<crate::outcome::HistoryEntry>, QueryError> {
  let query = HistoryQuery {
    patient:           john(),
    concept:           None,
    start_valid:       on(1),
    end_valid:         on(31),
    as_of_transaction: as_of,
  };
  resolve_history(store, &StaticDictionary::default(), &query)
}

// ─── Worked scenarios ────────────────────────────────────────────────────────

#[test]
fn inserted_fact_is_found() {
  let store = seeded();
  let outcome = point(&store, on(10), at(11, 0)).unwrap();
  assert_eq!(
    outcome,
    PointOutcome::Found {
      value:               Measurement::Number(5.0),
      valid_time:          on(10),
      concept_description: "Anatomic pathology & Lab medicine".into(),
    }
  );
}

#[test]
fn delete_shadows_later_queries() {
  let mut store = seeded();
  mutate::delete(&mut store, &mutation(on(10), at(12, 0))).unwrap();

  let outcome = point(&store, on(10), at(13, 0)).unwrap();
  assert_eq!(outcome, PointOutcome::Deleted { valid_time: on(10) });
}

#[test]
fn query_before_delete_still_sees_value() {
  let mut store = seeded();
  mutate::delete(&mut store, &mutation(on(10), at(12, 0))).unwrap();

  let outcome = point(&store, on(10), at(11, 0)).unwrap();
  assert_eq!(outcome.value(), Some(&Measurement::Number(5.0)));
}

#[test]
fn update_after_delete_undeletes() {
  let mut store = seeded();
  mutate::delete(&mut store, &mutation(on(10), at(12, 0))).unwrap();
  mutate::update(&mut store, &mutation(on(10), at(14, 0)), Measurement::parse("7")).unwrap();

  let outcome = point(&store, on(10), at(15, 0)).unwrap();
  assert_eq!(outcome.value().map(ToString::to_string).as_deref(), Some("7"));

  // Between the delete and the update the tombstone is still what was known.
  assert!(point(&store, on(10), at(13, 0)).unwrap().is_deleted());
}

#[test]
fn history_omits_superseded_tombstone() {
  let mut store = seeded();
  mutate::delete(&mut store, &mutation(on(10), at(12, 0))).unwrap();
  mutate::update(&mut store, &mutation(on(10), at(14, 0)), Measurement::parse("7")).unwrap();

  let entries = january(&store, at(15, 0)).unwrap();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0].concept_code.as_str(), "11218-5");
  assert_eq!(entries[0].valid_time, on(10));
  assert_eq!(entries[0].value.to_string(), "7");
}

#[test]
fn delete_without_original_is_refused() {
  let mut store = seeded();
  let err = mutate::delete(&mut store, &mutation(on(20), at(12, 0))).unwrap_err();
  assert_eq!(err, MutationError::OriginalNotFound);
  assert_eq!(store.len(), 1);
}

#[test]
fn blank_update_is_refused() {
  let mut store = seeded();
  for blank in ["", "   "] {
    let err = mutate::update(&mut store, &mutation(on(10), at(12, 0)), Measurement::parse(blank))
      .unwrap_err();
    assert_eq!(err, MutationError::BlankValue);
  }
  assert_eq!(store.len(), 1);
  assert_eq!(
    point(&store, on(10), at(13, 0)).unwrap().value().map(ToString::to_string),
    Some("5".to_owned())
  );
}

// ─── Point resolver outcomes ─────────────────────────────────────────────────

#[test]
fn empty_store_is_reported() {
  let store = MemoryStore::new();
  assert_eq!(point(&store, on(10), at(11, 0)), Err(QueryError::EmptyStore));
}

#[test]
fn unknown_pair_is_not_found() {
  let store = seeded();
  let query = PointQuery {
    patient:           PatientKey::new("Jane", "Roe"),
    concept:           "11218-5".into(),
    as_of_valid:       on(10),
    as_of_transaction: at(11, 0),
  };
  let result = resolve(&store, &StaticDictionary::default(), &query);
  assert_eq!(result, Err(QueryError::NotFound));
}

#[test]
fn nothing_recorded_yet_is_reported() {
  let store = seeded();
  assert_eq!(point(&store, on(10), at(9, 0)), Err(QueryError::NoVisibleTransaction));
}

#[test]
fn date_cursor_without_same_day_measurement_misses() {
  let store = seeded();
  assert_eq!(point(&store, on(11), at(20, 0)), Err(QueryError::NoMatchingValidTime));
}

#[test]
fn instant_cursor_takes_latest_at_or_before() {
  let mut store = MemoryStore::new();
  store.append(observation("11218-5", "5", instant(10, 8), at(10, 9)));
  store.append(observation("11218-5", "6", instant(10, 14), at(10, 15)));
  store.append(observation("11218-5", "9", instant(12, 8), at(12, 9)));

  let noon = point(&store, instant(10, 12), at(20, 0)).unwrap();
  assert_eq!(noon.value(), Some(&Measurement::Number(5.0)));

  let evening = point(&store, instant(11, 20), at(20, 0)).unwrap();
  assert_eq!(evening.value(), Some(&Measurement::Number(6.0)));

  assert_eq!(point(&store, instant(10, 7), at(20, 0)), Err(QueryError::NoMatchingValidTime));
}

#[test]
fn date_cursor_takes_latest_on_that_day() {
  let mut store = MemoryStore::new();
  store.append(observation("11218-5", "5", instant(10, 8), at(10, 9)));
  store.append(observation("11218-5", "6", instant(10, 14), at(10, 15)));

  let outcome = point(&store, on(10), at(20, 0)).unwrap();
  assert_eq!(outcome.value(), Some(&Measurement::Number(6.0)));
}

#[test]
fn unknown_concept_uses_fallback_description() {
  let mut store = MemoryStore::new();
  store.append(observation("0000-0", "1", on(10), at(10, 9)));
  let query = PointQuery {
    patient:           john(),
    concept:           "0000-0".into(),
    as_of_valid:       on(10),
    as_of_transaction: at(11, 0),
  };
  let outcome = resolve(&store, &StaticDictionary::default(), &query).unwrap();
  assert!(matches!(
    outcome,
    PointOutcome::Found { ref concept_description, .. } if concept_description == "Unknown Concept"
  ));
}

#[test]
fn outcome_messages_are_stable() {
  assert_eq!(PointOutcome::Deleted { valid_time: on(10) }.to_string(), "Record was deleted.");
  assert_eq!(
    point(&seeded(), on(10), at(11, 0)).unwrap().to_string(),
    "*** RESULT: 5 *** (Date: 2024-01-10, Concept: Anatomic pathology & Lab medicine)"
  );
  assert_eq!(QueryError::EmptyStore.to_string(), "Database is empty.");
  assert_eq!(MutationError::OriginalNotFound.to_string(), "Could not find original record.");
}

#[test]
fn outcome_serialises_with_tag() {
  let json = serde_json::to_value(PointOutcome::Deleted { valid_time: on(10) }).unwrap();
  assert_eq!(json["outcome"], "deleted");
  assert_eq!(json["valid_time"]["kind"], "date_only");
  assert_eq!(json["valid_time"]["value"], "2024-01-10");
}

// ─── Properties ──────────────────────────────────────────────────────────────

#[test]
fn exact_transaction_tie_keeps_first_inserted() {
  let mut store = MemoryStore::new();
  store.append(observation("11218-5", "5", on(10), at(10, 9)));
  store.append(observation("11218-5", "8", on(10), at(10, 9)));

  let outcome = point(&store, on(10), at(11, 0)).unwrap();
  assert_eq!(outcome.value(), Some(&Measurement::Number(5.0)));
}

#[test]
fn resolution_is_idempotent() {
  let mut store = seeded();
  mutate::delete(&mut store, &mutation(on(10), at(12, 0))).unwrap();
  for as_of in [at(11, 0), at(13, 0)] {
    assert_eq!(point(&store, on(10), as_of), point(&store, on(10), as_of));
  }
}

#[test]
fn widening_the_perspective_never_hides_earlier_knowledge() {
  let mut store = seeded();
  store.append(observation("11218-5", "6", on(11), at(12, 0)));

  // As of the 11th only the first measurement exists.
  let early = january(&store, at(11, 0)).unwrap();
  assert_eq!(early.len(), 1);

  // Later perspectives keep it and add the new one.
  let late = january(&store, at(13, 0)).unwrap();
  assert_eq!(late.len(), 2);
  assert_eq!(late[0], early[0]);
}

#[test]
fn successful_mutations_grow_store_by_one() {
  let mut store = seeded();
  let before = store.len();
  mutate::update(&mut store, &mutation(on(10), at(12, 0)), Measurement::parse("6")).unwrap();
  assert_eq!(store.len(), before + 1);
  mutate::delete(&mut store, &mutation(on(10), at(13, 0))).unwrap();
  assert_eq!(store.len(), before + 2);

  // History is intact: the first version is untouched.
  assert_eq!(store.versions()[0].value, FactValue::parse("5"));
}

#[test]
fn mutation_copies_identity_and_keeps_target_valid_time() {
  let mut store = MemoryStore::new();
  store.append(observation("11218-5", "5", instant(10, 8), at(10, 9)));

  let appended = mutate::update(&mut store, &mutation(on(10), at(12, 0)), Measurement::parse("6"))
    .unwrap()
    .clone();
  assert_eq!(appended.patient.first_name(), "John");
  assert_eq!(appended.valid_time, on(10));
  assert_eq!(appended.transaction_time, at(12, 0));
  assert_eq!(appended.sequence, 1);
}

#[test]
fn mutation_defaults_to_now() {
  let mut store = seeded();
  let before = Utc::now();
  let mut m = mutation(on(10), at(12, 0));
  m.transaction_time = None;
  let recorded = mutate::delete(&mut store, &m).unwrap().transaction_time;
  assert!(recorded >= before);
}

#[test]
fn instant_target_requires_exact_match() {
  let mut store = MemoryStore::new();
  store.append(observation("11218-5", "5", instant(10, 8), at(10, 9)));

  let miss = mutate::delete(&mut store, &mutation(instant(10, 9), at(12, 0)));
  assert_eq!(miss.unwrap_err(), MutationError::OriginalNotFound);

  mutate::delete(&mut store, &mutation(instant(10, 8), at(12, 0))).unwrap();
  assert!(point(&store, instant(10, 8), at(13, 0)).unwrap().is_deleted());
}

#[test]
fn mutation_base_ignores_transaction_visibility() {
  // The only version was recorded on the 20th; a backdated delete still finds
  // it and is itself visible from the 12th.
  let mut store = MemoryStore::new();
  store.append(observation("11218-5", "5", on(10), at(20, 0)));
  mutate::delete(&mut store, &mutation(on(10), at(12, 0))).unwrap();
  assert!(point(&store, on(10), at(13, 0)).unwrap().is_deleted());
}

// ─── History resolver ────────────────────────────────────────────────────────

#[test]
fn history_sorts_by_valid_time_then_concept() {
  let mut store = MemoryStore::new();
  store.append(observation("14743-9", "90", on(12), at(12, 9)));
  store.append(observation("12345", "4000", on(10), at(10, 9)));
  store.append(observation("11218-5", "5", on(10), at(10, 9)));

  let entries = january(&store, at(20, 0)).unwrap();
  let order: Vec<(ValidTime, &str)> =
    entries.iter().map(|e| (e.valid_time, e.concept_code.as_str())).collect();
  assert_eq!(order, [(on(10), "11218-5"), (on(10), "12345"), (on(12), "14743-9")]);
  assert_eq!(entries[2].concept_description, "Glucose [Moles/volume] in Body fluid");
}

#[test]
fn history_concept_filter() {
  let mut store = MemoryStore::new();
  store.append(observation("14743-9", "90", on(12), at(12, 9)));
  store.append(observation("11218-5", "5", on(10), at(10, 9)));

  let query = HistoryQuery {
    patient:           john(),
    concept:           Some("14743-9".into()),
    start_valid:       on(1),
    end_valid:         on(31),
    as_of_transaction: at(20, 0),
  };
  let entries = resolve_history(&store, &StaticDictionary::default(), &query).unwrap();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0].concept_code.as_str(), "14743-9");

  let missing = HistoryQuery { concept: Some("0000-0".into()), ..query };
  assert_eq!(
    resolve_history(&store, &StaticDictionary::default(), &missing),
    Err(QueryError::NoRecordsForPatient)
  );
}

#[test]
fn history_reports_each_empty_stage() {
  let store = seeded();

  let stranger = HistoryQuery {
    patient:           PatientKey::new("Jane", "Roe"),
    concept:           None,
    start_valid:       on(1),
    end_valid:         on(31),
    as_of_transaction: at(20, 0),
  };
  assert_eq!(
    resolve_history(&store, &StaticDictionary::default(), &stranger),
    Err(QueryError::NoRecordsForPatient)
  );

  assert_eq!(january(&store, at(1, 0)), Err(QueryError::NoVisibleTransaction));

  let out_of_range = HistoryQuery {
    patient: john(),
    start_valid: on(20),
    ..stranger
  };
  assert_eq!(
    resolve_history(&store, &StaticDictionary::default(), &out_of_range),
    Err(QueryError::NoMatchingHistory)
  );
}

#[test]
fn history_drops_current_tombstone() {
  let mut store = seeded();
  mutate::delete(&mut store, &mutation(on(10), at(12, 0))).unwrap();
  assert_eq!(january(&store, at(13, 0)), Err(QueryError::NoMatchingHistory));
  assert_eq!(january(&store, at(11, 0)).unwrap().len(), 1);
}

#[test]
fn history_range_is_inclusive() {
  let mut store = MemoryStore::new();
  store.append(observation("11218-5", "1", on(1), at(1, 9)));
  store.append(observation("11218-5", "2", instant(31, 23), at(31, 23)));
  store.append(observation("11218-5", "3", instant(31, 23), at(31, 23)));

  let entries = january(&store, at(31, 23)).unwrap();
  let values: Vec<String> = entries.iter().map(|e| e.value.to_string()).collect();
  assert_eq!(values, ["1", "2"]);
}
