//! CSV export of a store.
//!
//! Versions are written in insertion order under the canonical headers, so a
//! re-ingested export reproduces the same versions in the same order.

use std::io;

use chart_core::{
  fact::FactVersion,
  time::{TransactionTime, ValidTime},
};
use chrono::SecondsFormat;

use crate::{
  columns::{Field, canonical_header},
  error::Result,
};

const EXPORT_ORDER: [Field; 6] = [
  Field::FirstName,
  Field::LastName,
  Field::Concept,
  Field::Value,
  Field::TransactionTime,
  Field::ValidTime,
];

fn encode_instant(t: &TransactionTime) -> String {
  t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn encode_valid(v: &ValidTime) -> String {
  match v {
    ValidTime::DateOnly(d) => d.format("%Y-%m-%d").to_string(),
    ValidTime::Instant(t) => encode_instant(t),
  }
}

pub(crate) fn write_csv<'a, W, I>(writer: W, versions: I) -> Result<()>
where
  W: io::Write,
  I: IntoIterator<Item = &'a FactVersion>,
{
  let mut out = csv::Writer::from_writer(writer);
  out.write_record(EXPORT_ORDER.map(canonical_header))?;

  for v in versions {
    out.write_record([
      v.patient.first_name().to_owned(),
      v.patient.last_name().to_owned(),
      v.concept.to_string(),
      v.value.to_string(),
      encode_instant(&v.transaction_time),
      encode_valid(&v.valid_time),
    ])?;
  }

  out.flush().map_err(csv::Error::from)?;
  Ok(())
}
