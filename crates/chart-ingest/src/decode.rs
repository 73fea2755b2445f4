//! Tabular source decoding.
//!
//! Pipeline:
//!   raw bytes
//!     └─ text: UTF-8, else windows-1255 (CSV) / workbook (xlsx, xls)
//!          └─ header row / object keys → ColumnMap
//!               └─ decode_row() per record → NewFactVersion | RowError

use std::{borrow::Cow, io::Cursor};

use calamine::{Data, DataType as _, Reader, open_workbook_auto_from_rs};
use chart_core::{
  fact::{FactValue, NewFactVersion, PatientKey},
  time::{ValidTime, parse_transaction_time},
};
use chrono::{NaiveDateTime, Timelike};
use encoding_rs::WINDOWS_1255;
use serde_json::{Map, Value};
use tracing::warn;

use crate::{
  Batch,
  columns::{ColumnMap, Field},
  error::{Error, Result, RowError, RowErrorKind},
};

// ─── Row decoding ────────────────────────────────────────────────────────────

/// Build one fact version from a row, given a lookup of its cells by field.
/// Empty cells count as missing.
fn decode_row<'r, F>(cell: F) -> Result<NewFactVersion, RowErrorKind>
where
  F: Fn(Field) -> Option<&'r str>,
{
  let required = |field: Field| {
    cell(field)
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .ok_or(RowErrorKind::MissingField(field))
  };

  let first = required(Field::FirstName)?;
  let last = required(Field::LastName)?;
  let concept = required(Field::Concept)?;
  let value = required(Field::Value)?;

  let raw_tx = required(Field::TransactionTime)?;
  let transaction_time =
    parse_transaction_time(raw_tx).map_err(|e| RowErrorKind::InvalidTimestamp {
      field: Field::TransactionTime,
      value: e.input,
    })?;

  let raw_valid = required(Field::ValidTime)?;
  let valid_time =
    raw_valid
      .parse::<ValidTime>()
      .map_err(|e| RowErrorKind::InvalidTimestamp {
        field: Field::ValidTime,
        value: e.input,
      })?;

  Ok(NewFactVersion::new(
    PatientKey::new(first, last),
    concept,
    FactValue::parse(value),
    valid_time,
    transaction_time,
  ))
}

fn push_row(batch: &mut Batch, line: u64, row: Result<NewFactVersion, RowErrorKind>) {
  match row {
    Ok(record) => batch.records.push(record),
    Err(kind) => {
      let rejected = RowError { line, kind };
      warn!("{rejected}");
      batch.rejected.push(rejected);
    }
  }
}

// ─── CSV ─────────────────────────────────────────────────────────────────────

/// Source text of a CSV file. Files that are not UTF-8 are read as
/// windows-1255, the legacy Hebrew codepage; a byte unmapped there too fails
/// the source.
pub(crate) fn csv_text(input: &[u8]) -> Result<Cow<'_, str>> {
  match std::str::from_utf8(input) {
    Ok(text) => Ok(Cow::Borrowed(text)),
    Err(utf8) => {
      let (text, had_errors) = WINDOWS_1255.decode_without_bom_handling(input);
      if had_errors {
        return Err(Error::Decode(utf8));
      }
      warn!("source is not UTF-8; read as windows-1255");
      Ok(text)
    }
  }
}

pub(crate) fn decode_csv(text: &str) -> Result<Batch> {
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(true)
    .flexible(true)
    .from_reader(text.as_bytes());

  let columns = ColumnMap::resolve(reader.headers()?.iter())?;
  let mut batch = Batch::default();

  for record in reader.records() {
    let record = record?;
    let line = record.position().map(|p| p.line()).unwrap_or_default();
    let row = decode_row(|field| columns.index(field).and_then(|i| record.get(i)));
    push_row(&mut batch, line, row);
  }

  Ok(batch)
}

// ─── JSON ────────────────────────────────────────────────────────────────────

/// Render a scalar JSON value as cell text. Nulls and containers are empty.
fn json_cell(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Null | Value::Array(_) | Value::Object(_) => None,
  }
}

/// Decode an array of flat objects. Keys are normalised like CSV headers;
/// the key set of the first object fixes the column mapping.
pub(crate) fn decode_json(text: &str) -> Result<Batch> {
  let objects: Vec<Map<String, Value>> = serde_json::from_str(text)?;
  let mut batch = Batch::default();

  let Some(first) = objects.first() else {
    return Ok(batch);
  };
  let keys: Vec<&String> = first.keys().collect();
  let columns = ColumnMap::resolve(&keys)?;

  for (position, object) in objects.iter().enumerate() {
    // Cells keyed by the original (uncleaned) key of the first object.
    let cells: Vec<Option<String>> = keys
      .iter()
      .map(|k| object.get(k.as_str()).and_then(json_cell))
      .collect();
    let row = decode_row(|field| {
      columns
        .index(field)
        .and_then(|i| cells.get(i))
        .and_then(|c| c.as_deref())
    });
    push_row(&mut batch, position as u64 + 1, row);
  }

  Ok(batch)
}

// ─── Spreadsheet ─────────────────────────────────────────────────────────────

fn sheet_datetime(dt: NaiveDateTime) -> String {
  // Spreadsheet dates carry no precision; midnight reads as a bare date.
  if dt.num_seconds_from_midnight() == 0 && dt.nanosecond() == 0 {
    dt.format("%Y-%m-%d").to_string()
  } else {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
  }
}

/// Render a worksheet cell as cell text. Empty and error cells are missing.
fn sheet_cell(cell: &Data) -> Option<String> {
  match cell {
    Data::Empty | Data::Error(_) => None,
    Data::DateTime(_) => cell.as_datetime().map(sheet_datetime),
    other => Some(other.to_string()),
  }
}

/// Decode the first worksheet of an `xlsx`/`xls` workbook. Its first row is
/// the header row.
pub(crate) fn decode_sheet(input: &[u8]) -> Result<Batch> {
  let mut workbook = open_workbook_auto_from_rs(Cursor::new(input))?;
  let range = workbook.worksheet_range_at(0).ok_or(Error::EmptyWorkbook)??;
  let mut batch = Batch::default();

  let mut rows = range.rows();
  let Some(header) = rows.next() else {
    return Ok(batch);
  };
  let headers: Vec<String> = header
    .iter()
    .map(|c| sheet_cell(c).unwrap_or_default())
    .collect();
  let columns = ColumnMap::resolve(&headers)?;

  // 1-based sheet row of the header.
  let header_line = range.start().map_or(0, |(row, _)| u64::from(row)) + 1;

  for (offset, row) in rows.enumerate() {
    let cells: Vec<Option<String>> = row.iter().map(sheet_cell).collect();
    let decoded = decode_row(|field| {
      columns
        .index(field)
        .and_then(|i| cells.get(i))
        .and_then(|c| c.as_deref())
    });
    push_row(&mut batch, header_line + offset as u64 + 1, decoded);
  }

  Ok(batch)
}
