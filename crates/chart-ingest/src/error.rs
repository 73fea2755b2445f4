//! Error types for the chart-ingest codec.

use std::path::PathBuf;

use thiserror::Error;

use crate::columns::Field;

#[derive(Debug, Error)]
pub enum Error {
  #[error("reading {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("unsupported source format: {0:?}")]
  UnsupportedFormat(String),

  #[error("source is neither UTF-8 nor windows-1255 text: {0}")]
  Decode(#[from] std::str::Utf8Error),

  #[error("no column recognised as {0}")]
  MissingColumn(Field),

  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("spreadsheet error: {0}")]
  Spreadsheet(#[from] calamine::Error),

  #[error("workbook has no worksheets")]
  EmptyWorkbook,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a single source row was left out of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowErrorKind {
  #[error("missing value for {0}")]
  MissingField(Field),

  #[error("invalid {field} {value:?}")]
  InvalidTimestamp { field: Field, value: String },
}

/// A rejected row, by 1-based source line (CSV) or record position (JSON).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {line}: {kind}")]
pub struct RowError {
  pub line: u64,
  pub kind: RowErrorKind,
}
