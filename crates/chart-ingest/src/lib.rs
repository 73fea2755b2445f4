//! Tabular codec for Chart.
//!
//! Converts CSV, JSON and spreadsheet observation files into [`chart_core`]
//! fact versions, and writes a store back out as CSV. Pure synchronous; the
//! only I/O is the file read or write in [`load_path`] and [`export_path`].
//!
//! # Quick start
//!
//! ```no_run
//! use chart_core::store::MemoryStore;
//! use chart_ingest::load_path;
//!
//! let mut store = MemoryStore::new();
//! let batch = load_path("project_db_2025.csv").unwrap();
//! println!("{} rejected rows", batch.rejected.len());
//! batch.append_to(&mut store);
//! ```

pub mod columns;
mod decode;
pub mod error;
mod export;

use std::{
  fs::File,
  io::BufWriter,
  path::{Path, PathBuf},
};

use chart_core::{
  fact::{FactVersion, NewFactVersion},
  store::FactLog,
};
pub use error::{Error, Result, RowError, RowErrorKind};
use strum::{Display, EnumString};
use tracing::info;

// ─── Public types ────────────────────────────────────────────────────────────

/// A supported source encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SourceFormat {
  Csv,
  Json,
  /// Excel workbooks, current (`xlsx`) or legacy (`xls`).
  #[strum(to_string = "xlsx", serialize = "xls")]
  Xlsx,
}

impl SourceFormat {
  /// Detect the format from a file extension.
  pub fn from_path(path: &Path) -> Result<Self> {
    let ext = path
      .extension()
      .and_then(|e| e.to_str())
      .unwrap_or_default();
    ext
      .parse()
      .map_err(|_| Error::UnsupportedFormat(ext.to_owned()))
  }
}

/// The outcome of decoding one source.
///
/// Rows that could not be decoded are collected in `rejected` rather than
/// aborting the rest of the batch.
#[derive(Debug, Default)]
pub struct Batch {
  pub records:  Vec<NewFactVersion>,
  pub rejected: Vec<RowError>,
}

impl Batch {
  /// Append every decoded record to `store` in source order.
  pub fn append_to<S: FactLog>(self, store: &mut S) -> usize {
    store.extend(self.records)
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

fn strip_bom(text: &str) -> &str { text.strip_prefix('\u{feff}').unwrap_or(text) }

/// Decode `input` as `format`.
pub fn decode(input: &[u8], format: SourceFormat) -> Result<Batch> {
  match format {
    SourceFormat::Csv => decode::decode_csv(strip_bom(&decode::csv_text(input)?)),
    SourceFormat::Json => decode::decode_json(strip_bom(std::str::from_utf8(input)?)),
    SourceFormat::Xlsx => decode::decode_sheet(input),
  }
}

/// Read and decode the file at `path`, detecting its format by extension.
pub fn load_path(path: impl AsRef<Path>) -> Result<Batch> {
  let path = path.as_ref();
  let format = SourceFormat::from_path(path)?;
  let bytes = std::fs::read(path).map_err(|source| Error::Io {
    path: path.to_path_buf(),
    source,
  })?;

  let batch = decode(&bytes, format)?;
  info!(
    path = %path.display(),
    %format,
    records = batch.records.len(),
    rejected = batch.rejected.len(),
    "decoded source"
  );
  Ok(batch)
}

/// Write `versions` as CSV to any writer.
pub fn write_csv<'a, W, I>(writer: W, versions: I) -> Result<()>
where
  W: std::io::Write,
  I: IntoIterator<Item = &'a FactVersion>,
{
  export::write_csv(writer, versions)
}

/// Export every version in `store` to a CSV file at `path`, replacing it.
pub fn export_path<S: FactLog + ?Sized>(store: &S, path: impl AsRef<Path>) -> Result<()> {
  let path = path.as_ref();
  let io_err = |source| Error::Io { path: PathBuf::from(path), source };

  if SourceFormat::from_path(path)? != SourceFormat::Csv {
    return Err(Error::UnsupportedFormat(path.display().to_string()));
  }

  let file = File::create(path).map_err(io_err)?;
  write_csv(BufWriter::new(file), store.versions())?;
  info!(path = %path.display(), versions = store.len(), "exported store");
  Ok(())
}
