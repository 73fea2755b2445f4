//! Rendering of outcomes for the terminal, as text or JSON.

use std::fmt::{self, Display};

use anyhow::Result;
use chart_core::{fact::FactVersion, outcome::HistoryEntry};
use serde::Serialize;
use serde_json::json;

/// A successful update or delete: the confirmation and the appended version.
#[derive(Debug, Serialize)]
pub struct Recorded {
  pub message: String,
  pub version: FactVersion,
}

impl Display for Recorded {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.message) }
}

/// Render a single outcome. Domain errors are rendered, not propagated.
pub fn outcome<T, E>(json: bool, result: &Result<T, E>) -> Result<String>
where
  T: Serialize + Display,
  E: Serialize + Display,
{
  if json {
    let value = match result {
      Ok(v) => serde_json::to_value(v)?,
      Err(e) => json!({ "error": e, "message": e.to_string() }),
    };
    return Ok(serde_json::to_string_pretty(&value)?);
  }

  Ok(match result {
    Ok(v) => v.to_string(),
    Err(e) => e.to_string(),
  })
}

/// Render a timeline, one entry per line.
pub fn history<E>(json: bool, result: &Result<Vec<HistoryEntry>, E>) -> Result<String>
where
  E: Serialize + Display,
{
  if json {
    let value = match result {
      Ok(entries) => serde_json::to_value(entries)?,
      Err(e) => json!({ "error": e, "message": e.to_string() }),
    };
    return Ok(serde_json::to_string_pretty(&value)?);
  }

  Ok(match result {
    Ok(entries) => entries
      .iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>()
      .join("\n"),
    Err(e) => e.to_string(),
  })
}
