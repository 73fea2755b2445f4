//! Header normalisation.
//!
//! Source files name their columns inconsistently. [`HEADER_ALIASES`] lists,
//! for every canonical field, the header variants recognised for it; the first
//! variant present in a file wins.

use strum::{Display, EnumIter, IntoEnumIterator};

use crate::error::{Error, Result};

/// A canonical fact field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Field {
  #[strum(serialize = "first name")]
  FirstName,
  #[strum(serialize = "last name")]
  LastName,
  Concept,
  Value,
  #[strum(serialize = "transaction time")]
  TransactionTime,
  #[strum(serialize = "valid time")]
  ValidTime,
}

/// Recognised header variants, in order of preference. The first variant of
/// each field is the header written on export.
pub const HEADER_ALIASES: &[(Field, &[&str])] = &[
  (Field::FirstName, &["First name", "Firstname", "Name", "First"]),
  (Field::LastName, &["Last name", "Lastname", "Family Name", "Last"]),
  (Field::Concept, &["LOINC", "LOINC-NUM", "LOINC CODE", "Code"]),
  (Field::Value, &["Value", "Result"]),
  (Field::TransactionTime, &["Transaction time", "TransactionTime", "TT"]),
  (Field::ValidTime, &["Valid start time", "ValidStartTime", "Time"]),
];

/// Strip surrounding whitespace and any double quotes from a raw header.
pub fn clean_header(raw: &str) -> String { raw.replace('"', "").trim().to_owned() }

/// The preferred header for `field`.
pub fn canonical_header(field: Field) -> &'static str {
  aliases(field).first().copied().unwrap_or_default()
}

fn aliases(field: Field) -> &'static [&'static str] {
  HEADER_ALIASES
    .iter()
    .find(|(f, _)| *f == field)
    .map(|(_, a)| *a)
    .unwrap_or_default()
}

/// Where each canonical field lives in a particular source.
#[derive(Debug, Clone)]
pub struct ColumnMap {
  columns: Vec<(Field, usize, String)>,
}

impl ColumnMap {
  /// Map cleaned `headers` to canonical fields. Every field is required.
  pub fn resolve<I, H>(headers: I) -> Result<Self>
  where
    I: IntoIterator<Item = H>,
    H: AsRef<str>,
  {
    let cleaned: Vec<String> =
      headers.into_iter().map(|h| clean_header(h.as_ref())).collect();

    let columns = Field::iter()
      .map(|field| {
        aliases(field)
          .iter()
          .find_map(|alias| {
            cleaned
              .iter()
              .position(|h| h == alias)
              .map(|index| (field, index, cleaned[index].clone()))
          })
          .ok_or(Error::MissingColumn(field))
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Self { columns })
  }

  /// Position of `field` among the source headers.
  pub fn index(&self, field: Field) -> Option<usize> {
    self.column(field).map(|(_, index, _)| *index)
  }

  /// The source header that was mapped to `field`.
  pub fn header(&self, field: Field) -> Option<&str> {
    self.column(field).map(|(_, _, header)| header.as_str())
  }

  fn column(&self, field: Field) -> Option<&(Field, usize, String)> {
    self.columns.iter().find(|(f, _, _)| *f == field)
  }
}
