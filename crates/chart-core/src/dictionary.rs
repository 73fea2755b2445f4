//! Concept code → human description lookup.

use std::borrow::Cow;

use crate::fact::ConceptCode;

/// Returned by [`StaticDictionary::describe`] for codes it does not know.
pub const UNKNOWN_CONCEPT: &str = "Unknown Concept";

/// The LOINC entries every dictionary starts with.
const BUILTIN_LOINC: &[(&str, &str)] = &[
  ("12345", "Leukocytes [#/volume] in Blood by Automated count"),
  ("14743-9", "Glucose [Moles/volume] in Body fluid"),
  ("11218-5", "Anatomic pathology & Lab medicine"),
];

/// Describes concept codes for resolver output.
pub trait ConceptDictionary {
  /// Total: unknown codes produce a fallback description.
  fn describe(&self, code: &ConceptCode) -> Cow<'_, str>;

  /// Best-effort reverse lookup from a code or a fragment of a description.
  fn find_code(&self, text: &str) -> Option<ConceptCode>;
}

/// An ordered, in-memory dictionary. Lookup order is insertion order, which
/// makes free-text matches deterministic.
#[derive(Debug, Clone)]
pub struct StaticDictionary {
  entries: Vec<(ConceptCode, String)>,
}

impl Default for StaticDictionary {
  fn default() -> Self {
    Self::with_entries(
      BUILTIN_LOINC
        .iter()
        .map(|(code, desc)| (ConceptCode::from(*code), (*desc).to_owned())),
    )
  }
}

impl StaticDictionary {
  /// A dictionary with no entries at all; every code is unknown.
  pub fn empty() -> Self { Self { entries: Vec::new() } }

  pub fn with_entries<I>(entries: I) -> Self
  where
    I: IntoIterator<Item = (ConceptCode, String)>,
  {
    let mut dict = Self::empty();
    for (code, description) in entries {
      dict.insert(code, description);
    }
    dict
  }

  /// Add an entry, replacing the description of an existing code in place.
  pub fn insert(&mut self, code: ConceptCode, description: String) {
    match self.entries.iter_mut().find(|(c, _)| *c == code) {
      Some(entry) => entry.1 = description,
      None => self.entries.push((code, description)),
    }
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = (&ConceptCode, &str)> {
    self.entries.iter().map(|(c, d)| (c, d.as_str()))
  }
}

impl ConceptDictionary for StaticDictionary {
  fn describe(&self, code: &ConceptCode) -> Cow<'_, str> {
    self
      .entries
      .iter()
      .find(|(c, _)| c == code)
      .map(|(_, d)| Cow::Borrowed(d.as_str()))
      .unwrap_or(Cow::Borrowed(UNKNOWN_CONCEPT))
  }

  fn find_code(&self, text: &str) -> Option<ConceptCode> {
    let text = text.trim();
    if text.is_empty() {
      return None;
    }
    if let Some((code, _)) = self.entries.iter().find(|(c, _)| c.as_str() == text) {
      return Some(code.clone());
    }

    let needle = text.to_lowercase();
    self
      .entries
      .iter()
      .find(|(_, d)| d.to_lowercase().contains(&needle))
      .map(|(c, _)| c.clone())
  }
}
