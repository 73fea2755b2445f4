//! Application state: one store, one dictionary, and the file it came from.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chart_core::{
  MutationError, QueryError,
  dictionary::{ConceptDictionary, StaticDictionary},
  fact::{ConceptCode, FactVersion, Measurement},
  history::{HistoryQuery, resolve_history},
  mutate::{self, Mutation},
  outcome::{HistoryEntry, PointOutcome},
  point::{PointQuery, resolve},
  store::{FactLog, MemoryStore},
};
use tracing::warn;

pub struct App {
  pub store:      MemoryStore,
  pub dictionary: StaticDictionary,
  data_path:      PathBuf,
}

impl App {
  /// Load the observation file at `data_path` into a fresh store.
  ///
  /// Rows that fail to decode are logged and skipped.
  pub fn load(data_path: &Path, dictionary: StaticDictionary) -> Result<Self> {
    let batch = chart_ingest::load_path(data_path)
      .with_context(|| format!("loading observations from {}", data_path.display()))?;

    if !batch.rejected.is_empty() {
      warn!(
        rejected = batch.rejected.len(),
        "some rows were skipped while loading {}",
        data_path.display()
      );
    }

    let mut store = MemoryStore::new();
    batch.append_to(&mut store);

    Ok(Self { store, dictionary, data_path: data_path.to_path_buf() })
  }

  /// Resolve user input to a concept code: a known code, else the first
  /// description containing the text, else the text itself.
  pub fn concept(&self, text: &str) -> ConceptCode {
    self
      .dictionary
      .find_code(text)
      .unwrap_or_else(|| ConceptCode::from(text.trim()))
  }

  pub fn query(&self, query: &PointQuery) -> Result<PointOutcome, QueryError> {
    resolve(&self.store, &self.dictionary, query)
  }

  pub fn history(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>, QueryError> {
    resolve_history(&self.store, &self.dictionary, query)
  }

  pub fn delete(&mut self, mutation: &Mutation) -> Result<FactVersion, MutationError> {
    mutate::delete(&mut self.store, mutation).cloned()
  }

  pub fn update(
    &mut self,
    mutation: &Mutation,
    new_value: Measurement,
  ) -> Result<FactVersion, MutationError> {
    mutate::update(&mut self.store, mutation, new_value).cloned()
  }

  /// Write the whole store back over the file it was loaded from.
  pub fn save(&self) -> Result<()> {
    chart_ingest::export_path(&self.store, &self.data_path)
      .with_context(|| format!("writing store to {}", self.data_path.display()))?;
    Ok(())
  }

  pub fn len(&self) -> usize { self.store.len() }
}
