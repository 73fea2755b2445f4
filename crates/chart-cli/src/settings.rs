//! Layered configuration: an optional TOML file, then `CHART_*` environment
//! variables. Command-line flags override both.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use chart_core::dictionary::StaticDictionary;
use serde::Deserialize;

/// Used when `--config` is not given; silently skipped if absent.
const DEFAULT_CONFIG_FILE: &str = "chart.toml";

/// Shape of the configuration file.
///
/// ```toml
/// data_path = "project_db_2025.csv"
///
/// [dictionary]
/// "2345-7" = "Glucose [Mass/volume] in Serum or Plasma"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
  /// Observation file loaded on start-up.
  #[serde(default)]
  pub data_path:  Option<PathBuf>,
  /// Extra concept descriptions, merged over the built-in LOINC entries.
  #[serde(default)]
  pub dictionary: BTreeMap<String, String>,
}

impl CliConfig {
  /// Load configuration. An explicitly named file must exist; the default
  /// file is optional.
  pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
    let (file, required) = match path {
      Some(p) => (p.to_path_buf(), true),
      None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let settings = config::Config::builder()
      .add_source(config::File::from(file.clone()).required(required))
      .add_source(
        config::Environment::with_prefix("CHART")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .with_context(|| format!("failed to read config file {}", file.display()))?;

    settings
      .try_deserialize()
      .context("failed to deserialise CliConfig")
  }

  /// The built-in dictionary with this configuration's entries merged in.
  pub fn dictionary(&self) -> StaticDictionary {
    let mut dict = StaticDictionary::default();
    for (code, description) in &self.dictionary {
      dict.insert(code.as_str().into(), description.clone());
    }
    dict
  }
}
