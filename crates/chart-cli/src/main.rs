//! `chart` — command-line driver for the Chart observation store.
//!
//! # Usage
//!
//! ```text
//! chart --data project_db_2025.csv query --first John --last Doe --concept 11218-5 \
//!   --valid 10/01/2024 --as-of "11/01/2024 00:00"
//! chart --data project_db_2025.csv history --first John --last Doe \
//!   --from 01/01/2024 --to 31/01/2024
//! chart --data project_db_2025.csv delete --first John --last Doe \
//!   --concept glucose --valid "10/01/2024 08:30" --write
//! ```
//!
//! The store lives for one invocation. `delete` and `update` only outlast it
//! when `--write` exports the store back over the data file.

mod app;
mod report;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use app::App;
use chart_core::{
  MutationError,
  dictionary::ConceptDictionary,
  fact::{FactValue, PatientKey},
  history::HistoryQuery,
  mutate::Mutation,
  point::PointQuery,
  time::{TransactionTime, ValidTime, parse_transaction_time},
};
use chrono::Utc;
use clap::{Args as ClapArgs, Parser, Subcommand};
use report::Recorded;
use settings::CliConfig;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "chart", version, about = "Bitemporal clinical observation store")]
struct Args {
  /// Path to a TOML config file (data_path, [dictionary]).
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Observation file to load (CSV or JSON).
  #[arg(short, long, value_name = "FILE", env = "CHART_DATA", global = true)]
  data: Option<PathBuf>,

  /// Print outcomes as JSON.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(ClapArgs, Debug)]
struct Patient {
  /// Patient first name (case-insensitive).
  #[arg(long)]
  first: String,

  /// Patient last name (case-insensitive).
  #[arg(long)]
  last: String,
}

impl Patient {
  fn key(&self) -> PatientKey { PatientKey::new(self.first.trim(), self.last.trim()) }
}

#[derive(Subcommand, Debug)]
enum Command {
  #[command(flatten)]
  Store(StoreCommand),

  /// Look up a concept by code or description text.
  Describe {
    /// Code or description fragment.
    text: String,
  },
}

/// Commands that run against a loaded observation file.
#[derive(Subcommand, Debug)]
enum StoreCommand {
  /// The value of one concept at one valid time, as known at a perspective time.
  Query {
    #[command(flatten)]
    patient: Patient,
    /// Concept code, or text matched against concept descriptions.
    #[arg(long)]
    concept: String,
    /// Valid time (DD/MM/YYYY [HH:MM]); a bare date asks for that whole day.
    /// Defaults to now.
    #[arg(long)]
    valid: Option<ValidTime>,
    /// Perspective (transaction) time. Defaults to now.
    #[arg(long, value_parser = parse_transaction_time)]
    as_of: Option<TransactionTime>,
  },

  /// The visible timeline of a patient over a valid-time range.
  History {
    #[command(flatten)]
    patient: Patient,
    /// Restrict to one concept (code or description text).
    #[arg(long)]
    concept: Option<String>,
    /// Start of the valid-time range, inclusive.
    #[arg(long)]
    from: ValidTime,
    /// End of the valid-time range, inclusive; a bare date covers the day.
    #[arg(long)]
    to: ValidTime,
    /// Perspective (transaction) time. Defaults to now.
    #[arg(long, value_parser = parse_transaction_time)]
    as_of: Option<TransactionTime>,
  },

  /// Logically delete a measurement.
  Delete {
    #[command(flatten)]
    patient: Patient,
    #[arg(long)]
    concept: String,
    /// Valid time of the measurement to delete.
    #[arg(long)]
    valid: ValidTime,
    /// Transaction time to record the delete at. Defaults to now.
    #[arg(long, value_parser = parse_transaction_time)]
    at: Option<TransactionTime>,
    /// Export the store back over the data file afterwards.
    #[arg(long)]
    write: bool,
  },

  /// Record a corrected value for a measurement.
  Update {
    #[command(flatten)]
    patient: Patient,
    #[arg(long)]
    concept: String,
    /// Valid time of the original measurement.
    #[arg(long)]
    valid: ValidTime,
    /// The new value; `DELETED` records a delete.
    #[arg(long, value_parser = parse_new_value)]
    value: FactValue,
    /// Transaction time to record the update at. Defaults to now.
    #[arg(long, value_parser = parse_transaction_time)]
    at: Option<TransactionTime>,
    /// Export the store back over the data file afterwards.
    #[arg(long)]
    write: bool,
  },
}

/// Read `--value` the way the same cell reads on ingestion. Blank text has
/// no tabular form, so it is refused here.
fn parse_new_value(raw: &str) -> Result<FactValue, String> {
  if raw.trim().is_empty() {
    return Err("value must not be empty".to_owned());
  }
  Ok(FactValue::parse(raw))
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let output = execute(Args::parse())?;
  println!("{output}");
  Ok(())
}

fn execute(args: Args) -> Result<String> {
  let cfg = CliConfig::load(args.config.as_deref())?;
  let dictionary = cfg.dictionary();

  let command = match args.command {
    // Dictionary lookups need no observation file.
    Command::Describe { text } => return Ok(describe(&dictionary, &text)),
    Command::Store(command) => command,
  };

  // CLI flag overrides config file.
  let data_path = args
    .data
    .or(cfg.data_path)
    .ok_or_else(|| anyhow!("no data file given (use --data or data_path in chart.toml)"))?;

  let mut app = App::load(&data_path, dictionary)?;
  info!(versions = app.len(), path = %data_path.display(), "store loaded");

  run(&mut app, command, args.json)
}

fn run(app: &mut App, command: StoreCommand, json: bool) -> Result<String> {
  match command {
    StoreCommand::Query { patient, concept, valid, as_of } => {
      let query = PointQuery {
        patient:           patient.key(),
        concept:           app.concept(&concept),
        as_of_valid:       valid.unwrap_or_else(|| ValidTime::Instant(Utc::now())),
        as_of_transaction: as_of.unwrap_or_else(Utc::now),
      };
      report::outcome(json, &app.query(&query))
    }

    StoreCommand::History { patient, concept, from, to, as_of } => {
      let query = HistoryQuery {
        patient:           patient.key(),
        concept:           concept.as_deref().map(|c| app.concept(c)),
        start_valid:       from,
        end_valid:         to,
        as_of_transaction: as_of.unwrap_or_else(Utc::now),
      };
      report::history(json, &app.history(&query))
    }

    StoreCommand::Delete { patient, concept, valid, at, write } => {
      let mutation = Mutation {
        patient:          patient.key(),
        concept:          app.concept(&concept),
        target_valid:     valid,
        transaction_time: at,
      };
      let result = record_delete(app, &mutation);
      finish_mutation(app, json, write, &result)
    }

    StoreCommand::Update { patient, concept, valid, value, at, write } => {
      let mutation = Mutation {
        patient:          patient.key(),
        concept:          app.concept(&concept),
        target_valid:     valid,
        transaction_time: at,
      };
      let result = match value {
        FactValue::Tombstone => record_delete(app, &mutation),
        FactValue::Recorded(new_value) => {
          let message = format!("Success: Updated value to {new_value}.");
          app
            .update(&mutation, new_value)
            .map(|version| Recorded { message, version })
        }
      };
      finish_mutation(app, json, write, &result)
    }
  }
}

fn record_delete(
  app: &mut App,
  mutation: &Mutation,
) -> std::result::Result<Recorded, MutationError> {
  app.delete(mutation).map(|version| Recorded {
    message: "Success: Record marked as DELETED.".to_owned(),
    version,
  })
}

fn describe<D: ConceptDictionary>(dictionary: &D, text: &str) -> String {
  let code = dictionary
    .find_code(text)
    .unwrap_or_else(|| text.trim().into());
  format!("{code}: {}", dictionary.describe(&code))
}

/// Only a successful mutation is written back, and only when asked.
fn finish_mutation(
  app: &App,
  json: bool,
  write: bool,
  result: &std::result::Result<Recorded, MutationError>,
) -> Result<String> {
  if write && result.is_ok() {
    app.save().context("persisting mutation")?;
    info!("store written back");
  }
  report::outcome(json, result)
}
