//! The two time axes of the store.
//!
//! Valid time says when an observation held in the real world; it may be a
//! bare calendar date or a full instant, and the distinction is carried
//! explicitly rather than inferred from a midnight time-of-day. Transaction
//! time says when the store learned a version and is always an instant.

use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TimeParseError;

/// When a version was recorded. Strictly defines recency.
pub type TransactionTime = DateTime<Utc>;

/// Layouts carrying a time of day. Day-first layouts come first, matching the
/// clinical source files.
const INSTANT_FORMATS: &[&str] = &[
  "%d/%m/%Y %H:%M:%S",
  "%d/%m/%Y %H:%M",
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d"];

// ─── ValidTime ───────────────────────────────────────────────────────────────

/// When an observation is (or was) true in the real world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ValidTime {
  /// A calendar date without a time component.
  DateOnly(NaiveDate),
  /// A specific moment in time.
  Instant(DateTime<Utc>),
}

impl ValidTime {
  /// The calendar date this valid time falls on.
  pub fn date(&self) -> NaiveDate {
    match self {
      Self::DateOnly(d) => *d,
      Self::Instant(t) => t.date_naive(),
    }
  }

  /// The earliest instant covered. A date starts at midnight UTC.
  pub fn start(&self) -> DateTime<Utc> {
    match self {
      Self::DateOnly(d) => d.and_time(NaiveTime::MIN).and_utc(),
      Self::Instant(t) => *t,
    }
  }

  pub fn is_date_only(&self) -> bool { matches!(self, Self::DateOnly(_)) }

  /// Whether a recorded valid time satisfies this value used as a point-query
  /// cursor: a date admits anything on the same calendar day, an instant
  /// admits anything at or before it.
  pub fn admits(&self, recorded: &ValidTime) -> bool {
    match self {
      Self::DateOnly(d) => recorded.date() == *d,
      Self::Instant(_) => recorded <= self,
    }
  }

  /// Whether a recorded valid time is the one a mutation targets: a date
  /// identifies any version on that day, an instant only an exact match.
  pub fn identifies(&self, recorded: &ValidTime) -> bool {
    match self {
      Self::DateOnly(d) => recorded.date() == *d,
      Self::Instant(_) => recorded == self,
    }
  }

  /// Inclusive range membership. A date used as the upper bound covers the
  /// whole day.
  pub fn within(&self, start: &ValidTime, end: &ValidTime) -> bool {
    let lower = self.start() >= start.start();
    let upper = match end {
      Self::DateOnly(d) => self.date() <= *d,
      Self::Instant(t) => self.start() <= *t,
    };
    lower && upper
  }

  fn granularity_rank(&self) -> u8 {
    match self {
      Self::DateOnly(_) => 0,
      Self::Instant(_) => 1,
    }
  }
}

impl Ord for ValidTime {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .start()
      .cmp(&other.start())
      .then_with(|| self.granularity_rank().cmp(&other.granularity_rank()))
  }
}

impl PartialOrd for ValidTime {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl fmt::Display for ValidTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::DateOnly(d) => write!(f, "{}", d.format("%Y-%m-%d")),
      Self::Instant(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S")),
    }
  }
}

impl FromStr for ValidTime {
  type Err = TimeParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();

    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
      return Ok(Self::Instant(t.with_timezone(&Utc)));
    }
    for fmt in INSTANT_FORMATS {
      if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
        return Ok(Self::Instant(t.and_utc()));
      }
    }
    for fmt in DATE_FORMATS {
      if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
        return Ok(Self::DateOnly(d));
      }
    }

    Err(TimeParseError { input: s.to_owned() })
  }
}

impl From<NaiveDate> for ValidTime {
  fn from(d: NaiveDate) -> Self { Self::DateOnly(d) }
}

impl From<DateTime<Utc>> for ValidTime {
  fn from(t: DateTime<Utc>) -> Self { Self::Instant(t) }
}

/// Parse a transaction time. Date-only text means midnight UTC.
pub fn parse_transaction_time(s: &str) -> Result<TransactionTime, TimeParseError> {
  s.parse::<ValidTime>().map(|v| v.start())
}
