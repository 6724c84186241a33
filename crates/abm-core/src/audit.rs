//! Creation and modification timestamps for auditable entities.
//!
//! Timestamps are stored as RFC 3339 (ISO-8601) text in UTC with microsecond
//! precision. Values are truncated to that precision in memory as well, so a
//! timestamp read back from the store compares equal to the one written.
//!
//! Reading is more lenient than writing: ISO-8601 text without an offset
//! (e.g. `2025-09-16T12:00:00.123456`, or SQLite's `2025-09-16 12:00:00`) is
//! taken as UTC, and rows whose stamp columns are NULL still load.

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, SubsecRound as _, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, record::Record};

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// The current time at storage precision.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Offset-less layouts accepted on read, tried in order.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn decode_dt(column: &str, s: &str) -> Result<DateTime<Utc>> {
  let s = s.trim();
  let rfc3339 = match DateTime::parse_from_rfc3339(s) {
    Ok(dt) => return Ok(dt.with_timezone(&Utc).trunc_subsecs(6)),
    Err(e) => e,
  };
  NAIVE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .map(|naive| naive.and_utc().trunc_subsecs(6))
    .ok_or_else(|| Error::Timestamp {
      column: column.to_owned(),
      reason: rfc3339.to_string(),
    })
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// `created_at` is fixed once stamped; `updated_at` only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl Timestamps {
  /// Stamp both fields with the current time.
  pub fn stamp() -> Self {
    let at = now();
    Self { created_at: at, updated_at: at }
  }

  /// Rebuild from persisted values.
  pub fn restore(created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
    Self { created_at, updated_at }
  }

  pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

  pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

  /// Re-stamp `updated_at`. The new value is strictly greater than the old
  /// one even when the clock has not advanced past storage precision.
  pub fn touch(&mut self) {
    let floor = self.updated_at + Duration::microseconds(1);
    self.updated_at = now().max(floor);
  }

  pub fn write_to(&self, record: &mut Record) {
    record.set(CREATED_AT, self.created_at);
    record.set(UPDATED_AT, self.updated_at);
  }

  /// A NULL stamp borrows the other column's value; with both NULL the row
  /// is dated at the Unix epoch.
  pub fn read_from(record: &Record) -> Result<Self> {
    let created_at = record.opt_timestamp(CREATED_AT)?;
    let updated_at = record.opt_timestamp(UPDATED_AT)?;
    let (created_at, updated_at) = match (created_at, updated_at) {
      (Some(c), Some(u)) => (c, u),
      (Some(at), None) | (None, Some(at)) => (at, at),
      (None, None) => (DateTime::<Utc>::UNIX_EPOCH, DateTime::<Utc>::UNIX_EPOCH),
    };
    Ok(Self { created_at, updated_at })
  }
}

/// An entity that carries [`Timestamps`].
///
/// Every mutator on an implementing type must call [`Timestamps::touch`];
/// the persistence layer does not do it on the entity's behalf.
pub trait Auditable {
  fn timestamps(&self) -> &Timestamps;

  fn created_at(&self) -> DateTime<Utc> { self.timestamps().created_at() }

  fn updated_at(&self) -> DateTime<Utc> { self.timestamps().updated_at() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::Value;

  #[test]
  fn touch_strictly_increases_updated_at() {
    let mut stamps = Timestamps::stamp();
    let created = stamps.created_at();
    let mut previous = stamps.updated_at();

    for _ in 0..100 {
      stamps.touch();
      assert!(stamps.updated_at() > previous);
      previous = stamps.updated_at();
    }
    assert_eq!(stamps.created_at(), created);
  }

  #[test]
  fn encoded_form_is_utc_with_micros() {
    let dt = DateTime::parse_from_rfc3339("2024-03-01T10:20:30.123456789+02:00")
      .unwrap()
      .with_timezone(&Utc)
      .trunc_subsecs(6);
    assert_eq!(encode_dt(dt), "2024-03-01T08:20:30.123456Z");
  }

  #[test]
  fn decode_rejects_garbage() {
    let err = decode_dt("created_at", "yesterday").unwrap_err();
    assert!(matches!(err, Error::Timestamp { ref column, .. } if column == "created_at"));
  }

  #[test]
  fn decode_accepts_offsetless_iso8601_as_utc() {
    let expected = DateTime::parse_from_rfc3339("2025-09-16T12:00:00.123456Z")
      .unwrap()
      .with_timezone(&Utc);
    assert_eq!(decode_dt("created_at", "2025-09-16T12:00:00.123456").unwrap(), expected);
    assert_eq!(
      decode_dt("created_at", "2025-09-16 12:00:00").unwrap(),
      expected.trunc_subsecs(0)
    );
    assert_eq!(
      decode_dt("created_at", "2025-09-16T12:00:00.123456789").unwrap(),
      expected
    );
  }

  #[test]
  fn null_stamps_still_load() {
    let at = now();
    let half = Record::new()
      .with(CREATED_AT, at)
      .with(UPDATED_AT, Value::Null);
    let stamps = Timestamps::read_from(&half).unwrap();
    assert_eq!((stamps.created_at(), stamps.updated_at()), (at, at));

    let bare = Record::new()
      .with(CREATED_AT, Value::Null)
      .with(UPDATED_AT, Value::Null);
    let stamps = Timestamps::read_from(&bare).unwrap();
    assert_eq!(stamps.created_at(), DateTime::<Utc>::UNIX_EPOCH);
  }

  #[test]
  fn record_round_trip() {
    let stamps = Timestamps::stamp();
    let mut record = Record::new();
    stamps.write_to(&mut record);
    assert_eq!(Timestamps::read_from(&record).unwrap(), stamps);
  }
}
