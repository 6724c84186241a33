//! Storage-neutral values and name-keyed records.
//!
//! A [`Record`] is what flows across the persistence boundary in both
//! directions: entities render their attribute state into one, and rows read
//! back from the store arrive as one. Columns are always looked up by name,
//! never by position.

use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  audit::{decode_dt, encode_dt},
};

// ─── Value ───────────────────────────────────────────────────────────────────

/// A single column value as the store sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
  Null,
  Integer(i64),
  Text(String),
}

impl Value {
  /// Name of the variant, used in type-mismatch errors.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Null => "null",
      Self::Integer(_) => "integer",
      Self::Text(_) => "text",
    }
  }

  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }
}

impl From<i64> for Value {
  fn from(v: i64) -> Self { Self::Integer(v) }
}

impl From<String> for Value {
  fn from(v: String) -> Self { Self::Text(v) }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self { Self::Text(v.to_owned()) }
}

impl From<DateTime<Utc>> for Value {
  fn from(v: DateTime<Utc>) -> Self { Self::Text(encode_dt(v)) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// An ordered list of `(column, value)` pairs with unique column names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
  fields: Vec<(String, Value)>,
}

impl Record {
  pub fn new() -> Self { Self::default() }

  /// Builder form of [`Record::set`].
  pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
    self.set(column, value);
    self
  }

  /// Set `column` to `value`, replacing any previous value for that column.
  pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
    let column = column.into();
    let value = value.into();
    match self.fields.iter_mut().find(|(name, _)| *name == column) {
      Some((_, slot)) => *slot = value,
      None => self.fields.push((column, value)),
    }
  }

  pub fn get(&self, column: &str) -> Option<&Value> {
    self
      .fields
      .iter()
      .find(|(name, _)| name == column)
      .map(|(_, value)| value)
  }

  pub fn columns(&self) -> impl Iterator<Item = &str> {
    self.fields.iter().map(|(name, _)| name.as_str())
  }

  pub fn len(&self) -> usize { self.fields.len() }

  pub fn is_empty(&self) -> bool { self.fields.is_empty() }

  fn require(&self, column: &str) -> Result<&Value> {
    self
      .get(column)
      .ok_or_else(|| Error::MissingColumn(column.to_owned()))
  }

  // ── Typed accessors ───────────────────────────────────────────────────────

  pub fn text(&self, column: &str) -> Result<String> {
    match self.require(column)? {
      Value::Text(s) => Ok(s.clone()),
      other => Err(mismatch(column, "text", other)),
    }
  }

  pub fn opt_text(&self, column: &str) -> Result<Option<String>> {
    match self.require(column)? {
      Value::Null => Ok(None),
      Value::Text(s) => Ok(Some(s.clone())),
      other => Err(mismatch(column, "text or null", other)),
    }
  }

  pub fn integer(&self, column: &str) -> Result<i64> {
    match self.require(column)? {
      Value::Integer(v) => Ok(*v),
      other => Err(mismatch(column, "integer", other)),
    }
  }

  pub fn opt_integer(&self, column: &str) -> Result<Option<i64>> {
    match self.require(column)? {
      Value::Null => Ok(None),
      Value::Integer(v) => Ok(Some(*v)),
      other => Err(mismatch(column, "integer or null", other)),
    }
  }

  pub fn timestamp(&self, column: &str) -> Result<DateTime<Utc>> {
    let raw = self.text(column)?;
    decode_dt(column, &raw)
  }

  pub fn opt_timestamp(&self, column: &str) -> Result<Option<DateTime<Utc>>> {
    self
      .opt_text(column)?
      .map(|raw| decode_dt(column, &raw))
      .transpose()
  }
}

impl IntoIterator for Record {
  type Item = (String, Value);
  type IntoIter = std::vec::IntoIter<(String, Value)>;

  fn into_iter(self) -> Self::IntoIter { self.fields.into_iter() }
}

fn mismatch(column: &str, expected: &'static str, found: &Value) -> Error {
  Error::ColumnType {
    column: column.to_owned(),
    expected,
    found: found.kind(),
  }
}
