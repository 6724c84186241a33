//! The [`Entity`] contract: what a type declares in order to be persisted by a
//! generic repository.
//!
//! A concrete entity names its table, lists its columns in order (identity
//! column first), renders its attribute state as a [`Record`] and rebuilds
//! itself from one. Construction is keyed by column name, so a column list
//! that disagrees with the constructor fails loudly instead of shuffling
//! data between fields.

use crate::{Error, Result, record::Record};

/// Name of the identity column every entity table starts with.
pub const ID_COLUMN: &str = "id";

pub trait Entity: Sized {
  /// Table the entity lives in.
  const TABLE: &'static str;

  /// Ordered column list. The first entry must be [`ID_COLUMN`].
  const COLUMNS: &'static [&'static str];

  /// Store-assigned identity; `None` until the first insert.
  fn id(&self) -> Option<i64>;

  /// Write the store-assigned identity back onto the instance.
  fn assign_id(&mut self, id: i64);

  /// Current attribute state for every declared column except the identity.
  fn to_record(&self) -> Record;

  /// Rebuild an instance from a row holding every declared column.
  fn from_record(record: &Record) -> Result<Self>;

  /// Reject attribute state the store must never see.
  fn validate(&self) -> Result<()> { Ok(()) }
}

/// Declared columns minus the identity column.
pub fn data_columns<E: Entity>() -> &'static [&'static str] {
  match E::COLUMNS.split_first() {
    Some((_, rest)) => rest,
    None => &[],
  }
}

/// `true` for plain SQL identifiers: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(s: &str) -> bool {
  let mut chars = s.chars();
  matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate an entity's table and column declaration.
///
/// Identifiers end up spliced into SQL text (only values are bound), so they
/// are held to the plain-identifier alphabet here.
pub fn check_declaration<E: Entity>() -> Result<()> {
  let fail = |reason: String| Error::Declaration { table: E::TABLE, reason };

  if !is_identifier(E::TABLE) {
    return Err(fail("table name is not a plain identifier".into()));
  }
  match E::COLUMNS.first() {
    Some(&first) if first == ID_COLUMN => {}
    Some(&first) => {
      return Err(fail(format!("first column is {first:?}, expected {ID_COLUMN:?}")));
    }
    None => return Err(fail("no columns declared".into())),
  }
  if E::COLUMNS.len() < 2 {
    return Err(fail("no data columns declared".into()));
  }

  for (idx, column) in E::COLUMNS.iter().enumerate() {
    if !is_identifier(column) {
      return Err(fail(format!("column {column:?} is not a plain identifier")));
    }
    if E::COLUMNS[..idx].contains(column) {
      return Err(fail(format!("column {column:?} declared twice")));
    }
  }
  Ok(())
}
