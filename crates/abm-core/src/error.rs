//! Error types for `abm-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A value was rejected before it could reach the store.
  #[error("constraint violation on `{field}`: {reason}")]
  ConstraintViolation { field: &'static str, reason: String },

  #[error("missing column: {0}")]
  MissingColumn(String),

  #[error("column {column} holds {found}, expected {expected}")]
  ColumnType {
    column:   String,
    expected: &'static str,
    found:    &'static str,
  },

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("invalid timestamp in column {column}: {reason}")]
  Timestamp { column: String, reason: String },

  #[error("invalid declaration for table {table:?}: {reason}")]
  Declaration { table: &'static str, reason: String },

  #[error("password hashing failed: {0}")]
  PasswordHash(String),
}

impl Error {
  pub fn constraint(field: &'static str, reason: impl Into<String>) -> Self {
    Self::ConstraintViolation { field, reason: reason.into() }
  }

  pub fn is_constraint_violation(&self) -> bool {
    matches!(self, Self::ConstraintViolation { .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
