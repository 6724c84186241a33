//! Error type for `abm-store-sqlite`.
//!
//! Every `rusqlite` failure is translated here, at the DAO boundary; callers
//! never match on store-specific error codes.

use abm_core::store::StoreError;
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The database file (or memory database) could not be opened.
  #[error("storage unavailable at {location}: {source}")]
  StorageUnavailable {
    location: String,
    #[source]
    source:   rusqlite::Error,
  },

  #[error("database error: {0}")]
  Database(#[source] rusqlite::Error),

  /// The store refused a write (NOT NULL, UNIQUE, CHECK, ...).
  #[error("constraint violation: {message}")]
  Constraint {
    message: String,
    #[source]
    source:  rusqlite::Error,
  },

  #[error(transparent)]
  Core(#[from] abm_core::Error),

  #[error("no {table} row with id {id}")]
  NotFound { table: &'static str, id: i64 },

  #[error("{table} entity is already persisted with id {id}")]
  AlreadyPersisted { table: &'static str, id: i64 },

  #[error("{table} entity has no id; save it first")]
  NotPersisted { table: &'static str },

  #[error("column {column:?} is not declared by {table}")]
  UndeclaredColumn { table: &'static str, column: String },

  #[error("column {column:?} holds an unsupported {kind} value")]
  UnsupportedValue { column: String, kind: &'static str },

  #[error("schema mismatch on {table}: {detail}")]
  SchemaMismatch { table: &'static str, detail: String },

  #[error("database schema version {found} is newer than supported {supported}")]
  UnsupportedSchemaVersion { found: u32, supported: u32 },

  /// A statement that writes was passed to a read.
  #[error("statement is not read-only: {sql}")]
  NotReadOnly { sql: String },

  #[error("connection already closed")]
  Closed,
}

impl Error {
  /// `true` for violations caught either before or by the store.
  pub fn is_constraint_violation(&self) -> bool {
    match self {
      Self::Constraint { .. } => true,
      Self::Core(e) => e.is_constraint_violation(),
      _ => false,
    }
  }
}

impl StoreError for Error {
  fn is_constraint_violation(&self) -> bool { Error::is_constraint_violation(self) }
}

impl From<rusqlite::Error> for Error {
  fn from(err: rusqlite::Error) -> Self {
    if let rusqlite::Error::SqliteFailure(code, message) = &err
      && code.code == ErrorCode::ConstraintViolation
    {
      let message = message.clone().unwrap_or_else(|| code.to_string());
      return Self::Constraint { message, source: err };
    }
    Self::Database(err)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
