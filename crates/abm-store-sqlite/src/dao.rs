//! [`Dao`] — the generic data-access object.
//!
//! Exactly one SQLite handle per `Dao`. Reads come back as name-keyed
//! [`Record`]s; writes commit as soon as they return (autocommit), so there is
//! no rollback spanning two calls.

use abm_core::record::{Record, Value};
use rusqlite::{Connection, params_from_iter};

use crate::{
  Error, Result,
  encode::{decode_value, encode_value},
};

/// Outcome of [`Dao::execute_write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Written {
  pub rows_affected:  usize,
  /// Rowid of the most recent successful insert on this handle.
  pub last_insert_id: i64,
}

pub struct Dao {
  conn:     Option<Connection>,
  location: String,
}

impl Dao {
  pub(crate) fn new(conn: Connection, location: String) -> Self {
    Self { conn: Some(conn), location }
  }

  fn conn(&self) -> Result<&Connection> {
    self.conn.as_ref().ok_or(Error::Closed)
  }

  pub fn location(&self) -> &str { &self.location }

  pub fn is_open(&self) -> bool { self.conn.is_some() }

  /// Run a read-only statement. No match is an empty `Vec`, not an error.
  /// Statements that could modify the database are refused before they run.
  pub fn execute_read(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
    let conn = self.conn()?;
    tracing::debug!(sql, params = params.len(), "execute_read");

    let mut stmt = conn.prepare(sql)?;
    if !stmt.readonly() {
      return Err(Error::NotReadOnly { sql: sql.to_owned() });
    }
    let names: Vec<String> = stmt
      .column_names()
      .into_iter()
      .map(str::to_owned)
      .collect();

    let mut rows = stmt.query(params_from_iter(params.iter().map(encode_value)))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
      let mut record = Record::new();
      for (idx, name) in names.iter().enumerate() {
        record.set(name.as_str(), decode_value(name, row.get_ref(idx)?)?);
      }
      records.push(record);
    }
    Ok(records)
  }

  /// Run a mutating statement and commit it.
  pub fn execute_write(&self, sql: &str, params: &[Value]) -> Result<Written> {
    let conn = self.conn()?;
    tracing::debug!(sql, params = params.len(), "execute_write");

    let rows_affected = conn.execute(sql, params_from_iter(params.iter().map(encode_value)))?;
    Ok(Written {
      rows_affected,
      last_insert_id: conn.last_insert_rowid(),
    })
  }

  /// Release the handle. Further calls fail with [`Error::Closed`]; closing
  /// twice is a no-op.
  pub fn close(&mut self) -> Result<()> {
    if let Some(conn) = self.conn.take() {
      conn.close().map_err(|(_, err)| Error::from(err))?;
      tracing::debug!(location = %self.location, "dao closed");
    }
    Ok(())
  }
}

impl Drop for Dao {
  fn drop(&mut self) {
    if self.conn.is_some() {
      tracing::debug!(location = %self.location, "dao dropped while open; releasing handle");
    }
  }
}
