//! Conversions between [`abm_core::record::Value`] and SQLite values, and the
//! SQL text built from entity declarations.
//!
//! Identifiers come from `Entity::TABLE` / `Entity::COLUMNS`, which are
//! checked by `check_declaration` before any statement is built. Values are
//! only ever bound as `?N` placeholders.

use abm_core::record::Value;
use rusqlite::types::{Value as SqlValue, ValueRef};

use crate::{Error, Result};

// ─── Values ──────────────────────────────────────────────────────────────────

pub fn encode_value(value: &Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    Value::Integer(v) => SqlValue::Integer(*v),
    Value::Text(s) => SqlValue::Text(s.clone()),
  }
}

pub fn decode_value(column: &str, raw: ValueRef<'_>) -> Result<Value> {
  match raw {
    ValueRef::Null => Ok(Value::Null),
    ValueRef::Integer(v) => Ok(Value::Integer(v)),
    ValueRef::Text(bytes) => std::str::from_utf8(bytes)
      .map(Value::from)
      .map_err(|_| unsupported(column, "non-UTF-8 text")),
    ValueRef::Real(_) => Err(unsupported(column, "real")),
    ValueRef::Blob(_) => Err(unsupported(column, "blob")),
  }
}

fn unsupported(column: &str, kind: &'static str) -> Error {
  Error::UnsupportedValue { column: column.to_owned(), kind }
}

// ─── Statements ──────────────────────────────────────────────────────────────

fn placeholders(range: std::ops::Range<usize>) -> String {
  range
    .map(|n| format!("?{n}"))
    .collect::<Vec<_>>()
    .join(", ")
}

/// `INSERT INTO t (a, b) VALUES (?1, ?2)`
pub fn insert_sql(table: &str, columns: &[&str]) -> String {
  format!(
    "INSERT INTO {table} ({}) VALUES ({})",
    columns.join(", "),
    placeholders(1..columns.len() + 1),
  )
}

/// `UPDATE t SET a = ?1, b = ?2 WHERE id = ?3`
pub fn update_sql(table: &str, columns: &[&str], id_column: &str) -> String {
  let assignments = columns
    .iter()
    .enumerate()
    .map(|(idx, col)| format!("{col} = ?{}", idx + 1))
    .collect::<Vec<_>>()
    .join(", ");
  format!(
    "UPDATE {table} SET {assignments} WHERE {id_column} = ?{}",
    columns.len() + 1,
  )
}

/// `DELETE FROM t WHERE id = ?1`
pub fn delete_sql(table: &str, id_column: &str) -> String {
  format!("DELETE FROM {table} WHERE {id_column} = ?1")
}

/// `SELECT a, b FROM t`, optionally filtered on `column = ?1`.
pub fn select_sql(table: &str, columns: &[&str], filter: Option<&str>) -> String {
  let base = format!("SELECT {} FROM {table}", columns.join(", "));
  match filter {
    Some(column) => format!("{base} WHERE {column} = ?1"),
    None => base,
  }
}
