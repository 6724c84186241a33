//! SQL schema and migrations for the ABM SQLite store.
//!
//! The applied version is mirrored to `PRAGMA user_version`. Every step is
//! `CREATE ... IF NOT EXISTS`, so running against a database that already
//! has the tables never touches existing rows.

use rusqlite::Connection;

use crate::{Error, Result};

struct Migration {
  version: u32,
  sql:     &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration { version: 1, sql: V1_INIT }];

const V1_INIT: &str = "
CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL,
    password    TEXT NOT NULL,   -- argon2 PHC string
    role        TEXT NOT NULL,   -- 'basic' | 'admin'
    last_access TEXT,            -- RFC 3339 UTC
    created_at  TEXT,
    updated_at  TEXT
);

CREATE TABLE IF NOT EXISTS contacts (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL,
    phone      TEXT,
    email      TEXT,
    created_at TEXT,
    updated_at TEXT
);

CREATE INDEX IF NOT EXISTS users_username_idx ON users(username);
";

/// Latest schema version known to this binary.
pub fn latest_version() -> u32 {
  MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Apply every pending migration inside a single transaction.
pub(crate) fn apply_migrations(conn: &mut Connection) -> Result<u32> {
  let current = user_version(conn)?;
  let latest = latest_version();

  if current > latest {
    return Err(Error::UnsupportedSchemaVersion {
      found:     current,
      supported: latest,
    });
  }
  if current == latest {
    return Ok(current);
  }

  let tx = conn.transaction()?;
  for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
    tracing::info!(version = migration.version, "applying schema migration");
    tx.execute_batch(migration.sql)?;
    tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
  }
  tx.commit()?;

  Ok(latest)
}

pub(crate) fn user_version(conn: &Connection) -> Result<u32> {
  Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Column names of `table` in declaration order; empty if the table is
/// missing.
pub(crate) fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
  let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
  let names = stmt
    .query_map([table], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(names)
}
