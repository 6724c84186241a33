//! [`ConnectionProvider`] — opens handles to the store and bootstraps its
//! schema.
//!
//! There is no process-wide connection. Each unit of work asks the provider
//! for its own [`Dao`] and releases it when done.

use std::{
  fmt,
  path::{Path, PathBuf},
  time::{Duration, Instant},
};

use abm_core::entity::{Entity, check_declaration};
use rusqlite::Connection;
use uuid::Uuid;

use crate::{
  Error, Result,
  dao::Dao,
  repository::SqliteRepository,
  schema::{apply_migrations, table_columns},
};

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
  File(PathBuf),
  /// A named shared-cache memory database; every handle opened from the same
  /// provider sees the same data.
  Memory(String),
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::File(path) => write!(f, "{}", path.display()),
      Self::Memory(uri) => write!(f, "{uri}"),
    }
  }
}

pub struct ConnectionProvider {
  location: Location,
  /// Keeps a memory database alive between handles.
  _anchor:  Option<Connection>,
}

impl ConnectionProvider {
  /// A provider for a database file. Nothing is opened until [`open`] or
  /// [`ensure_schema`]; the file is created on first open.
  ///
  /// [`open`]: Self::open
  /// [`ensure_schema`]: Self::ensure_schema
  pub fn file(path: impl AsRef<Path>) -> Self {
    Self { location: Location::File(path.as_ref().to_path_buf()), _anchor: None }
  }

  /// A provider for a fresh, private memory database — useful for testing.
  pub fn in_memory() -> Result<Self> {
    let location = Location::Memory(format!(
      "file:abm-{}?mode=memory&cache=shared",
      Uuid::new_v4().simple()
    ));
    let anchor = connect(&location)?;
    Ok(Self { location, _anchor: Some(anchor) })
  }

  pub fn location(&self) -> &Location { &self.location }

  /// Open a new handle.
  pub fn open(&self) -> Result<Dao> {
    let conn = connect(&self.location)?;
    Ok(Dao::new(conn, self.location.to_string()))
  }

  /// Create any missing tables. Existing rows are never touched. Call once
  /// per process before any other storage operation.
  pub fn ensure_schema(&self) -> Result<()> {
    let started_at = Instant::now();
    let mut conn = connect(&self.location)?;
    let version = apply_migrations(&mut conn)?;
    tracing::info!(
      location = %self.location,
      version,
      duration_ms = started_at.elapsed().as_millis() as u64,
      "schema ready"
    );
    Ok(())
  }

  /// Compare `E`'s declared columns with the physical table.
  pub fn verify_entity<E: Entity>(&self) -> Result<()> {
    check_declaration::<E>()?;

    let conn = connect(&self.location)?;
    let actual = table_columns(&conn, E::TABLE)?;
    if actual.is_empty() {
      return Err(Error::SchemaMismatch {
        table:  E::TABLE,
        detail: "table does not exist".into(),
      });
    }

    if let Some(missing) = E::COLUMNS.iter().find(|c| !actual.iter().any(|a| a.as_str() == **c)) {
      return Err(Error::SchemaMismatch {
        table:  E::TABLE,
        detail: format!("declared column {missing:?} is missing from the table"),
      });
    }
    if let Some(extra) = actual.iter().find(|a| !E::COLUMNS.contains(&a.as_str())) {
      return Err(Error::SchemaMismatch {
        table:  E::TABLE,
        detail: format!("table column {extra:?} is not declared"),
      });
    }
    Ok(())
  }

  /// Open a handle and wrap it in a repository for `E`.
  pub fn repository<E: Entity>(&self) -> Result<SqliteRepository<E>> {
    SqliteRepository::new(self.open()?)
  }
}

fn connect(location: &Location) -> Result<Connection> {
  let opened = match location {
    Location::File(path) => Connection::open(path),
    Location::Memory(uri) => Connection::open(uri),
  };
  let conn = opened.map_err(|source| {
    tracing::error!(%location, error = %source, "failed to open store");
    Error::StorageUnavailable { location: location.to_string(), source }
  })?;

  conn.execute_batch("PRAGMA foreign_keys = ON;")?;
  conn.busy_timeout(Duration::from_secs(5))?;
  Ok(conn)
}
