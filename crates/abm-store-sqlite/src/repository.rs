//! [`SqliteRepository`] — generic CRUD for any [`Entity`].

use std::marker::PhantomData;

use abm_core::{
  entity::{Entity, ID_COLUMN, check_declaration, data_columns},
  record::{Record, Value},
  store::Repository,
};

use crate::{
  Error, Result,
  dao::Dao,
  encode::{delete_sql, insert_sql, select_sql, update_sql},
};

/// Statements prepared once from the entity declaration.
struct Statements {
  insert:       String,
  update:       String,
  delete:       String,
  select_all:   String,
  select_by_id: String,
}

impl Statements {
  fn for_entity<E: Entity>() -> Self {
    let data = data_columns::<E>();
    Self {
      insert:       insert_sql(E::TABLE, data),
      update:       update_sql(E::TABLE, data, ID_COLUMN),
      delete:       delete_sql(E::TABLE, ID_COLUMN),
      select_all:   select_sql(E::TABLE, E::COLUMNS, None),
      select_by_id: select_sql(E::TABLE, E::COLUMNS, Some(ID_COLUMN)),
    }
  }
}

/// A repository for `E` that owns its own [`Dao`].
pub struct SqliteRepository<E> {
  dao:        Dao,
  statements: Statements,
  _entity:    PhantomData<fn() -> E>,
}

impl<E: Entity> SqliteRepository<E> {
  /// Fails if `E`'s declaration is malformed.
  pub fn new(dao: Dao) -> Result<Self> {
    check_declaration::<E>()?;
    Ok(Self {
      dao,
      statements: Statements::for_entity::<E>(),
      _entity: PhantomData,
    })
  }

  pub fn dao(&self) -> &Dao { &self.dao }

  /// Release the underlying handle.
  pub fn close(&mut self) -> Result<()> { self.dao.close() }

  /// Values for every data column, in declared order, looked up by name.
  fn bind(&self, record: &Record) -> Result<Vec<Value>> {
    let declared = data_columns::<E>();

    if let Some(extra) = record.columns().find(|c| !declared.contains(c)) {
      return Err(Error::UndeclaredColumn {
        table:  E::TABLE,
        column: extra.to_owned(),
      });
    }

    declared
      .iter()
      .map(|column| {
        record
          .get(column)
          .cloned()
          .ok_or_else(|| Error::from(abm_core::Error::MissingColumn((*column).to_owned())))
      })
      .collect()
  }

  fn hydrate(records: Vec<Record>) -> Result<Vec<E>> {
    records
      .iter()
      .map(|r| E::from_record(r).map_err(Error::from))
      .collect()
  }
}

impl<E: Entity> Repository<E> for SqliteRepository<E> {
  type Error = Error;

  fn save(&self, entity: &mut E) -> Result<i64> {
    if let Some(id) = entity.id() {
      return Err(Error::AlreadyPersisted { table: E::TABLE, id });
    }
    entity.validate()?;

    let params = self.bind(&entity.to_record())?;
    let written = self.dao.execute_write(&self.statements.insert, &params)?;
    entity.assign_id(written.last_insert_id);

    tracing::debug!(table = E::TABLE, id = written.last_insert_id, "saved");
    Ok(written.last_insert_id)
  }

  fn update(&self, entity: &E) -> Result<()> {
    let id = entity.id().ok_or(Error::NotPersisted { table: E::TABLE })?;
    entity.validate()?;

    let mut params = self.bind(&entity.to_record())?;
    params.push(Value::Integer(id));
    let written = self.dao.execute_write(&self.statements.update, &params)?;

    if written.rows_affected == 0 {
      return Err(Error::NotFound { table: E::TABLE, id });
    }
    tracing::debug!(table = E::TABLE, id, "updated");
    Ok(())
  }

  fn delete(&self, id: i64) -> Result<bool> {
    let written = self
      .dao
      .execute_write(&self.statements.delete, &[Value::Integer(id)])?;
    tracing::debug!(table = E::TABLE, id, rows = written.rows_affected, "deleted");
    Ok(written.rows_affected > 0)
  }

  fn find_by_id(&self, id: i64) -> Result<Option<E>> {
    let rows = self
      .dao
      .execute_read(&self.statements.select_by_id, &[Value::Integer(id)])?;
    rows
      .first()
      .map(|r| E::from_record(r).map_err(Error::from))
      .transpose()
  }

  fn find_all(&self) -> Result<Vec<E>> {
    let rows = self.dao.execute_read(&self.statements.select_all, &[])?;
    Self::hydrate(rows)
  }

  fn find_by(&self, column: &str, value: Value) -> Result<Vec<E>> {
    let Some(column) = E::COLUMNS.iter().copied().find(|c| *c == column) else {
      return Err(Error::UndeclaredColumn {
        table:  E::TABLE,
        column: column.to_owned(),
      });
    };
    let sql = select_sql(E::TABLE, E::COLUMNS, Some(column));
    let rows = self.dao.execute_read(&sql, &[value])?;
    Self::hydrate(rows)
  }
}
