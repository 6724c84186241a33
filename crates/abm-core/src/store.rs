//! The [`Repository`] trait.
//!
//! Implemented by storage backends (e.g. `abm-store-sqlite`). The service
//! layer depends on this abstraction, not on any concrete backend.

use crate::{entity::Entity, record::Value};

/// An error a [`Repository`] can return, classified so callers can tell a
/// rejected write from a broken store without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// `true` when the entity or the store refused the data, whether the
  /// check happened in `Entity::validate` or in the store's own constraints.
  fn is_constraint_violation(&self) -> bool;
}

/// Generic CRUD over any [`Entity`].
///
/// Each repository holds its own store handle; there is no ambient
/// connection. Calls are synchronous and every write commits on its own.
pub trait Repository<E: Entity> {
  type Error: StoreError;

  /// Insert `entity` and write the store-assigned id back onto it.
  ///
  /// Fails if the entity already carries an id.
  fn save(&self, entity: &mut E) -> Result<i64, Self::Error>;

  /// Overwrite the row matching `entity.id()` with its current state.
  ///
  /// Fails if the entity has no id, or if no row matches it.
  fn update(&self, entity: &E) -> Result<(), Self::Error>;

  /// Delete the row with `id`. Returns whether a row was removed; deleting a
  /// missing id is not an error.
  fn delete(&self, id: i64) -> Result<bool, Self::Error>;

  /// Delete the row backing `entity`, consuming the instance so it cannot be
  /// persisted again. Unsaved entities are simply dropped.
  fn remove(&self, entity: E) -> Result<bool, Self::Error> {
    match entity.id() {
      Some(id) => self.delete(id),
      None => Ok(false),
    }
  }

  /// Returns `None` if no row matches.
  fn find_by_id(&self, id: i64) -> Result<Option<E>, Self::Error>;

  /// Every row in the table, in the store's natural order.
  fn find_all(&self) -> Result<Vec<E>, Self::Error>;

  /// Rows whose `column` equals `value`. `column` must be one of
  /// [`Entity::COLUMNS`].
  fn find_by(&self, column: &str, value: Value) -> Result<Vec<E>, Self::Error>;
}
