//! Contact operations.

use abm_core::{
  contact::{Contact, ContactPatch, NewContact},
  store::Repository,
};

use crate::{Result, ServiceError};

pub struct ContactService<R> {
  repo: R,
}

impl<R> ContactService<R>
where
  R: Repository<Contact>,
{
  pub fn new(repo: R) -> Self { Self { repo } }

  pub fn repository(&self) -> &R { &self.repo }

  pub fn into_inner(self) -> R { self.repo }

  /// Validate and persist a new contact.
  pub fn create(&self, input: NewContact) -> Result<Contact> {
    let mut contact = Contact::new(input)?;
    let id = self.repo.save(&mut contact).map_err(ServiceError::store)?;
    tracing::info!(id, "contact created");
    Ok(contact)
  }

  pub fn find(&self, id: i64) -> Result<Option<Contact>> {
    self.repo.find_by_id(id).map_err(ServiceError::store)
  }

  /// Apply `patch` to the stored contact. Fields the patch leaves unset keep
  /// their stored values. Returns `None` if there is no contact with `id`.
  pub fn update(&self, id: i64, patch: ContactPatch) -> Result<Option<Contact>> {
    let Some(mut contact) = self.find(id)? else {
      return Ok(None);
    };
    if contact.apply(patch)? {
      self.repo.update(&contact).map_err(ServiceError::store)?;
      tracing::info!(id, "contact updated");
    }
    Ok(Some(contact))
  }

  /// Returns whether a contact was removed. Deleting twice is harmless.
  pub fn delete(&self, id: i64) -> Result<bool> {
    let removed = self.repo.delete(id).map_err(ServiceError::store)?;
    tracing::info!(id, removed, "contact delete");
    Ok(removed)
  }

  pub fn list_all(&self) -> Result<Vec<Contact>> {
    self.repo.find_all().map_err(ServiceError::store)
  }
}
