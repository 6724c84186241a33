//! Contacts — the address-book entries the system exists to manage.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  audit::{Auditable, Timestamps},
  entity::{Entity, ID_COLUMN},
  record::Record,
};

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A person in the address book.
///
/// Fields are private so that every change goes through a setter, and every
/// setter re-stamps `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
  id:     Option<i64>,
  name:   String,
  phone:  Option<String>,
  email:  Option<String>,
  #[serde(flatten)]
  stamps: Timestamps,
}

/// Input to [`Contact::new`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewContact {
  pub name:  String,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
}

impl NewContact {
  pub fn named(name: impl Into<String>) -> Self {
    Self { name: name.into(), ..Self::default() }
  }

  pub fn phone(mut self, phone: impl Into<String>) -> Self {
    self.phone = Some(phone.into());
    self
  }

  pub fn email(mut self, email: impl Into<String>) -> Self {
    self.email = Some(email.into());
    self
  }
}

impl Contact {
  /// Build an unsaved contact. Blank optional fields are stored as absent.
  pub fn new(input: NewContact) -> Result<Self> {
    let contact = Self {
      id:     None,
      name:   checked_name(input.name)?,
      phone:  non_blank(input.phone),
      email:  non_blank(input.email),
      stamps: Timestamps::stamp(),
    };
    Ok(contact)
  }

  pub fn id(&self) -> Option<i64> { self.id }

  pub fn name(&self) -> &str { &self.name }

  pub fn phone(&self) -> Option<&str> { self.phone.as_deref() }

  pub fn email(&self) -> Option<&str> { self.email.as_deref() }

  pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
    self.name = checked_name(name.into())?;
    self.stamps.touch();
    Ok(())
  }

  pub fn set_phone(&mut self, phone: Option<String>) {
    self.phone = non_blank(phone);
    self.stamps.touch();
  }

  pub fn set_email(&mut self, email: Option<String>) {
    self.email = non_blank(email);
    self.stamps.touch();
  }

  /// Apply the supplied fields of `patch`, leaving the rest untouched.
  ///
  /// Validation happens before any field changes, so a rejected patch leaves
  /// the contact exactly as it was. Returns whether anything was supplied.
  pub fn apply(&mut self, patch: ContactPatch) -> Result<bool> {
    if patch.is_empty() {
      return Ok(false);
    }
    let name = patch.name.map(checked_name).transpose()?;

    if let Some(name) = name {
      self.name = name;
      self.stamps.touch();
    }
    if let Some(phone) = patch.phone {
      self.set_phone(phone);
    }
    if let Some(email) = patch.email {
      self.set_email(email);
    }
    Ok(true)
  }
}

impl fmt::Display for Contact {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)?;
    if let Some(email) = &self.email {
      write!(f, " <{email}>")?;
    }
    if let Some(phone) = &self.phone {
      write!(f, " tel. {phone}")?;
    }
    Ok(())
  }
}

fn checked_name(name: String) -> Result<String> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return Err(Error::constraint("name", "must not be empty"));
  }
  Ok(trimmed.to_owned())
}

fn non_blank(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}

// ─── ContactPatch ────────────────────────────────────────────────────────────

/// A partial update.
///
/// `None` means "not supplied, keep the stored value". For the optional
/// fields, `Some(None)` (or a blank string) clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContactPatch {
  #[serde(default)]
  pub name:  Option<String>,
  #[serde(default)]
  pub phone: Option<Option<String>>,
  #[serde(default)]
  pub email: Option<Option<String>>,
}

impl ContactPatch {
  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.phone.is_none() && self.email.is_none()
  }

  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn phone(mut self, phone: impl Into<String>) -> Self {
    self.phone = Some(Some(phone.into()));
    self
  }

  pub fn email(mut self, email: impl Into<String>) -> Self {
    self.email = Some(Some(email.into()));
    self
  }

  pub fn clear_phone(mut self) -> Self {
    self.phone = Some(None);
    self
  }

  pub fn clear_email(mut self) -> Self {
    self.email = Some(None);
    self
  }
}

// ─── Persistence ─────────────────────────────────────────────────────────────

impl Entity for Contact {
  const TABLE: &'static str = "contacts";
  const COLUMNS: &'static [&'static str] =
    &["id", "name", "phone", "email", "created_at", "updated_at"];

  fn id(&self) -> Option<i64> { self.id }

  fn assign_id(&mut self, id: i64) { self.id = Some(id); }

  fn to_record(&self) -> Record {
    let mut record = Record::new()
      .with("name", self.name.as_str())
      .with("phone", self.phone.clone())
      .with("email", self.email.clone());
    self.stamps.write_to(&mut record);
    record
  }

  fn from_record(record: &Record) -> Result<Self> {
    Ok(Self {
      id:     Some(record.integer(ID_COLUMN)?),
      name:   record.text("name")?,
      phone:  record.opt_text("phone")?,
      email:  record.opt_text("email")?,
      stamps: Timestamps::read_from(record)?,
    })
  }

  fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::constraint("name", "must not be empty"));
    }
    Ok(())
  }
}

impl Auditable for Contact {
  fn timestamps(&self) -> &Timestamps { &self.stamps }
}
