//! Users — people who log in and act on the address book.

use std::str::FromStr as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
  Error, Result,
  audit::{self, Auditable, Timestamps},
  entity::{Entity, ID_COLUMN},
  password::{hash_password, verify_password},
  permission::{Action, Role},
  record::Record,
};

/// An account. The stored password is an argon2 PHC string, never plaintext.
#[derive(Debug, Clone, Serialize)]
pub struct User {
  id:            Option<i64>,
  username:      String,
  #[serde(skip)]
  password_hash: String,
  role:          Role,
  last_access:   Option<DateTime<Utc>>,
  /// Session flag; not persisted.
  #[serde(skip)]
  logged_in:     bool,
  #[serde(flatten)]
  stamps:        Timestamps,
}

impl User {
  /// Build an unsaved user, hashing `password`.
  pub fn new(username: impl Into<String>, password: &str, role: Role) -> Result<Self> {
    let username = checked_username(username.into())?;
    checked_password(password)?;

    Ok(Self {
      id: None,
      username,
      password_hash: hash_password(password)?,
      role,
      last_access: None,
      logged_in: false,
      stamps: Timestamps::stamp(),
    })
  }

  pub fn basic(username: impl Into<String>, password: &str) -> Result<Self> {
    Self::new(username, password, Role::Basic)
  }

  pub fn admin(username: impl Into<String>, password: &str) -> Result<Self> {
    Self::new(username, password, Role::Admin)
  }

  pub fn id(&self) -> Option<i64> { self.id }

  pub fn username(&self) -> &str { &self.username }

  pub fn role(&self) -> Role { self.role }

  pub fn last_access(&self) -> Option<DateTime<Utc>> { self.last_access }

  pub fn is_logged_in(&self) -> bool { self.logged_in }

  pub fn password_hash(&self) -> &str { &self.password_hash }

  pub fn set_password(&mut self, password: &str) -> Result<()> {
    checked_password(password)?;
    self.password_hash = hash_password(password)?;
    self.stamps.touch();
    Ok(())
  }

  pub fn set_role(&mut self, role: Role) {
    self.role = role;
    self.stamps.touch();
  }

  /// Check the credentials. On success the user becomes logged in and
  /// `last_access` is stamped; on failure nothing changes. Persisting the new
  /// `last_access` is the caller's job.
  pub fn login(&mut self, username: &str, password: &str) -> bool {
    if username != self.username || !verify_password(password, &self.password_hash) {
      return false;
    }
    self.logged_in = true;
    self.last_access = Some(audit::now());
    self.stamps.touch();
    true
  }

  /// Leave the session. Returns `false` if the user was not logged in.
  pub fn logout(&mut self) -> bool {
    std::mem::replace(&mut self.logged_in, false)
  }

  pub fn can(&self, action: Action) -> bool { self.role.permits(action) }
}

fn checked_username(username: String) -> Result<String> {
  let trimmed = username.trim();
  if trimmed.is_empty() {
    return Err(Error::constraint("username", "must not be empty"));
  }
  Ok(trimmed.to_owned())
}

fn checked_password(password: &str) -> Result<()> {
  if password.is_empty() {
    return Err(Error::constraint("password", "must not be empty"));
  }
  Ok(())
}

// ─── Persistence ─────────────────────────────────────────────────────────────

impl Entity for User {
  const TABLE: &'static str = "users";
  const COLUMNS: &'static [&'static str] = &[
    "id",
    "username",
    "password",
    "role",
    "last_access",
    "created_at",
    "updated_at",
  ];

  fn id(&self) -> Option<i64> { self.id }

  fn assign_id(&mut self, id: i64) { self.id = Some(id); }

  fn to_record(&self) -> Record {
    let mut record = Record::new()
      .with("username", self.username.as_str())
      .with("password", self.password_hash.as_str())
      .with("role", self.role.to_string())
      .with("last_access", self.last_access);
    self.stamps.write_to(&mut record);
    record
  }

  fn from_record(record: &Record) -> Result<Self> {
    let role = record.text("role")?;
    let role = Role::from_str(&role).map_err(|_| Error::UnknownRole(role))?;

    Ok(Self {
      id: Some(record.integer(ID_COLUMN)?),
      username: record.text("username")?,
      password_hash: record.text("password")?,
      role,
      last_access: record.opt_timestamp("last_access")?,
      logged_in: false,
      stamps: Timestamps::read_from(record)?,
    })
  }

  fn validate(&self) -> Result<()> {
    if self.username.trim().is_empty() {
      return Err(Error::constraint("username", "must not be empty"));
    }
    if self.password_hash.is_empty() {
      return Err(Error::constraint("password", "must not be empty"));
    }
    Ok(())
  }
}

impl Auditable for User {
  fn timestamps(&self) -> &Timestamps { &self.stamps }
}
