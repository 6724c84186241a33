//! Roles, actions, and the table that says which role may do what.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator as _};

// ─── Action ──────────────────────────────────────────────────────────────────

/// Something a user may ask the system to do.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
  AsRefStr, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
  AddContact,
  EditContact,
  DeleteContact,
  ListContacts,
  ManageUsers,
}

// ─── Role ────────────────────────────────────────────────────────────────────

/// Stored in the `role` column as its lowercase name.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
  AsRefStr, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  #[default]
  Basic,
  Admin,
}

// ─── Permission table ────────────────────────────────────────────────────────

enum Grant {
  All,
  Only(&'static [Action]),
}

const PERMISSIONS: &[(Role, Grant)] = &[
  (Role::Basic, Grant::Only(&[Action::AddContact])),
  (Role::Admin, Grant::All),
];

impl Role {
  /// Whether this role may perform `action`. Roles missing from the table
  /// are allowed nothing.
  pub fn permits(self, action: Action) -> bool {
    PERMISSIONS
      .iter()
      .find(|(role, _)| *role == self)
      .is_some_and(|(_, grant)| match grant {
        Grant::All => true,
        Grant::Only(actions) => actions.contains(&action),
      })
  }

  pub fn allowed_actions(self) -> Vec<Action> {
    Action::iter().filter(|a| self.permits(*a)).collect()
  }
}
