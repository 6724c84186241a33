//! Service error type.

use abm_core::{
  permission::{Action, Role},
  store::StoreError,
};
use thiserror::Error;

/// An error returned by a service call.
#[derive(Debug, Error)]
pub enum ServiceError {
  /// Input rejected before it reached the store.
  #[error(transparent)]
  Invalid(#[from] abm_core::Error),

  #[error("role {role} may not {action}")]
  Forbidden { role: Role, action: Action },

  #[error("not found: {0}")]
  NotFound(String),

  /// The repository refused the data (validation or a store constraint).
  #[error("rejected by store: {0}")]
  Rejected(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ServiceError {
  pub(crate) fn store<E: StoreError>(err: E) -> Self {
    if err.is_constraint_violation() {
      Self::Rejected(Box::new(err))
    } else {
      Self::Store(Box::new(err))
    }
  }

  pub fn is_constraint_violation(&self) -> bool {
    match self {
      Self::Invalid(e) => e.is_constraint_violation(),
      Self::Rejected(_) => true,
      _ => false,
    }
  }
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;
