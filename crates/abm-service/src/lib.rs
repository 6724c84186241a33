//! Application services for the ABM contact manager.
//!
//! The collaborator interface offered to presentation layers: create, find,
//! update, delete and list, plus user registration, login and permission
//! checks. Services are generic over any [`abm_core::store::Repository`];
//! they own the repository they are given and never reach for a shared
//! connection.

pub mod contacts;
pub mod error;
pub mod users;

pub use contacts::ContactService;
pub use error::{Result, ServiceError};
pub use users::UserService;
