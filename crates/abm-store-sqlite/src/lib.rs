//! SQLite backend for the ABM contact manager.
//!
//! [`ConnectionProvider`] opens handles and bootstraps the schema, [`Dao`]
//! runs parameterised statements over one handle, and [`SqliteRepository`]
//! turns any [`abm_core::entity::Entity`] declaration into CRUD on top of a
//! `Dao`.

mod connection;
mod dao;
mod encode;
mod repository;
mod schema;

pub mod error;

pub use connection::{ConnectionProvider, Location};
pub use dao::{Dao, Written};
pub use error::{Error, Result};
pub use repository::SqliteRepository;
pub use schema::latest_version;

#[cfg(test)]
mod tests;
