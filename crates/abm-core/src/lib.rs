//! Core types and trait definitions for the ABM contact manager.
//!
//! This crate has no database dependencies. Entities describe themselves
//! (table name, ordered column list, name-keyed constructor) and the storage
//! crates turn that description into SQL.

pub mod audit;
pub mod contact;
pub mod entity;
pub mod error;
pub mod password;
pub mod permission;
pub mod record;
pub mod store;
pub mod user;

pub use error::{Error, Result};
