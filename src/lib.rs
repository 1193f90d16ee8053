//! Relational persistence core for a UPnP/DLNA Content Directory Service
//! (SPEC_FULL.md). Object store, tree operations, autoscan and config-value
//! stores, schema migration, and a dynamic-container registry, all
//! serialized behind one `CdsDatabase`.

pub mod autoscan_store;
pub mod config;
pub mod config_store;
pub mod database;
pub mod dialect;
pub mod driver;
pub mod dynamic;
pub mod error;
pub mod model;
pub mod object_store;
pub mod row;
pub mod schema;
pub mod tree;

pub use database::CdsDatabase;
pub use error::{CdsError, Result};
