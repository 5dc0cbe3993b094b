//! # lostfound-store
//!
//! Document-oriented storage for the lost-and-found registry.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` used as a plain document store: whole JSON
//! documents keyed by `(collection, doc_id)`.  Item records are partitioned
//! into one document per building floor; notices live in a single document.
//! Typed repository helpers for both domains are implemented directly on
//! [`Database`].

pub mod database;
pub mod items;
pub mod migrations;
pub mod models;
pub mod notices;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
