//! Generic document persistence layer: CRUD, paging, filtering, and
//! projection over an arbitrary record type, without hand-written query
//! construction per entity.
//!
//! This crate is the core of the docstore project and provides:
//!
//! - **Connection resolution** ([`connect`]) - Merging partial connection
//!   descriptors and credentials into one canonical connection URI
//! - **Configuration** ([`options`]) - Explicit per-instance options with
//!   documented defaults
//! - **Record traits** ([`record`]) - Identity-keyed, serde-serializable
//!   entities
//! - **Spec composition** ([`compose`]) - Generic filter/update/sort/
//!   projection maps translated into the store-neutral query representation
//! - **Query representation** ([`query`]) - The store-neutral AST drivers
//!   translate into native syntax
//! - **Driver abstraction** ([`driver`]) - The async storage-driver
//!   interface backends implement
//! - **Persistence engine** ([`persistence`]) - Lifecycle plus the generic
//!   CRUD surface
//! - **Paging** ([`page`]) - Skip/limit windows and result pages
//! - **Error handling** ([`error`]) - Error kinds and result alias
//!
//! # Example
//!
//! ```ignore
//! use docstore_core::record::Record;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Task {
//!     pub id: Option<i64>,
//!     pub title: String,
//! }
//!
//! impl Record for Task {
//!     type Key = i64;
//!
//!     fn key(&self) -> Option<i64> { self.id }
//!     fn set_key(&mut self, key: i64) { self.id = Some(key); }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docstore_core;

pub mod compose;
pub mod connect;
pub mod driver;
pub mod error;
pub mod options;
pub mod page;
pub mod persistence;
pub mod query;
pub mod record;
