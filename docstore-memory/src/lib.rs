//! In-memory storage driver for docstore.
//!
//! This crate provides a fully functional [`StoreDriver`](docstore_core::driver::StoreDriver)
//! implementation that keeps documents in process memory. It is the primary
//! driver for development and tests: fast, dependency-free, and faithful to
//! the query semantics of the persistent drivers.
//!
//! # Example
//!
//! ```ignore
//! use docstore_core::{options::PersistenceOptions, persistence::DocumentPersistence};
//! use docstore_core::connect::ConnectionParams;
//! use docstore_memory::MemoryConnector;
//!
//! let options = PersistenceOptions::builder("tasks").build()?;
//! let persistence = DocumentPersistence::<_, Task>::new(options, MemoryConnector::new())
//!     .with_connection(ConnectionParams::from_uri("mongodb://localhost/test"));
//!
//! persistence.open("boot-1").await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docstore_memory;

mod evaluator;
pub mod store;

pub use store::{MemoryConnector, MemoryDriver};
