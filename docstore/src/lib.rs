//! Main docstore crate providing a unified interface for document persistence.
//!
//! This crate is the primary entry point for users of the docstore project.
//! It re-exports the core types and functionality from the sub-crates and
//! provides convenient access to the storage drivers.
//!
//! # Features
//!
//! - **Type-safe document persistence** - Define your records with Serde and
//!   store them without hand-written query construction per entity
//! - **Multiple drivers** - In-memory and MongoDB storage behind one async
//!   driver trait
//! - **Generic CRUD** - Paged reads, filtered reads, random pick, create with
//!   duplicate detection, upsert, partial updates, and scoped deletes
//! - **Connection resolution** - Partial connection descriptors and
//!   credentials merged into one canonical connection URI
//!
//! # Quick Start
//!
//! ```ignore
//! use docstore::{prelude::*, memory::MemoryConnector};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Task {
//!     pub id: Option<i64>,
//!     pub title: String,
//!     pub done: bool,
//! }
//!
//! impl Record for Task {
//!     type Key = i64;
//!
//!     fn key(&self) -> Option<i64> { self.id }
//!     fn set_key(&mut self, key: i64) { self.id = Some(key); }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let options = PersistenceOptions::builder("tasks").build().unwrap();
//!
//!     let persistence = DocumentPersistence::<_, Task>::new(options, MemoryConnector::new())
//!         .with_connection(ConnectionParams::new().with_host("localhost").with_database("demo"));
//!
//!     persistence.open("boot-1").await.unwrap();
//!
//!     // Create a task; the identity is generated because `id` is None.
//!     let task = persistence
//!         .create("req-1", Task { id: None, title: "write docs".into(), done: false })
//!         .await
//!         .unwrap();
//!
//!     // Page through open tasks.
//!     let mut filter = FilterSpec::new();
//!     filter.insert("done", false);
//!
//!     let page = persistence
//!         .get_page("req-2", Some(&filter), Some(&PagingParams::new().limit(10)), None)
//!         .await
//!         .unwrap();
//!
//!     println!("open tasks: {:?}", page.data);
//!
//!     persistence.close("shutdown").await.unwrap();
//! }
//! ```
//!
//! # Drivers
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB driver (requires the `mongodb` feature)

pub mod prelude;

pub use docstore_core::{compose, connect, driver, error, options, page, persistence, query, record};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage driver implementations.
pub mod memory {
    pub use docstore_memory::{MemoryConnector, MemoryDriver};
}

/// MongoDB storage driver implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docstore_mongodb::{MongoConnector, MongoDriver};
}
