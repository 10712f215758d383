//! MongoDB storage driver for docstore.
//!
//! This crate provides a MongoDB-based implementation of the `StoreDriver`
//! trait, persisting documents to MongoDB Atlas or a self-hosted cluster and
//! delegating filtering, sorting, and projection to MongoDB's query engine.
//!
//! To use this driver, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docstore = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! The connector takes the canonical connection URI produced by the
//! connection resolver; the URI's path segment names the target database.
//!
//! # Example
//!
//! ```ignore
//! use docstore_core::{options::PersistenceOptions, persistence::DocumentPersistence};
//! use docstore_core::connect::ConnectionParams;
//! use docstore_mongodb::MongoConnector;
//!
//! let options = PersistenceOptions::builder("tasks").build()?;
//! let persistence = DocumentPersistence::<_, Task>::new(options, MongoConnector::new())
//!     .with_connection(ConnectionParams::from_uri("mongodb://localhost:27017/mydb"));
//!
//! persistence.open("boot-1").await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docstore_mongodb;

mod query;
mod sanitizer;
pub mod store;

pub use store::{MongoConnector, MongoDriver};
