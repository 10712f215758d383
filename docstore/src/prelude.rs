//! Convenient re-exports of commonly used types from docstore.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docstore::prelude::*;
//! ```
//!
//! This provides access to:
//! - Record traits and the persistence engine
//! - Connection descriptors, credentials, and providers
//! - Filter/update/sort/projection spec types
//! - Paging parameters and result pages
//! - Storage driver traits
//! - Error types

pub use docstore_core::{
    compose::{FilterSpec, ProjectionSpec, QueryComposer, RecordComposer, ScalarValue, SortSpec, UpdateSpec, IDS_FILTER_KEY},
    connect::{ConnectionParams, ConnectionProvider, ConnectionResolver, CredentialParams, CredentialProvider},
    driver::{StoreConnector, StoreDriver},
    error::{PersistenceError, PersistenceResult},
    options::{PersistenceOptions, PersistenceOptionsBuilder},
    page::{Page, PagingParams},
    persistence::DocumentPersistence,
    query::{Expr, FieldOp, Query, QueryVisitor, Sort, SortDirection, UpdateOps},
    record::{Record, RecordExt, RecordKey},
};
