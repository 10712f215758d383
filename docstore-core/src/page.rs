//! Paging types: skip/limit windowing with optional total counts.

use serde::{Deserialize, Serialize};

/// Skip/limit windowing parameters for paged queries.
///
/// Requesting `total` causes a second, separate count round-trip against the
/// same filter; it is off by default.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PagingParams {
    /// Number of documents to skip. Defaults to 0.
    pub skip: Option<u64>,
    /// Maximum number of documents to return. Defaults to the configured
    /// max page size.
    pub limit: Option<u64>,
    /// Whether to compute the total match count.
    pub total: bool,
}

impl PagingParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_total(mut self) -> Self {
        self.total = true;
        self
    }
}

/// A single page of results.
///
/// `total` is populated only when the caller requested it through
/// [`PagingParams::with_total`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The documents in this page, in store order.
    pub data: Vec<T>,
    /// Total count of matches across all pages, when requested.
    pub total: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: Option<u64>) -> Self {
        Self { data, total }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self { data: Vec::new(), total: None }
    }
}
