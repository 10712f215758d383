//! Persistence configuration with documented defaults.
//!
//! Options are an explicit per-instance struct built through
//! [`PersistenceOptionsBuilder`]; there is no process-wide default state.
//! Every option not supplied by the caller falls back to the defaults
//! documented on the builder setters.

use crate::error::{PersistenceError, PersistenceResult};

/// Configuration for one persistence component instance.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistenceOptions {
    /// Name of the backing collection. Required, validated at construction.
    pub collection: String,
    /// Name of the record identity field inside stored documents.
    pub identity_field: String,
    /// Upper bound for page sizes when the caller does not supply a limit.
    pub max_page_size: u64,
    /// Driver connection pool size. `None` leaves the driver default.
    pub pool_size: Option<u32>,
    /// Driver keep-alive flag. `None` leaves the driver default.
    pub keep_alive: Option<bool>,
    /// Driver connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Driver auto-reconnect flag. `None` leaves the driver default.
    pub auto_reconnect: Option<bool>,
    /// Emit additional debug-level events.
    pub debug: bool,
    /// Assign identities on create when the record has none and its key type
    /// supports generation. String keys are never generated regardless.
    pub auto_generate_identity: bool,
}

impl PersistenceOptions {
    /// Starts a builder for the given collection name.
    pub fn builder(collection: impl Into<String>) -> PersistenceOptionsBuilder {
        PersistenceOptionsBuilder::new(collection)
    }
}

/// Builder for [`PersistenceOptions`].
///
/// Validates the collection name at `build` time, so a misconfigured
/// component fails at construction rather than at open.
pub struct PersistenceOptionsBuilder {
    collection: String,
    identity_field: String,
    max_page_size: u64,
    pool_size: Option<u32>,
    keep_alive: Option<bool>,
    connect_timeout_ms: u64,
    auto_reconnect: Option<bool>,
    debug: bool,
    auto_generate_identity: bool,
}

impl PersistenceOptionsBuilder {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            identity_field: "id".to_string(),
            max_page_size: 100,
            pool_size: None,
            keep_alive: None,
            connect_timeout_ms: 5000,
            auto_reconnect: None,
            debug: false,
            auto_generate_identity: true,
        }
    }

    /// Sets the identity field name. Default: `"id"`.
    pub fn identity_field(mut self, field: impl Into<String>) -> Self {
        self.identity_field = field.into();
        self
    }

    /// Sets the default page size cap. Default: 100.
    pub fn max_page_size(mut self, max_page_size: u64) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    /// Sets the driver connection pool size. Default: driver-defined.
    pub fn pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = Some(pool_size);
        self
    }

    /// Sets the driver keep-alive flag. Default: driver-defined.
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }

    /// Sets the connect timeout in milliseconds. Default: 5000.
    pub fn connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    /// Sets the driver auto-reconnect flag. Default: driver-defined.
    pub fn auto_reconnect(mut self, auto_reconnect: bool) -> Self {
        self.auto_reconnect = Some(auto_reconnect);
        self
    }

    /// Enables debug-level event emission. Default: false.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Controls identity auto-generation on create. Default: true.
    pub fn auto_generate_identity(mut self, auto_generate: bool) -> Self {
        self.auto_generate_identity = auto_generate;
        self
    }

    /// Builds the options.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Configuration`] when the collection name
    /// is empty.
    pub fn build(self) -> PersistenceResult<PersistenceOptions> {
        if self.collection.is_empty() {
            return Err(PersistenceError::Configuration(
                "Collection name is not set".to_string(),
            ));
        }

        Ok(PersistenceOptions {
            collection: self.collection,
            identity_field: self.identity_field,
            max_page_size: self.max_page_size,
            pool_size: self.pool_size,
            keep_alive: self.keep_alive,
            connect_timeout_ms: self.connect_timeout_ms,
            auto_reconnect: self.auto_reconnect,
            debug: self.debug,
            auto_generate_identity: self.auto_generate_identity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let options = PersistenceOptions::builder("things").build().unwrap();

        assert_eq!(options.collection, "things");
        assert_eq!(options.identity_field, "id");
        assert_eq!(options.max_page_size, 100);
        assert_eq!(options.connect_timeout_ms, 5000);
        assert_eq!(options.pool_size, None);
        assert!(!options.debug);
        assert!(options.auto_generate_identity);
    }

    #[test]
    fn empty_collection_fails_at_construction() {
        assert!(matches!(
            PersistenceOptions::builder("").build(),
            Err(PersistenceError::Configuration(_))
        ));
    }

    #[test]
    fn overrides_replace_defaults() {
        let options = PersistenceOptions::builder("things")
            .identity_field("key")
            .max_page_size(25)
            .pool_size(4)
            .connect_timeout_ms(1000)
            .auto_generate_identity(false)
            .build()
            .unwrap();

        assert_eq!(options.identity_field, "key");
        assert_eq!(options.max_page_size, 25);
        assert_eq!(options.pool_size, Some(4));
        assert_eq!(options.connect_timeout_ms, 1000);
        assert!(!options.auto_generate_identity);
    }
}
