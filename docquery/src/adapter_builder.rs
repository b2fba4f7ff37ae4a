use crate::adapter::Adapter;
use crate::adapter_config::AdapterConfig;
use crate::errors::{QueryError, QueryResult};
use crate::store::{DocumentStore, DocumentStoreProvider};

/// Fluent construction of an [Adapter].
///
/// The first invalid setting is remembered and reported by
/// [AdapterBuilder::connect]; later settings are ignored once one has failed.
///
/// ```rust
/// use docquery::Adapter;
///
/// let adapter = Adapter::builder()
///     .uri("memory://shop")
///     .database("shop")
///     .connect()
///     .unwrap();
/// assert_eq!(adapter.database(), "shop");
/// ```
#[derive(Default)]
pub struct AdapterBuilder {
    error: Option<QueryError>,
    config: AdapterConfig,
}

impl AdapterBuilder {
    pub fn new() -> Self {
        AdapterBuilder {
            error: None,
            config: AdapterConfig::new(),
        }
    }

    pub fn uri(self, uri: &str) -> Self {
        self.apply(|config| config.set_uri(uri))
    }

    pub fn database(self, database: &str) -> Self {
        self.apply(|config| config.set_database(database))
    }

    pub fn max_nesting_depth(self, depth: usize) -> Self {
        self.apply(|config| config.set_max_nesting_depth(depth))
    }

    /// Uses `store` whatever the URI scheme.
    pub fn store<T: DocumentStoreProvider + 'static>(self, store: T) -> Self {
        self.apply(|config| config.set_store(DocumentStore::new(store)))
    }

    pub fn connect(self) -> QueryResult<Adapter> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Adapter::connect(self.config)
    }

    fn apply<F>(mut self, setter: F) -> Self
    where
        F: FnOnce(&AdapterConfig) -> QueryResult<()>,
    {
        if self.error.is_none() {
            if let Err(e) = setter(&self.config) {
                self.error = Some(e);
            }
        }
        self
    }
}
