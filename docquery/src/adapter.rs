use crate::adapter_builder::AdapterBuilder;
use crate::adapter_config::AdapterConfig;
use crate::collection::{Document, FindOptions, ObjectId};
use crate::common::{Convertible, Value, MEMORY_SCHEME};
use crate::errors::{ErrorKind, QueryError, QueryResult};
use crate::projection::{Projector, SparseDocument};
use crate::querier::{Model, Querier};
use crate::store::matcher::validate_collection_name;
use crate::store::memory::InMemoryStore;
use crate::store::DocumentStore;
use std::ops::Deref;
use std::sync::Arc;

/// A connection to a document database.
///
/// The adapter owns the store selected by its [AdapterConfig] and hands out
/// collection handles and queriers bound to it. Clones share the connection.
///
/// ```rust
/// use docquery::{doc, sparse, Adapter, AdapterConfig};
///
/// let adapter = Adapter::connect(AdapterConfig::new()).unwrap();
/// let products = adapter.collection("products").unwrap();
/// products.insert_one(doc! { name: "Widget" }).unwrap();
/// assert_eq!(products.count_documents(&sparse! {}).unwrap(), 1);
/// adapter.disconnect().unwrap();
/// ```
#[derive(Clone)]
pub struct Adapter {
    inner: Arc<AdapterInner>,
}

impl Adapter {
    pub fn builder() -> AdapterBuilder {
        AdapterBuilder::new()
    }

    /// Opens the store the config selects and checks that it answers.
    ///
    /// A store set on the config wins over the URI scheme; otherwise the
    /// `memory` scheme opens a fresh [InMemoryStore] and any other scheme fails
    /// with [ErrorKind::UnsupportedScheme].
    pub fn connect(config: AdapterConfig) -> QueryResult<Adapter> {
        let store = match config.store() {
            Some(store) => store,
            None => open_store(&config.scheme()?)?,
        };

        if let Err(err) = store.ping() {
            log::error!("Failed to connect to '{}': {}", config.uri(), err);
            return Err(err);
        }

        config.mark_configured();
        log::debug!(
            "Connected to '{}', database '{}'",
            config.uri(),
            config.database()
        );

        let projector = Projector::with_max_depth(config.max_nesting_depth());
        Ok(Adapter {
            inner: Arc::new(AdapterInner {
                config,
                store,
                projector,
            }),
        })
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.inner.config
    }

    pub fn database(&self) -> String {
        self.inner.config.database()
    }

    pub fn store(&self) -> DocumentStore {
        self.inner.store.clone()
    }

    /// The projector used by every querier of this adapter, bounded by the
    /// configured maximum nesting depth.
    pub fn projector(&self) -> Projector {
        self.inner.projector
    }

    /// Returns a raw document handle on the named collection.
    pub fn collection(&self, name: &str) -> QueryResult<Collection> {
        validate_collection_name(name)?;
        Ok(Collection {
            name: name.to_string(),
            store: self.store(),
        })
    }

    /// Returns a querier for `M` on the collection named by
    /// [Model::model_name], with store generated [ObjectId] identifiers.
    pub fn querier<M: Model>(&self) -> QueryResult<Querier<M, ObjectId>> {
        Querier::new(self, M::model_name())
    }

    /// Returns a querier for `M` whose identifier is the `Id` structure held in
    /// the model's `_id` field.
    pub fn querier_with_composite_id<M, Id>(&self) -> QueryResult<Querier<M, Id>>
    where
        M: Model,
        Id: Convertible<Output = Id>,
    {
        Querier::with_composite_id(self, M::model_name())
    }

    pub fn ping(&self) -> QueryResult<()> {
        self.inner.store.ping().map_err(|err| {
            log::error!("Ping to '{}' failed: {}", self.inner.config.uri(), err);
            err
        })
    }

    /// Closes the underlying store. Every handle of this adapter fails with
    /// [ErrorKind::StoreAlreadyClosed] afterwards.
    pub fn disconnect(&self) -> QueryResult<()> {
        match self.inner.store.close() {
            Ok(()) => {
                log::debug!("Disconnected from '{}'", self.inner.config.uri());
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to disconnect from '{}': {}", self.inner.config.uri(), err);
                Err(err)
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.inner.store.is_closed()
    }
}

struct AdapterInner {
    config: AdapterConfig,
    store: DocumentStore,
    projector: Projector,
}

fn open_store(scheme: &str) -> QueryResult<DocumentStore> {
    match scheme {
        MEMORY_SCHEME => Ok(DocumentStore::new(InMemoryStore::new())),
        other => {
            log::error!("No store available for scheme '{}'", other);
            Err(QueryError::new(
                &format!("No store available for scheme '{}'", other),
                ErrorKind::UnsupportedScheme,
            ))
        }
    }
}

/// A raw handle on one collection of an adapter's store.
///
/// Filters are [SparseDocument]s and results are untyped [Document]s. The
/// handle derefs to the store for the operations it does not wrap.
#[derive(Clone)]
pub struct Collection {
    name: String,
    store: DocumentStore,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert_one(&self, document: Document) -> QueryResult<Value> {
        self.store.insert_one(&self.name, document)
    }

    pub fn insert_many(&self, documents: Vec<Document>) -> QueryResult<Vec<Value>> {
        self.store.insert_many(&self.name, documents)
    }

    pub fn find(&self, filter: &SparseDocument, options: &FindOptions) -> QueryResult<Vec<Document>> {
        self.store.find(&self.name, filter, options)
    }

    pub fn count_documents(&self, filter: &SparseDocument) -> QueryResult<u64> {
        self.store.count_documents(&self.name, filter)
    }

    pub fn drop(&self) -> QueryResult<()> {
        self.store.drop_collection(&self.name)
    }
}

impl Deref for Collection {
    type Target = DocumentStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}
