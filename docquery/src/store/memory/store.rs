use super::collection::InMemoryCollection;
use crate::collection::{
    Document, FindOneAndReplaceOptions, FindOneAndUpdateOptions, FindOptions, UpdateOptions,
    UpdateResult,
};
use crate::common::Value;
use crate::errors::{ErrorKind, QueryError, QueryResult};
use crate::projection::SparseDocument;
use crate::store::matcher::validate_collection_name;
use crate::store::{DocumentStoreProvider, Update};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Document store that keeps every collection in memory.
///
/// Collections are created on first write. Reading a collection that was
/// never written behaves as reading an empty one. Clones share the same
/// collections, and all data is lost once the last clone is dropped or the
/// store is closed.
///
/// ```rust
/// use docquery::store::memory::InMemoryStore;
/// use docquery::store::DocumentStoreProvider;
/// use docquery::{doc, sparse};
///
/// let store = InMemoryStore::new();
/// store.insert_one("products", doc! { name: "Widget" }).unwrap();
/// assert_eq!(store.count_documents("products", &sparse! { "name" => "Widget" }).unwrap(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore {
            inner: Arc::new(InMemoryStoreInner::new()),
        }
    }
}

impl DocumentStoreProvider for InMemoryStore {
    fn insert_one(&self, collection: &str, document: Document) -> QueryResult<Value> {
        self.inner.open_collection(collection)?.insert(document)
    }

    fn insert_many(&self, collection: &str, documents: Vec<Document>) -> QueryResult<Vec<Value>> {
        self.inner.open_collection(collection)?.insert_all(documents)
    }

    fn find(
        &self,
        collection: &str,
        filter: &SparseDocument,
        options: &FindOptions,
    ) -> QueryResult<Vec<Document>> {
        Ok(self
            .inner
            .existing_collection(collection)?
            .map(|c| c.find(filter, options))
            .unwrap_or_default())
    }

    fn find_one(
        &self,
        collection: &str,
        filter: &SparseDocument,
        options: &FindOptions,
    ) -> QueryResult<Option<Document>> {
        let options = options.clone().limit(1);
        Ok(self.find(collection, filter, &options)?.into_iter().next())
    }

    fn find_one_and_update(
        &self,
        collection: &str,
        filter: &SparseDocument,
        update: &Update,
        options: &FindOneAndUpdateOptions,
    ) -> QueryResult<Option<Document>> {
        self.inner
            .open_collection(collection)?
            .find_one_and_update(filter, update, options)
    }

    fn update_many(
        &self,
        collection: &str,
        filter: &SparseDocument,
        update: &Update,
        options: &UpdateOptions,
    ) -> QueryResult<UpdateResult> {
        self.inner
            .open_collection(collection)?
            .update_many(filter, update, options)
    }

    fn find_one_and_replace(
        &self,
        collection: &str,
        filter: &SparseDocument,
        replacement: Document,
        options: &FindOneAndReplaceOptions,
    ) -> QueryResult<Option<Document>> {
        self.inner
            .open_collection(collection)?
            .find_one_and_replace(filter, replacement, options)
    }

    fn find_one_and_delete(
        &self,
        collection: &str,
        filter: &SparseDocument,
        options: &FindOptions,
    ) -> QueryResult<Option<Document>> {
        Ok(self
            .inner
            .existing_collection(collection)?
            .and_then(|c| c.find_one_and_delete(filter, options)))
    }

    fn delete_many(&self, collection: &str, filter: &SparseDocument) -> QueryResult<u64> {
        Ok(self
            .inner
            .existing_collection(collection)?
            .map(|c| c.delete_many(filter))
            .unwrap_or(0))
    }

    fn count_documents(&self, collection: &str, filter: &SparseDocument) -> QueryResult<u64> {
        Ok(self
            .inner
            .existing_collection(collection)?
            .map(|c| c.count(filter))
            .unwrap_or(0))
    }

    fn distinct(
        &self,
        collection: &str,
        field: &str,
        filter: &SparseDocument,
    ) -> QueryResult<Vec<Value>> {
        match self.inner.existing_collection(collection)? {
            Some(c) => c.distinct(field, filter),
            None => Ok(Vec::new()),
        }
    }

    fn drop_collection(&self, collection: &str) -> QueryResult<()> {
        self.inner.drop_collection(collection)
    }

    fn collection_names(&self) -> QueryResult<Vec<String>> {
        self.inner.collection_names()
    }

    fn ping(&self) -> QueryResult<()> {
        self.inner.check_opened()
    }

    fn close(&self) -> QueryResult<()> {
        self.inner.close()
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

#[derive(Default)]
struct InMemoryStoreInner {
    closed: AtomicBool,
    collections: DashMap<String, InMemoryCollection>,
}

impl InMemoryStoreInner {
    fn new() -> InMemoryStoreInner {
        InMemoryStoreInner {
            closed: AtomicBool::from(false),
            collections: DashMap::new(),
        }
    }

    fn check_opened(&self) -> QueryResult<()> {
        if self.is_closed() {
            log::error!("Store is already closed");
            return Err(QueryError::new(
                "Store is already closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(())
    }

    fn open_collection(&self, name: &str) -> QueryResult<InMemoryCollection> {
        self.check_opened()?;
        validate_collection_name(name)?;

        let collection = self
            .collections
            .entry(name.to_string())
            .or_insert_with(|| {
                log::debug!("Creating collection '{}'", name);
                InMemoryCollection::new(name)
            })
            .value()
            .clone();
        Ok(collection)
    }

    fn existing_collection(&self, name: &str) -> QueryResult<Option<InMemoryCollection>> {
        self.check_opened()?;
        validate_collection_name(name)?;
        Ok(self.collections.get(name).map(|entry| entry.value().clone()))
    }

    fn drop_collection(&self, name: &str) -> QueryResult<()> {
        self.check_opened()?;
        validate_collection_name(name)?;
        if let Some((_, collection)) = self.collections.remove(name) {
            log::debug!("Dropped collection '{}'", collection.name());
        }
        Ok(())
    }

    fn collection_names(&self) -> QueryResult<Vec<String>> {
        self.check_opened()?;
        let mut names: Vec<String> = self
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }

    fn close(&self) -> QueryResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.collections.clear();
        log::debug!("In-memory store closed");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
