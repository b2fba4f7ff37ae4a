//! The store seam: running sparse filters and updates against named collections.
//!
//! The querier never talks to a database directly. It hands a
//! [DocumentStoreProvider] a collection name, a [SparseDocument] filter and,
//! for writes, an [Update] or a replacement document, and gets documents,
//! identifiers or counts back. [memory::InMemoryStore] is the built-in
//! implementation; any other backend plugs in through
//! [crate::AdapterBuilder::store].

pub mod matcher;
pub mod memory;

use crate::collection::{
    Document, FindOneAndReplaceOptions, FindOneAndUpdateOptions, FindOptions, UpdateOptions,
    UpdateResult,
};
use crate::common::{Value, SET_OPERATOR};
use crate::errors::QueryResult;
use crate::projection::SparseDocument;
use std::ops::Deref;
use std::sync::Arc;

/// An update directive applied to every matched document.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Sets each dotted path to its value, creating intermediate documents.
    Set(SparseDocument),
}

impl Update {
    /// Returns the paths and values the update writes.
    pub fn fields(&self) -> &SparseDocument {
        match self {
            Update::Set(fields) => fields,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Renders the update in operator form, e.g. `{"$set": {"a.b": 1}}`.
    pub fn to_document(&self) -> Document {
        match self {
            Update::Set(fields) => {
                let body: Document = fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                std::iter::once((SET_OPERATOR.to_string(), Value::Document(body))).collect()
            }
        }
    }
}

/// Contract every document store implements.
///
/// Filters are equality-only: a document matches when, for every entry of
/// the filter, the value at that dotted path equals the entry's value, or is
/// an array containing it. A missing path reads as null. An empty filter
/// matches every document.
///
/// Every operation fails with [crate::errors::ErrorKind::StoreAlreadyClosed]
/// once [DocumentStoreProvider::close] has been called, and with
/// [crate::errors::ErrorKind::InvalidCollectionName] for a malformed
/// collection name.
pub trait DocumentStoreProvider: Send + Sync {
    /// Inserts a document and returns its `_id`, generating an
    /// [crate::collection::ObjectId] when the document has none.
    fn insert_one(&self, collection: &str, document: Document) -> QueryResult<Value>;

    /// Inserts documents in order, stopping at the first failure.
    fn insert_many(&self, collection: &str, documents: Vec<Document>) -> QueryResult<Vec<Value>>;

    fn find(
        &self,
        collection: &str,
        filter: &SparseDocument,
        options: &FindOptions,
    ) -> QueryResult<Vec<Document>>;

    fn find_one(
        &self,
        collection: &str,
        filter: &SparseDocument,
        options: &FindOptions,
    ) -> QueryResult<Option<Document>>;

    /// Updates the first match and returns its image before or after the
    /// update, as chosen by the options.
    fn find_one_and_update(
        &self,
        collection: &str,
        filter: &SparseDocument,
        update: &Update,
        options: &FindOneAndUpdateOptions,
    ) -> QueryResult<Option<Document>>;

    fn update_many(
        &self,
        collection: &str,
        filter: &SparseDocument,
        update: &Update,
        options: &UpdateOptions,
    ) -> QueryResult<UpdateResult>;

    /// Replaces the first match, keeping its `_id`.
    fn find_one_and_replace(
        &self,
        collection: &str,
        filter: &SparseDocument,
        replacement: Document,
        options: &FindOneAndReplaceOptions,
    ) -> QueryResult<Option<Document>>;

    fn find_one_and_delete(
        &self,
        collection: &str,
        filter: &SparseDocument,
        options: &FindOptions,
    ) -> QueryResult<Option<Document>>;

    /// Deletes every match and returns how many were deleted.
    fn delete_many(&self, collection: &str, filter: &SparseDocument) -> QueryResult<u64>;

    fn count_documents(&self, collection: &str, filter: &SparseDocument) -> QueryResult<u64>;

    /// Returns the distinct values of `field` among the matches in first-seen
    /// order. An array value contributes its elements.
    fn distinct(
        &self,
        collection: &str,
        field: &str,
        filter: &SparseDocument,
    ) -> QueryResult<Vec<Value>>;

    fn drop_collection(&self, collection: &str) -> QueryResult<()>;

    fn collection_names(&self) -> QueryResult<Vec<String>>;

    fn ping(&self) -> QueryResult<()>;

    fn close(&self) -> QueryResult<()>;

    fn is_closed(&self) -> bool;
}

/// Shared handle to a [DocumentStoreProvider].
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<dyn DocumentStoreProvider>,
}

impl DocumentStore {
    pub fn new<T: DocumentStoreProvider + 'static>(inner: T) -> Self {
        DocumentStore {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for DocumentStore {
    type Target = Arc<dyn DocumentStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
