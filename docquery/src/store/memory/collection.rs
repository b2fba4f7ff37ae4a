use crate::collection::{
    Document, FindOneAndReplaceOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument,
    UpdateOptions, UpdateResult,
};
use crate::common::{SortOrder, Value, DOC_ID};
use crate::errors::{ErrorKind, QueryError, QueryResult};
use crate::projection::SparseDocument;
use crate::store::matcher::{apply_set, compare, ensure_id, matches, sort, upsert_seed};
use crate::store::Update;
use indexmap::IndexMap;
use itertools::Itertools;
use parking_lot::RwLock;
use std::sync::Arc;

type DocumentMap = IndexMap<Value, Document>;

/// A named collection held in memory.
///
/// Documents are keyed by `_id` and kept in insertion order, which is the
/// natural order of unsorted reads. Every operation holds the collection lock
/// for its whole duration, so a find-and-modify is atomic.
#[derive(Clone)]
pub(crate) struct InMemoryCollection {
    inner: Arc<InMemoryCollectionInner>,
}

struct InMemoryCollectionInner {
    name: String,
    documents: RwLock<DocumentMap>,
}

impl InMemoryCollection {
    pub(crate) fn new(name: &str) -> Self {
        InMemoryCollection {
            inner: Arc::new(InMemoryCollectionInner {
                name: name.to_string(),
                documents: RwLock::new(IndexMap::new()),
            }),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.inner.name
    }

    pub(crate) fn insert(&self, document: Document) -> QueryResult<Value> {
        let mut documents = self.inner.documents.write();
        self.insert_locked(&mut documents, document)
    }

    pub(crate) fn insert_all(&self, batch: Vec<Document>) -> QueryResult<Vec<Value>> {
        let mut documents = self.inner.documents.write();
        let mut ids = Vec::with_capacity(batch.len());
        for document in batch {
            ids.push(self.insert_locked(&mut documents, document)?);
        }
        Ok(ids)
    }

    pub(crate) fn find(&self, filter: &SparseDocument, options: &FindOptions) -> Vec<Document> {
        let documents = self.inner.documents.read();
        let mut found: Vec<Document> = documents
            .values()
            .filter(|document| matches(document, filter))
            .cloned()
            .collect();
        sort(&mut found, options.sort_keys());

        let skip = options.skip_count().unwrap_or(0) as usize;
        let limit = options.limit_count().map(|limit| limit as usize).unwrap_or(usize::MAX);
        found.into_iter().skip(skip).take(limit).collect()
    }

    pub(crate) fn find_one_and_update(
        &self,
        filter: &SparseDocument,
        update: &Update,
        options: &FindOneAndUpdateOptions,
    ) -> QueryResult<Option<Document>> {
        let mut documents = self.inner.documents.write();
        let position = first_match(&documents, filter, options.sort_keys());

        if let Some((_, current)) = position.and_then(|index| documents.get_index_mut(index)) {
            // apply on a copy so a rejected update leaves the stored document untouched
            let mut updated = current.clone();
            apply_set(&mut updated, update.fields())?;
            let before = std::mem::replace(current, updated.clone());
            return Ok(Some(match options.returned() {
                ReturnDocument::Before => before,
                ReturnDocument::After => updated,
            }));
        }

        if !options.is_upsert() {
            return Ok(None);
        }

        let seed = upsert_seed(filter, update.fields())?;
        let inserted = self.insert_returning(&mut documents, seed)?;
        Ok(match options.returned() {
            ReturnDocument::Before => None,
            ReturnDocument::After => Some(inserted),
        })
    }

    /// Applies `update` to every match in turn. Not all-or-nothing: when the
    /// update is rejected for one document, the matches already visited keep
    /// their new values.
    pub(crate) fn update_many(
        &self,
        filter: &SparseDocument,
        update: &Update,
        options: &UpdateOptions,
    ) -> QueryResult<UpdateResult> {
        let mut documents = self.inner.documents.write();
        let mut result = UpdateResult::default();

        for current in documents.values_mut().filter(|document| matches(document, filter)) {
            result.matched_count += 1;
            let mut updated = current.clone();
            if apply_set(&mut updated, update.fields())? {
                *current = updated;
                result.modified_count += 1;
            }
        }

        if result.matched_count == 0 && options.is_upsert() {
            let seed = upsert_seed(filter, update.fields())?;
            let id = self.insert_locked(&mut documents, seed)?;
            result.upserted_id = Some(id);
        }
        Ok(result)
    }

    pub(crate) fn find_one_and_replace(
        &self,
        filter: &SparseDocument,
        mut replacement: Document,
        options: &FindOneAndReplaceOptions,
    ) -> QueryResult<Option<Document>> {
        let mut documents = self.inner.documents.write();
        let position = first_match(&documents, filter, &[]);

        if let Some((id, current)) = position.and_then(|index| documents.get_index_mut(index)) {
            let replacement_id = replacement.id();
            if !replacement_id.is_null() && replacement_id != *id {
                log::error!(
                    "Replacement in '{}' would change the immutable field '{}'",
                    self.name(),
                    DOC_ID
                );
                return Err(QueryError::new(
                    &format!("Cannot modify the immutable field '{}'", DOC_ID),
                    ErrorKind::InvalidOperation,
                ));
            }

            replacement.put(DOC_ID, id.clone())?;
            let before = std::mem::replace(current, replacement.clone());
            return Ok(Some(match options.returned() {
                ReturnDocument::Before => before,
                ReturnDocument::After => replacement,
            }));
        }

        if !options.is_upsert() {
            return Ok(None);
        }

        if !replacement.has_id() {
            if let Some(id) = filter.get(DOC_ID) {
                replacement.put(DOC_ID, id.clone())?;
            }
        }
        let inserted = self.insert_returning(&mut documents, replacement)?;
        Ok(match options.returned() {
            ReturnDocument::Before => None,
            ReturnDocument::After => Some(inserted),
        })
    }

    pub(crate) fn find_one_and_delete(
        &self,
        filter: &SparseDocument,
        options: &FindOptions,
    ) -> Option<Document> {
        let mut documents = self.inner.documents.write();
        let position = first_match(&documents, filter, options.sort_keys())?;
        documents
            .shift_remove_index(position)
            .map(|(_, document)| document)
    }

    pub(crate) fn delete_many(&self, filter: &SparseDocument) -> u64 {
        let mut documents = self.inner.documents.write();
        let before = documents.len();
        documents.retain(|_, document| !matches(document, filter));
        (before - documents.len()) as u64
    }

    pub(crate) fn count(&self, filter: &SparseDocument) -> u64 {
        let documents = self.inner.documents.read();
        documents
            .values()
            .filter(|document| matches(document, filter))
            .count() as u64
    }

    pub(crate) fn distinct(&self, field: &str, filter: &SparseDocument) -> QueryResult<Vec<Value>> {
        let documents = self.inner.documents.read();
        let mut values = Vec::new();
        for document in documents.values().filter(|document| matches(document, filter)) {
            match document.get(field)? {
                Value::Null => {}
                Value::Array(items) => values.extend(items),
                value => values.push(value),
            }
        }
        Ok(values.into_iter().unique().collect())
    }

    fn insert_locked(&self, documents: &mut DocumentMap, document: Document) -> QueryResult<Value> {
        self.insert_returning(documents, document)
            .map(|document| document.id())
    }

    fn insert_returning(&self, documents: &mut DocumentMap, mut document: Document) -> QueryResult<Document> {
        let id = ensure_id(&mut document)?;
        if documents.contains_key(&id) {
            log::error!("Duplicate key {:?} in collection '{}'", id, self.name());
            return Err(QueryError::new(
                &format!("Duplicate key {:?} in collection '{}'", id, self.name()),
                ErrorKind::DuplicateKey,
            ));
        }
        documents.insert(id, document.clone());
        Ok(document)
    }
}

// position of the first match in sort order, ties broken by insertion order
fn first_match(
    documents: &DocumentMap,
    filter: &SparseDocument,
    sort_keys: &[(String, SortOrder)],
) -> Option<usize> {
    documents
        .values()
        .enumerate()
        .filter(|(_, document)| matches(document, filter))
        .min_by(|(_, a), (_, b)| compare(a, b, sort_keys))
        .map(|(index, _)| index)
}
