//! Equality matching, ordering and `$set` application shared by store
//! implementations.

use crate::collection::{Document, ObjectId};
use crate::common::{
    SortOrder, Value, DOC_ID, FIELD_SEPARATOR, RESERVED_COLLECTION_CHARS,
    SYSTEM_COLLECTION_PREFIX,
};
use crate::errors::{ErrorKind, QueryError, QueryResult};
use crate::projection::SparseDocument;
use std::cmp::Ordering;

/// Whether `document` satisfies every entry of `filter`.
///
/// The value at each path must equal the entry's value, or be an array that
/// contains it. A missing path reads as [Value::Null], so a filter entry of
/// `null` matches documents lacking the field.
pub fn matches(document: &Document, filter: &SparseDocument) -> bool {
    filter.iter().all(|(path, expected)| {
        // a malformed array index simply does not match
        let actual = document.get(path).unwrap_or(Value::Null);
        match &actual {
            Value::Array(items) if !expected.is_array() => items.contains(expected),
            _ => actual == *expected,
        }
    })
}

/// Compares two documents by the given sort keys, in order of priority.
pub fn compare(a: &Document, b: &Document, sort_keys: &[(String, SortOrder)]) -> Ordering {
    for (field, order) in sort_keys {
        let left = a.get(field).unwrap_or(Value::Null);
        let right = b.get(field).unwrap_or(Value::Null);
        let ordering = order.apply(left.cmp(&right));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Stable sort of `documents`; equal documents keep their insertion order.
pub fn sort(documents: &mut [Document], sort_keys: &[(String, SortOrder)]) {
    if !sort_keys.is_empty() {
        documents.sort_by(|a, b| compare(a, b, sort_keys));
    }
}

/// Writes every path of `fields` into `document` and reports whether
/// anything changed.
///
/// The `_id` of a stored document is immutable; setting it to a different
/// value fails with [ErrorKind::InvalidOperation].
pub fn apply_set(document: &mut Document, fields: &SparseDocument) -> QueryResult<bool> {
    let mut modified = false;
    for (path, value) in fields.iter() {
        if is_id_path(path) && document.has_id() {
            let current = document.get(path)?;
            if current != *value {
                log::error!("Cannot modify the immutable field '{}'", path);
                return Err(QueryError::new(
                    &format!("Cannot modify the immutable field '{}'", path),
                    ErrorKind::InvalidOperation,
                ));
            }
            continue;
        }

        if document.get(path).ok().as_ref() != Some(value) {
            document.put(path.as_str(), value.clone())?;
            modified = true;
        }
    }
    Ok(modified)
}

/// Builds the document inserted by an upsert: the filter's equality entries
/// with the update applied on top.
pub fn upsert_seed(filter: &SparseDocument, fields: &SparseDocument) -> QueryResult<Document> {
    let mut document = filter.to_document()?;
    for (path, value) in fields.iter() {
        document.put(path.as_str(), value.clone())?;
    }
    Ok(document)
}

/// Returns the `_id` of `document`, generating and storing an [ObjectId]
/// when it has none.
pub fn ensure_id(document: &mut Document) -> QueryResult<Value> {
    let id = document.id();
    if !id.is_null() {
        return Ok(id);
    }
    let id = Value::ObjectId(ObjectId::new());
    document.put(DOC_ID, id.clone())?;
    Ok(id)
}

/// Rejects collection names a document database would refuse.
pub fn validate_collection_name(name: &str) -> QueryResult<()> {
    if name.is_empty() {
        log::error!("Collection name cannot be empty");
        return Err(QueryError::new(
            "Collection name cannot be empty",
            ErrorKind::InvalidCollectionName,
        ));
    }

    if name.contains(RESERVED_COLLECTION_CHARS) {
        log::error!("Collection name '{}' contains a reserved character", name);
        return Err(QueryError::new(
            &format!("Collection name '{}' contains a reserved character", name),
            ErrorKind::InvalidCollectionName,
        ));
    }

    if name.starts_with(SYSTEM_COLLECTION_PREFIX) {
        log::error!("Collection name '{}' is reserved for system use", name);
        return Err(QueryError::new(
            &format!("Collection name '{}' is reserved for system use", name),
            ErrorKind::InvalidCollectionName,
        ));
    }
    Ok(())
}

fn is_id_path(path: &str) -> bool {
    path == DOC_ID || path.starts_with(&format!("{}{}", DOC_ID, FIELD_SEPARATOR))
}
