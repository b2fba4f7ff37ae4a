use crate::collection::Document;
use crate::common::{Value, FIELD_SEPARATOR};
use crate::errors::QueryResult;
use indexmap::IndexMap;
use std::fmt::{Debug, Display, Formatter};

/// A flat mapping from dotted field paths to values.
///
/// This is what projecting a model produces, and what filters and `$set`
/// updates are made of. Keys keep insertion order, which for a projection is
/// the declaration order of the model's fields. Equality ignores order.
///
/// ```rust
/// use docquery::common::Value;
/// use docquery::projection::SparseDocument;
/// use docquery::sparse;
///
/// let filter = sparse! { "address.city" => "Rome", "name" => "Widget" };
/// assert_eq!(filter.len(), 2);
///
/// let nested = filter.to_document().unwrap();
/// assert_eq!(nested.get("address.city").unwrap(), Value::from("Rome"));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SparseDocument {
    entries: IndexMap<String, Value>,
}

impl SparseDocument {
    pub fn new() -> Self {
        SparseDocument {
            entries: IndexMap::new(),
        }
    }

    /// Sets `key` to `value`. Re-inserting a key keeps its original position.
    pub fn insert<V: Into<Value>>(&mut self, key: impl Into<String>, value: V) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Expands the dotted paths into nested documents.
    pub fn to_document(&self) -> QueryResult<Document> {
        let mut doc = Document::new();
        for (key, value) in self.entries.iter() {
            doc.put(key.as_str(), value.clone())?;
        }
        Ok(doc)
    }

    /// Flattens a document into dotted leaf paths. Arrays are kept whole.
    pub fn from_document(doc: &Document) -> SparseDocument {
        let mut sparse = SparseDocument::new();
        flatten_into("", doc, &mut sparse);
        sparse
    }
}

fn flatten_into(prefix: &str, doc: &Document, sparse: &mut SparseDocument) {
    for (key, value) in doc.iter() {
        let path = join_path(prefix, key);
        match value {
            Value::Document(nested) if !nested.is_empty() => flatten_into(&path, nested, sparse),
            _ => {
                sparse.entries.insert(path, value.clone());
            }
        }
    }
}

pub(crate) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}{}{}", prefix, FIELD_SEPARATOR, key)
    }
}

impl IntoIterator for SparseDocument {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for SparseDocument {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        SparseDocument {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl Display for SparseDocument {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{}\": {}", key, value)?;
        }
        write!(f, "}}")
    }
}

impl Debug for SparseDocument {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

/// Creates a [SparseDocument] from `key => value` pairs.
///
/// ```rust
/// use docquery::common::Value;
/// use docquery::sparse;
///
/// let empty = sparse! {};
/// assert!(empty.is_empty());
///
/// let filter = sparse! { "name" => "Widget", "quantity" => 5 };
/// assert_eq!(filter.get("quantity"), Some(&Value::I32(5)));
/// ```
#[macro_export]
macro_rules! sparse {
    () => {
        $crate::projection::SparseDocument::new()
    };

    ($($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut sparse = $crate::projection::SparseDocument::new();
            $(
                sparse.insert($key, $crate::common::Value::from($value));
            )+
            sparse
        }
    };
}
