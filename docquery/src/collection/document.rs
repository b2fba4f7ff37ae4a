use crate::common::{Value, DOC_ID, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, QueryError, QueryResult};
use im::OrdMap;
use itertools::Itertools;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt::{Debug, Display};

type FieldVec = SmallVec<[String; 8]>;

/// A stored document: an ordered map from field names to [Value]s.
///
/// Documents nest. The key of a nested field is the path of field names joined
/// by `.`, so for `{"a": {"b": 1}}` the value can be read with `document.get("a.b")`.
/// Array elements are addressed by index (`"items.0"`), and a non-numeric key
/// below an array collects that field from every element.
///
/// The `_id` field holds the document identity. Unlike the other fields it may
/// be any [Value]: a store generated [crate::collection::ObjectId] or a
/// caller supplied composite key.
///
/// The map is an `im::OrdMap`, so cloning a document is O(1) and mutations share
/// structure with the original.
#[derive(Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd, serde::Deserialize, serde::Serialize)]
pub struct Document {
    data: OrdMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Associates `value` with `key`, replacing any previous value.
    ///
    /// A dotted key writes into nested documents, creating them as needed.
    /// An empty key, or an empty segment of a dotted key, is rejected with
    /// [ErrorKind::InvalidOperation].
    ///
    /// ```rust
    /// use docquery::collection::Document;
    /// use docquery::common::Value;
    ///
    /// let mut doc = Document::new();
    /// doc.put("address.city", "Rome").unwrap();
    /// assert_eq!(doc.get("address.city").unwrap(), Value::from("Rome"));
    /// assert!(doc.get("address").unwrap().is_document());
    /// ```
    pub fn put<'a, T: Into<Value>>(&mut self, key: impl Into<Cow<'a, str>>, value: T) -> QueryResult<()> {
        let key = key.into();
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(QueryError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        let value = value.into();
        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_put(&splits, value)
        } else {
            self.data = self.data.update(key.to_string(), value);
            Ok(())
        }
    }

    /// Returns the value at `key`, or [Value::Null] if there is none.
    ///
    /// Only malformed array access fails: a negative or out of bound index below
    /// an array yields [ErrorKind::ValidationError].
    pub fn get(&self, key: &str) -> QueryResult<Value> {
        match self.data.get(key) {
            Some(value) => Ok(value.clone()),
            None => {
                if key.contains(FIELD_SEPARATOR) {
                    self.get_by_embedded_key(key)
                } else {
                    Ok(Value::Null)
                }
            }
        }
    }

    /// Returns the `_id` value, or [Value::Null] when the document has none.
    pub fn id(&self) -> Value {
        self.data.get(DOC_ID).cloned().unwrap_or(Value::Null)
    }

    pub fn has_id(&self) -> bool {
        self.data.contains_key(DOC_ID)
    }

    /// Returns every leaf field path, nested documents flattened with `.`.
    /// The `_id` field is not included.
    pub fn fields(&self) -> FieldVec {
        self.get_fields_internal("")
    }

    /// Removes the value at `key`. Removing the last field of a nested document
    /// removes the nested document too.
    pub fn remove(&mut self, key: &str) -> QueryResult<()> {
        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_remove(&splits)
        } else {
            self.data = self.data.without(key);
            Ok(())
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Merges `other` into this document. Nested documents merge recursively,
    /// any other value from `other` overwrites.
    pub fn merge(&mut self, other: &Document) -> QueryResult<()> {
        for (key, value) in other.data.iter() {
            match value {
                Value::Document(obj) => {
                    if let Some(Value::Document(mut nested)) = self.data.get(key).cloned() {
                        nested.merge(obj)?;
                        self.data = self.data.update(key.clone(), Value::Document(nested));
                    } else {
                        self.data = self.data.update(key.clone(), value.clone());
                    }
                }
                _ => {
                    self.data = self.data.update(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    /// Checks for a top level key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Checks for a field path, nested paths included.
    pub fn contains_field(&self, field: &str) -> bool {
        if self.contains_key(field) {
            true
        } else {
            self.fields().iter().any(|f| f == field || f.starts_with(&format!("{}.", field)))
        }
    }

    /// Iterates over the top level entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub(crate) fn to_pretty_json(&self, indent: usize) -> String {
        if self.data.is_empty() {
            return "{}".to_string();
        }

        let mut json_string = String::with_capacity(self.data.len() * 30 + indent * 2);
        json_string.push_str("{\n");
        let indent_str = " ".repeat(indent + 2);
        for (key, value) in self.data.iter() {
            json_string.push_str(&format!(
                "{}\"{}\": {},\n",
                indent_str,
                key,
                value.to_pretty_json(indent + 2)
            ));
        }

        // drop the trailing ",\n"
        json_string.pop();
        json_string.pop();
        json_string.push_str(&format!("\n{}}}", " ".repeat(indent)));
        json_string
    }

    pub(crate) fn to_debug_string(&self, indent: usize) -> String {
        if self.data.is_empty() {
            return "{}".to_string();
        }

        let indent_str = " ".repeat(indent + 2);
        let entries = self
            .data
            .iter()
            .map(|(key, value)| {
                format!("{}\"{}\": {}", indent_str, key, value.to_debug_string(indent + 2))
            })
            .join(",\n");
        format!("{{\n{}\n{}}}", entries, " ".repeat(indent))
    }

    fn get_fields_internal(&self, prefix: &str) -> FieldVec {
        let mut fields = FieldVec::new();

        for (key, value) in self.data.iter() {
            if key == DOC_ID || key.is_empty() {
                continue;
            }

            let field = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, FIELD_SEPARATOR, key)
            };

            if let Value::Document(doc) = value {
                fields.append(&mut doc.get_fields_internal(&field));
            } else {
                fields.push(field);
            }
        }
        fields
    }

    fn deep_put(&mut self, splits: &[&str], value: Value) -> QueryResult<()> {
        let key = match splits.first() {
            Some(key) if !key.is_empty() => *key,
            _ => {
                log::error!("Document does not support empty key");
                return Err(QueryError::new(
                    "Document does not support empty key",
                    ErrorKind::InvalidOperation,
                ));
            }
        };

        if splits.len() == 1 {
            self.data = self.data.update(key.to_string(), value);
            return Ok(());
        }

        // a scalar in the way is replaced by a new embedded document
        let mut nested = match self.data.get(key) {
            Some(Value::Document(obj)) => obj.clone(),
            _ => Document::new(),
        };
        let result = nested.deep_put(&splits[1..], value);
        self.data = self.data.update(key.to_string(), Value::Document(nested));
        result
    }

    fn deep_remove(&mut self, splits: &[&str]) -> QueryResult<()> {
        let key = match splits.first() {
            Some(key) if !key.is_empty() => *key,
            _ => {
                log::error!("Document does not support empty key");
                return Err(QueryError::new(
                    "Document does not support empty key",
                    ErrorKind::InvalidOperation,
                ));
            }
        };

        if splits.len() == 1 {
            self.data = self.data.without(key);
            return Ok(());
        }

        match self.data.get(key) {
            Some(Value::Document(obj)) => {
                let mut nested = obj.clone();
                let result = nested.deep_remove(&splits[1..]);
                if nested.is_empty() {
                    self.data = self.data.without(key);
                } else {
                    self.data = self.data.update(key.to_string(), Value::Document(nested));
                }
                result
            }
            Some(Value::Array(arr)) => {
                let index = array_index(splits[1], arr.len())?;
                let mut new_arr = arr.clone();
                match (&arr[index], splits.len() > 2) {
                    (Value::Document(obj), true) => {
                        let mut nested = obj.clone();
                        nested.deep_remove(&splits[2..])?;
                        if nested.is_empty() {
                            new_arr.remove(index);
                        } else {
                            new_arr[index] = Value::Document(nested);
                        }
                    }
                    _ => {
                        new_arr.remove(index);
                    }
                }
                self.data = self.data.update(key.to_string(), Value::Array(new_arr));
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn get_by_embedded_key(&self, key: &str) -> QueryResult<Value> {
        let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
        let first = splits[0];
        if first.is_empty() {
            log::error!("Document does not support empty key");
            return Err(QueryError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        recursive_get(self.data.get(first), &splits[1..])
    }
}

fn recursive_get(value: Option<&Value>, splits: &[&str]) -> QueryResult<Value> {
    let value = match value {
        None => return Ok(Value::Null),
        Some(v) => v,
    };

    let key = match splits.first() {
        None => return Ok(value.clone()),
        Some(key) => *key,
    };

    if key.is_empty() {
        log::error!("Document does not support empty key");
        return Err(QueryError::new(
            "Document does not support empty key",
            ErrorKind::InvalidOperation,
        ));
    }

    match value {
        Value::Document(obj) => recursive_get(obj.data.get(key), &splits[1..]),
        Value::Array(arr) => {
            if key.parse::<isize>().is_ok() {
                let index = array_index(key, arr.len())?;
                recursive_get(Some(&arr[index]), &splits[1..])
            } else {
                decompose(arr, splits)
            }
        }
        _ => Ok(Value::Null),
    }
}

// collects the remaining path from every array element, flattening nested arrays
fn decompose(arr: &[Value], splits: &[&str]) -> QueryResult<Value> {
    let mut items: Vec<Value> = Vec::with_capacity(arr.len());
    for item in arr {
        match recursive_get(Some(item), splits)? {
            Value::Array(values) => items.extend(values),
            Value::Null => {}
            value => items.push(value),
        }
    }
    Ok(Value::Array(items.into_iter().unique().collect()))
}

fn array_index(key: &str, len: usize) -> QueryResult<usize> {
    let index = key.parse::<isize>().map_err(|_| {
        log::error!("Invalid array index {} to access array inside a document", key);
        QueryError::new(
            &format!("Invalid array index {} to access array inside a document", key),
            ErrorKind::ValidationError,
        )
    })?;

    if index < 0 {
        log::error!("Invalid array index {} to access array inside a document", index);
        return Err(QueryError::new(
            &format!("Invalid array index {} to access array inside a document", index),
            ErrorKind::ValidationError,
        ));
    }

    let index = index as usize;
    if index >= len {
        log::error!("Array index {} out of bound", index);
        return Err(QueryError::new(
            &format!("Array index {} out of bound", index),
            ErrorKind::ValidationError,
        ));
    }
    Ok(index)
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_debug_string(0))
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_pretty_json(0))
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = im::ordmap::ConsumingIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

#[doc(hidden)]
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// Keys may be identifiers or string literals. Values may be nested documents,
/// arrays, literals, or parenthesized expressions.
///
/// ```rust
/// use docquery::doc;
///
/// let base = 100;
/// let document = doc! {
///     name: "Widget",
///     "_id": 7,
///     price: (base * 2),
///     tags: ["a", "b"],
///     address: {
///         city: "Rome",
///     }
/// };
/// assert_eq!(document.size(), 5);
/// ```
#[macro_export]
macro_rules! doc {
    ({}) => {
        $crate::collection::Document::new()
    };

    () => {
        $crate::collection::Document::new()
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            let mut doc = $crate::collection::Document::new();
            $(
                doc.put($crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                    .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro converting the values of [doc!].
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
