use crate::collection::{Document, ObjectId};
use crate::common::Value;
use crate::errors::{ErrorKind, QueryError, QueryResult};
use chrono::{DateTime, Utc};
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::str::FromStr;

/// Conversion between a Rust type and its [Value] form.
///
/// `to_value` encodes `self`; `from_value` decodes a value produced by the store
/// or by another type's `to_value`. Decoding is tolerant of integer width: any
/// integer value that fits the target type is accepted, since stores and casts
/// do not preserve the original width.
///
/// Models normally get this impl from `#[derive(Convertible)]` or
/// `#[derive(Model)]`.
pub trait Convertible {
    type Output;

    fn to_value(&self) -> QueryResult<Value>;
    fn from_value(value: &Value) -> QueryResult<Self::Output>;
}

fn mapping_error(value: &Value, expected: &str) -> QueryError {
    log::error!("Value {} is not {}", value, expected);
    QueryError::new(
        &format!("Value of type {} is not {}", value.type_name(), expected),
        ErrorKind::ObjectMappingError,
    )
}

macro_rules! impl_convertible_for_integer {
    ($($t:ty => $variant:ident, $name:expr);* $(;)?) => {
        $(
            impl Convertible for $t {
                type Output = $t;

                fn to_value(&self) -> QueryResult<Value> {
                    Ok(Value::$variant(*self))
                }

                fn from_value(value: &Value) -> QueryResult<Self> {
                    value
                        .as_i128()
                        .and_then(|v| <$t>::try_from(v).ok())
                        .ok_or_else(|| mapping_error(value, $name))
                }
            }
        )*
    };
}

impl_convertible_for_integer! {
    i8 => I8, "an i8";
    u8 => U8, "a u8";
    i16 => I16, "an i16";
    u16 => U16, "a u16";
    i32 => I32, "an i32";
    u32 => U32, "a u32";
    i64 => I64, "an i64";
    u64 => U64, "a u64";
}

impl Convertible for isize {
    type Output = isize;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::I64(*self as i64))
    }

    fn from_value(value: &Value) -> QueryResult<Self> {
        value
            .as_i128()
            .and_then(|v| isize::try_from(v).ok())
            .ok_or_else(|| mapping_error(value, "an isize"))
    }
}

impl Convertible for usize {
    type Output = usize;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::U64(*self as u64))
    }

    fn from_value(value: &Value) -> QueryResult<Self> {
        value
            .as_i128()
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| mapping_error(value, "a usize"))
    }
}

impl Convertible for f32 {
    type Output = f32;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::F32(*self))
    }

    fn from_value(value: &Value) -> QueryResult<Self> {
        value
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| mapping_error(value, "an f32"))
    }
}

impl Convertible for f64 {
    type Output = f64;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::F64(*self))
    }

    fn from_value(value: &Value) -> QueryResult<Self> {
        value.as_f64().ok_or_else(|| mapping_error(value, "an f64"))
    }
}

impl Convertible for char {
    type Output = char;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::Char(*self))
    }

    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Char(c) => Ok(*c),
            Value::String(s) if s.chars().count() == 1 => {
                s.chars().next().ok_or_else(|| mapping_error(value, "a char"))
            }
            _ => Err(mapping_error(value, "a char")),
        }
    }
}

impl Convertible for String {
    type Output = String;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::String(self.clone()))
    }

    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Char(c) => Ok(c.to_string()),
            _ => Err(mapping_error(value, "a string")),
        }
    }
}

impl Convertible for &str {
    type Output = String;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::String(self.to_string()))
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        String::from_value(value)
    }
}

impl Convertible for bool {
    type Output = bool;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: &Value) -> QueryResult<Self> {
        value
            .as_bool()
            .copied()
            .ok_or_else(|| mapping_error(value, "a bool"))
    }
}

impl Convertible for () {
    type Output = ();

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::Null)
    }

    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Null => Ok(()),
            _ => Err(mapping_error(value, "null")),
        }
    }
}

impl Convertible for ObjectId {
    type Output = ObjectId;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::ObjectId(*self))
    }

    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::ObjectId(id) => Ok(*id),
            Value::String(hex) => ObjectId::parse_str(hex),
            _ => {
                log::error!("Value {} is not an object id", value);
                Err(QueryError::new(
                    &format!("Value of type {} is not an object id", value.type_name()),
                    ErrorKind::InvalidId,
                ))
            }
        }
    }
}

impl Convertible for DateTime<Utc> {
    type Output = DateTime<Utc>;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::String(self.to_rfc3339()))
    }

    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|err| {
                    log::error!("Invalid timestamp {}: {}", s, err);
                    QueryError::new(
                        &format!("Invalid timestamp {}: {}", s, err),
                        ErrorKind::ObjectMappingError,
                    )
                }),
            _ => Err(mapping_error(value, "a timestamp")),
        }
    }
}

impl Convertible for Document {
    type Output = Document;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::Document(self.clone()))
    }

    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Document(doc) => Ok(doc.clone()),
            _ => Err(mapping_error(value, "a document")),
        }
    }
}

impl Convertible for Value {
    type Output = Value;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(self.clone())
    }

    fn from_value(value: &Value) -> QueryResult<Self> {
        Ok(value.clone())
    }
}

impl<T> Convertible for Option<T>
where
    T: Convertible,
{
    type Output = Option<T::Output>;

    fn to_value(&self) -> QueryResult<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        match value {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(value)?)),
        }
    }
}

impl<T> Convertible for Box<T>
where
    T: Convertible,
{
    type Output = Box<T::Output>;

    fn to_value(&self) -> QueryResult<Value> {
        self.as_ref().to_value()
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        Ok(Box::new(T::from_value(value)?))
    }
}

impl<T> Convertible for Vec<T>
where
    T: Convertible + Any,
{
    type Output = Vec<T::Output>;

    fn to_value(&self) -> QueryResult<Value> {
        if TypeId::of::<T>() == TypeId::of::<u8>() {
            let mut bytes = Vec::with_capacity(self.len());
            for item in self {
                match item.to_value()? {
                    Value::U8(b) => bytes.push(b),
                    other => return Err(mapping_error(&other, "a u8")),
                }
            }
            return Ok(Value::Bytes(bytes));
        }

        let mut arr = Vec::with_capacity(self.len());
        for item in self {
            arr.push(item.to_value()?);
        }
        Ok(Value::Array(arr))
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        match value {
            Value::Array(arr) => arr.iter().map(T::from_value).collect(),
            Value::Bytes(bytes) => bytes.iter().map(|b| T::from_value(&Value::U8(*b))).collect(),
            _ => Err(mapping_error(value, "an array")),
        }
    }
}

impl<V> Convertible for HashSet<V>
where
    V: Convertible,
    V::Output: Eq + Hash,
{
    type Output = HashSet<V::Output>;

    fn to_value(&self) -> QueryResult<Value> {
        let mut arr = Vec::with_capacity(self.len());
        for item in self {
            arr.push(item.to_value()?);
        }
        // hash order is unstable, keep the encoded form deterministic
        arr.sort();
        Ok(Value::Array(arr))
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        match value {
            Value::Array(arr) => arr.iter().map(V::from_value).collect(),
            _ => Err(mapping_error(value, "an array")),
        }
    }
}

impl<V> Convertible for BTreeSet<V>
where
    V: Convertible,
    V::Output: Ord,
{
    type Output = BTreeSet<V::Output>;

    fn to_value(&self) -> QueryResult<Value> {
        let mut arr = Vec::with_capacity(self.len());
        for item in self {
            arr.push(item.to_value()?);
        }
        Ok(Value::Array(arr))
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        match value {
            Value::Array(arr) => arr.iter().map(V::from_value).collect(),
            _ => Err(mapping_error(value, "an array")),
        }
    }
}

macro_rules! impl_convertible_for_tuples {
    ($(($($T:ident : $idx:tt),+)),+ $(,)?) => {
        $(
            impl<$($T),+> Convertible for ($($T,)+)
            where
                $($T: Convertible),+
            {
                type Output = ($($T::Output,)+);

                fn to_value(&self) -> QueryResult<Value> {
                    Ok(Value::Array(vec![$(self.$idx.to_value()?),+]))
                }

                fn from_value(value: &Value) -> QueryResult<Self::Output> {
                    let arity = [$($idx),+].len();
                    match value {
                        Value::Array(arr) if arr.len() == arity => {
                            Ok(($($T::from_value(&arr[$idx])?,)+))
                        }
                        _ => Err(mapping_error(value, &format!("an array of {} elements", arity))),
                    }
                }
            }
        )+
    };
}

impl_convertible_for_tuples! {
    (A: 0, B: 1),
    (A: 0, B: 1, C: 2),
    (A: 0, B: 1, C: 2, D: 3),
}

fn map_to_value<'a, K, V, I>(entries: I) -> QueryResult<Value>
where
    K: ToString + 'a,
    V: Convertible + 'a,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    let mut pairs = Vec::new();
    for (k, v) in entries {
        pairs.push((k.to_string(), v.to_value()?));
    }
    // collected rather than put, so a dotted map key stays a single field
    Ok(Value::Document(pairs.into_iter().collect()))
}

fn map_entries<K, V>(value: &Value) -> QueryResult<Vec<(K, V::Output)>>
where
    K: FromStr,
    V: Convertible,
{
    match value {
        Value::Document(doc) => doc
            .iter()
            .map(|(k, v)| {
                let key = K::from_str(k).map_err(|_| {
                    log::error!("Failed to convert key {} to type", k);
                    QueryError::new(
                        &format!("Failed to convert key {} to type", k),
                        ErrorKind::ObjectMappingError,
                    )
                })?;
                Ok((key, V::from_value(v)?))
            })
            .collect(),
        _ => Err(mapping_error(value, "a document")),
    }
}

impl<K, V> Convertible for BTreeMap<K, V>
where
    K: ToString + FromStr + Ord,
    V: Convertible,
{
    type Output = BTreeMap<K, V::Output>;

    fn to_value(&self) -> QueryResult<Value> {
        map_to_value(self.iter())
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        Ok(map_entries::<K, V>(value)?.into_iter().collect())
    }
}

impl<K, V> Convertible for HashMap<K, V>
where
    K: ToString + FromStr + Eq + Hash,
    V: Convertible,
{
    type Output = HashMap<K, V::Output>;

    fn to_value(&self) -> QueryResult<Value> {
        map_to_value(self.iter())
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        Ok(map_entries::<K, V>(value)?.into_iter().collect())
    }
}

/// Encodes `value` into its [Value] form.
pub fn to_value<T: Convertible + ?Sized>(value: &T) -> QueryResult<Value> {
    value.to_value()
}

/// Decodes `value` into `T`. Used by derive-generated code.
pub fn from_value<T: Convertible>(value: &Value) -> QueryResult<T::Output> {
    T::from_value(value)
}

/// Encodes `value` and requires the result to be a document.
pub fn to_document<T: Convertible + ?Sized>(value: &T) -> QueryResult<Document> {
    match value.to_value()? {
        Value::Document(doc) => Ok(doc),
        other => {
            log::error!("Value {} does not encode to a document", other);
            Err(QueryError::new(
                &format!("Value of type {} does not encode to a document", other.type_name()),
                ErrorKind::EncodingError,
            ))
        }
    }
}

/// Decodes a document into `T`.
pub fn from_document<T: Convertible>(doc: &Document) -> QueryResult<T::Output> {
    T::from_value(&Value::Document(doc.clone()))
}
