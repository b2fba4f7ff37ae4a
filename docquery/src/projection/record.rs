use crate::collection::{Document, ObjectId};
use crate::common::{Convertible, Value};
use crate::errors::QueryResult;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Object-safe encoding of a field value into its [Value] form.
///
/// Every [Convertible] type is `Encode`; the projection engine only needs the
/// encoding direction, and it needs it behind a `dyn` reference.
pub trait Encode {
    fn encode(&self) -> QueryResult<Value>;
}

impl<T: Convertible + ?Sized> Encode for T {
    fn encode(&self) -> QueryResult<Value> {
        self.to_value()
    }
}

/// How the projection engine treats a field value.
pub enum FieldShape<'a> {
    /// Stored whole under the field's key.
    Leaf(&'a dyn Encode),
    /// Projected recursively, its keys prefixed with the field's key.
    Record(&'a dyn Record),
}

/// One field of a [Record], as seen by the projection engine.
pub struct FieldDescriptor<'a> {
    key: &'static str,
    zero: bool,
    shape: FieldShape<'a>,
}

impl<'a> FieldDescriptor<'a> {
    pub fn new(key: &'static str, zero: bool, shape: FieldShape<'a>) -> Self {
        FieldDescriptor { key, zero, shape }
    }

    /// Describes a field through its [FieldKind] impl.
    pub fn of<T: FieldKind + ?Sized>(key: &'static str, value: &'a T) -> Self {
        FieldDescriptor::new(key, value.is_zero(), value.shape())
    }

    /// Describes a field forced to be a leaf, whatever its type.
    pub fn leaf<T>(key: &'static str, value: &'a T) -> Self
    where
        T: Convertible + Default + PartialEq,
    {
        FieldDescriptor::new(key, is_zero_value(value), FieldShape::Leaf(value))
    }

    /// The external key: the `#[field(name)]` annotation, else the field name.
    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn is_zero(&self) -> bool {
        self.zero
    }

    pub fn shape(&self) -> &FieldShape<'a> {
        &self.shape
    }
}

/// A model whose fields the projection engine can walk.
///
/// Implemented by `#[derive(Model)]`. Fields are listed in declaration order;
/// fields marked `#[field(skip)]` or listed in `#[converter(ignored)]` are
/// not listed.
pub trait Record: Encode {
    fn field_descriptors(&self) -> Vec<FieldDescriptor<'_>>;
}

/// Per-type zero check and leaf/record classification of a field.
pub trait FieldKind {
    /// Whether the value equals the zero value of its type.
    fn is_zero(&self) -> bool;

    fn shape(&self) -> FieldShape<'_>;
}

/// Compares `value` with its type's `Default`.
pub fn is_zero_value<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

macro_rules! impl_leaf_field_kind {
    ($($t:ty),* $(,)?) => {
        $(
            impl FieldKind for $t {
                fn is_zero(&self) -> bool {
                    is_zero_value(self)
                }

                fn shape(&self) -> FieldShape<'_> {
                    FieldShape::Leaf(self)
                }
            }
        )*
    };
}

impl_leaf_field_kind! {
    i8, u8, i16, u16, i32, u32, i64, u64, isize, usize,
    f32, f64, bool, char, String, Value, Document, DateTime<Utc>,
}

impl FieldKind for ObjectId {
    fn is_zero(&self) -> bool {
        self.is_nil()
    }

    fn shape(&self) -> FieldShape<'_> {
        FieldShape::Leaf(self)
    }
}

// an optional record is stored whole, not flattened
impl<T: Convertible> FieldKind for Option<T> {
    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn shape(&self) -> FieldShape<'_> {
        FieldShape::Leaf(self)
    }
}

impl<T: FieldKind + ?Sized> FieldKind for Box<T> {
    fn is_zero(&self) -> bool {
        self.as_ref().is_zero()
    }

    fn shape(&self) -> FieldShape<'_> {
        self.as_ref().shape()
    }
}

impl<T: Convertible + Any> FieldKind for Vec<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn shape(&self) -> FieldShape<'_> {
        FieldShape::Leaf(self)
    }
}

macro_rules! impl_collection_field_kind {
    ($($t:ident < $($p:ident),+ >),* $(,)?) => {
        $(
            impl<$($p),+> FieldKind for $t<$($p),+>
            where
                $t<$($p),+>: Convertible,
            {
                fn is_zero(&self) -> bool {
                    self.is_empty()
                }

                fn shape(&self) -> FieldShape<'_> {
                    FieldShape::Leaf(self)
                }
            }
        )*
    };
}

impl_collection_field_kind! {
    HashMap<K, V>,
    BTreeMap<K, V>,
    HashSet<V>,
    BTreeSet<V>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_zero_values() {
        assert!(0i32.is_zero());
        assert!(!5i32.is_zero());
        assert!(0.0f64.is_zero());
        assert!((-0.0f64).is_zero());
        assert!(!f64::NAN.is_zero());
        assert!(false.is_zero());
        assert!(String::new().is_zero());
        assert!(!"x".to_string().is_zero());
        assert!('\0'.is_zero());
        assert!(Value::Null.is_zero());
        assert!(Document::new().is_zero());
    }

    #[test]
    fn test_container_zero_values() {
        assert!(None::<i32>.is_zero());
        assert!(!Some(0).is_zero());
        assert!(Vec::<String>::new().is_zero());
        assert!(!vec![0].is_zero());
        assert!(HashMap::<String, i32>::new().is_zero());
        assert!(BTreeSet::<i32>::new().is_zero());
        assert!(Box::new(0u8).is_zero());
    }

    #[test]
    fn test_object_id_zero() {
        assert!(ObjectId::from_bytes([0; 12]).is_zero());
        assert!(ObjectId::default().is_zero());
        assert!(!ObjectId::new().is_zero());
    }

    #[test]
    fn test_leaf_shape_encodes_value() {
        let value = 5i64;
        match value.shape() {
            FieldShape::Leaf(leaf) => assert_eq!(leaf.encode().unwrap(), Value::I64(5)),
            FieldShape::Record(_) => panic!("i64 must be a leaf"),
        }

        let value = Some("x".to_string());
        match value.shape() {
            FieldShape::Leaf(leaf) => assert_eq!(leaf.encode().unwrap(), Value::from("x")),
            FieldShape::Record(_) => panic!("Option must be a leaf"),
        }
    }

    #[test]
    fn test_descriptor_constructors() {
        let name = "Widget".to_string();
        let descriptor = FieldDescriptor::of("name", &name);
        assert_eq!(descriptor.key(), "name");
        assert!(!descriptor.is_zero());

        let price = 0.0f64;
        let descriptor = FieldDescriptor::leaf("price", &price);
        assert!(descriptor.is_zero());
        assert!(matches!(descriptor.shape(), FieldShape::Leaf(_)));
    }
}
