use crate::collection::Document;
use crate::common::{Convertible, Value, DOC_ID};
use crate::errors::QueryResult;
use crate::projection::Record;

/// A typed document stored in a collection.
///
/// Implemented by `#[derive(Model)]` together with the [Record] descriptor.
/// The [Convertible] half normally comes from `#[derive(Convertible)]`.
pub trait Model: Record + Convertible<Output = Self> {
    /// Name of the collection the model is stored in: the
    /// `#[model(name = "...")]` annotation, else the type name.
    fn model_name() -> &'static str;
}

/// Holds just the `_id` field of a model.
///
/// Casting a model into `IdContainer<Id>` extracts its identifier, whatever
/// else the model carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdContainer<Id> {
    pub id: Id,
}

impl<Id: Convertible<Output = Id>> Convertible for IdContainer<Id> {
    type Output = IdContainer<Id>;

    fn to_value(&self) -> QueryResult<Value> {
        let mut doc = Document::new();
        doc.put(DOC_ID, self.id.to_value()?)?;
        Ok(Value::Document(doc))
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        let doc = Document::from_value(value)?;
        Ok(IdContainer {
            id: Id::from_value(&doc.id())?,
        })
    }
}
