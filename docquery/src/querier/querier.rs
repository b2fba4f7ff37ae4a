use super::model::{IdContainer, Model};
use crate::adapter::Adapter;
use crate::collection::{
    Document, FindOneAndReplaceOptions, FindOneAndUpdateOptions, FindOptions, ObjectId,
    UpdateOptions, UpdateResult,
};
use crate::common::{from_document, to_document, Convertible, Value};
use crate::errors::{ErrorKind, QueryError, QueryResult};
use crate::projection::{cast, SparseDocument};
use crate::store::matcher::validate_collection_name;
use crate::store::{DocumentStore, Update};
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed CRUD operations on one collection.
///
/// Every operation comes in two forms. The model form takes partially
/// populated models and projects them: only fields that differ from their
/// zero value take part in the filter or update. The `*_by_filter` form takes
/// a [SparseDocument] as is, which is how a zero value is matched or written.
///
/// `Id` is the identifier type returned by inserts. A plain querier uses the
/// store generated [ObjectId]; a composite querier uses whatever structure
/// the model keeps in its `_id` field.
pub struct Querier<M, Id = ObjectId> {
    inner: Arc<QuerierInner>,
    _marker: PhantomData<fn() -> (M, Id)>,
}

struct QuerierInner {
    adapter: Adapter,
    collection: String,
    composite: bool,
}

impl<M, Id> Clone for Querier<M, Id> {
    fn clone(&self) -> Self {
        Querier {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<M: Model> Querier<M, ObjectId> {
    pub fn new(adapter: &Adapter, collection: &str) -> QueryResult<Self> {
        Self::create(adapter, collection, false)
    }
}

impl<M, Id> Querier<M, Id>
where
    M: Model,
    Id: Convertible<Output = Id>,
{
    pub fn with_composite_id(adapter: &Adapter, collection: &str) -> QueryResult<Self> {
        Self::create(adapter, collection, true)
    }

    fn create(adapter: &Adapter, collection: &str, composite: bool) -> QueryResult<Self> {
        validate_collection_name(collection)?;
        Ok(Querier {
            inner: Arc::new(QuerierInner {
                adapter: adapter.clone(),
                collection: collection.to_string(),
                composite,
            }),
            _marker: PhantomData,
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.inner.collection
    }

    pub fn adapter(&self) -> &Adapter {
        &self.inner.adapter
    }

    pub fn is_composite(&self) -> bool {
        self.inner.composite
    }

    /// Inserts a model and returns its identifier.
    ///
    /// For a composite querier whose store reports an `_id` that does not
    /// decode into `Id`, the identifier is taken from the model's own `_id`
    /// field instead.
    pub fn insert_one(&self, model: &M) -> QueryResult<Id> {
        let document = to_document(model)?;
        let inserted = self.store().insert_one(self.collection_name(), document)?;

        let id = match Id::from_value(&inserted) {
            Ok(id) => id,
            Err(err) if self.is_composite() => {
                log::debug!(
                    "Inserted id {} in '{}' is not the composite id type, reading it from the model",
                    inserted,
                    self.collection_name()
                );
                cast::<M, IdContainer<Id>>(model)
                    .map(|container| container.id)
                    .map_err(|_| invalid_id(err))?
            }
            Err(err) => return Err(invalid_id(err)),
        };

        log::debug!("Inserted document {} into '{}'", inserted, self.collection_name());
        Ok(id)
    }

    /// Inserts models in order and returns their identifiers in the same order.
    pub fn insert_many(&self, models: &[M]) -> QueryResult<Vec<Id>> {
        let documents = models
            .iter()
            .map(|model| to_document(model))
            .collect::<QueryResult<Vec<Document>>>()?;
        let inserted = self.store().insert_many(self.collection_name(), documents)?;

        let ids = inserted
            .iter()
            .map(|id| Id::from_value(id).map_err(invalid_id))
            .collect::<QueryResult<Vec<Id>>>()?;
        log::debug!("Inserted {} documents into '{}'", ids.len(), self.collection_name());
        Ok(ids)
    }

    pub fn find(&self, filter: &M, options: &FindOptions) -> QueryResult<Vec<M>> {
        self.find_by_filter(&self.project(filter)?, options)
    }

    pub fn find_by_filter(&self, filter: &SparseDocument, options: &FindOptions) -> QueryResult<Vec<M>> {
        let documents = self.store().find(self.collection_name(), filter, options)?;
        log::debug!(
            "Found {} documents in '{}' matching {}",
            documents.len(),
            self.collection_name(),
            filter
        );
        documents.iter().map(decode::<M>).collect()
    }

    pub fn find_one(&self, filter: &M) -> QueryResult<Option<M>> {
        self.find_one_by_filter(&self.project(filter)?)
    }

    pub fn find_one_by_filter(&self, filter: &SparseDocument) -> QueryResult<Option<M>> {
        let found = self
            .store()
            .find_one(self.collection_name(), filter, &FindOptions::new())?;
        log::debug!(
            "Found {} document in '{}' matching {}",
            found.as_ref().map_or(0, |_| 1),
            self.collection_name(),
            filter
        );
        found.as_ref().map(decode::<M>).transpose()
    }

    /// Sets the projected fields of `update` on the first model matching
    /// `filter` and returns it as it was before or after the update.
    pub fn update_one(
        &self,
        filter: &M,
        update: &M,
        options: &FindOneAndUpdateOptions,
    ) -> QueryResult<Option<M>> {
        self.update_one_by_filter(&self.project(filter)?, &self.project(update)?, options)
    }

    pub fn update_one_by_filter(
        &self,
        filter: &SparseDocument,
        update: &SparseDocument,
        options: &FindOneAndUpdateOptions,
    ) -> QueryResult<Option<M>> {
        let update = set_update(update)?;
        let found = self
            .store()
            .find_one_and_update(self.collection_name(), filter, &update, options)?;
        log::debug!(
            "Updated {} document in '{}' matching {}",
            found.as_ref().map_or(0, |_| 1),
            self.collection_name(),
            filter
        );
        found.as_ref().map(decode::<M>).transpose()
    }

    pub fn update_many(
        &self,
        filter: &M,
        update: &M,
        options: &UpdateOptions,
    ) -> QueryResult<UpdateResult> {
        self.update_many_by_filter(&self.project(filter)?, &self.project(update)?, options)
    }

    pub fn update_many_by_filter(
        &self,
        filter: &SparseDocument,
        update: &SparseDocument,
        options: &UpdateOptions,
    ) -> QueryResult<UpdateResult> {
        let update = set_update(update)?;
        let result = self
            .store()
            .update_many(self.collection_name(), filter, &update, options)?;
        log::debug!(
            "Matched {} and modified {} documents in '{}'",
            result.matched_count,
            result.modified_count,
            self.collection_name()
        );
        Ok(result)
    }

    /// Replaces the first model matching `filter` with the projected
    /// `replacement`. The stored `_id` is kept.
    pub fn replace_one(
        &self,
        filter: &M,
        replacement: &M,
        options: &FindOneAndReplaceOptions,
    ) -> QueryResult<Option<M>> {
        self.replace_one_by_filter(&self.project(filter)?, &self.project(replacement)?, options)
    }

    pub fn replace_one_by_filter(
        &self,
        filter: &SparseDocument,
        replacement: &SparseDocument,
        options: &FindOneAndReplaceOptions,
    ) -> QueryResult<Option<M>> {
        let replacement = replacement.to_document()?;
        let found = self.store().find_one_and_replace(
            self.collection_name(),
            filter,
            replacement,
            options,
        )?;
        log::debug!(
            "Replaced {} document in '{}' matching {}",
            found.as_ref().map_or(0, |_| 1),
            self.collection_name(),
            filter
        );
        found.as_ref().map(decode::<M>).transpose()
    }

    /// Deletes the first model matching `filter` and returns it.
    pub fn delete_one(&self, filter: &M) -> QueryResult<Option<M>> {
        self.delete_one_by_filter(&self.project(filter)?)
    }

    pub fn delete_one_by_filter(&self, filter: &SparseDocument) -> QueryResult<Option<M>> {
        let deleted = self.store().find_one_and_delete(
            self.collection_name(),
            filter,
            &FindOptions::new(),
        )?;
        log::debug!(
            "Deleted {} document from '{}' matching {}",
            deleted.as_ref().map_or(0, |_| 1),
            self.collection_name(),
            filter
        );
        deleted.as_ref().map(decode::<M>).transpose()
    }

    pub fn delete_many(&self, filter: &M) -> QueryResult<u64> {
        self.delete_many_by_filter(&self.project(filter)?)
    }

    pub fn delete_many_by_filter(&self, filter: &SparseDocument) -> QueryResult<u64> {
        let deleted = self.store().delete_many(self.collection_name(), filter)?;
        log::debug!(
            "Deleted {} documents from '{}' matching {}",
            deleted,
            self.collection_name(),
            filter
        );
        Ok(deleted)
    }

    pub fn count_documents(&self, filter: &M) -> QueryResult<u64> {
        self.count_documents_by_filter(&self.project(filter)?)
    }

    pub fn count_documents_by_filter(&self, filter: &SparseDocument) -> QueryResult<u64> {
        let count = self.store().count_documents(self.collection_name(), filter)?;
        log::debug!(
            "Counted {} documents in '{}' matching {}",
            count,
            self.collection_name(),
            filter
        );
        Ok(count)
    }

    /// Distinct values of `field` among the matches, in first-seen order.
    pub fn distinct(&self, field: &str, filter: &M) -> QueryResult<Vec<Value>> {
        self.distinct_by_filter(field, &self.project(filter)?)
    }

    pub fn distinct_by_filter(&self, field: &str, filter: &SparseDocument) -> QueryResult<Vec<Value>> {
        let values = self.store().distinct(self.collection_name(), field, filter)?;
        log::debug!(
            "Found {} distinct values of '{}' in '{}'",
            values.len(),
            field,
            self.collection_name()
        );
        Ok(values)
    }

    /// Drops the bound collection. `name` must repeat the collection name.
    pub fn delete_collection(&self, name: &str) -> QueryResult<()> {
        if name != self.collection_name() {
            log::error!(
                "Cannot delete collection '{}' from a querier bound to '{}'",
                name,
                self.collection_name()
            );
            return Err(QueryError::new(
                &format!(
                    "Cannot delete collection '{}' from a querier bound to '{}'",
                    name,
                    self.collection_name()
                ),
                ErrorKind::CollectionNameMismatch,
            ));
        }

        self.store().drop_collection(name)?;
        log::debug!("Dropped collection '{}'", name);
        Ok(())
    }

    fn project(&self, model: &M) -> QueryResult<SparseDocument> {
        self.inner.adapter.projector().project(model)
    }

    fn store(&self) -> DocumentStore {
        self.inner.adapter.store()
    }
}

fn set_update(fields: &SparseDocument) -> QueryResult<Update> {
    if fields.is_empty() {
        log::error!("Update document must not be empty");
        return Err(QueryError::new(
            "Update document must not be empty",
            ErrorKind::InvalidOperation,
        ));
    }
    Ok(Update::Set(fields.clone()))
}

fn decode<M: Model>(document: &Document) -> QueryResult<M> {
    from_document::<M>(document)
}

fn invalid_id(cause: QueryError) -> QueryError {
    log::error!("Failed to cast inserted id: {}", cause);
    QueryError::new_with_cause("Failed to cast inserted id", ErrorKind::InvalidId, cause)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter_config::AdapterConfig;
    use crate::common::SortOrder;
    use crate::projection::{FieldDescriptor, FieldKind, FieldShape, Record};
    use crate::{doc, sparse};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Item {
        id: Option<ObjectId>,
        name: String,
        quantity: i32,
    }

    impl Convertible for Item {
        type Output = Item;

        fn to_value(&self) -> QueryResult<Value> {
            let mut doc = doc! {
                name: (self.name.clone()),
                quantity: (self.quantity),
            };
            if let Some(id) = self.id {
                doc.put("_id", id)?;
            }
            Ok(Value::Document(doc))
        }

        fn from_value(value: &Value) -> QueryResult<Self::Output> {
            let doc = Document::from_value(value)?;
            Ok(Item {
                id: Option::<ObjectId>::from_value(&doc.get("_id")?)?,
                name: Option::<String>::from_value(&doc.get("name")?)?.unwrap_or_default(),
                quantity: Option::<i32>::from_value(&doc.get("quantity")?)?.unwrap_or_default(),
            })
        }
    }

    impl Record for Item {
        fn field_descriptors(&self) -> Vec<FieldDescriptor<'_>> {
            vec![
                FieldDescriptor::of("_id", &self.id),
                FieldDescriptor::of("name", &self.name),
                FieldDescriptor::of("quantity", &self.quantity),
            ]
        }
    }

    impl Model for Item {
        fn model_name() -> &'static str {
            "items"
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Key {
        shop: String,
        seq: i64,
    }

    impl Convertible for Key {
        type Output = Key;

        fn to_value(&self) -> QueryResult<Value> {
            Ok(Value::Document(doc! { shop: (self.shop.clone()), seq: (self.seq) }))
        }

        fn from_value(value: &Value) -> QueryResult<Self::Output> {
            let doc = Document::from_value(value)?;
            Ok(Key {
                shop: Option::<String>::from_value(&doc.get("shop")?)?.unwrap_or_default(),
                seq: Option::<i64>::from_value(&doc.get("seq")?)?.unwrap_or_default(),
            })
        }
    }

    impl FieldKind for Key {
        fn is_zero(&self) -> bool {
            self.shop.is_zero() && self.seq.is_zero()
        }

        fn shape(&self) -> FieldShape<'_> {
            FieldShape::Leaf(self)
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Order {
        key: Key,
        total: i64,
    }

    impl Convertible for Order {
        type Output = Order;

        fn to_value(&self) -> QueryResult<Value> {
            Ok(Value::Document(doc! { "_id": (self.key.to_value()?), total: (self.total) }))
        }

        fn from_value(value: &Value) -> QueryResult<Self::Output> {
            let doc = Document::from_value(value)?;
            Ok(Order {
                key: Key::from_value(&doc.get("_id")?)?,
                total: Option::<i64>::from_value(&doc.get("total")?)?.unwrap_or_default(),
            })
        }
    }

    impl Record for Order {
        fn field_descriptors(&self) -> Vec<FieldDescriptor<'_>> {
            vec![
                FieldDescriptor::of("_id", &self.key),
                FieldDescriptor::of("total", &self.total),
            ]
        }
    }

    impl Model for Order {
        fn model_name() -> &'static str {
            "orders"
        }
    }

    fn item(name: &str, quantity: i32) -> Item {
        Item {
            id: None,
            name: name.to_string(),
            quantity,
        }
    }

    fn querier() -> Querier<Item> {
        let adapter = Adapter::connect(AdapterConfig::new()).unwrap();
        adapter.querier::<Item>().unwrap()
    }

    #[test]
    fn test_insert_and_find() {
        let querier = querier();
        let id = querier.insert_one(&item("Widget", 5)).unwrap();
        querier.insert_one(&item("Gadget", 2)).unwrap();

        let found = querier
            .find(&item("Widget", 0), &FindOptions::new())
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, Some(id));
        assert_eq!(found[0].quantity, 5);
    }

    #[test]
    fn test_empty_filter_model_matches_all() {
        let querier = querier();
        querier
            .insert_many(&[item("a", 1), item("b", 2), item("c", 3)])
            .unwrap();
        assert_eq!(querier.count_documents(&Item::default()).unwrap(), 3);

        let options = FindOptions::new().sort_by("quantity", SortOrder::Descending);
        let found = querier.find(&Item::default(), &options).unwrap();
        let names: Vec<&str> = found.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_update_one_sets_projected_fields_only() {
        let querier = querier();
        querier.insert_one(&item("Widget", 5)).unwrap();

        let before = querier
            .update_one(
                &item("Widget", 0),
                &item("", 9),
                &FindOneAndUpdateOptions::new(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(before.quantity, 5);

        let after = querier.find_one(&item("Widget", 0)).unwrap().unwrap();
        assert_eq!(after.quantity, 9);
        assert_eq!(after.name, "Widget");
    }

    #[test]
    fn test_empty_update_is_rejected() {
        let querier = querier();
        querier.insert_one(&item("Widget", 5)).unwrap();
        let err = querier
            .update_one(&item("Widget", 0), &Item::default(), &FindOneAndUpdateOptions::new())
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);

        let err = querier
            .update_many(&Item::default(), &Item::default(), &UpdateOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_zero_value_needs_filter_form() {
        let querier = querier();
        querier.insert_one(&item("Widget", 5)).unwrap();

        // quantity 0 is not projected, so the model form cannot write it
        let result = querier
            .update_many_by_filter(
                &sparse! { "name" => "Widget" },
                &sparse! { "quantity" => 0 },
                &UpdateOptions::default(),
            )
            .unwrap();
        assert_eq!(result.modified_count, 1);
        assert_eq!(
            querier
                .count_documents_by_filter(&sparse! { "quantity" => 0 })
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_replace_keeps_id() {
        let querier = querier();
        let id = querier.insert_one(&item("Widget", 5)).unwrap();
        let options = FindOneAndReplaceOptions::new()
            .return_document(crate::collection::ReturnDocument::After);
        let replaced = querier
            .replace_one(&item("Widget", 0), &item("Gizmo", 1), &options)
            .unwrap()
            .unwrap();
        assert_eq!(replaced.id, Some(id));
        assert_eq!(replaced.name, "Gizmo");
    }

    #[test]
    fn test_delete() {
        let querier = querier();
        querier
            .insert_many(&[item("a", 1), item("a", 2), item("b", 3)])
            .unwrap();
        let deleted = querier.delete_one(&item("b", 0)).unwrap().unwrap();
        assert_eq!(deleted.quantity, 3);
        assert_eq!(querier.delete_many(&item("a", 0)).unwrap(), 2);
        assert_eq!(querier.count_documents(&Item::default()).unwrap(), 0);
        assert!(querier.delete_one(&item("a", 0)).unwrap().is_none());
    }

    #[test]
    fn test_distinct() {
        let querier = querier();
        querier
            .insert_many(&[item("a", 1), item("b", 1), item("a", 2)])
            .unwrap();
        let names = querier.distinct("name", &Item::default()).unwrap();
        assert_eq!(names, vec![Value::from("a"), Value::from("b")]);
        let names = querier.distinct("name", &item("", 1)).unwrap();
        assert_eq!(names, vec![Value::from("a"), Value::from("b")]);
    }

    #[test]
    fn test_delete_collection_name_check() {
        let querier = querier();
        querier.insert_one(&item("a", 1)).unwrap();
        let err = querier.delete_collection("other").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::CollectionNameMismatch);
        assert_eq!(querier.count_documents(&Item::default()).unwrap(), 1);

        querier.delete_collection("items").unwrap();
        assert_eq!(querier.count_documents(&Item::default()).unwrap(), 0);
    }

    #[test]
    fn test_plain_querier_rejects_non_object_id() {
        let adapter = Adapter::connect(AdapterConfig::new()).unwrap();
        let orders: Querier<Order> = Querier::new(&adapter, "orders").unwrap();
        let order = Order {
            key: Key {
                shop: "rome".to_string(),
                seq: 1,
            },
            total: 10,
        };
        let err = orders.insert_one(&order).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidId);
        assert_eq!(err.cause().unwrap().kind(), &ErrorKind::InvalidId);
    }

    #[test]
    fn test_composite_querier_returns_model_id() {
        let adapter = Adapter::connect(AdapterConfig::new()).unwrap();
        let orders = adapter.querier_with_composite_id::<Order, Key>().unwrap();
        assert!(orders.is_composite());
        let key = Key {
            shop: "rome".to_string(),
            seq: 1,
        };
        let order = Order {
            key: key.clone(),
            total: 10,
        };
        assert_eq!(orders.insert_one(&order).unwrap(), key);

        let found = orders
            .find_one(&Order {
                key: key.clone(),
                total: 0,
            })
            .unwrap()
            .unwrap();
        assert_eq!(found.total, 10);
    }

    #[test]
    fn test_querier_is_bound_to_collection() {
        let querier = querier();
        assert_eq!(querier.collection_name(), "items");
        assert!(!querier.is_composite());
        let clone = querier.clone();
        querier.insert_one(&item("a", 1)).unwrap();
        assert_eq!(clone.count_documents(&Item::default()).unwrap(), 1);
    }
}
