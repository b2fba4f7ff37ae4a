use crate::common::{Value, DEFAULT_MAX_DEPTH};
use crate::errors::{ErrorKind, QueryError, QueryResult};
use crate::projection::record::{Encode, FieldDescriptor, FieldShape, Record};
use crate::projection::sparse::{join_path, SparseDocument};

/// Projects a model into a [SparseDocument] with the default maximum depth.
///
/// Only fields that the model's own encoding emits and whose value differs from
/// the zero value of their type are kept. Nested records are flattened into
/// dotted paths.
///
/// A field deliberately set to its zero value cannot be told apart from an
/// unset one and is left out. Use an `Option<T>` field (`Some(0)` is not zero)
/// or build the [SparseDocument] by hand when a zero value must be matched
/// or written.
pub fn project<R: Record + ?Sized>(model: &R) -> QueryResult<SparseDocument> {
    Projector::new().project(model)
}

/// Turns typed models into sparse filter and update documents.
///
/// The projector is stateless apart from its depth bound and can be shared
/// freely between threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projector {
    max_depth: usize,
}

impl Default for Projector {
    fn default() -> Self {
        Projector::new()
    }
}

impl Projector {
    pub fn new() -> Self {
        Projector {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limits how many levels of nested records are flattened. A model nested
    /// deeper fails with [ErrorKind::RecursionError].
    pub fn with_max_depth(max_depth: usize) -> Self {
        Projector { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn project<R: Record + ?Sized>(&self, model: &R) -> QueryResult<SparseDocument> {
        let mut result = SparseDocument::new();
        self.project_record(model.field_descriptors(), encode(model)?, "", 0, &mut result)?;
        Ok(result)
    }

    fn project_record(
        &self,
        fields: Vec<FieldDescriptor<'_>>,
        intermediate: Value,
        prefix: &str,
        depth: usize,
        result: &mut SparseDocument,
    ) -> QueryResult<()> {
        if depth > self.max_depth {
            return Err(QueryError::new(
                &format!(
                    "Projection of '{}' exceeds the maximum nesting depth of {}",
                    prefix, self.max_depth
                ),
                ErrorKind::RecursionError,
            ));
        }

        let present = match intermediate {
            Value::Document(doc) => doc,
            other => {
                return Err(QueryError::new(
                    &format!("Model encodes to {} instead of a document", other.type_name()),
                    ErrorKind::EncodingError,
                ))
            }
        };

        for field in fields {
            // the model's own encoding decides which keys exist at all
            if !present.contains_key(field.key()) || field.is_zero() {
                continue;
            }

            let key = join_path(prefix, field.key());
            match field.shape() {
                FieldShape::Leaf(value) => {
                    result.insert(key, encode(*value)?);
                }
                FieldShape::Record(nested) => {
                    let nested_fields = nested.field_descriptors();
                    self.project_record(nested_fields, encode(*nested)?, &key, depth + 1, result)?;
                }
            }
        }
        Ok(())
    }
}

fn encode<E: Encode + ?Sized>(value: &E) -> QueryResult<Value> {
    value.encode().map_err(|err| match err.kind() {
        ErrorKind::EncodingError => err,
        _ => QueryError::new_with_cause("Failed to encode model", ErrorKind::EncodingError, err),
    })
}
