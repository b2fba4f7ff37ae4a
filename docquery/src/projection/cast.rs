use crate::common::{Convertible, Value};
use crate::errors::{ErrorKind, QueryError, QueryResult};

/// Converts `source` into a new `D` through the intermediate [Value] form.
///
/// Fields of `source` that `D` does not declare are dropped. Fields of `D` that
/// `source` does not carry take their default value. A key present on both
/// sides with incompatible types fails with [ErrorKind::ObjectMappingError].
///
/// This is how a store generated `_id` is coerced into a declared identifier
/// type, and how a composite identifier is extracted from a full model.
pub fn cast<S, D>(source: &S) -> QueryResult<D::Output>
where
    S: Convertible + ?Sized,
    D: Convertible,
{
    let value = encode_source(source)?;
    D::from_value(&value)
}

/// Overwrites `destination` with the fields carried by `source`.
///
/// Unlike [cast], fields that `source` does not carry keep their current value
/// in `destination`. Nested documents merge field by field; any other value
/// is replaced.
pub fn cast_into<S, D>(source: &S, destination: &mut D) -> QueryResult<()>
where
    S: Convertible + ?Sized,
    D: Convertible<Output = D>,
{
    let incoming = encode_source(source)?;
    let merged = match (destination.to_value()?, incoming) {
        (Value::Document(mut current), Value::Document(update)) => {
            current.merge(&update)?;
            Value::Document(current)
        }
        (_, incoming) => incoming,
    };
    *destination = D::from_value(&merged)?;
    Ok(())
}

fn encode_source<S: Convertible + ?Sized>(source: &S) -> QueryResult<Value> {
    source.to_value().map_err(|err| match err.kind() {
        ErrorKind::EncodingError => err,
        _ => QueryError::new_with_cause("Failed to encode cast source", ErrorKind::EncodingError, err),
    })
}
