use docquery::collection::{Document, ObjectId};
use docquery::common::Value;
use docquery::doc;
use docquery::errors::ErrorKind;
use docquery::projection::{cast, cast_into};
use docquery::querier::IdContainer;
use docquery_int_test::models::{
    generate_order, generate_product, Order, OrderKey, Product, ProductSummary, Status,
};

#[test]
fn test_cast_to_narrower_type() {
    let product = generate_product();
    let summary = cast::<Product, ProductSummary>(&product).unwrap();
    assert_eq!(
        summary,
        ProductSummary {
            name: product.name.clone(),
            quantity: product.quantity,
        }
    );
}

#[test]
fn test_cast_to_wider_type_defaults_missing_fields() {
    let summary = ProductSummary {
        name: "Widget".to_string(),
        quantity: 3,
    };
    let product = cast::<ProductSummary, Product>(&summary).unwrap();
    assert_eq!(product.name, "Widget");
    assert_eq!(product.quantity, 3);
    assert_eq!(product.price, 0.0);
    assert_eq!(product.status, Status::Draft);
    assert!(product.id.is_none());
}

#[test]
fn test_cast_into_keeps_unset_fields() {
    let mut product = generate_product();
    let address = product.address.clone();
    let summary = ProductSummary {
        name: "Renamed".to_string(),
        quantity: 1,
    };

    cast_into(&summary, &mut product).unwrap();
    assert_eq!(product.name, "Renamed");
    assert_eq!(product.quantity, 1);
    assert_eq!(product.address, address);
    assert_eq!(product.status, Status::Active);
}

#[test]
fn test_cast_extracts_identifiers() {
    let id = ObjectId::new();
    let product = Product {
        id: Some(id),
        ..generate_product()
    };
    let container = cast::<Product, IdContainer<ObjectId>>(&product).unwrap();
    assert_eq!(container.id, id);

    let order = generate_order("rome", 7);
    let container = cast::<Order, IdContainer<OrderKey>>(&order).unwrap();
    assert_eq!(
        container.id,
        OrderKey {
            shop: "rome".to_string(),
            seq: 7,
        }
    );
}

#[test]
fn test_cast_store_id_into_declared_type() {
    let id = ObjectId::new();
    let from_hex = cast::<Value, ObjectId>(&Value::String(id.to_hex())).unwrap();
    assert_eq!(from_hex, id);

    let err = cast::<Value, ObjectId>(&Value::from(42)).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidId);
}

#[test]
fn test_cast_incompatible_field_fails() {
    let document = doc! { name: 5, qty: 3 };
    let err = cast::<Document, ProductSummary>(&document).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::ObjectMappingError);
}

#[test]
fn test_cast_enum_variants_round_trip() {
    let product = Product {
        status: Status::Replaced("gizmo".to_string(), 2),
        ..Default::default()
    };
    let document = cast::<Product, Document>(&product).unwrap();
    assert_eq!(
        document.get("status").unwrap(),
        Value::Document(doc! { variant: "Replaced", value: ["gizmo", 2] })
    );

    let back = cast::<Document, Product>(&document).unwrap();
    assert_eq!(back.status, Status::Replaced("gizmo".to_string(), 2));
}
