use docquery::collection::ObjectId;
use docquery::common::Value;
use docquery::errors::ErrorKind;
use docquery::projection::{project, Projector};
use docquery::{doc, sparse};
use docquery_int_test::models::{
    generate_address, generate_product, Address, Product, Site, Status, Warehouse,
};

#[test]
fn test_zero_fields_are_left_out() {
    let product = Product {
        name: "Widget".to_string(),
        price: 0.0,
        quantity: 5,
        ..Default::default()
    };

    let projected = project(&product).unwrap();
    assert_eq!(projected, sparse! { "name" => "Widget", "qty" => 5 });
    assert!(!projected.contains_key("price"));
}

#[test]
fn test_default_model_projects_to_nothing() {
    assert!(project(&Product::default()).unwrap().is_empty());
    assert!(project(&Address::default()).unwrap().is_empty());
}

#[test]
fn test_nested_record_is_flattened() {
    let product = Product {
        address: Address {
            city: "Rome".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    let projected = project(&product).unwrap();
    assert_eq!(projected.len(), 1);
    assert_eq!(projected.get("address.city"), Some(&Value::from("Rome")));
}

#[test]
fn test_omit_empty_key_inside_nested_record() {
    let mut address = generate_address();
    address.zip_code = String::new();
    let product = Product {
        address: address.clone(),
        ..Default::default()
    };
    let projected = project(&product).unwrap();
    assert!(!projected.contains_key("address.zip"));

    address.zip_code = "00184".to_string();
    let product = Product {
        address,
        ..Default::default()
    };
    let projected = project(&product).unwrap();
    assert_eq!(projected.get("address.zip"), Some(&Value::from("00184")));
}

#[test]
fn test_skipped_and_ignored_fields_are_never_projected() {
    let product = Product {
        name: "Widget".to_string(),
        note: "internal".to_string(),
        cache: vec![1, 2, 3],
        ..Default::default()
    };

    let projected = project(&product).unwrap();
    assert_eq!(projected.keys().collect::<Vec<_>>(), vec!["name"]);
}

#[test]
fn test_enum_leaf_is_stored_whole() {
    let active = Product {
        status: Status::Active,
        ..Default::default()
    };
    assert_eq!(
        project(&active).unwrap(),
        sparse! { "status" => "Active" }
    );

    let discontinued = Product {
        status: Status::Discontinued {
            reason: "recall".to_string(),
        },
        ..Default::default()
    };
    let projected = project(&discontinued).unwrap();
    assert_eq!(
        projected.get("status"),
        Some(&Value::Document(doc! {
            variant: "Discontinued",
            value: { reason: "recall" },
        }))
    );

    // the default variant is the zero value
    let draft = Product {
        status: Status::Draft,
        ..Default::default()
    };
    assert!(project(&draft).unwrap().is_empty());
}

#[test]
fn test_option_distinguishes_zero_from_unset() {
    let product = Product {
        discount: Some(0.0),
        ..Default::default()
    };
    let projected = project(&product).unwrap();
    assert_eq!(projected.get("discount"), Some(&Value::F64(0.0)));
}

#[test]
fn test_id_is_projected_when_set() {
    let id = ObjectId::new();
    let product = Product {
        id: Some(id),
        ..Default::default()
    };
    assert_eq!(project(&product).unwrap(), sparse! { "_id" => id });
}

#[test]
fn test_arrays_are_leaves() {
    let product = Product {
        tags: vec!["red".to_string(), "sale".to_string()],
        ..Default::default()
    };
    let projected = project(&product).unwrap();
    assert_eq!(
        projected.get("tags"),
        Some(&Value::Array(vec![Value::from("red"), Value::from("sale")]))
    );
}

#[test]
fn test_full_product_projection() {
    let product = generate_product();
    let projected = project(&product).unwrap();

    assert_eq!(projected.get("name"), Some(&Value::from(product.name.as_str())));
    assert_eq!(projected.get("qty"), Some(&Value::from(product.quantity)));
    assert_eq!(
        projected.get("address.street"),
        Some(&Value::from(product.address.street.as_str()))
    );
    assert!(!projected.contains_key("address"));
    assert!(!projected.contains_key("_id"));
}

#[test]
fn test_deep_nesting_respects_max_depth() {
    let warehouse = Warehouse {
        name: "North".to_string(),
        site: Site {
            label: "A".to_string(),
            address: Address {
                city: "Oslo".to_string(),
                ..Default::default()
            },
        },
    };

    let projected = project(&warehouse).unwrap();
    assert_eq!(
        projected,
        sparse! { "name" => "North", "site.label" => "A", "site.address.city" => "Oslo" }
    );

    let shallow = Projector::with_max_depth(1);
    let err = shallow.project(&warehouse).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::RecursionError);

    // zero nested records are never entered
    let warehouse = Warehouse {
        name: "North".to_string(),
        ..Default::default()
    };
    assert_eq!(shallow.project(&warehouse).unwrap(), sparse! { "name" => "North" });
}

#[test]
fn test_projection_to_update_document() {
    let product = Product {
        price: 9.5,
        address: Address {
            city: "Rome".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    let document = project(&product).unwrap().to_document().unwrap();
    assert_eq!(document, doc! { price: 9.5, address: { city: "Rome" } });
}
