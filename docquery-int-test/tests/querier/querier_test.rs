use docquery::collection::{
    FindOneAndReplaceOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument, UpdateOptions,
};
use docquery::common::{SortOrder, Value};
use docquery::errors::ErrorKind;
use docquery::querier::Querier;
use docquery::sparse;
use docquery_int_test::models::{generate_product, Address, Product, Status};
use docquery_int_test::test_util::{cleanup, create_test_context, run_test};

fn product(name: &str, quantity: i32, city: &str) -> Product {
    Product {
        name: name.to_string(),
        quantity,
        address: Address {
            city: city.to_string(),
            ..Default::default()
        },
        status: Status::Active,
        ..Default::default()
    }
}

fn by_name(name: &str) -> Product {
    Product {
        name: name.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_querier_is_named_after_model() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.adapter().querier::<Product>()?;
            assert_eq!(products.collection_name(), "products");
            assert!(!products.is_composite());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_and_find_by_example() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.adapter().querier::<Product>()?;
            let id = products.insert_one(&product("Widget", 5, "Rome"))?;
            products.insert_one(&product("Gizmo", 2, "Oslo"))?;

            let found = products.find(&by_name("Widget"), &FindOptions::new())?;
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].id, Some(id));
            assert_eq!(found[0].quantity, 5);
            assert_eq!(found[0].address.city, "Rome");

            // nested example fields filter on their dotted path
            let in_oslo = Product {
                address: Address {
                    city: "Oslo".to_string(),
                    ..Default::default()
                },
                ..Default::default()
            };
            let found = products.find_one(&in_oslo)?;
            assert_eq!(found.map(|p| p.name), Some("Gizmo".to_string()));

            assert!(products.find_one(&by_name("Missing"))?.is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_sort_skip_and_limit() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.adapter().querier::<Product>()?;
            for quantity in 1..=5 {
                products.insert_one(&product(&format!("p{}", quantity), quantity, "Rome"))?;
            }

            let options = FindOptions::new()
                .sort_by("qty", SortOrder::Descending)
                .skip(1)
                .limit(2);
            let found = products.find(&Product::default(), &options)?;
            let quantities: Vec<i32> = found.iter().map(|p| p.quantity).collect();
            assert_eq!(quantities, vec![4, 3]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_many_returns_ids_in_order() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.adapter().querier::<Product>()?;
            let batch: Vec<Product> = (0..10).map(|_| generate_product()).collect();
            let ids = products.insert_many(&batch)?;
            assert_eq!(ids.len(), 10);

            for (id, expected) in ids.iter().zip(batch.iter()) {
                let filter = Product {
                    id: Some(*id),
                    ..Default::default()
                };
                let found = products.find_one(&filter)?;
                assert_eq!(found.map(|p| p.name), Some(expected.name.clone()));
            }
            assert_eq!(products.count_documents(&Product::default())?, 10);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_one_returns_requested_image() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.adapter().querier::<Product>()?;
            products.insert_one(&product("Widget", 5, "Rome"))?;

            let update = Product {
                price: 19.5,
                ..Default::default()
            };
            let before = products
                .update_one(&by_name("Widget"), &update, &FindOneAndUpdateOptions::new())?
                .unwrap();
            assert_eq!(before.price, 0.0);

            let update = Product {
                quantity: 7,
                ..Default::default()
            };
            let options = FindOneAndUpdateOptions::new().return_document(ReturnDocument::After);
            let after = products
                .update_one(&by_name("Widget"), &update, &options)?
                .unwrap();
            assert_eq!(after.price, 19.5);
            assert_eq!(after.quantity, 7);
            assert_eq!(after.address.city, "Rome");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_one_upsert() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.adapter().querier::<Product>()?;
            let update = Product {
                quantity: 3,
                ..Default::default()
            };

            let options = FindOneAndUpdateOptions::new()
                .upsert(true)
                .return_document(ReturnDocument::After);
            let inserted = products
                .update_one(&by_name("Widget"), &update, &options)?
                .unwrap();
            assert_eq!(inserted.name, "Widget");
            assert_eq!(inserted.quantity, 3);
            assert!(inserted.id.is_some());

            let missing = products.update_one(
                &by_name("Gizmo"),
                &update,
                &FindOneAndUpdateOptions::new(),
            )?;
            assert!(missing.is_none());
            assert_eq!(products.count_documents(&Product::default())?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_cannot_set_zero_value_by_example() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.adapter().querier::<Product>()?;
            products.insert_one(&product("Widget", 5, "Rome"))?;

            let err = products
                .update_one(&by_name("Widget"), &Product::default(), &FindOneAndUpdateOptions::new())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);

            // the filter form writes the zero value explicitly
            let updated = products
                .update_one_by_filter(
                    &sparse! { "name" => "Widget" },
                    &sparse! { "qty" => 0 },
                    &FindOneAndUpdateOptions::new().return_document(ReturnDocument::After),
                )?
                .unwrap();
            assert_eq!(updated.quantity, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_cannot_change_id() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.adapter().querier::<Product>()?;
            let id = products.insert_one(&product("Widget", 5, "Rome"))?;

            let update = Product {
                id: Some(docquery::collection::ObjectId::new()),
                quantity: 9,
                ..Default::default()
            };
            let err = products
                .update_one(&by_name("Widget"), &update, &FindOneAndUpdateOptions::new())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);

            // the rejected update left the document untouched
            let found = products.find_one(&by_name("Widget"))?.unwrap();
            assert_eq!(found.id, Some(id));
            assert_eq!(found.quantity, 5);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_many() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.adapter().querier::<Product>()?;
            products.insert_one(&product("Widget", 5, "Rome"))?;
            products.insert_one(&product("Gizmo", 2, "Rome"))?;
            products.insert_one(&product("Doohickey", 1, "Oslo"))?;

            let in_rome = Product {
                address: Address {
                    city: "Rome".to_string(),
                    ..Default::default()
                },
                ..Default::default()
            };
            let update = Product {
                discount: Some(0.0),
                ..Default::default()
            };

            let result = products.update_many(&in_rome, &update, &UpdateOptions::default())?;
            assert_eq!(result.matched_count, 2);
            assert_eq!(result.modified_count, 2);
            assert!(result.upserted_id.is_none());

            // a second identical update matches but changes nothing
            let result = products.update_many(&in_rome, &update, &UpdateOptions::default())?;
            assert_eq!(result.matched_count, 2);
            assert_eq!(result.modified_count, 0);

            let discounted = products.count_documents_by_filter(&sparse! { "discount" => 0.0 })?;
            assert_eq!(discounted, 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_many_upsert() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.adapter().querier::<Product>()?;
            let update = Product {
                quantity: 4,
                ..Default::default()
            };
            let result = products.update_many(&by_name("Widget"), &update, &UpdateOptions::new(true))?;
            assert_eq!(result.matched_count, 0);
            assert!(result.upserted_id.is_some());

            let found = products.find_one(&by_name("Widget"))?.unwrap();
            assert_eq!(found.quantity, 4);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_replace_one_keeps_id_and_drops_other_fields() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.adapter().querier::<Product>()?;
            let id = products.insert_one(&product("Widget", 5, "Rome"))?;

            let replacement = Product {
                name: "Gizmo".to_string(),
                price: 2.5,
                ..Default::default()
            };
            let options = FindOneAndReplaceOptions::new().return_document(ReturnDocument::After);
            let replaced = products
                .replace_one(&by_name("Widget"), &replacement, &options)?
                .unwrap();

            assert_eq!(replaced.id, Some(id));
            assert_eq!(replaced.name, "Gizmo");
            assert_eq!(replaced.price, 2.5);
            assert_eq!(replaced.quantity, 0);
            assert_eq!(replaced.address, Address::default());
            assert_eq!(replaced.status, Status::Draft);

            assert!(products.find_one(&by_name("Widget"))?.is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_replace_one_upsert() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.adapter().querier::<Product>()?;
            let options = FindOneAndReplaceOptions::new().upsert(true);

            let returned = products.replace_one(&by_name("Widget"), &by_name("Gizmo"), &options)?;
            assert!(returned.is_none());
            assert_eq!(products.count_documents(&by_name("Gizmo"))?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_one_and_many() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.adapter().querier::<Product>()?;
            products.insert_one(&product("Widget", 5, "Rome"))?;
            products.insert_one(&product("Gizmo", 2, "Rome"))?;
            products.insert_one(&product("Doohickey", 1, "Oslo"))?;

            let deleted = products.delete_one(&by_name("Widget"))?.unwrap();
            assert_eq!(deleted.quantity, 5);
            assert!(products.delete_one(&by_name("Widget"))?.is_none());

            let in_rome = Product {
                address: Address {
                    city: "Rome".to_string(),
                    ..Default::default()
                },
                ..Default::default()
            };
            assert_eq!(products.delete_many(&in_rome)?, 1);
            assert_eq!(products.count_documents(&Product::default())?, 1);

            assert_eq!(products.delete_many(&Product::default())?, 1);
            assert_eq!(products.count_documents(&Product::default())?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_distinct_values() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.adapter().querier::<Product>()?;
            let mut widget = product("Widget", 5, "Rome");
            widget.tags = vec!["red".to_string(), "sale".to_string()];
            let mut gizmo = product("Gizmo", 2, "Oslo");
            gizmo.tags = vec!["sale".to_string(), "new".to_string()];
            let doohickey = product("Doohickey", 1, "Rome");
            products.insert_many(&[widget, gizmo, doohickey])?;

            let cities = products.distinct("address.city", &Product::default())?;
            assert_eq!(cities, vec![Value::from("Rome"), Value::from("Oslo")]);

            let tags = products.distinct("tags", &Product::default())?;
            assert_eq!(
                tags,
                vec![Value::from("red"), Value::from("sale"), Value::from("new")]
            );

            let in_oslo = products.distinct_by_filter("name", &sparse! { "address.city" => "Oslo" })?;
            assert_eq!(in_oslo, vec![Value::from("Gizmo")]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let adapter = ctx.adapter();
            let products = adapter.querier::<Product>()?;
            products.insert_one(&generate_product())?;

            let err = products.delete_collection("orders").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::CollectionNameMismatch);
            assert_eq!(products.count_documents(&Product::default())?, 1);

            products.delete_collection("products")?;
            assert_eq!(products.count_documents(&Product::default())?, 0);
            assert!(!adapter.store().collection_names()?.contains(&"products".to_string()));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_queriers_share_the_adapter_store() {
    run_test(
        create_test_context,
        |ctx| {
            let adapter = ctx.adapter();
            let typed = adapter.querier::<Product>()?;
            let renamed: Querier<Product> = Querier::new(&adapter, "archived_products")?;

            typed.insert_one(&product("Widget", 5, "Rome"))?;
            renamed.insert_one(&product("Gizmo", 2, "Oslo"))?;

            assert_eq!(typed.count_documents(&Product::default())?, 1);
            assert_eq!(renamed.count_documents(&Product::default())?, 1);

            let raw = adapter.collection("products")?;
            assert_eq!(raw.count_documents(&sparse! { "name" => "Widget" })?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_operations_fail_after_disconnect() {
    run_test(
        create_test_context,
        |ctx| {
            let adapter = ctx.adapter();
            let products = adapter.querier::<Product>()?;
            adapter.disconnect()?;
            assert!(!adapter.is_connected());

            let err = products.insert_one(&generate_product()).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::StoreAlreadyClosed);
            Ok(())
        },
        cleanup,
    )
}
