use docquery::collection::{FindOneAndUpdateOptions, FindOptions, ObjectId, ReturnDocument};
use docquery::common::SortOrder;
use docquery::errors::ErrorKind;
use docquery::querier::Querier;
use docquery_int_test::models::{generate_order, Order, OrderKey};
use docquery_int_test::test_util::{cleanup, create_test_context, run_test};

fn key(shop: &str, seq: i64) -> OrderKey {
    OrderKey {
        shop: shop.to_string(),
        seq,
    }
}

fn by_key(shop: &str, seq: i64) -> Order {
    Order {
        key: key(shop, seq),
        ..Default::default()
    }
}

#[test]
fn test_insert_returns_composite_id() {
    run_test(
        create_test_context,
        |ctx| {
            let orders = ctx.adapter().querier_with_composite_id::<Order, OrderKey>()?;
            assert!(orders.is_composite());
            assert_eq!(orders.collection_name(), "orders");

            let order = generate_order("rome", 1);
            let id = orders.insert_one(&order)?;
            assert_eq!(id, key("rome", 1));

            let found = orders.find_one(&by_key("rome", 1))?.unwrap();
            assert_eq!(found, order);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_many_composite_ids() {
    run_test(
        create_test_context,
        |ctx| {
            let orders = ctx.adapter().querier_with_composite_id::<Order, OrderKey>()?;
            let batch: Vec<Order> = (1..=3).map(|seq| generate_order("oslo", seq)).collect();
            let ids = orders.insert_many(&batch)?;
            assert_eq!(ids, vec![key("oslo", 1), key("oslo", 2), key("oslo", 3)]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_duplicate_composite_id_is_rejected() {
    run_test(
        create_test_context,
        |ctx| {
            let orders = ctx.adapter().querier_with_composite_id::<Order, OrderKey>()?;
            orders.insert_one(&generate_order("rome", 1))?;

            let err = orders.insert_one(&generate_order("rome", 1)).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert_eq!(orders.count_documents(&Order::default())?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_filter_on_part_of_the_key() {
    run_test(
        create_test_context,
        |ctx| {
            let orders = ctx.adapter().querier_with_composite_id::<Order, OrderKey>()?;
            for seq in 1..=3 {
                orders.insert_one(&generate_order("rome", seq))?;
            }
            orders.insert_one(&generate_order("oslo", 1))?;

            // seq 0 is the zero value, so only the shop is matched
            let in_rome = orders.find(
                &by_key("rome", 0),
                &FindOptions::new().sort_by("_id.seq", SortOrder::Descending),
            )?;
            let seqs: Vec<i64> = in_rome.iter().map(|order| order.key.seq).collect();
            assert_eq!(seqs, vec![3, 2, 1]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_keeps_composite_id() {
    run_test(
        create_test_context,
        |ctx| {
            let orders = ctx.adapter().querier_with_composite_id::<Order, OrderKey>()?;
            orders.insert_one(&generate_order("rome", 1))?;

            let update = Order {
                customer: "Ada".to_string(),
                ..Default::default()
            };
            let options = FindOneAndUpdateOptions::new().return_document(ReturnDocument::After);
            let updated = orders.update_one(&by_key("rome", 1), &update, &options)?.unwrap();
            assert_eq!(updated.key, key("rome", 1));
            assert_eq!(updated.customer, "Ada");

            // moving the order to another key is a change of identity
            let err = orders
                .update_one(&by_key("rome", 1), &by_key("oslo", 1), &options)
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_plain_querier_rejects_composite_id() {
    run_test(
        create_test_context,
        |ctx| {
            let orders: Querier<Order, ObjectId> = Querier::new(&ctx.adapter(), "orders")?;
            assert!(!orders.is_composite());

            let err = orders.insert_one(&generate_order("rome", 1)).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidId);
            Ok(())
        },
        cleanup,
    )
}
