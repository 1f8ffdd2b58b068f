use super::*;
use shared::checkout::ShopEvent;

// ========================================================================
// Happy path
// ========================================================================

#[test]
fn checkout_round_trip() {
    let engine = create_test_engine();
    let p1 = seed_product(&engine, "Widget", 10.0, 5);
    let p2 = seed_product(&engine, "Gadget", 5.0, 3);

    engine.carts().add_item(1, p1, 2).unwrap();
    engine.carts().add_item(1, p2, 1).unwrap();

    let order = engine.checkout().place_order(&user_request(1)).unwrap();

    assert_eq!(order.total, 25.0);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.lines.len(), 2);
    let l1 = order.lines.iter().find(|l| l.product_id == p1).unwrap();
    let l2 = order.lines.iter().find(|l| l.product_id == p2).unwrap();
    assert_eq!((l1.subtotal, l2.subtotal), (20.0, 5.0));
    assert_eq!(l1.product_name, "Widget");
    assert_eq!(l1.unit_price, 10.0);

    // Stock decremented, cart cleared, order persisted
    assert_eq!(stock_of(&engine, p1), 3);
    assert_eq!(stock_of(&engine, p2), 2);
    assert!(engine.carts().get(1).unwrap().is_empty());
    let persisted = engine.orders().find_by_id(order.id).unwrap().unwrap();
    assert_eq!(persisted.total, 25.0);
}

#[test]
fn order_lines_are_snapshots() {
    let engine = create_test_engine();
    let p1 = seed_product(&engine, "Widget", 10.0, 5);
    engine.carts().add_item(1, p1, 1).unwrap();
    let order = engine.checkout().place_order(&user_request(1)).unwrap();

    // Later catalog changes must not leak into the persisted order
    engine
        .update_product(
            p1,
            shared::models::ProductUpdate {
                name: Some("Renamed".into()),
                price: Some(99.0),
                ..Default::default()
            },
        )
        .unwrap();

    let persisted = engine.orders().find_by_id(order.id).unwrap().unwrap();
    assert_eq!(persisted.lines[0].product_name, "Widget");
    assert_eq!(persisted.lines[0].unit_price, 10.0);
    assert_eq!(persisted.total, 10.0);
}

#[test]
fn placing_order_broadcasts_event() {
    let engine = create_test_engine();
    let p1 = seed_product(&engine, "Widget", 10.0, 5);
    engine.carts().add_item(1, p1, 1).unwrap();

    let mut rx = engine.subscribe();
    let order = engine.checkout().place_order(&user_request(1)).unwrap();
    assert_eq!(
        rx.try_recv().unwrap(),
        ShopEvent::OrderPlaced {
            order_id: order.id,
            total: 10.0,
        }
    );
}

// ========================================================================
// Validation failures (no side effects)
// ========================================================================

#[test]
fn empty_cart_is_rejected() {
    let engine = create_test_engine();
    let result = engine.checkout().place_order(&user_request(1));
    assert!(matches!(result, Err(CheckoutError::EmptyCart)));
}

#[test]
fn unknown_product_fails_the_whole_order() {
    let engine = create_test_engine();
    let p1 = seed_product(&engine, "Widget", 10.0, 5);
    engine.carts().add_item(1, p1, 1).unwrap();
    engine.carts().add_item(1, 999, 1).unwrap();

    let result = engine.checkout().place_order(&user_request(1));
    assert!(matches!(result, Err(CheckoutError::ProductNotFound(999))));

    // No partial orders, no stock movement, cart untouched
    assert_eq!(stock_of(&engine, p1), 5);
    assert_eq!(engine.carts().get(1).unwrap().lines.len(), 2);
}

#[test]
fn insufficient_stock_names_the_offending_product_and_rolls_back() {
    let engine = create_test_engine();
    let p1 = seed_product(&engine, "Widget", 10.0, 5);
    let p2 = seed_product(&engine, "Gadget", 5.0, 3);

    engine.carts().add_item(1, p1, 2).unwrap();
    engine.carts().add_item(1, p2, 100).unwrap();

    match engine.checkout().place_order(&user_request(1)) {
        Err(CheckoutError::InsufficientStock {
            product_id,
            requested,
            available,
        }) => {
            assert_eq!((product_id, requested, available), (p2, 100, 3));
        }
        other => panic!("unexpected result: {other:?}"),
    }

    // Any reservation made for p1 before the failure has been released
    assert_eq!(stock_of(&engine, p1), 5);
    assert_eq!(stock_of(&engine, p2), 3);
    assert!(!engine.carts().get(1).unwrap().is_empty());
}

#[test]
fn invalid_shipping_is_rejected() {
    let engine = create_test_engine();
    let p1 = seed_product(&engine, "Widget", 10.0, 5);
    engine.carts().add_item(1, p1, 1).unwrap();

    let mut req = user_request(1);
    req.shipping.address = String::new();
    assert!(matches!(
        engine.checkout().place_order(&req),
        Err(CheckoutError::Validation(_))
    ));
    assert_eq!(stock_of(&engine, p1), 5);
}

// ========================================================================
// Guest checkout
// ========================================================================

#[test]
fn guest_checkout_merges_duplicate_lines_and_touches_no_cart() {
    let engine = create_test_engine();
    let p1 = seed_product(&engine, "Widget", 10.0, 5);

    let req = guest_request(vec![
        CartItemInput {
            product_id: p1,
            quantity: 1,
        },
        CartItemInput {
            product_id: p1,
            quantity: 2,
        },
    ]);
    let order = engine.checkout().place_order(&req).unwrap();

    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.lines[0].quantity, 3);
    assert_eq!(order.total, 30.0);
    assert_eq!(order.owner, OrderOwner::Guest("guest@example.com".into()));
    assert_eq!(stock_of(&engine, p1), 2);
}

#[test]
fn guest_checkout_requires_contact_and_items() {
    let engine = create_test_engine();
    let p1 = seed_product(&engine, "Widget", 10.0, 5);

    let mut req = guest_request(vec![CartItemInput {
        product_id: p1,
        quantity: 1,
    }]);
    req.owner = OrderOwner::Guest("not-an-email".into());
    assert!(matches!(
        engine.checkout().place_order(&req),
        Err(CheckoutError::Validation(_))
    ));

    let req = guest_request(Vec::new());
    assert!(matches!(
        engine.checkout().place_order(&req),
        Err(CheckoutError::EmptyCart)
    ));

    let req = guest_request(vec![CartItemInput {
        product_id: p1,
        quantity: 0,
    }]);
    assert!(matches!(
        engine.checkout().place_order(&req),
        Err(CheckoutError::Validation(_))
    ));
}

// ========================================================================
// Idempotency
// ========================================================================

#[test]
fn duplicate_command_returns_the_same_order_without_reserving_again() {
    let engine = create_test_engine();
    let p1 = seed_product(&engine, "Widget", 10.0, 5);
    engine.carts().add_item(1, p1, 2).unwrap();

    let req = user_request(1);
    let first = engine.checkout().place_order(&req).unwrap();
    let second = engine.checkout().place_order(&req).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.total, 20.0);
    // Stock moved exactly once
    assert_eq!(stock_of(&engine, p1), 3);
}
