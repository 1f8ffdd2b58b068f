use super::*;
use shared::checkout::ShopEvent;

fn place_simple_order(engine: &ShopEngine, user_id: u64, product_id: u64, qty: u32) -> Order {
    engine.carts().add_item(user_id, product_id, qty).unwrap();
    engine.checkout().place_order(&user_request(user_id)).unwrap()
}

#[test]
fn full_lifecycle_progresses_linearly() {
    let engine = create_test_engine();
    let p1 = seed_product(&engine, "Widget", 10.0, 5);
    let order = place_simple_order(&engine, 1, p1, 1);

    let order = engine
        .checkout()
        .update_order_status(order.id, OrderStatus::Processing, false)
        .unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    let order = engine
        .checkout()
        .update_order_status(order.id, OrderStatus::Shipped, false)
        .unwrap();
    assert_eq!(order.status, OrderStatus::Shipped);
    let order = engine
        .checkout()
        .update_order_status(order.id, OrderStatus::Delivered, false)
        .unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
}

#[test]
fn skipping_and_backward_transitions_are_rejected() {
    let engine = create_test_engine();
    let p1 = seed_product(&engine, "Widget", 10.0, 5);
    let order = place_simple_order(&engine, 1, p1, 1);

    // Pending → Shipped skips Processing
    match engine
        .checkout()
        .update_order_status(order.id, OrderStatus::Shipped, false)
    {
        Err(CheckoutError::IllegalTransition { from, to }) => {
            assert_eq!(from, OrderStatus::Pending);
            assert_eq!(to, OrderStatus::Shipped);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    engine
        .checkout()
        .update_order_status(order.id, OrderStatus::Processing, false)
        .unwrap();
    // Backward without override
    assert!(matches!(
        engine
            .checkout()
            .update_order_status(order.id, OrderStatus::Pending, false),
        Err(CheckoutError::IllegalTransition { .. })
    ));
    // Administrative override may correct it
    let order = engine
        .checkout()
        .update_order_status(order.id, OrderStatus::Pending, true)
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[test]
fn unknown_order_is_reported() {
    let engine = create_test_engine();
    assert!(matches!(
        engine
            .checkout()
            .update_order_status(42, OrderStatus::Processing, false),
        Err(CheckoutError::OrderNotFound(42))
    ));
}

#[test]
fn cancelling_a_pending_order_restocks_its_lines() {
    let engine = create_test_engine();
    let p1 = seed_product(&engine, "Widget", 10.0, 5);
    let p2 = seed_product(&engine, "Gadget", 5.0, 3);
    engine.carts().add_item(1, p1, 2).unwrap();
    engine.carts().add_item(1, p2, 1).unwrap();
    let order = engine.checkout().place_order(&user_request(1)).unwrap();
    assert_eq!(stock_of(&engine, p1), 3);
    assert_eq!(stock_of(&engine, p2), 2);

    let mut rx = engine.subscribe();
    engine
        .checkout()
        .update_order_status(order.id, OrderStatus::Cancelled, false)
        .unwrap();

    assert_eq!(stock_of(&engine, p1), 5);
    assert_eq!(stock_of(&engine, p2), 3);
    assert_eq!(
        rx.try_recv().unwrap(),
        ShopEvent::OrderStatusChanged {
            order_id: order.id,
            from: OrderStatus::Pending,
            to: OrderStatus::Cancelled,
        }
    );
}

#[test]
fn cancelling_shipped_goods_does_not_restock() {
    let engine = create_test_engine();
    let p1 = seed_product(&engine, "Widget", 10.0, 5);
    let order = place_simple_order(&engine, 1, p1, 2);
    engine
        .checkout()
        .update_order_status(order.id, OrderStatus::Processing, false)
        .unwrap();
    engine
        .checkout()
        .update_order_status(order.id, OrderStatus::Shipped, false)
        .unwrap();

    // Cancelling shipped goods takes an override, and the units are gone
    assert!(matches!(
        engine
            .checkout()
            .update_order_status(order.id, OrderStatus::Cancelled, false),
        Err(CheckoutError::IllegalTransition { .. })
    ));
    engine
        .checkout()
        .update_order_status(order.id, OrderStatus::Cancelled, true)
        .unwrap();
    assert_eq!(stock_of(&engine, p1), 3);
}

#[test]
fn cancelled_orders_stay_cancelled() {
    let engine = create_test_engine();
    let p1 = seed_product(&engine, "Widget", 10.0, 5);
    let order = place_simple_order(&engine, 1, p1, 1);
    let order = engine
        .checkout()
        .update_order_status(order.id, OrderStatus::Cancelled, false)
        .unwrap();
    assert!(order.is_cancelled());
    assert!(matches!(
        engine
            .checkout()
            .update_order_status(order.id, OrderStatus::Processing, false),
        Err(CheckoutError::IllegalTransition { .. })
    ));
}
