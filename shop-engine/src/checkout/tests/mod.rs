use super::*;
use crate::engine::ShopEngine;
use shared::models::{PaymentMethod, ProductCreate, ShippingInfo};

mod test_core;
mod test_status;

fn create_test_engine() -> ShopEngine {
    ShopEngine::in_memory().unwrap()
}

fn seed_product(engine: &ShopEngine, name: &str, price: f64, stock: u32) -> u64 {
    engine
        .create_product(ProductCreate {
            name: name.to_string(),
            description: None,
            image: None,
            category: None,
            price,
            stock: Some(stock),
        })
        .unwrap()
        .id
}

fn test_shipping() -> ShippingInfo {
    ShippingInfo {
        address: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        postal_code: "12345".to_string(),
        country: "US".to_string(),
    }
}

fn user_request(user_id: u64) -> CheckoutRequest {
    CheckoutRequest::for_user(user_id, test_shipping(), PaymentMethod::Card)
}

fn guest_request(items: Vec<CartItemInput>) -> CheckoutRequest {
    CheckoutRequest::for_guest(
        "guest@example.com",
        items,
        test_shipping(),
        PaymentMethod::CashOnDelivery,
    )
}

fn stock_of(engine: &ShopEngine, product_id: u64) -> u32 {
    engine.products().find_by_id(product_id).unwrap().unwrap().stock
}
