//! Checkout wire types
//!
//! [`CheckoutRequest`] is the client's request to turn a cart (or an explicit
//! item list, for guests) into an order. Each request carries a
//! client-generated `command_id`; re-submitting the same command returns the
//! already-created order instead of reserving stock twice.

use crate::models::{CartItemInput, OrderOwner, OrderStatus, PaymentMethod, ShippingInfo};
use serde::{Deserialize, Serialize};

/// Checkout request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Client-generated idempotency key (uuid)
    pub command_id: String,
    pub owner: OrderOwner,
    /// Explicit item list; required for guest checkout, ignored for
    /// authenticated checkout (the stored cart is the source of truth)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<CartItemInput>>,
    pub shipping: ShippingInfo,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl CheckoutRequest {
    /// Authenticated checkout against the user's stored cart
    pub fn for_user(user_id: u64, shipping: ShippingInfo, payment_method: PaymentMethod) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            owner: OrderOwner::User(user_id),
            items: None,
            shipping,
            payment_method,
        }
    }

    /// Guest checkout with an explicit item list
    pub fn for_guest(
        email: impl Into<String>,
        items: Vec<CartItemInput>,
        shipping: ShippingInfo,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            owner: OrderOwner::Guest(email.into()),
            items: Some(items),
            shipping,
            payment_method,
        }
    }
}

/// Events broadcast by the engine after a successful state change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShopEvent {
    OrderPlaced {
        order_id: u64,
        total: f64,
    },
    OrderStatusChanged {
        order_id: u64,
        from: OrderStatus,
        to: OrderStatus,
    },
    StockAdjusted {
        product_id: u64,
        /// Signed change applied to stock (negative = reservation)
        delta: i64,
        /// Stock level after the adjustment
        stock: u32,
    },
    RatingChanged {
        product_id: u64,
        average_rating: f64,
        rating_count: u32,
    },
}
