//! Order Model
//!
//! Orders are historical snapshots: once written, an [`OrderLine`] never
//! changes, even if the underlying product's price or name changes later.
//! Status is the only field mutated after creation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Order status - linear lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether `next` is a legal forward transition from `self`
    ///
    /// The lifecycle is strictly linear; `Cancelled` is reachable from the
    /// two states where goods have not left the warehouse. Anything else
    /// requires an administrative override.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Pending, Cancelled)
                | (Processing, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// Who owns an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderOwner {
    /// Authenticated user (checkout reads and clears this user's cart)
    User(u64),
    /// Guest checkout, identified by contact email (no stored cart)
    Guest(String),
}

/// Payment method chosen at checkout (recorded, never processed here)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    Card,
    Paypal,
}

/// Shipping address captured on the order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShippingInfo {
    #[validate(length(min = 1, max = 200))]
    pub address: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
}

/// Immutable order line - product name and unit price captured at order time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub product_id: u64,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: u32,
    /// unit_price × quantity, rounded to 2 decimal places
    pub subtotal: f64,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub owner: OrderOwner,
    pub lines: Vec<OrderLine>,
    /// Sum of line subtotals, rounded to 2 decimal places
    pub total: f64,
    pub status: OrderStatus,
    pub shipping: ShippingInfo,
    pub payment_method: PaymentMethod,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    pub fn is_cancelled(&self) -> bool {
        self.status == OrderStatus::Cancelled
    }
}
