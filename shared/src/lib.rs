//! Shared types for the shop engine
//!
//! Domain models and checkout wire types used by the engine crate and any
//! embedding application (HTTP layer, admin tooling, sync workers).

pub mod checkout;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use checkout::{CheckoutRequest, ShopEvent};
pub use models::{
    Cart, CartItemInput, CartLine, Order, OrderLine, OrderOwner, OrderStatus, PaymentMethod,
    Product, ProductCreate, ProductUpdate, Rating, ShippingInfo,
};
