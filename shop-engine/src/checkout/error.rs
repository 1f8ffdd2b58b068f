use crate::inventory::InventoryError;
use crate::store::StorageError;
use shared::models::OrderStatus;
use thiserror::Error;

/// Checkout errors
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Product not found: {0}")]
    ProductNotFound(u64),

    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: u64,
        requested: u32,
        available: u32,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(u64),

    #[error("Illegal status transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<InventoryError> for CheckoutError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InvalidQuantity(msg) => CheckoutError::Validation(msg),
            InventoryError::ProductNotFound(id) => CheckoutError::ProductNotFound(id),
            InventoryError::InsufficientStock {
                product_id,
                requested,
                available,
            } => CheckoutError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            InventoryError::Storage(e) => CheckoutError::Storage(e),
        }
    }
}

pub type CheckoutResult<T> = Result<T, CheckoutError>;
