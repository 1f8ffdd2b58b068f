//! Inventory Ledger
//!
//! Thin policy layer over the product repository's atomic stock operations:
//! input validation (a quantity of 0 is an error, not a silent no-op),
//! typed errors, and the admin restock path with its event broadcast.

use crate::store::{ProductRepository, ReserveOutcome, StorageError, with_retry};
use shared::ShopEvent;
use thiserror::Error;
use tokio::sync::broadcast;

/// Inventory errors
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Product not found: {0}")]
    ProductNotFound(u64),

    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: u64,
        requested: u32,
        available: u32,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type InventoryResult<T> = Result<T, InventoryError>;

/// Inventory ledger over the products table
#[derive(Clone)]
pub struct InventoryLedger {
    products: ProductRepository,
    event_tx: broadcast::Sender<ShopEvent>,
}

impl InventoryLedger {
    pub fn new(products: ProductRepository, event_tx: broadcast::Sender<ShopEvent>) -> Self {
        Self { products, event_tx }
    }

    /// Reserve `quantity` units if available (atomic conditional decrement)
    ///
    /// Returns the stock level after the reservation.
    pub fn reserve(&self, product_id: u64, quantity: u32) -> InventoryResult<u32> {
        crate::money::validate_quantity(quantity).map_err(InventoryError::InvalidQuantity)?;
        match self.products.reserve_stock(product_id, quantity)? {
            ReserveOutcome::Reserved { remaining } => {
                tracing::debug!(product_id, quantity, remaining, "Stock reserved");
                Ok(remaining)
            }
            ReserveOutcome::Insufficient { available } => Err(InventoryError::InsufficientStock {
                product_id,
                requested: quantity,
                available,
            }),
            ReserveOutcome::NotFound => Err(InventoryError::ProductNotFound(product_id)),
        }
    }

    /// Release `quantity` units (compensation for a failed downstream step)
    ///
    /// Returns the stock level after the release.
    pub fn release(&self, product_id: u64, quantity: u32) -> InventoryResult<u32> {
        crate::money::validate_quantity(quantity).map_err(InventoryError::InvalidQuantity)?;
        match self.products.release_stock(product_id, quantity)? {
            Some(remaining) => {
                tracing::debug!(product_id, quantity, remaining, "Stock released");
                Ok(remaining)
            }
            None => Err(InventoryError::ProductNotFound(product_id)),
        }
    }

    /// Admin stock adjustment: add `quantity` units and broadcast the change
    pub fn restock(&self, product_id: u64, quantity: u32) -> InventoryResult<u32> {
        crate::money::validate_quantity(quantity).map_err(InventoryError::InvalidQuantity)?;
        let stock = with_retry("inventory.restock", || {
            self.products.release_stock(product_id, quantity)
        })?
        .ok_or(InventoryError::ProductNotFound(product_id))?;

        tracing::info!(product_id, quantity, stock, "Product restocked");
        let _ = self.event_tx.send(ShopEvent::StockAdjusted {
            product_id,
            delta: i64::from(quantity),
            stock,
        });
        Ok(stock)
    }

    /// Admin stock correction to an absolute level
    pub fn set_stock(&self, product_id: u64, stock: u32) -> InventoryResult<u32> {
        let before = self
            .products
            .find_by_id(product_id)?
            .ok_or(InventoryError::ProductNotFound(product_id))?
            .stock;
        let after = self
            .products
            .set_stock(product_id, stock)?
            .ok_or(InventoryError::ProductNotFound(product_id))?;

        tracing::info!(product_id, before, after, "Stock level set");
        let _ = self.event_tx.send(ShopEvent::StockAdjusted {
            product_id,
            delta: i64::from(after) - i64::from(before),
            stock: after,
        });
        Ok(after)
    }
}
