//! Cart Model

use serde::{Deserialize, Serialize};

/// One line of a cart, keyed by product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: u64,
    pub quantity: u32,
}

/// A user's cart
///
/// Lines are keyed by product: re-adding a product increments its quantity
/// instead of creating a duplicate line. The cart is cleared, not deleted,
/// after a successful checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: u64,
    pub lines: Vec<CartLine>,
    pub updated_at: i64,
}

impl Cart {
    pub fn empty(user_id: u64) -> Self {
        Self {
            user_id,
            lines: Vec::new(),
            updated_at: crate::util::now_millis(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add quantity for a product, merging into an existing line if present
    ///
    /// Adding 0 is a no-op; lines always hold a quantity of at least 1.
    pub fn add(&mut self, product_id: u64, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLine {
                product_id,
                quantity,
            }),
        }
        self.updated_at = crate::util::now_millis();
    }

    /// Replace a line's quantity; 0 removes the line
    pub fn set_quantity(&mut self, product_id: u64, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = quantity,
            None => self.lines.push(CartLine {
                product_id,
                quantity,
            }),
        }
        self.updated_at = crate::util::now_millis();
    }

    pub fn remove(&mut self, product_id: u64) {
        self.lines.retain(|l| l.product_id != product_id);
        self.updated_at = crate::util::now_millis();
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.updated_at = crate::util::now_millis();
    }
}

/// Item input for guest checkout (no stored cart)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CartItemInput {
    pub product_id: u64,
    pub quantity: u32,
}
