//! Cart Repository
//!
//! One cart per user, stored as a whole document. Mutations are whole-cart
//! read-modify-write inside a single write transaction; the serialized
//! writer makes "two tabs add the same product" merge instead of clobber.

use super::{CARTS_TABLE, StorageResult, StoreDb};
use redb::ReadableTable;
use shared::models::Cart;

#[derive(Clone)]
pub struct CartRepository {
    db: StoreDb,
}

impl CartRepository {
    pub fn new(db: StoreDb) -> Self {
        Self { db }
    }

    /// The user's cart; an empty cart if they never had one
    pub fn get(&self, user_id: u64) -> StorageResult<Cart> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CARTS_TABLE)?;
        match table.get(user_id)? {
            Some(guard) => Ok(serde_json::from_slice(guard.value())?),
            None => Ok(Cart::empty(user_id)),
        }
    }

    /// Add quantity of a product (merges into an existing line)
    pub fn add_item(&self, user_id: u64, product_id: u64, quantity: u32) -> StorageResult<Cart> {
        self.mutate(user_id, |cart| cart.add(product_id, quantity))
    }

    /// Replace a line's quantity; 0 removes the line
    pub fn set_item_quantity(
        &self,
        user_id: u64,
        product_id: u64,
        quantity: u32,
    ) -> StorageResult<Cart> {
        self.mutate(user_id, |cart| cart.set_quantity(product_id, quantity))
    }

    pub fn remove_item(&self, user_id: u64, product_id: u64) -> StorageResult<Cart> {
        self.mutate(user_id, |cart| cart.remove(product_id))
    }

    /// Empty the cart (the row stays; carts are cleared, not deleted)
    pub fn clear(&self, user_id: u64) -> StorageResult<Cart> {
        self.mutate(user_id, |cart| cart.clear())
    }

    fn mutate(&self, user_id: u64, f: impl FnOnce(&mut Cart)) -> StorageResult<Cart> {
        let txn = self.db.begin_write()?;
        let cart = {
            let mut table = txn.open_table(CARTS_TABLE)?;
            let mut cart: Cart = match table.get(user_id)? {
                Some(guard) => serde_json::from_slice(guard.value())?,
                None => Cart::empty(user_id),
            };
            f(&mut cart);
            let value = serde_json::to_vec(&cart)?;
            table.insert(user_id, value.as_slice())?;
            cart
        };
        txn.commit()?;
        Ok(cart)
    }
}
