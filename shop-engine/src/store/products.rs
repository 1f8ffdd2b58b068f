//! Product Repository
//!
//! Catalog reads/writes plus the two inventory primitives the ledger builds
//! on: `reserve_stock` (conditional decrement, the atomic "reserve N units
//! if available") and `release_stock` (compensating increment). Both are
//! single write transactions; the stock check and the decrement cannot be
//! separated by another writer.

use super::{PRODUCTS_TABLE, StorageResult, StoreDb};
use redb::ReadableTable;
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::util::now_millis;

/// Result of a conditional stock reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Stock was decremented; `remaining` is the level after the decrement
    Reserved { remaining: u32 },
    /// Precondition failed: fewer than the requested units on hand
    Insufficient { available: u32 },
    /// No such product
    NotFound,
}

#[derive(Clone)]
pub struct ProductRepository {
    db: StoreDb,
}

impl ProductRepository {
    pub fn new(db: StoreDb) -> Self {
        Self { db }
    }

    /// Build and insert a new product under a pre-allocated id
    pub fn create(&self, id: u64, data: ProductCreate) -> StorageResult<Product> {
        let now = now_millis();
        let product = Product {
            id,
            name: data.name,
            description: data.description.unwrap_or_default(),
            image: data.image.unwrap_or_default(),
            category: data.category,
            price: data.price,
            stock: data.stock.unwrap_or(0),
            rating_sum: 0,
            rating_count: 0,
            average_rating: 0.0,
            created_at: now,
            updated_at: now,
        };
        self.insert(&product)?;
        Ok(product)
    }

    /// Insert or overwrite a product row
    pub fn insert(&self, product: &Product) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            let value = serde_json::to_vec(product)?;
            table.insert(product.id, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn find_by_id(&self, id: u64) -> StorageResult<Option<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        match table.get(id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn find_all(&self) -> StorageResult<Vec<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        let mut products = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            products.push(serde_json::from_slice(value.value())?);
        }
        Ok(products)
    }

    /// Apply a catalog patch (name/description/image/category/price)
    ///
    /// Stock and rating fields are deliberately not patchable here; those
    /// belong to the inventory ledger and the rating maintainer.
    pub fn update(&self, id: u64, data: ProductUpdate) -> StorageResult<Option<Product>> {
        let txn = self.db.begin_write()?;
        let updated = {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            let product: Option<Product> = match table.get(id)? {
                Some(guard) => Some(serde_json::from_slice(guard.value())?),
                None => None,
            };
            match product {
                None => None,
                Some(mut product) => {
                    if let Some(v) = data.name {
                        product.name = v;
                    }
                    if let Some(v) = data.description {
                        product.description = v;
                    }
                    if let Some(v) = data.image {
                        product.image = v;
                    }
                    if let Some(v) = data.category {
                        product.category = Some(v);
                    }
                    if let Some(v) = data.price {
                        product.price = v;
                    }
                    product.updated_at = now_millis();
                    let value = serde_json::to_vec(&product)?;
                    table.insert(id, value.as_slice())?;
                    Some(product)
                }
            }
        };
        txn.commit()?;
        Ok(updated)
    }

    /// Atomically decrement stock by `quantity` if at least that much is on
    /// hand (compare-and-swap semantics; stock can never go negative)
    pub fn reserve_stock(&self, id: u64, quantity: u32) -> StorageResult<ReserveOutcome> {
        let txn = self.db.begin_write()?;
        let outcome = {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            let product: Option<Product> = match table.get(id)? {
                Some(guard) => Some(serde_json::from_slice(guard.value())?),
                None => None,
            };
            match product {
                None => ReserveOutcome::NotFound,
                Some(mut product) => {
                    if product.stock < quantity {
                        ReserveOutcome::Insufficient {
                            available: product.stock,
                        }
                    } else {
                        product.stock -= quantity;
                        product.updated_at = now_millis();
                        let value = serde_json::to_vec(&product)?;
                        table.insert(id, value.as_slice())?;
                        ReserveOutcome::Reserved {
                            remaining: product.stock,
                        }
                    }
                }
            }
        };
        txn.commit()?;
        Ok(outcome)
    }

    /// Atomically increment stock by `quantity` (compensation / restock)
    ///
    /// Returns the new stock level, or `None` if the product is gone.
    pub fn release_stock(&self, id: u64, quantity: u32) -> StorageResult<Option<u32>> {
        let txn = self.db.begin_write()?;
        let remaining = {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            let product: Option<Product> = match table.get(id)? {
                Some(guard) => Some(serde_json::from_slice(guard.value())?),
                None => None,
            };
            match product {
                None => None,
                Some(mut product) => {
                    product.stock = product.stock.saturating_add(quantity);
                    product.updated_at = now_millis();
                    let value = serde_json::to_vec(&product)?;
                    table.insert(id, value.as_slice())?;
                    Some(product.stock)
                }
            }
        };
        txn.commit()?;
        Ok(remaining)
    }

    /// Set an absolute stock level (admin correction)
    pub fn set_stock(&self, id: u64, stock: u32) -> StorageResult<Option<u32>> {
        let txn = self.db.begin_write()?;
        let remaining = {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            let product: Option<Product> = match table.get(id)? {
                Some(guard) => Some(serde_json::from_slice(guard.value())?),
                None => None,
            };
            match product {
                None => None,
                Some(mut product) => {
                    product.stock = stock;
                    product.updated_at = now_millis();
                    let value = serde_json::to_vec(&product)?;
                    table.insert(id, value.as_slice())?;
                    Some(product.stock)
                }
            }
        };
        txn.commit()?;
        Ok(remaining)
    }
}
