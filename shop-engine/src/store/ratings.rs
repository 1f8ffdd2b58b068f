//! Rating Repository
//!
//! A rating row and its product's aggregate always move in the same write
//! transaction, so `(rating_sum, rating_count)` is never out of lockstep
//! with the rows. The serialized writer is also what serializes the
//! read-modify-write of the aggregate per product: two users rating the
//! same product concurrently cannot lose an update.
//!
//! The aggregate keeps the raw sum of values; the stored average is derived
//! from it (1 decimal place) on every write. Incremental "avg*count ± x"
//! arithmetic and its float drift never enter the picture, and
//! [`RatingRepository::reconcile`] can recompute the aggregate from the
//! rows at any time.

use super::{PRODUCTS_TABLE, RATINGS_TABLE, StorageResult, StoreDb};
use redb::ReadableTable;
use rust_decimal::prelude::*;
use shared::models::{Product, Rating};
use shared::util::now_millis;

/// Result of a rating write
#[derive(Debug, Clone)]
pub enum RatingWriteOutcome {
    /// The write went through; `product` carries the updated aggregate
    Applied { rating: Rating, product: Product },
    ProductNotFound,
    /// Only for removals: the user never rated this product
    RatingNotFound,
}

/// Derived mean, rounded to 1 decimal place; 0.0 when unrated
fn derive_average(sum: u64, count: u32) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (Decimal::from(sum) / Decimal::from(count))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

#[derive(Clone)]
pub struct RatingRepository {
    db: StoreDb,
}

impl RatingRepository {
    pub fn new(db: StoreDb) -> Self {
        Self { db }
    }

    pub fn get(&self, product_id: u64, user_id: u64) -> StorageResult<Option<Rating>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RATINGS_TABLE)?;
        match table.get((product_id, user_id))? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All ratings for a product, ordered by user id
    pub fn list_for_product(&self, product_id: u64) -> StorageResult<Vec<Rating>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RATINGS_TABLE)?;
        let mut ratings = Vec::new();
        let range_start = (product_id, 0u64);
        let range_end = (product_id, u64::MAX);
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            ratings.push(serde_json::from_slice(value.value())?);
        }
        Ok(ratings)
    }

    /// Insert or update a user's rating and the product aggregate, atomically
    pub fn submit_txn(
        &self,
        product_id: u64,
        user_id: u64,
        value: u8,
        text: Option<String>,
    ) -> StorageResult<RatingWriteOutcome> {
        let txn = self.db.begin_write()?;
        let outcome = {
            let mut products = txn.open_table(PRODUCTS_TABLE)?;
            let mut ratings = txn.open_table(RATINGS_TABLE)?;

            let product: Option<Product> = match products.get(product_id)? {
                Some(guard) => Some(serde_json::from_slice(guard.value())?),
                None => None,
            };
            match product {
                None => RatingWriteOutcome::ProductNotFound,
                Some(mut product) => {
                    let existing: Option<Rating> = match ratings.get((product_id, user_id))? {
                        Some(guard) => Some(serde_json::from_slice(guard.value())?),
                        None => None,
                    };

                    let now = now_millis();
                    let rating = match existing {
                        // Update in place: count unchanged, sum re-based
                        Some(previous) => {
                            product.rating_sum =
                                product.rating_sum - u64::from(previous.value) + u64::from(value);
                            Rating {
                                value,
                                text,
                                updated_at: now,
                                ..previous
                            }
                        }
                        None => {
                            product.rating_sum += u64::from(value);
                            product.rating_count += 1;
                            Rating {
                                product_id,
                                user_id,
                                value,
                                text,
                                created_at: now,
                                updated_at: now,
                            }
                        }
                    };
                    product.average_rating =
                        derive_average(product.rating_sum, product.rating_count);
                    product.updated_at = now;

                    let rating_value = serde_json::to_vec(&rating)?;
                    ratings.insert((product_id, user_id), rating_value.as_slice())?;
                    let product_value = serde_json::to_vec(&product)?;
                    products.insert(product_id, product_value.as_slice())?;

                    RatingWriteOutcome::Applied { rating, product }
                }
            }
        };
        txn.commit()?;
        Ok(outcome)
    }

    /// Delete a user's rating and shrink the product aggregate, atomically
    pub fn remove_txn(&self, product_id: u64, user_id: u64) -> StorageResult<RatingWriteOutcome> {
        let txn = self.db.begin_write()?;
        let outcome = {
            let mut products = txn.open_table(PRODUCTS_TABLE)?;
            let mut ratings = txn.open_table(RATINGS_TABLE)?;

            let product: Option<Product> = match products.get(product_id)? {
                Some(guard) => Some(serde_json::from_slice(guard.value())?),
                None => None,
            };
            match product {
                None => RatingWriteOutcome::ProductNotFound,
                Some(mut product) => {
                    let removed: Option<Rating> = match ratings.remove((product_id, user_id))? {
                        Some(guard) => Some(serde_json::from_slice(guard.value())?),
                        None => None,
                    };
                    match removed {
                        None => RatingWriteOutcome::RatingNotFound,
                        Some(rating) => {
                            product.rating_sum =
                                product.rating_sum.saturating_sub(u64::from(rating.value));
                            product.rating_count = product.rating_count.saturating_sub(1);
                            product.average_rating =
                                derive_average(product.rating_sum, product.rating_count);
                            product.updated_at = now_millis();

                            let product_value = serde_json::to_vec(&product)?;
                            products.insert(product_id, product_value.as_slice())?;

                            RatingWriteOutcome::Applied { rating, product }
                        }
                    }
                }
            }
        };
        txn.commit()?;
        Ok(outcome)
    }

    /// Recompute the aggregate from the rating rows (reconciliation)
    ///
    /// Returns the updated product, or `None` if the product is gone.
    pub fn reconcile(&self, product_id: u64) -> StorageResult<Option<Product>> {
        let txn = self.db.begin_write()?;
        let updated = {
            let mut products = txn.open_table(PRODUCTS_TABLE)?;
            let ratings = txn.open_table(RATINGS_TABLE)?;

            let product: Option<Product> = match products.get(product_id)? {
                Some(guard) => Some(serde_json::from_slice(guard.value())?),
                None => None,
            };
            match product {
                None => None,
                Some(mut product) => {
                    let mut sum = 0u64;
                    let mut count = 0u32;
                    let range_start = (product_id, 0u64);
                    let range_end = (product_id, u64::MAX);
                    for result in ratings.range(range_start..=range_end)? {
                        let (_key, value) = result?;
                        let rating: Rating = serde_json::from_slice(value.value())?;
                        sum += u64::from(rating.value);
                        count += 1;
                    }

                    if sum != product.rating_sum || count != product.rating_count {
                        tracing::warn!(
                            product_id,
                            stored_sum = product.rating_sum,
                            stored_count = product.rating_count,
                            actual_sum = sum,
                            actual_count = count,
                            "Rating aggregate drifted from rows, reconciling"
                        );
                    }
                    product.rating_sum = sum;
                    product.rating_count = count;
                    product.average_rating = derive_average(sum, count);
                    product.updated_at = now_millis();

                    let value = serde_json::to_vec(&product)?;
                    products.insert(product_id, value.as_slice())?;
                    Some(product)
                }
            }
        };
        txn.commit()?;
        Ok(updated)
    }
}
