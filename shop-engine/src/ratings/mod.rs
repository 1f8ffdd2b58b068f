//! Rating Aggregate Maintainer
//!
//! Public surface for product reviews: one rating per (user, product),
//! submitted, updated in place, or removed, with the product's
//! `(rating_sum, rating_count, average_rating)` aggregate kept in lockstep
//! by the repository's single-transaction writes. The stored average is
//! always derivable from the raw sum, so repeated updates cannot drift;
//! [`RatingService::reconcile`] additionally recomputes from the rows.

use crate::store::{RatingRepository, RatingWriteOutcome, StorageError, with_retry};
use shared::checkout::ShopEvent;
use shared::models::{Product, Rating};
use thiserror::Error;
use tokio::sync::broadcast;

/// Longest accepted review text
const MAX_TEXT_LEN: usize = 2000;

/// Rating errors
#[derive(Debug, Error)]
pub enum RatingError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Product not found: {0}")]
    ProductNotFound(u64),

    #[error("Rating not found for user {user_id} on product {product_id}")]
    RatingNotFound { product_id: u64, user_id: u64 },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type RatingResult<T> = Result<T, RatingError>;

/// Rating service over the rating repository
#[derive(Clone)]
pub struct RatingService {
    ratings: RatingRepository,
    event_tx: broadcast::Sender<ShopEvent>,
}

impl RatingService {
    pub fn new(ratings: RatingRepository, event_tx: broadcast::Sender<ShopEvent>) -> Self {
        Self { ratings, event_tx }
    }

    /// Submit a rating; a second submission by the same user replaces the
    /// first in place (count unchanged)
    pub fn submit(
        &self,
        user_id: u64,
        product_id: u64,
        value: u8,
        text: Option<String>,
    ) -> RatingResult<Rating> {
        if !(1..=5).contains(&value) {
            return Err(RatingError::Validation(format!(
                "rating value must be between 1 and 5, got {value}"
            )));
        }
        if let Some(ref text) = text {
            if text.len() > MAX_TEXT_LEN {
                return Err(RatingError::Validation(format!(
                    "review text exceeds {MAX_TEXT_LEN} characters"
                )));
            }
        }

        let outcome = with_retry("ratings.submit", || {
            self.ratings
                .submit_txn(product_id, user_id, value, text.clone())
        })?;
        match outcome {
            RatingWriteOutcome::Applied { rating, product } => {
                tracing::info!(
                    product_id,
                    user_id,
                    value,
                    average = product.average_rating,
                    count = product.rating_count,
                    "Rating submitted"
                );
                self.broadcast_aggregate(&product);
                Ok(rating)
            }
            RatingWriteOutcome::ProductNotFound => Err(RatingError::ProductNotFound(product_id)),
            RatingWriteOutcome::RatingNotFound => Err(RatingError::RatingNotFound {
                product_id,
                user_id,
            }),
        }
    }

    /// Remove a user's rating and shrink the aggregate
    pub fn remove(&self, user_id: u64, product_id: u64) -> RatingResult<()> {
        let outcome = with_retry("ratings.remove", || {
            self.ratings.remove_txn(product_id, user_id)
        })?;
        match outcome {
            RatingWriteOutcome::Applied { product, .. } => {
                tracing::info!(
                    product_id,
                    user_id,
                    average = product.average_rating,
                    count = product.rating_count,
                    "Rating removed"
                );
                self.broadcast_aggregate(&product);
                Ok(())
            }
            RatingWriteOutcome::ProductNotFound => Err(RatingError::ProductNotFound(product_id)),
            RatingWriteOutcome::RatingNotFound => Err(RatingError::RatingNotFound {
                product_id,
                user_id,
            }),
        }
    }

    pub fn get(&self, user_id: u64, product_id: u64) -> RatingResult<Option<Rating>> {
        Ok(self.ratings.get(product_id, user_id)?)
    }

    pub fn list_for_product(&self, product_id: u64) -> RatingResult<Vec<Rating>> {
        Ok(self.ratings.list_for_product(product_id)?)
    }

    /// Recompute the aggregate from the rating rows
    pub fn reconcile(&self, product_id: u64) -> RatingResult<Product> {
        let product = with_retry("ratings.reconcile", || self.ratings.reconcile(product_id))?
            .ok_or(RatingError::ProductNotFound(product_id))?;
        self.broadcast_aggregate(&product);
        Ok(product)
    }

    fn broadcast_aggregate(&self, product: &Product) {
        let _ = self.event_tx.send(ShopEvent::RatingChanged {
            product_id: product.id,
            average_rating: product.average_rating,
            rating_count: product.rating_count,
        });
    }
}
