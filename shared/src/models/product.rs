//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
///
/// `stock` is only ever mutated through the inventory ledger's conditional
/// operations; `rating_sum` / `rating_count` / `average_rating` only through
/// the rating maintainer. The stored `average_rating` is derived from
/// `rating_sum` / `rating_count` and rounded to one decimal place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    /// Category reference (sequence-allocated ID, optional)
    pub category: Option<u64>,
    /// Unit price (non-negative, 2 decimal places)
    pub price: f64,
    /// Units on hand
    pub stock: u32,
    /// Sum of all raw rating values (each 1-5)
    #[serde(default)]
    pub rating_sum: u64,
    /// Number of ratings backing the aggregate
    #[serde(default)]
    pub rating_count: u32,
    /// Derived mean of ratings, 0.0 when unrated, rounded to 1 decimal
    #[serde(default)]
    pub average_rating: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<u64>,
    pub price: f64,
    pub stock: Option<u32>,
}

/// Update product payload (stock and rating fields deliberately absent)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<u64>,
    pub price: Option<f64>,
}
