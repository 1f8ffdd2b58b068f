//! Rating Model

use serde::{Deserialize, Serialize};

/// A single user's rating of a product
///
/// Composite-unique on (user, product): a user has at most one rating per
/// product; re-submitting replaces the value in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub product_id: u64,
    pub user_id: u64,
    /// Raw rating value, 1-5
    pub value: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}
