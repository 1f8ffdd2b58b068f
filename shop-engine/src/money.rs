//! Money calculation utilities using rust_decimal for precision
//!
//! All monetary arithmetic is done in `Decimal` and converted to `f64` only
//! at the storage/serialization edge, rounded to 2 decimal places.

use rust_decimal::prelude::*;

/// Rounding for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price
pub const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per order line
pub const MAX_QUANTITY: u32 = 9999;

/// Convert f64 to Decimal for internal calculations
pub fn from_f64(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Line subtotal: unit price × quantity
pub fn line_subtotal(unit_price: f64, quantity: u32) -> f64 {
    to_f64(from_f64(unit_price) * Decimal::from(quantity))
}

/// Order total: sum of line subtotals
pub fn order_total(subtotals: impl IntoIterator<Item = f64>) -> f64 {
    to_f64(subtotals.into_iter().map(from_f64).sum())
}

/// Validate a unit price coming from outside (finite, non-negative, bounded)
pub fn validate_price(value: f64) -> Result<(), String> {
    if !value.is_finite() {
        return Err(format!("price must be a finite number, got {value}"));
    }
    if value < 0.0 {
        return Err(format!("price must be non-negative, got {value}"));
    }
    if value > MAX_PRICE {
        return Err(format!(
            "price exceeds maximum allowed ({MAX_PRICE}), got {value}"
        ));
    }
    Ok(())
}

/// Validate an order-line quantity (positive, bounded)
pub fn validate_quantity(quantity: u32) -> Result<(), String> {
    if quantity == 0 {
        return Err("quantity must be positive, got 0".to_string());
    }
    if quantity > MAX_QUANTITY {
        return Err(format!(
            "quantity exceeds maximum allowed ({MAX_QUANTITY}), got {quantity}"
        ));
    }
    Ok(())
}
