//! Decimal money helpers
//!
//! Documents store monetary values as `f64` (the wire and storage
//! format), but all arithmetic goes through `Decimal` to avoid binary
//! floating point drift when summing line items.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::order::OrderItem;

/// Monetary values are rounded to 2 decimal places
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for precise calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Sum of `price * qty` over all line items
pub fn items_subtotal(items: &[OrderItem]) -> Decimal {
    items
        .iter()
        .map(|item| to_decimal(item.price) * Decimal::from(item.qty))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: f64, qty: u32) -> OrderItem {
        OrderItem {
            product_id: "p".into(),
            title: "Candle".into(),
            price,
            qty,
        }
    }

    #[test]
    fn decimal_avoids_f64_drift() {
        // 0.1 + 0.2 != 0.3 in f64, but does with Decimal
        assert_ne!(0.1_f64 + 0.2_f64, 0.3_f64);
        assert_eq!(to_f64(to_decimal(0.1) + to_decimal(0.2)), 0.3);
    }

    #[test]
    fn subtotal_multiplies_qty() {
        let items = vec![item(1000.0, 2), item(10.99, 3)];
        assert_eq!(to_f64(items_subtotal(&items)), 2032.97);
    }

    #[test]
    fn subtotal_of_empty_cart_is_zero() {
        assert_eq!(items_subtotal(&[]), Decimal::ZERO);
    }
}
