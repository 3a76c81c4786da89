//! Stock threshold logic
//!
//! Low-stock alerts are edge-triggered: they fire exactly when an
//! adjustment moves a product's stock from at-or-above the threshold
//! to below it. Stock lingering below the threshold must not keep
//! re-alerting the owner.

use serde::{Deserialize, Serialize};

/// Remaining stock below this fires a low-stock alert
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// How a stock level should be changed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StockAdjustment {
    /// Add to the current level (negative to decrement); the result
    /// is clamped at zero, never rejected
    Delta(i64),
    /// Replace the current level (clamped at zero)
    Absolute(i64),
}

/// Before/after stock levels of one atomic adjustment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockChange {
    pub before: i64,
    pub after: i64,
}

impl StockChange {
    /// True exactly when this adjustment crossed the low-stock threshold
    /// downward (edge trigger, not a level trigger)
    pub fn is_low_stock_edge(&self) -> bool {
        self.after < LOW_STOCK_THRESHOLD && self.before >= LOW_STOCK_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(before: i64, after: i64) -> StockChange {
        StockChange { before, after }
    }

    #[test]
    fn fires_once_per_downward_crossing() {
        // Stock sequence 10 → 6 → 4 → 3 → 6 → 2: alerts only at
        // 6→4 and 6→2.
        assert!(!change(10, 6).is_low_stock_edge());
        assert!(change(6, 4).is_low_stock_edge());
        assert!(!change(4, 3).is_low_stock_edge());
        assert!(!change(3, 6).is_low_stock_edge());
        assert!(change(6, 2).is_low_stock_edge());
    }

    #[test]
    fn crossing_straight_to_zero_fires() {
        assert!(change(10, 0).is_low_stock_edge());
    }

    #[test]
    fn already_low_does_not_refire() {
        assert!(!change(2, 1).is_low_stock_edge());
        assert!(!change(0, 0).is_low_stock_edge());
    }
}
