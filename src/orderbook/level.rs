//! Aggregated price level for L2 depth.
//!
//! ## Design
//!
//! A `PriceLevel` sums every order at one price. Levels are produced by
//! [`Slab::l2_depth`](crate::orderbook::Slab::l2_depth) in best-price-first
//! order and are plain values: they hold no reference back into the slab.

use serde::{Deserialize, Serialize};

/// One price level of an aggregated (L2) book side.
///
/// `P` is whatever price unit the caller's extractor produces: raw ticks,
/// a decimal price, or a coarser bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel<P> {
    /// Price for this level
    pub price: P,

    /// Total quantity resting at this level
    pub quantity: u64,

    /// Number of orders merged into this level
    pub order_count: usize,
}

impl<P> PriceLevel<P> {
    /// Open a level with its first order
    pub fn new(price: P, quantity: u64) -> Self {
        Self {
            price,
            quantity,
            order_count: 1,
        }
    }

    /// Merge another order at the same price
    #[inline]
    pub fn add_order(&mut self, quantity: u64) {
        self.quantity = self.quantity.saturating_add(quantity);
        self.order_count += 1;
    }

    /// `(price, quantity)` pair, the shape most feeds publish
    pub fn into_pair(self) -> (P, u64) {
        (self.price, self.quantity)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
