//! Key layout and price extraction.
//!
//! ## Overview
//!
//! A leaf key is a `u128` whose high 64 bits carry the price in ticks and
//! whose low 64 bits carry a sequence number. Converting a key to a price is
//! the job of a [`PriceExtractor`]; the query layer only needs prices to be
//! comparable for equality so it can merge orders into levels.
//!
//! Two extractors ship with the crate:
//!
//! - [`RawPrice`]: the tick count as a `u64`
//! - [`ScaledPrice`]: ticks multiplied by the market tick size, as a `Decimal`
//!
//! Any `Fn(u128) -> P` closure works as well.
//!
//! ## Examples
//!
//! ```
//! use critbit_slab::types::price::{make_key, price_ticks, ticks_to_decimal};
//! use rust_decimal::Decimal;
//!
//! let key = make_key(125, 7);
//! assert_eq!(price_ticks(key), 125);
//!
//! let tick = Decimal::new(1, 2); // 0.01
//! assert_eq!(ticks_to_decimal(125, tick).to_string(), "1.25");
//! ```

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

// ============================================================================
// Key helpers
// ============================================================================

/// Price in ticks: the high 64 bits of the key
#[inline]
pub fn price_ticks(key: u128) -> u64 {
    (key >> 64) as u64
}

/// Sequence number: the low 64 bits of the key
#[inline]
pub fn sequence(key: u128) -> u64 {
    key as u64
}

/// Build a key from a tick price and a sequence number
#[inline]
pub fn make_key(price_ticks: u64, sequence: u64) -> u128 {
    ((price_ticks as u128) << 64) | sequence as u128
}

// ============================================================================
// Price extraction
// ============================================================================

/// Maps a leaf key to a price unit.
///
/// Only equality is required: consecutive leaves with equal prices are merged
/// into one level by [`Slab::l2_depth`](crate::orderbook::Slab::l2_depth).
pub trait PriceExtractor {
    /// Price unit produced by this extractor
    type Price: PartialEq + Copy;

    /// Price of the order identified by `key`
    fn price(&self, key: u128) -> Self::Price;
}

impl<F, P> PriceExtractor for F
where
    F: Fn(u128) -> P,
    P: PartialEq + Copy,
{
    type Price = P;

    #[inline]
    fn price(&self, key: u128) -> P {
        self(key)
    }
}

/// Price in raw ticks (high 64 bits of the key)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawPrice;

impl PriceExtractor for RawPrice {
    type Price = u64;

    #[inline]
    fn price(&self, key: u128) -> u64 {
        price_ticks(key)
    }
}

/// Price as a decimal: ticks multiplied by the market tick size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledPrice {
    /// Quote units per tick
    pub tick_size: Decimal,
}

impl ScaledPrice {
    /// Create an extractor for the given tick size
    pub fn new(tick_size: Decimal) -> Self {
        Self { tick_size }
    }
}

impl PriceExtractor for ScaledPrice {
    type Price = Decimal;

    #[inline]
    fn price(&self, key: u128) -> Decimal {
        ticks_to_decimal(price_ticks(key), self.tick_size)
    }
}

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert a tick count to a decimal price
///
/// Saturates at `Decimal::MAX` if the product does not fit.
pub fn ticks_to_decimal(ticks: u64, tick_size: Decimal) -> Decimal {
    Decimal::from(ticks)
        .checked_mul(tick_size)
        .unwrap_or(Decimal::MAX)
}

/// Convert a decimal price to a whole number of ticks
///
/// # Returns
///
/// * `Some(u64)` - The tick count (rounded to the nearest tick)
/// * `None` - If the price is negative, the tick size is zero, or the value is out of range
///
/// # Example
///
/// ```
/// use critbit_slab::types::price::decimal_to_ticks;
/// use rust_decimal::Decimal;
///
/// let tick = Decimal::new(5, 1); // 0.5
/// assert_eq!(decimal_to_ticks(Decimal::new(25, 1), tick), Some(5));
/// ```
pub fn decimal_to_ticks(price: Decimal, tick_size: Decimal) -> Option<u64> {
    if price.is_sign_negative() || tick_size.is_zero() {
        return None;
    }
    price.checked_div(tick_size)?.round_dp(0).to_u64()
}

/// Parse a decimal string into ticks
///
/// ```
/// use critbit_slab::types::price::parse_ticks;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_ticks("1.25", Decimal::new(1, 2)), Some(125));
/// assert_eq!(parse_ticks("abc", Decimal::new(1, 2)), None);
/// ```
pub fn parse_ticks(s: &str, tick_size: Decimal) -> Option<u64> {
    let decimal = Decimal::from_str(s).ok()?;
    decimal_to_ticks(decimal, tick_size)
}

/// Human-readable price with trailing zeros trimmed
pub fn format_ticks(ticks: u64, tick_size: Decimal) -> String {
    ticks_to_decimal(ticks, tick_size).normalize().to_string()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let key = make_key(42, 9);
        assert_eq!(price_ticks(key), 42);
        assert_eq!(sequence(key), 9);
        assert_eq!(key, (42u128 << 64) | 9);

        let max = make_key(u64::MAX, u64::MAX);
        assert_eq!(max, u128::MAX);
    }

    #[test]
    fn test_raw_price() {
        assert_eq!(RawPrice.price(make_key(10, 3)), 10);
        assert_eq!(RawPrice.price(make_key(10, 4)), RawPrice.price(make_key(10, 0)));
    }

    #[test]
    fn test_scaled_price() {
        let extractor = ScaledPrice::new(Decimal::new(25, 2)); // 0.25
        assert_eq!(extractor.price(make_key(4, 1)), Decimal::ONE);
        assert_eq!(extractor.price(make_key(10, 1)), Decimal::new(250, 2));
    }

    #[test]
    fn test_closure_extractor() {
        let coarse = |key: u128| price_ticks(key) / 10;
        assert_eq!(coarse.price(make_key(105, 0)), 10);
        assert_eq!(coarse.price(make_key(109, 0)), 10);
    }

    #[test]
    fn test_ticks_roundtrip() {
        let tick = Decimal::new(1, 2);
        for ticks in [0u64, 1, 125, 5_000_000] {
            let price = ticks_to_decimal(ticks, tick);
            assert_eq!(decimal_to_ticks(price, tick), Some(ticks));
        }
    }

    #[test]
    fn test_decimal_to_ticks_edge_cases() {
        let tick = Decimal::new(1, 2);
        assert_eq!(decimal_to_ticks(Decimal::new(-1, 0), tick), None);
        assert_eq!(decimal_to_ticks(Decimal::ONE, Decimal::ZERO), None);
        // Rounds to the nearest tick
        assert_eq!(decimal_to_ticks(Decimal::new(1256, 3), tick), Some(126));
    }

    #[test]
    fn test_ticks_saturate() {
        let huge_tick = Decimal::MAX;
        assert_eq!(ticks_to_decimal(u64::MAX, huge_tick), Decimal::MAX);
    }

    #[test]
    fn test_format_ticks() {
        let tick = Decimal::new(5, 1);
        assert_eq!(format_ticks(4, tick), "2");
        assert_eq!(format_ticks(3, tick), "1.5");
        assert_eq!(parse_ticks("", tick), None);
    }
}
