//! Core value types shared by the decoder and the query layer
//!
//! ## Types
//!
//! - [`Side`]: Bid or Ask; decides the read direction of a query
//! - [`PriceExtractor`]: maps a leaf key to a price unit
//! - [`RawPrice`] / [`ScaledPrice`]: the stock extractors
//!
//! ## Key Layout
//!
//! Keys are `u128`: the price in ticks occupies the high 64 bits and a
//! sequence number the low 64 bits, so key order is price order first.

mod side;
pub mod price;

// Re-export all types at module level
pub use side::Side;
pub use price::{PriceExtractor, RawPrice, ScaledPrice};
