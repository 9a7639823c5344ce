//! # critbit-slab
//!
//! Read-only decoder and query engine for crit-bit order-book slabs.
//!
//! ## Architecture
//!
//! An exchange program persists each side of its order book as a flat byte
//! buffer (a "slab"): a fixed header followed by fixed-size slots holding the
//! nodes of a crit-bit tree. This crate reconstructs book state from such a
//! snapshot without re-running the program that wrote it:
//!
//! - **Types**: Side, key layout and price extraction
//! - **OrderBook**: header and node decoding, traversal and queries
//! - **Config**: per-market metadata (callback info length, tick size)
//!
//! ## Design Principles
//!
//! 1. **Read-only**: a [`Slab`] is an immutable snapshot; nothing mutates it
//! 2. **Lazy**: slots are decoded on demand, bounded queries stop early
//! 3. **Fail whole**: a query that meets a corrupt slot returns an error, never a partial answer
//! 4. **Synchronous**: no I/O, no async; fetching the bytes is the caller's job

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Core value types: Side, key layout, price extraction
pub mod types;

/// Slab decoding, traversal and queries
pub mod orderbook;

/// Market configuration and account tags
pub mod config;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use config::{AccountTag, MarketConfig};
pub use error::{Result, SlabError};
pub use orderbook::{LeafNode, Node, PriceLevel, Slab, SlabBuilder, SlabHeader};
pub use types::{PriceExtractor, RawPrice, ScaledPrice, Side};
