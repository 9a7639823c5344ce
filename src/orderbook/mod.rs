//! Crit-bit order-book slab: decoding and read-only queries.
//!
//! ## Architecture
//!
//! A slab is one account's bytes: a 65-byte header followed by an array of
//! fixed-size slots. Slots hold the nodes of a crit-bit tree keyed by `u128`
//! order keys, plus free-list entries for reclaimed slots.
//!
//! - **Header**: root pointer, leaf count, free list, market address
//! - **Node decoder**: one slot + tag byte → [`Node`]
//! - **Slab**: pointer → node resolution over an immutable snapshot
//! - **Traversal**: explicit-stack walk yielding leaves in key order
//! - **Queries**: lookup, min/max, L2 depth, top-N
//!
//! ## Performance
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | Lookup | O(depth) |
//! | Min / Max | O(depth) |
//! | Top N | O(n + depth) |
//! | L2 depth | O(orders in the returned levels) |
//! | Full traversal | O(leaf_count) |
//!
//! Nothing is decoded ahead of use: a query stops decoding as soon as it has
//! its answer.
//!
//! ## Example
//!
//! ```
//! use critbit_slab::orderbook::{Slab, SlabBuilder};
//! use critbit_slab::types::{price::make_key, RawPrice, Side};
//!
//! let mut builder = SlabBuilder::new(0);
//! builder.insert(make_key(100, 1), vec![], 5).unwrap();
//! builder.insert(make_key(101, 2), vec![], 7).unwrap();
//!
//! let bids = Slab::new(builder.encode().unwrap(), 0).unwrap();
//!
//! let best = bids.best(Side::Bid).unwrap().unwrap();
//! assert_eq!(best.price_ticks(), 101);
//!
//! let depth = bids.l2_depth(10, Side::Bid, &RawPrice).unwrap();
//! assert_eq!(depth.len(), 2);
//! ```

pub mod header;
pub mod node;
pub mod slab;
pub mod traverse;
pub mod query;
pub mod level;
pub mod builder;

pub use header::{SlabHeader, SLAB_HEADER_LEN};
pub use node::{FreeNode, InnerNode, LeafNode, Node};
pub use self::slab::{FreeList, Slab};
pub use traverse::{Leaves, MAX_DEPTH};
pub use level::PriceLevel;
pub use builder::SlabBuilder;
