//! Queries over a slab: point lookup, min/max, L2 depth and top-N.
//!
//! ## Read Direction
//!
//! Side-aware queries start from the best price of the side:
//!
//! | Side | Key order  | First leaf     |
//! |------|------------|----------------|
//! | Ask  | ascending  | lowest price   |
//! | Bid  | descending | highest price  |
//!
//! ## Complexity
//!
//! | Query            | Slots decoded                     |
//! |------------------|-----------------------------------|
//! | `lookup`         | O(depth)                          |
//! | `find_min/max`   | O(depth)                          |
//! | `top_n(n)`       | O(n + depth)                      |
//! | `l2_depth(d)`    | orders in the first d levels + 1  |

use std::iter::Take;

use tracing::{trace, warn};

use crate::error::{Result, SlabError};
use crate::orderbook::level::PriceLevel;
use crate::orderbook::node::{InnerNode, LeafNode, Node};
use crate::orderbook::traverse::{Leaves, MAX_DEPTH};
use crate::orderbook::Slab;
use crate::types::{PriceExtractor, Side};

impl Slab {
    /// Follow child pointers from the root until a leaf is reached.
    ///
    /// `choose` picks the next pointer at each inner node. Reaching anything
    /// other than an inner or leaf node, or exceeding the depth bound, is
    /// `StructuralCorruption`.
    fn descend<F>(&self, mut choose: F) -> Result<Option<LeafNode>>
    where
        F: FnMut(&InnerNode) -> Result<u32>,
    {
        if self.is_empty() {
            return Ok(None);
        }

        let mut pointer = self.header().root_node;
        for depth in 0..=MAX_DEPTH {
            match self.node_at(pointer) {
                Ok(Node::Leaf(leaf)) => {
                    trace!(pointer, depth, "descent reached leaf");
                    return Ok(Some(leaf));
                }
                Ok(Node::Inner(inner)) => pointer = choose(&inner)?,
                Ok(other) => {
                    let err = SlabError::corruption(format!(
                        "{} slot {pointer} reachable from root",
                        other.kind()
                    ));
                    warn!(error = %err, "descent aborted");
                    return Err(err);
                }
                Err(e) => {
                    let err = SlabError::corruption(format!(
                        "slot {pointer} reachable from root: {e}"
                    ));
                    warn!(error = %err, "descent aborted");
                    return Err(err);
                }
            }
        }

        let err = SlabError::corruption(format!("depth bound {MAX_DEPTH} exceeded"));
        warn!(error = %err, "descent aborted");
        Err(err)
    }

    // ========================================================================
    // Point lookup
    // ========================================================================

    /// Crit-bit lookup.
    ///
    /// At each inner node, bit `127 - prefix_len` of `key` selects the child.
    /// The first leaf reached is returned. This is the leaf sharing the longest
    /// common prefix with `key`, which is not necessarily an exact match:
    /// compare `leaf.key` when that matters, or use [`Slab::find_exact`].
    ///
    /// Returns `Ok(None)` only for an empty tree.
    pub fn lookup(&self, key: u128) -> Result<Option<LeafNode>> {
        self.descend(|inner| inner.walk_down(key))
    }

    /// Lookup that only returns a leaf whose key equals `key`
    pub fn find_exact(&self, key: u128) -> Result<Option<LeafNode>> {
        Ok(self.lookup(key)?.filter(|leaf| leaf.key == key))
    }

    // ========================================================================
    // Min / Max
    // ========================================================================

    /// Smallest or largest leaf.
    ///
    /// Descends through `children[1]` for the maximum and `children[0]` for
    /// the minimum. A chosen child pointer equal to 0 is treated as absent and
    /// the sibling is followed instead, matching the encoder this format comes
    /// from, which never places slot 0 below the root.
    pub fn min_max(&self, want_max: bool) -> Result<Option<LeafNode>> {
        let preferred = want_max as usize;
        self.descend(|inner| {
            let child = inner.children[preferred];
            Ok(if child == 0 {
                inner.children[1 - preferred]
            } else {
                child
            })
        })
    }

    /// Leaf with the smallest key
    #[inline]
    pub fn find_min(&self) -> Result<Option<LeafNode>> {
        self.min_max(false)
    }

    /// Leaf with the largest key
    #[inline]
    pub fn find_max(&self) -> Result<Option<LeafNode>> {
        self.min_max(true)
    }

    /// Best order for a side: lowest ask or highest bid
    pub fn best(&self, side: Side) -> Result<Option<LeafNode>> {
        self.min_max(!side.ascending())
    }

    // ========================================================================
    // Aggregated and bounded views
    // ========================================================================

    /// Aggregate leaves into at most `depth` price levels, best price first.
    ///
    /// Leaves are read in the side's order and priced with `extractor`.
    /// A leaf priced equal to the last level is merged into it; otherwise a
    /// new level is opened, unless `depth` levels already exist, in which case
    /// the walk stops without decoding further.
    ///
    /// # Example
    ///
    /// ```
    /// use critbit_slab::orderbook::{Slab, SlabBuilder};
    /// use critbit_slab::types::{price::make_key, RawPrice, Side};
    ///
    /// let mut builder = SlabBuilder::new(0);
    /// builder.insert(make_key(101, 0), vec![], 5).unwrap();
    /// builder.insert(make_key(100, 1), vec![], 2).unwrap();
    /// builder.insert(make_key(100, 2), vec![], 3).unwrap();
    /// let asks = Slab::new(builder.encode().unwrap(), 0).unwrap();
    ///
    /// let levels = asks.l2_depth(1, Side::Ask, &RawPrice).unwrap();
    /// assert_eq!(levels.len(), 1);
    /// assert_eq!(levels[0].into_pair(), (100, 5));
    /// ```
    pub fn l2_depth<E>(
        &self,
        depth: usize,
        side: Side,
        extractor: &E,
    ) -> Result<Vec<PriceLevel<E::Price>>>
    where
        E: PriceExtractor,
    {
        let mut levels: Vec<PriceLevel<E::Price>> = Vec::new();
        if depth == 0 {
            return Ok(levels);
        }

        for leaf in self.traverse(side.ascending()) {
            let leaf = leaf?;
            let price = extractor.price(leaf.key);
            match levels.last_mut() {
                Some(level) if level.price == price => level.add_order(leaf.asset_quantity),
                _ => {
                    if levels.len() == depth {
                        break;
                    }
                    levels.push(PriceLevel::new(price, leaf.asset_quantity));
                }
            }
        }

        trace!(%side, depth, levels = levels.len(), "aggregated l2 depth");
        Ok(levels)
    }

    /// Up to `max_count` raw leaves in the side's order, best first.
    ///
    /// Lazy: nothing past the `max_count`-th leaf is decoded.
    pub fn top_n(&self, max_count: usize, side: Side) -> Take<Leaves<'_>> {
        self.traverse(side.ascending()).take(max_count)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
