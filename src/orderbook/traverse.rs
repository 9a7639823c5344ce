//! Ordered, lazy walk over the leaves of the crit-bit tree.
//!
//! The walk keeps an explicit stack of `(pointer, depth)` pairs instead of
//! recursing, and decodes a slot only when the consumer asks for the next
//! leaf. A bounded query that stops after `n` leaves therefore touches only
//! the slots on the way to those `n` leaves.
//!
//! Only inner and leaf nodes may be reachable from the root. Anything else
//! means the buffer disagrees with its own header, and the walk ends with
//! `StructuralCorruption`.

use std::iter::FusedIterator;

use tracing::warn;

use crate::error::{Result, SlabError};
use crate::orderbook::node::{LeafNode, Node};
use crate::orderbook::Slab;

/// Deepest level a leaf can sit at: one inner node per key bit.
pub const MAX_DEPTH: u32 = 128;

/// Lazy leaf iterator. See [`Slab::traverse`].
///
/// Yields leaves in ascending or descending key order. After the first error
/// the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct Leaves<'a> {
    slab: &'a Slab,
    ascending: bool,
    stack: Vec<(u32, u32)>,
    /// Slots decoded so far
    visited: u64,
    /// A well-formed tree has exactly `2 * leaf_count - 1` nodes
    max_visits: u64,
    yielded: u64,
    failed: bool,
}

impl<'a> Leaves<'a> {
    pub(crate) fn new(slab: &'a Slab, ascending: bool) -> Self {
        let leaf_count = slab.header().leaf_count;
        let mut stack = Vec::new();
        if leaf_count > 0 {
            stack.push((slab.header().root_node, 0));
        }
        Self {
            slab,
            ascending,
            stack,
            visited: 0,
            max_visits: leaf_count.saturating_mul(2).saturating_sub(1),
            yielded: 0,
            failed: false,
        }
    }

    /// Key order of this walk
    pub fn ascending(&self) -> bool {
        self.ascending
    }

    fn fail(&mut self, err: SlabError) -> Option<Result<LeafNode>> {
        warn!(error = %err, "traversal aborted");
        self.failed = true;
        self.stack.clear();
        Some(Err(err))
    }
}

impl Iterator for Leaves<'_> {
    type Item = Result<LeafNode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        while let Some((pointer, depth)) = self.stack.pop() {
            if depth > MAX_DEPTH {
                return self.fail(SlabError::corruption(format!(
                    "depth bound {MAX_DEPTH} exceeded at slot {pointer}"
                )));
            }
            self.visited += 1;
            if self.visited > self.max_visits {
                return self.fail(SlabError::corruption(format!(
                    "visited more than {} slots for {} leaves",
                    self.max_visits,
                    self.slab.header().leaf_count
                )));
            }

            match self.slab.node_at(pointer) {
                Ok(Node::Leaf(leaf)) => {
                    self.yielded += 1;
                    return Some(Ok(leaf));
                }
                Ok(Node::Inner(inner)) => {
                    let [low, high] = inner.children;
                    // Pushed last pops first
                    if self.ascending {
                        self.stack.push((high, depth + 1));
                        self.stack.push((low, depth + 1));
                    } else {
                        self.stack.push((low, depth + 1));
                        self.stack.push((high, depth + 1));
                    }
                }
                Ok(other) => {
                    return self.fail(SlabError::corruption(format!(
                        "{} slot {pointer} reachable from root",
                        other.kind()
                    )));
                }
                Err(e) => {
                    return self.fail(SlabError::corruption(format!(
                        "slot {pointer} reachable from root: {e}"
                    )));
                }
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = self.slab.header().leaf_count.saturating_sub(self.yielded);
        (0, usize::try_from(remaining).ok())
    }
}

impl FusedIterator for Leaves<'_> {}

impl Slab {
    /// Walk every leaf in key order.
    ///
    /// Each call returns an independent cursor. An empty tree
    /// (`leaf_count == 0`) yields nothing and decodes nothing, whatever
    /// slot 0 contains.
    ///
    /// # Example
    ///
    /// ```
    /// use critbit_slab::orderbook::{Slab, SlabBuilder};
    ///
    /// let mut builder = SlabBuilder::new(0);
    /// for key in [3u128, 1, 2] {
    ///     builder.insert(key, vec![], 10).unwrap();
    /// }
    /// let slab = Slab::new(builder.encode().unwrap(), 0).unwrap();
    ///
    /// let keys: Vec<u128> = slab
    ///     .traverse(true)
    ///     .map(|leaf| leaf.map(|l| l.key))
    ///     .collect::<Result<_, _>>()
    ///     .unwrap();
    /// assert_eq!(keys, vec![1, 2, 3]);
    /// ```
    pub fn traverse(&self, ascending: bool) -> Leaves<'_> {
        Leaves::new(self, ascending)
    }

    /// Collect every leaf in key order, failing if any slot is bad
    pub fn leaves(&self, ascending: bool) -> Result<Vec<LeafNode>> {
        self.traverse(ascending).collect()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
