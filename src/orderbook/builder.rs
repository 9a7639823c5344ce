//! Fixture encoder: builds well-formed slab buffers.
//!
//! ## Design
//!
//! `SlabBuilder` grows a crit-bit tree inside a [`slab::Slab`] arena and then
//! writes it out in the on-chain layout. Arena keys become slot indices, so
//! the tree is encoded exactly as laid out in memory.
//!
//! Per slab docs (https://docs.rs/slab/0.4.11), keys handed out by
//! `insert` are sequential while nothing is removed. The builder never
//! removes, which keeps slot indices dense and the root in slot 0.
//!
//! ## Insertion
//!
//! Inserting walks down from the root while the new key shares at least the
//! node's prefix, then splits in place: the node found is moved to a fresh
//! slot and its old slot becomes the new inner node. Parents keep pointing at
//! the same slot, so no back-pointers are needed. Inserting an existing key
//! replaces that leaf.
//!
//! The builder writes fresh buffers only; it never touches a decoded
//! [`Slab`](crate::orderbook::Slab).

use slab::Slab as Arena;
use tracing::debug;

use crate::error::{Result, SlabError};
use crate::orderbook::header::SlabHeader;
use crate::orderbook::node::{
    encode_node, slot_size, FreeNode, InnerNode, LeafNode, Node, TAG_FREE, TAG_LAST_FREE,
};
use crate::orderbook::Slab;

/// Node as held in the arena: child pointers are arena keys
#[derive(Debug, Clone)]
enum ArenaNode {
    Inner {
        prefix_len: u32,
        key: u128,
        children: [usize; 2],
    },
    Leaf(LeafNode),
}

/// Builds slab buffers from a set of orders.
///
/// # Example
///
/// ```
/// use critbit_slab::config::AccountTag;
/// use critbit_slab::orderbook::SlabBuilder;
///
/// let mut builder = SlabBuilder::new(4)
///     .account_tag(AccountTag::Bids.to_u8())
///     .free_slots(2);
/// builder.insert(10, vec![0; 4], 100).unwrap();
/// builder.insert(20, vec![0; 4], 200).unwrap();
///
/// let slab = builder.build().unwrap();
/// assert_eq!(slab.len(), 2);
/// assert_eq!(slab.header().free_list_len, 2);
/// ```
#[derive(Debug, Clone)]
pub struct SlabBuilder {
    callback_info_len: usize,
    account_tag: u8,
    market_address: [u8; 32],
    nodes: Arena<ArenaNode>,
    root: Option<usize>,
    leaf_count: u64,
    free_slots: usize,
    spare_slots: usize,
}

impl SlabBuilder {
    /// Create an empty builder
    pub fn new(callback_info_len: usize) -> Self {
        Self::with_capacity(callback_info_len, 0)
    }

    /// Create a builder with room for `order_capacity` orders
    /// (`2n - 1` nodes) before the arena reallocates
    pub fn with_capacity(callback_info_len: usize, order_capacity: usize) -> Self {
        Self {
            callback_info_len,
            account_tag: 0,
            market_address: [0u8; 32],
            nodes: Arena::with_capacity(order_capacity.saturating_mul(2)),
            root: None,
            leaf_count: 0,
            free_slots: 0,
            spare_slots: 0,
        }
    }

    /// Raw account tag written to the header
    pub fn account_tag(mut self, tag: u8) -> Self {
        self.account_tag = tag;
        self
    }

    /// Market address written to the header
    pub fn market_address(mut self, address: [u8; 32]) -> Self {
        self.market_address = address;
        self
    }

    /// Append `count` slots on the free list after the tree
    pub fn free_slots(mut self, count: usize) -> Self {
        self.free_slots = count;
        self
    }

    /// Append `count` never-used (zeroed) slots at the end
    pub fn spare_slots(mut self, count: usize) -> Self {
        self.spare_slots = count;
        self
    }

    /// Number of orders inserted
    #[inline]
    pub fn len(&self) -> u64 {
        self.leaf_count
    }

    /// True when no order has been inserted
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    /// Insert an order.
    ///
    /// # Returns
    ///
    /// The leaf previously stored under `key`, if any
    ///
    /// # Errors
    ///
    /// `Encoding` if `callback_info` does not have the configured length.
    pub fn insert(
        &mut self,
        key: u128,
        callback_info: Vec<u8>,
        asset_quantity: u64,
    ) -> Result<Option<LeafNode>> {
        if callback_info.len() != self.callback_info_len {
            return Err(SlabError::Encoding(format!(
                "callback info is {} bytes, market expects {}",
                callback_info.len(),
                self.callback_info_len
            )));
        }
        let leaf = LeafNode::new(key, callback_info, asset_quantity);

        let Some(mut current) = self.root else {
            let handle = self.nodes.insert(ArenaNode::Leaf(leaf));
            self.root = Some(handle);
            self.leaf_count = 1;
            return Ok(None);
        };

        loop {
            let (node_key, descend) = match &self.nodes[current] {
                ArenaNode::Leaf(existing) => (existing.key, None),
                ArenaNode::Inner {
                    prefix_len,
                    key: inner_key,
                    children,
                } => (*inner_key, Some((*prefix_len, *children))),
            };

            if descend.is_none() && node_key == key {
                let old = std::mem::replace(&mut self.nodes[current], ArenaNode::Leaf(leaf));
                return Ok(match old {
                    ArenaNode::Leaf(old_leaf) => Some(old_leaf),
                    ArenaNode::Inner { .. } => None,
                });
            }

            let shared_prefix_len = (node_key ^ key).leading_zeros();
            if let Some((prefix_len, children)) = descend {
                if shared_prefix_len >= prefix_len {
                    let bit = ((key >> (127 - prefix_len)) & 1) as usize;
                    current = children[bit];
                    continue;
                }
            }

            // Split: `current` becomes the inner node where the keys diverge
            let new_leaf_bit = ((key >> (127 - shared_prefix_len)) & 1) as usize;
            let moved_contents = std::mem::replace(
                &mut self.nodes[current],
                ArenaNode::Inner {
                    prefix_len: shared_prefix_len,
                    key,
                    children: [0; 2],
                },
            );
            let moved = self.nodes.insert(moved_contents);
            let new_leaf = self.nodes.insert(ArenaNode::Leaf(leaf));

            if let ArenaNode::Inner { children, .. } = &mut self.nodes[current] {
                children[new_leaf_bit] = new_leaf;
                children[1 - new_leaf_bit] = moved;
            }
            self.leaf_count += 1;
            return Ok(None);
        }
    }

    /// Write the slab buffer
    pub fn encode(&self) -> Result<Vec<u8>> {
        let size = slot_size(self.callback_info_len)?;
        let tree_slots = self.nodes.len();
        let total_slots = tree_slots + self.free_slots + self.spare_slots;

        let header = SlabHeader {
            account_tag: self.account_tag,
            bump_index: (tree_slots + self.free_slots) as u64,
            free_list_len: self.free_slots as u64,
            free_list_head: if self.free_slots > 0 {
                to_pointer(tree_slots)?
            } else {
                0
            },
            root_node: self.root.map(to_pointer).transpose()?.unwrap_or(0),
            leaf_count: self.leaf_count,
            market_address: self.market_address,
        };

        let mut bytes = header.encode()?;
        bytes.reserve(total_slots * size);

        for (position, (index, node)) in self.nodes.iter().enumerate() {
            debug_assert_eq!(position, index, "arena keys must stay dense");
            let node = match node {
                ArenaNode::Inner {
                    prefix_len,
                    key,
                    children,
                } => Node::Inner(InnerNode {
                    prefix_len: *prefix_len,
                    key: *key,
                    children: [to_pointer(children[0])?, to_pointer(children[1])?],
                }),
                ArenaNode::Leaf(leaf) => Node::Leaf(leaf.clone()),
            };
            bytes.extend_from_slice(&encode_node(&node, size)?);
        }

        for offset in 0..self.free_slots {
            let last = offset + 1 == self.free_slots;
            let free = FreeNode {
                next: if last { 0 } else { to_pointer(tree_slots + offset + 1)? },
                tag: if last { TAG_LAST_FREE } else { TAG_FREE },
            };
            bytes.extend_from_slice(&encode_node(&Node::Free(free), size)?);
        }

        bytes.resize(bytes.len() + self.spare_slots * size, 0);

        debug!(
            leaves = self.leaf_count,
            slots = total_slots,
            slot_size = size,
            "encoded slab"
        );
        Ok(bytes)
    }

    /// Encode and decode in one step
    pub fn build(&self) -> Result<Slab> {
        Slab::new(self.encode()?, self.callback_info_len)
    }
}

fn to_pointer(index: usize) -> Result<u32> {
    u32::try_from(index).map_err(|_| SlabError::Encoding(format!("slot index {index} overflows u32")))
}

// ============================================================================
// Unit Tests
// ============================================================================
