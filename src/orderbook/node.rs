//! Slot decoding.
//!
//! ## Design
//!
//! Every slot in the slab starts with a one-byte discriminant followed by a
//! payload whose shape depends on the tag:
//!
//! | tag | node          | payload                                          |
//! |-----|---------------|--------------------------------------------------|
//! | 0   | Uninitialized | none                                             |
//! | 1   | Inner         | prefix_len u32, key u128, children [u32; 2]      |
//! | 2   | Leaf          | key u128, callback info, asset_quantity u64      |
//! | 3   | Free          | next u32                                         |
//! | 4   | Free (last)   | next u32                                         |
//!
//! Slots are padded to a common size; padding is ignored on decode.
//!
//! ## Slot Size
//!
//! A leaf is the largest record, so the slot size is the leaf size including
//! its tag, floored at 32 bytes:
//!
//! ```text
//! slot_size = max(callback_info_len + 8 + 16 + 1, 32)
//! ```

use ssz_rs::prelude::*;

use crate::error::{Result as SlabResult, SlabError};
use crate::types::price;

/// Discriminant of a never-written slot
pub const TAG_UNINITIALIZED: u8 = 0;
/// Discriminant of an inner node
pub const TAG_INNER: u8 = 1;
/// Discriminant of a leaf node
pub const TAG_LEAF: u8 = 2;
/// Discriminant of a free slot with a successor
pub const TAG_FREE: u8 = 3;
/// Discriminant of the last free slot
pub const TAG_LAST_FREE: u8 = 4;

/// Inner payload: prefix_len (4) + key (16) + children (2 * 4)
pub const INNER_PAYLOAD_LEN: usize = 28;
/// Free payload: next (4)
pub const FREE_PAYLOAD_LEN: usize = 4;
/// Smallest slot the format allows
pub const MIN_SLOT_SIZE: usize = 32;
/// Largest callback info length accepted; an account never exceeds 10 MiB
pub const MAX_CALLBACK_INFO_LEN: usize = 10 * 1024 * 1024;

const KEY_LEN: usize = 16;
const QUANTITY_LEN: usize = 8;

/// Slot size for a given callback info length
///
/// # Errors
///
/// `Config` if `callback_info_len` exceeds [`MAX_CALLBACK_INFO_LEN`].
pub fn slot_size(callback_info_len: usize) -> SlabResult<usize> {
    if callback_info_len > MAX_CALLBACK_INFO_LEN {
        return Err(SlabError::Config(format!(
            "callback_info_len {callback_info_len} exceeds {MAX_CALLBACK_INFO_LEN}"
        )));
    }
    callback_info_len
        .checked_add(QUANTITY_LEN + KEY_LEN + 1)
        .map(|size| size.max(MIN_SLOT_SIZE))
        .ok_or_else(|| {
            SlabError::Config(format!("callback_info_len {callback_info_len} overflows slot size"))
        })
}

// ============================================================================
// Node payloads
// ============================================================================

/// Internal crit-bit node.
///
/// All keys reachable through `children[0]` are strictly less than all keys
/// reachable through `children[1]`; they share their first `prefix_len` bits.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct InnerNode {
    /// Number of leading bits shared by every key below this node
    pub prefix_len: u32,

    /// A key from the subtree (carries the shared prefix)
    pub key: u128,

    /// Slot indices of the low and high subtrees
    pub children: [u32; 2],
}

impl InnerNode {
    /// Which child a search for `search_key` descends into.
    ///
    /// Inspects bit `127 - prefix_len` of the key (bit 127 is the most
    /// significant).
    ///
    /// # Errors
    ///
    /// `StructuralCorruption` if `prefix_len` does not name a bit of a u128.
    pub fn crit_bit(&self, search_key: u128) -> SlabResult<bool> {
        if self.prefix_len > 127 {
            return Err(SlabError::corruption(format!(
                "inner node prefix_len {} exceeds key width",
                self.prefix_len
            )));
        }
        Ok((search_key >> (127 - self.prefix_len)) & 1 == 1)
    }

    /// Child pointer a search for `search_key` descends into
    pub fn walk_down(&self, search_key: u128) -> SlabResult<u32> {
        Ok(self.children[self.crit_bit(search_key)? as usize])
    }
}

/// A resting order.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct LeafNode {
    /// Order key: price in the high 64 bits, sequence number in the low 64
    pub key: u128,

    /// Opaque per-order metadata (length fixed per market)
    pub callback_info: Vec<u8>,

    /// Remaining quantity of the order
    pub asset_quantity: u64,
}

impl LeafNode {
    /// Create a leaf
    pub fn new(key: u128, callback_info: Vec<u8>, asset_quantity: u64) -> Self {
        Self {
            key,
            callback_info,
            asset_quantity,
        }
    }

    /// Price in ticks (high 64 bits of the key)
    #[inline]
    pub fn price_ticks(&self) -> u64 {
        price::price_ticks(self.key)
    }

    /// Sequence number (low 64 bits of the key)
    #[inline]
    pub fn sequence(&self) -> u64 {
        price::sequence(self.key)
    }
}

/// A reclaimed slot on the free list.
///
/// Tags 3 and 4 share this shape; the original tag is kept so the slot can be
/// re-encoded exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeNode {
    /// Next slot on the free list
    pub next: u32,

    /// Discriminant the slot was decoded from (3 or 4)
    pub tag: u8,
}

impl FreeNode {
    /// True for the tail variant (tag 4)
    #[inline]
    pub fn is_last(&self) -> bool {
        self.tag == TAG_LAST_FREE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
struct FreeWire {
    next: u32,
}

// ============================================================================
// Node
// ============================================================================

/// One decoded slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Tag 0. Never produced by [`decode`], which rejects it.
    Uninitialized,
    /// Tag 1
    Inner(InnerNode),
    /// Tag 2
    Leaf(LeafNode),
    /// Tags 3 and 4
    Free(FreeNode),
}

impl Node {
    /// Discriminant this node encodes to
    pub fn tag(&self) -> u8 {
        match self {
            Node::Uninitialized => TAG_UNINITIALIZED,
            Node::Inner(_) => TAG_INNER,
            Node::Leaf(_) => TAG_LEAF,
            Node::Free(free) => free.tag,
        }
    }

    /// Key of an inner or leaf node
    pub fn key(&self) -> Option<u128> {
        match self {
            Node::Inner(inner) => Some(inner.key),
            Node::Leaf(leaf) => Some(leaf.key),
            _ => None,
        }
    }

    /// Short variant name for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Uninitialized => "uninitialized",
            Node::Inner(_) => "inner",
            Node::Leaf(_) => "leaf",
            Node::Free(_) => "free",
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

fn field(payload: &[u8], start: usize, len: usize) -> SlabResult<&[u8]> {
    let end = start.checked_add(len).unwrap_or(usize::MAX);
    payload
        .get(start..end)
        .ok_or_else(|| SlabError::underrun(end, payload.len()))
}

/// Decode one slot payload.
///
/// `payload` is the slot with its tag byte stripped. Trailing padding beyond
/// what the variant needs is ignored.
///
/// # Errors
///
/// - `UninitializedSlot` for tag 0
/// - `UnrecognizedNodeTag` for tags above 4
/// - `BufferUnderrun` if `payload` is shorter than the variant requires
pub fn decode(tag: u8, payload: &[u8], callback_info_len: usize) -> SlabResult<Node> {
    match tag {
        TAG_UNINITIALIZED => Err(SlabError::UninitializedSlot { pointer: None }),
        TAG_INNER => {
            let bytes = field(payload, 0, INNER_PAYLOAD_LEN)?;
            let inner = ssz_rs::deserialize::<InnerNode>(bytes)
                .map_err(|e| SlabError::corruption(format!("inner decode: {e:?}")))?;
            Ok(Node::Inner(inner))
        }
        TAG_LEAF => {
            let key_bytes = field(payload, 0, KEY_LEN)?;
            let callback_info = field(payload, KEY_LEN, callback_info_len)?;
            let quantity_bytes = field(payload, KEY_LEN + callback_info_len, QUANTITY_LEN)?;

            let key = ssz_rs::deserialize::<u128>(key_bytes)
                .map_err(|e| SlabError::corruption(format!("leaf key decode: {e:?}")))?;
            let asset_quantity = ssz_rs::deserialize::<u64>(quantity_bytes)
                .map_err(|e| SlabError::corruption(format!("leaf quantity decode: {e:?}")))?;

            Ok(Node::Leaf(LeafNode {
                key,
                callback_info: callback_info.to_vec(),
                asset_quantity,
            }))
        }
        TAG_FREE | TAG_LAST_FREE => {
            let bytes = field(payload, 0, FREE_PAYLOAD_LEN)?;
            let wire = ssz_rs::deserialize::<FreeWire>(bytes)
                .map_err(|e| SlabError::corruption(format!("free decode: {e:?}")))?;
            Ok(Node::Free(FreeNode {
                next: wire.next,
                tag,
            }))
        }
        other => Err(SlabError::UnrecognizedNodeTag { tag: other }),
    }
}

/// Decode a whole slot (tag byte included)
pub fn decode_slot(slot: &[u8], callback_info_len: usize) -> SlabResult<Node> {
    let (&tag, payload) = slot
        .split_first()
        .ok_or_else(|| SlabError::underrun(1, 0))?;
    decode(tag, payload, callback_info_len)
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a node into a zero-padded slot of `slot_size` bytes.
///
/// Free nodes keep the tag they were decoded from.
pub fn encode_node(node: &Node, slot_size: usize) -> SlabResult<Vec<u8>> {
    let mut slot = vec![0u8; slot_size];
    let payload = match node {
        Node::Uninitialized => Vec::new(),
        Node::Inner(inner) => ssz_rs::serialize(inner)
            .map_err(|e| SlabError::Encoding(format!("inner: {e:?}")))?,
        Node::Leaf(leaf) => {
            let mut bytes = Vec::with_capacity(KEY_LEN + leaf.callback_info.len() + QUANTITY_LEN);
            bytes.extend_from_slice(&leaf.key.to_le_bytes());
            bytes.extend_from_slice(&leaf.callback_info);
            bytes.extend_from_slice(&leaf.asset_quantity.to_le_bytes());
            bytes
        }
        Node::Free(free) => {
            if free.tag != TAG_FREE && free.tag != TAG_LAST_FREE {
                return Err(SlabError::Encoding(format!("free node with tag {}", free.tag)));
            }
            ssz_rs::serialize(&FreeWire { next: free.next })
                .map_err(|e| SlabError::Encoding(format!("free: {e:?}")))?
        }
    };

    if payload.len() + 1 > slot_size {
        return Err(SlabError::Encoding(format!(
            "{} node needs {} bytes, slot holds {}",
            node.kind(),
            payload.len() + 1,
            slot_size
        )));
    }

    slot[0] = node.tag();
    slot[1..1 + payload.len()].copy_from_slice(&payload);
    Ok(slot)
}

// ============================================================================
// Unit Tests
// ============================================================================
