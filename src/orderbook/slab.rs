//! Slab snapshot: header plus the raw slot array.
//!
//! ## Memory Model
//!
//! A [`Slab`] owns one immutable copy of the account bytes. Nodes are never
//! materialized up front; [`Slab::node_at`] decodes a single slot on demand,
//! so a query pays only for the slots it actually visits. A fresh on-chain
//! state means constructing a new `Slab` from a newly fetched buffer.
//!
//! ## Addressing
//!
//! Slot indices are plain integers into the slot array. Slot `i` occupies
//!
//! ```text
//! [65 + i * slot_size, 65 + (i + 1) * slot_size)
//! ```
//!
//! Index 0 is a valid slot, not a null pointer: emptiness is decided by
//! `leaf_count` alone.

use std::iter::FusedIterator;

use tracing::{debug, trace, warn};

use crate::config::MarketConfig;
use crate::error::{Result, SlabError};
use crate::orderbook::header::{SlabHeader, SLAB_HEADER_LEN};
use crate::orderbook::node::{self, FreeNode, Node};

/// Read-only view over one slab snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slab {
    /// Decoded header
    header: SlabHeader,

    /// Full account bytes, header included
    buffer: Vec<u8>,

    /// Per-market callback info length (not stored in the slab)
    callback_info_len: usize,

    /// Derived from `callback_info_len`
    slot_size: usize,
}

impl Slab {
    /// Build a slab from a buffer snapshot and the market's callback info length.
    ///
    /// Only the header is decoded here.
    ///
    /// # Errors
    ///
    /// - `BufferUnderrun` if the buffer cannot hold the 65-byte header
    /// - `Config` if `callback_info_len` is too large to describe a slot
    ///
    /// # Example
    ///
    /// ```
    /// use critbit_slab::orderbook::{Slab, SlabBuilder};
    ///
    /// let bytes = SlabBuilder::new(0).encode().unwrap();
    /// let slab = Slab::new(bytes, 0).unwrap();
    ///
    /// assert!(slab.is_empty());
    /// ```
    pub fn new(buffer: impl Into<Vec<u8>>, callback_info_len: usize) -> Result<Self> {
        let buffer = buffer.into();
        let header = SlabHeader::parse(&buffer)?;
        let slot_size = node::slot_size(callback_info_len)?;

        debug!(
            leaf_count = header.leaf_count,
            root = header.root_node,
            bump_index = header.bump_index,
            free_list_len = header.free_list_len,
            slot_size,
            bytes = buffer.len(),
            "decoded slab header"
        );

        Ok(Self {
            header,
            buffer,
            callback_info_len,
            slot_size,
        })
    }

    /// Build a slab using the callback info length from market config.
    ///
    /// # Errors
    ///
    /// As [`Slab::new`], plus `Config` when the config pins a market address
    /// and the header carries a different one.
    pub fn from_config(buffer: impl Into<Vec<u8>>, config: &MarketConfig) -> Result<Self> {
        let slab = Self::new(buffer, config.callback_info_len)?;
        if let Some(expected) = config.market_address_bytes()? {
            if expected != slab.header.market_address {
                let err = SlabError::Config(format!(
                    "slab belongs to market {}, expected {}",
                    slab.market_address_hex(),
                    hex::encode(expected)
                ));
                warn!(error = %err, "market address mismatch");
                return Err(err);
            }
        }
        Ok(slab)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Decoded header
    #[inline]
    pub fn header(&self) -> &SlabHeader {
        &self.header
    }

    /// Callback info length this slab was decoded with
    #[inline]
    pub fn callback_info_len(&self) -> usize {
        self.callback_info_len
    }

    /// Bytes per slot
    #[inline]
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Underlying bytes, header included
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Number of whole slots that fit after the header
    pub fn capacity(&self) -> usize {
        (self.buffer.len() - SLAB_HEADER_LEN) / self.slot_size
    }

    /// Number of orders in the tree
    #[inline]
    pub fn len(&self) -> u64 {
        self.header.leaf_count
    }

    /// True when the tree holds no orders
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    /// Market address as a hex string
    pub fn market_address_hex(&self) -> String {
        self.header.market_address_hex()
    }

    // ========================================================================
    // Indexing
    // ========================================================================

    /// Raw bytes of one slot, tag included
    pub fn slot_bytes(&self, pointer: u32) -> Result<&[u8]> {
        let start = (pointer as usize)
            .checked_mul(self.slot_size)
            .and_then(|offset| offset.checked_add(SLAB_HEADER_LEN))
            .ok_or_else(|| SlabError::underrun(usize::MAX, self.buffer.len()))?;
        let end = start
            .checked_add(self.slot_size)
            .ok_or_else(|| SlabError::underrun(usize::MAX, self.buffer.len()))?;

        self.buffer
            .get(start..end)
            .ok_or_else(|| SlabError::underrun(end, self.buffer.len()))
    }

    /// Decode the node stored at `pointer`.
    ///
    /// Not cached: repeated calls decode again.
    pub fn node_at(&self, pointer: u32) -> Result<Node> {
        let slot = self.slot_bytes(pointer)?;
        let node = node::decode_slot(slot, self.callback_info_len)
            .map_err(|e| e.at_pointer(pointer))?;
        trace!(pointer, kind = node.kind(), "decoded slot");
        Ok(node)
    }

    /// Walk the free list.
    ///
    /// Yields `(pointer, node)` for each of the `free_list_len` slots starting
    /// at `free_list_head`. A slot on the chain that is not free is reported as
    /// `StructuralCorruption` and ends the walk.
    pub fn free_list(&self) -> FreeList<'_> {
        FreeList {
            slab: self,
            next: self.header.free_list_head,
            remaining: self.header.free_list_len,
            failed: false,
        }
    }
}

// ============================================================================
// Free list walk
// ============================================================================

/// Lazy iterator over the free list. See [`Slab::free_list`].
#[derive(Debug, Clone)]
pub struct FreeList<'a> {
    slab: &'a Slab,
    next: u32,
    remaining: u64,
    failed: bool,
}

impl FreeList<'_> {
    fn fail(&mut self, err: SlabError) -> Option<Result<(u32, FreeNode)>> {
        warn!(error = %err, "free list walk aborted");
        self.failed = true;
        Some(Err(err))
    }
}

impl Iterator for FreeList<'_> {
    type Item = Result<(u32, FreeNode)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining == 0 {
            return None;
        }
        if self.remaining > self.slab.capacity() as u64 {
            return self.fail(SlabError::corruption(format!(
                "free list claims {} slots, slab holds {}",
                self.remaining,
                self.slab.capacity()
            )));
        }

        let pointer = self.next;
        match self.slab.node_at(pointer) {
            Ok(Node::Free(free)) => {
                self.remaining -= 1;
                self.next = free.next;
                Some(Ok((pointer, free)))
            }
            Ok(other) => self.fail(SlabError::corruption(format!(
                "{} slot {pointer} on the free list",
                other.kind()
            ))),
            Err(e) => self.fail(SlabError::corruption(format!(
                "free list slot {pointer}: {e}"
            ))),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        (0, usize::try_from(self.remaining).ok())
    }
}

impl FusedIterator for FreeList<'_> {}

// ============================================================================
// Unit Tests
// ============================================================================
