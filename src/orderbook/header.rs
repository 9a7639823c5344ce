//! Slab header: the fixed 65-byte prefix of every slab buffer.
//!
//! ## Layout
//!
//! All integers little-endian, fields packed with no padding:
//!
//! ```text
//! offset  size  field
//!      0     1  account_tag
//!      1     8  bump_index
//!      9     8  free_list_len
//!     17     4  free_list_head
//!     21     4  root_node
//!     25     8  leaf_count
//!     33    32  market_address
//! ```
//!
//! A fixed-size SSZ container serializes as the concatenation of its fields
//! in little-endian order, which is exactly this layout.

use ssz_rs::prelude::*;

use crate::error::{Result as SlabResult, SlabError};

/// Size of the header in bytes
pub const SLAB_HEADER_LEN: usize = 65;

/// Decoded slab header.
///
/// No relationship between fields is validated here; `leaf_count` is the only
/// field the query layer trusts for emptiness.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct SlabHeader {
    /// Raw account discriminant, interpreted by the caller
    pub account_tag: u8,

    /// Next never-used slot index
    pub bump_index: u64,

    /// Number of slots on the free list
    pub free_list_len: u64,

    /// First slot of the free list
    pub free_list_head: u32,

    /// Slot index of the tree root (meaningless when `leaf_count == 0`)
    pub root_node: u32,

    /// Number of leaves (orders) in the tree
    pub leaf_count: u64,

    /// Market this slab belongs to
    pub market_address: [u8; 32],
}

impl SlabHeader {
    /// Parse the header from the start of a slab buffer.
    ///
    /// Bytes past the first 65 are ignored.
    ///
    /// # Errors
    ///
    /// `BufferUnderrun` if fewer than 65 bytes are available.
    pub fn parse(bytes: &[u8]) -> SlabResult<Self> {
        let header_bytes = bytes
            .get(..SLAB_HEADER_LEN)
            .ok_or_else(|| SlabError::underrun(SLAB_HEADER_LEN, bytes.len()))?;
        ssz_rs::deserialize::<SlabHeader>(header_bytes)
            .map_err(|e| SlabError::corruption(format!("header decode: {e:?}")))
    }

    /// Encode the header into its 65-byte wire form
    pub fn encode(&self) -> SlabResult<Vec<u8>> {
        ssz_rs::serialize(self).map_err(|e| SlabError::Encoding(format!("header: {e:?}")))
    }

    /// Raw account tag byte
    #[inline]
    pub fn account_tag(&self) -> u8 {
        self.account_tag
    }

    /// True when the tree holds no leaves
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    /// Market address as a hex string
    pub fn market_address_hex(&self) -> String {
        hex::encode(self.market_address)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> SlabHeader {
        SlabHeader {
            account_tag: 3,
            bump_index: 0x0102_0304_0506_0708,
            free_list_len: 2,
            free_list_head: 7,
            root_node: 0,
            leaf_count: 5,
            market_address: [0xCD; 32],
        }
    }

    #[test]
    fn test_header_size() {
        let bytes = sample_header().encode().unwrap();
        assert_eq!(bytes.len(), SLAB_HEADER_LEN, "header must be exactly 65 bytes");
    }

    #[test]
    fn test_header_field_offsets() {
        let bytes = sample_header().encode().unwrap();

        assert_eq!(bytes[0], 3);
        assert_eq!(&bytes[1..9], &0x0102_0304_0506_0708u64.to_le_bytes());
        assert_eq!(&bytes[9..17], &2u64.to_le_bytes());
        assert_eq!(&bytes[17..21], &7u32.to_le_bytes());
        assert_eq!(&bytes[21..25], &0u32.to_le_bytes());
        assert_eq!(&bytes[25..33], &5u64.to_le_bytes());
        assert_eq!(&bytes[33..65], &[0xCD; 32]);
    }

    #[test]
    fn test_parse_hand_built_bytes() {
        let mut bytes = vec![0u8; SLAB_HEADER_LEN];
        bytes[0] = 4;
        bytes[1..9].copy_from_slice(&10u64.to_le_bytes());
        bytes[21..25].copy_from_slice(&6u32.to_le_bytes());
        bytes[25..33].copy_from_slice(&3u64.to_le_bytes());
        bytes[33] = 0xFF;

        let header = SlabHeader::parse(&bytes).unwrap();
        assert_eq!(header.account_tag(), 4);
        assert_eq!(header.bump_index, 10);
        assert_eq!(header.root_node, 6);
        assert_eq!(header.leaf_count, 3);
        assert_eq!(header.market_address[0], 0xFF);
        assert!(!header.is_empty());
    }

    #[test]
    fn test_parse_ignores_trailing_bytes() {
        let mut bytes = sample_header().encode().unwrap();
        bytes.extend_from_slice(&[0xEE; 100]);
        assert_eq!(SlabHeader::parse(&bytes).unwrap(), sample_header());
    }

    #[test]
    fn test_parse_short_buffer() {
        let err = SlabHeader::parse(&[0u8; 64]).unwrap_err();
        assert_eq!(err, SlabError::underrun(65, 64));
    }

    #[test]
    fn test_market_address_hex() {
        let header = sample_header();
        let hex = header.market_address_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c == 'c' || c == 'd'));
    }
}
