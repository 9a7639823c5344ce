//! Order-book side.
//!
//! A slab holds one side of a book. The side decides the direction a query
//! reads keys in: asks are read lowest price first, bids highest price first,
//! so both start from the best price for that side.

use serde::{Deserialize, Serialize};

// ============================================================================
// Side enum
// ============================================================================

/// Book side: Bid or Ask
///
/// Represented as u8 on the wire:
/// - Bid = 0
/// - Ask = 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy interest - best price is the highest key
    #[default]
    Bid,
    /// Sell interest - best price is the lowest key
    Ask,
}

impl Side {
    /// Convert to u8 for serialization
    pub fn to_u8(self) -> u8 {
        match self {
            Side::Bid => 0,
            Side::Ask => 1,
        }
    }

    /// Convert from u8 for deserialization
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Side::Bid),
            1 => Some(Side::Ask),
            _ => None,
        }
    }

    /// Returns the opposite side
    pub fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Key order that starts from the best price of this side
    #[inline]
    pub fn ascending(self) -> bool {
        matches!(self, Side::Ask)
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Bid => write!(f, "bid"),
            Side::Ask => write!(f, "ask"),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_conversion() {
        assert_eq!(Side::Bid.to_u8(), 0);
        assert_eq!(Side::Ask.to_u8(), 1);
        assert_eq!(Side::from_u8(0), Some(Side::Bid));
        assert_eq!(Side::from_u8(1), Some(Side::Ask));
        assert_eq!(Side::from_u8(2), None);
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
    }

    #[test]
    fn test_side_read_direction() {
        assert!(Side::Ask.ascending());
        assert!(!Side::Bid.ascending());
    }

    #[test]
    fn test_side_serde() {
        assert_eq!(serde_json::to_string(&Side::Ask).unwrap(), "\"ask\"");
        let side: Side = serde_json::from_str("\"bid\"").unwrap();
        assert_eq!(side, Side::Bid);
    }
}
