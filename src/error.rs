//! Error types for slab decoding and queries.
//!
//! Every error is terminal for the call that produced it: a query that hits
//! one of these never returns a partial result. Errors are scoped to the call,
//! so other queries over the same [`Slab`](crate::orderbook::Slab) may still
//! succeed if their path avoids the damaged slot.

use thiserror::Error;

/// Result type alias for slab operations.
pub type Result<T> = std::result::Result<T, SlabError>;

/// Main error type for slab operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlabError {
    /// Discriminant 0 was decoded
    #[error("Uninitialized slot at pointer {pointer:?}")]
    UninitializedSlot {
        /// Slot index, when the decode went through the indexer
        pointer: Option<u32>,
    },

    /// Discriminant outside the known node tags
    #[error("Unrecognized node tag: {tag}")]
    UnrecognizedNodeTag {
        /// The raw discriminant byte
        tag: u8,
    },

    /// A slice was shorter than the field being read
    #[error("Buffer underrun: needed {needed} bytes, {available} available")]
    BufferUnderrun {
        /// Bytes required by the read
        needed: usize,
        /// Bytes actually present
        available: usize,
    },

    /// The tree reachable from the root is inconsistent with its header
    #[error("Structural corruption: {0}")]
    StructuralCorruption(String),

    /// Market configuration could not be parsed
    #[error("Invalid market config: {0}")]
    Config(String),

    /// A record could not be encoded by the fixture encoder
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

impl SlabError {
    /// Create a corruption error from any string-like type.
    pub fn corruption(msg: impl Into<String>) -> Self {
        SlabError::StructuralCorruption(msg.into())
    }

    /// Shorthand for a buffer underrun.
    pub fn underrun(needed: usize, available: usize) -> Self {
        SlabError::BufferUnderrun { needed, available }
    }

    /// Attach a slot pointer to an uninitialized-slot error.
    pub(crate) fn at_pointer(self, pointer: u32) -> Self {
        match self {
            SlabError::UninitializedSlot { .. } => SlabError::UninitializedSlot {
                pointer: Some(pointer),
            },
            other => other,
        }
    }
}

impl From<serde_json::Error> for SlabError {
    fn from(err: serde_json::Error) -> Self {
        SlabError::Config(err.to_string())
    }
}
