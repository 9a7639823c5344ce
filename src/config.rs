//! Market configuration supplied alongside a slab buffer.
//!
//! The slab bytes alone do not say how long the per-order callback info is,
//! nor how ticks map to quote units. Both come from market configuration,
//! which callers load once per market and reuse for every snapshot.
//!
//! ```
//! use critbit_slab::config::MarketConfig;
//!
//! let config = MarketConfig::from_json(r#"{
//!     "callback_info_len": 32,
//!     "tick_size": "0.01"
//! }"#).unwrap();
//!
//! assert_eq!(config.slot_size().unwrap(), 57);
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SlabError};
use crate::orderbook::node::slot_size;
use crate::types::ScaledPrice;

// ============================================================================
// MarketConfig
// ============================================================================

/// Per-market metadata needed to decode and price a slab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Length in bytes of the opaque callback info stored in each leaf
    pub callback_info_len: usize,

    /// Quote units per price tick
    #[serde(default = "default_tick_size")]
    pub tick_size: Decimal,

    /// Expected market address, hex encoded
    #[serde(default)]
    pub market_address: Option<String>,
}

fn default_tick_size() -> Decimal {
    Decimal::ONE
}

impl MarketConfig {
    /// Create a config with a unit tick size
    pub fn new(callback_info_len: usize) -> Self {
        Self {
            callback_info_len,
            tick_size: default_tick_size(),
            market_address: None,
        }
    }

    /// Parse a config from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: MarketConfig = serde_json::from_str(json)?;
        config.validate()?;
        debug!(
            callback_info_len = config.callback_info_len,
            tick_size = %config.tick_size,
            "loaded market config"
        );
        Ok(config)
    }

    /// Reject configs that cannot describe a real market
    pub fn validate(&self) -> Result<()> {
        if self.tick_size <= Decimal::ZERO {
            return Err(SlabError::Config(format!(
                "tick_size must be positive, got {}",
                self.tick_size
            )));
        }
        self.slot_size()?;
        if let Some(address) = &self.market_address {
            self.market_address_bytes()?;
            debug!(%address, "market address pinned");
        }
        Ok(())
    }

    /// Slot size implied by this market's callback info length
    #[inline]
    pub fn slot_size(&self) -> Result<usize> {
        slot_size(self.callback_info_len)
    }

    /// Price extractor for this market's tick size
    pub fn price_extractor(&self) -> ScaledPrice {
        ScaledPrice::new(self.tick_size)
    }

    /// Decoded market address, if one is configured
    pub fn market_address_bytes(&self) -> Result<Option<[u8; 32]>> {
        let Some(address) = &self.market_address else {
            return Ok(None);
        };
        let bytes = hex::decode(address)
            .map_err(|e| SlabError::Config(format!("market_address: {e}")))?;
        let array: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            SlabError::Config(format!(
                "market_address must be 32 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Some(array))
    }
}

// ============================================================================
// AccountTag
// ============================================================================

/// Account type enumeration used to interpret the header's raw tag byte.
///
/// The slab itself only stores the raw byte; interpreting it is up to the
/// caller, which knows which account it fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountTag {
    /// Account not yet initialized
    Uninitialized,
    /// Market state account
    Market,
    /// Event queue account
    EventQueue,
    /// Bid-side slab
    Bids,
    /// Ask-side slab
    Asks,
}

impl AccountTag {
    /// Convert to u8 for serialization
    pub fn to_u8(self) -> u8 {
        match self {
            AccountTag::Uninitialized => 0,
            AccountTag::Market => 1,
            AccountTag::EventQueue => 2,
            AccountTag::Bids => 3,
            AccountTag::Asks => 4,
        }
    }

    /// Convert from u8 for deserialization
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AccountTag::Uninitialized),
            1 => Some(AccountTag::Market),
            2 => Some(AccountTag::EventQueue),
            3 => Some(AccountTag::Bids),
            4 => Some(AccountTag::Asks),
            _ => None,
        }
    }

    /// Check a raw header tag against the expected account type
    pub fn validate(raw: u8, expected: AccountTag) -> Result<AccountTag> {
        match Self::from_u8(raw) {
            Some(tag) if tag == expected => Ok(tag),
            Some(tag) => Err(SlabError::Config(format!(
                "account tag mismatch: expected {expected:?}, found {tag:?}"
            ))),
            None => Err(SlabError::Config(format!("unknown account tag {raw}"))),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
