//! Asset (mosaic) definitions.

use crate::BlockDuration;
use serde::{Deserialize, Serialize};

/// Properties of a fungible asset type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetDefinition {
    /// Decimal places, 0 through [`AssetDefinition::MAX_DIVISIBILITY`].
    pub divisibility: u8,
    /// Whether the issuer may change the supply after creation.
    pub supply_mutable: bool,
    /// Whether holders other than the issuer may transfer it.
    pub transferable: bool,
    /// Lifetime of the definition in blocks.
    pub duration: BlockDuration,
}

impl AssetDefinition {
    pub const MAX_DIVISIBILITY: u8 = 6;

    /// Default asset lifetime.
    pub const DEFAULT_DURATION: BlockDuration = BlockDuration(1_000_000);

    pub fn new(divisibility: u8, supply_mutable: bool, transferable: bool) -> Self {
        Self {
            divisibility,
            supply_mutable,
            transferable,
            duration: Self::DEFAULT_DURATION,
        }
    }

    /// Single indivisible token bound to one holder (identity badges).
    pub fn badge() -> Self {
        Self::new(0, false, false)
    }

    pub fn with_duration(mut self, duration: BlockDuration) -> Self {
        self.duration = duration;
        self
    }

    /// Check the divisibility range.
    pub fn validate(&self) -> Result<(), AssetError> {
        if self.divisibility > Self::MAX_DIVISIBILITY {
            return Err(AssetError::InvalidAssetDefinition {
                divisibility: self.divisibility,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("Invalid asset definition: divisibility {divisibility} is outside 0..=6")]
    InvalidAssetDefinition { divisibility: u8 },
}
