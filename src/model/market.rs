//! Market listing and pricing
//!
//! The market is a transient list of purchasable item ids regenerated once
//! per level-up. It is discarded after each shopping decision.

use serde::{Deserialize, Serialize};

use super::item::tier_of;

/// Base price per tier step: a tier-1 item lists at 20 gold before discount
pub const TIER_PRICE: u16 = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub item_ids: Vec<u8>,
}

impl Market {
    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty()
    }

    pub fn contains(&self, id: u8) -> bool {
        self.item_ids.contains(&id)
    }
}

/// Charisma-discounted item price, floored at 1 gold
pub fn item_price(id: u8, charisma: u8) -> u16 {
    let base = (6 - tier_of(id) as u16) * TIER_PRICE;
    base.saturating_sub(charisma as u16).max(1)
}
