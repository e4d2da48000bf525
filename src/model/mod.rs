//! Game state value types and economy formulas
//!
//! Everything here is an immutable snapshot decoded from chain state. The
//! engine never mutates a snapshot; each loop iteration re-fetches.

pub mod adventurer;
pub mod beast;
pub mod combat_math;
pub mod item;
pub mod market;

pub use adventurer::{Adventurer, Bag, Equipment, Stats};
pub use beast::Beast;
pub use item::{ArmorMaterial, Item, Matchup, Slot, WeaponType};
pub use market::{item_price, Market};

use serde::{Deserialize, Serialize};

/// One full game snapshot as read from chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub adventurer: Adventurer,
    pub bag: Bag,
    /// Present only while an encounter is live
    pub beast: Option<Beast>,
    pub market: Market,
}
