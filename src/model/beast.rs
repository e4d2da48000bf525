//! Beasts: ephemeral encounter state
//!
//! A beast exists only for the duration of one encounter. Its id fixes both
//! its attack family and its own armor family: ids 1..=25 are magical
//! (magic attacks, cloth hide), 26..=50 are hunters (blade, hide), 51..=75
//! are brutes (bludgeon, metal). Within each family block, tier runs 1..5 in
//! sub-blocks of five.

use serde::{Deserialize, Serialize};

use super::item::{ArmorMaterial, WeaponType};

/// Beasts above this level carry special names (bonus-damage flags)
pub const SPECIAL_NAME_LEVEL: u16 = 19;

pub const MAX_BEAST_ID: u8 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beast {
    pub id: u8,
    pub level: u16,
    pub health: u16,
    /// Special-name slots; zero means locked/absent
    pub specials: (u8, u8),
}

impl Beast {
    pub fn tier(&self) -> u8 {
        ((self.id.saturating_sub(1)) % 25) / 5 + 1
    }

    /// Family of the beast's attacks
    pub fn attack_type(&self) -> WeaponType {
        match self.id {
            1..=25 => WeaponType::Magic,
            26..=50 => WeaponType::Blade,
            _ => WeaponType::Bludgeon,
        }
    }

    /// Family of the beast's own armor
    pub fn armor_material(&self) -> ArmorMaterial {
        match self.id {
            1..=25 => ArmorMaterial::Cloth,
            26..=50 => ArmorMaterial::Hide,
            _ => ArmorMaterial::Metal,
        }
    }

    pub fn has_specials(&self) -> bool {
        self.level > SPECIAL_NAME_LEVEL && (self.specials.0 != 0 || self.specials.1 != 0)
    }

    /// Gold paid out for the kill: max(1, level * (6 - tier) / 2)
    pub fn gold_reward(&self) -> u16 {
        (self.level * (6 - self.tier() as u16) / 2).max(1)
    }

    /// Identity for per-encounter session memory. Level and specials
    /// distinguish re-rolls of the same species.
    pub fn identity(&self) -> u64 {
        (self.id as u64) << 32 | (self.level as u64) << 16 | (self.specials.0 as u64) << 8
            | self.specials.1 as u64
    }
}
