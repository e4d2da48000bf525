//! Items and the fixed loot lookup tables
//!
//! An item id fully determines its slot, tier and elemental family. The id
//! layout is a given constant of the game contracts, reproduced here as
//! arithmetic over fixed ranges rather than a 98-row table:
//!
//! - 1..=3   necklaces (Pendant, Necklace, Amulet), tier 1
//! - 4..=8   rings (Silver, Bronze, Platinum, Titanium, Gold)
//! - 9..=13  blade weapons, tier 1..5
//! - 14..=18 bludgeon weapons, tier 1..5
//! - 19..=23 magic weapons, tier 1..5
//! - 24..=48 cloth armor: 5 slots x 5 tiers
//! - 49..=73 hide armor: 5 slots x 5 tiers
//! - 74..=98 metal armor: 5 slots x 5 tiers
//!
//! Within an armor block the order is chest, head, waist, foot, hand, each
//! holding tiers 1..5 in sequence.

use serde::{Deserialize, Serialize};

/// Greatness at which the permanent suffix bonus unlocks
pub const SUFFIX_UNLOCK_GREATNESS: u8 = 15;

/// Greatness cap
pub const MAX_GREATNESS: u8 = 20;

pub const PENDANT: u8 = 1;
pub const NECKLACE: u8 = 2;
pub const AMULET: u8 = 3;
pub const SILVER_RING: u8 = 4;
pub const BRONZE_RING: u8 = 5;
pub const PLATINUM_RING: u8 = 6;
pub const TITANIUM_RING: u8 = 7;
pub const GOLD_RING: u8 = 8;

const BLADE_BASE: u8 = 9;
const BLUDGEON_BASE: u8 = 14;
const MAGIC_BASE: u8 = 19;
const CLOTH_BASE: u8 = 24;
const HIDE_BASE: u8 = 49;
const METAL_BASE: u8 = 74;
pub const MAX_ITEM_ID: u8 = 98;

/// Equipment slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Weapon,
    Chest,
    Head,
    Waist,
    Foot,
    Hand,
    Neck,
    Ring,
}

impl Slot {
    /// The five slots a beast can strike
    pub const ARMOR: [Slot; 5] = [Slot::Chest, Slot::Head, Slot::Waist, Slot::Foot, Slot::Hand];
}

/// Weapon elemental family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponType {
    Magic,
    Blade,
    Bludgeon,
}

impl WeaponType {
    pub const ALL: [WeaponType; 3] = [WeaponType::Magic, WeaponType::Blade, WeaponType::Bludgeon];
}

/// Armor elemental family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmorMaterial {
    Cloth,
    Hide,
    Metal,
}

/// Three-way elemental matchup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matchup {
    Weak,
    Fair,
    Strong,
}

impl Matchup {
    /// Damage multiplier for this matchup
    pub fn multiplier(self) -> f64 {
        match self {
            Matchup::Weak => 0.5,
            Matchup::Fair => 1.0,
            Matchup::Strong => 1.5,
        }
    }
}

/// Weapon family vs armor family: magic beats metal, blade beats cloth,
/// bludgeon beats hide; each is weak against the remaining family.
pub fn matchup(weapon: WeaponType, armor: ArmorMaterial) -> Matchup {
    match (weapon, armor) {
        (WeaponType::Magic, ArmorMaterial::Metal) => Matchup::Strong,
        (WeaponType::Magic, ArmorMaterial::Hide) => Matchup::Weak,
        (WeaponType::Magic, ArmorMaterial::Cloth) => Matchup::Fair,
        (WeaponType::Blade, ArmorMaterial::Cloth) => Matchup::Strong,
        (WeaponType::Blade, ArmorMaterial::Metal) => Matchup::Weak,
        (WeaponType::Blade, ArmorMaterial::Hide) => Matchup::Fair,
        (WeaponType::Bludgeon, ArmorMaterial::Hide) => Matchup::Strong,
        (WeaponType::Bludgeon, ArmorMaterial::Cloth) => Matchup::Weak,
        (WeaponType::Bludgeon, ArmorMaterial::Metal) => Matchup::Fair,
    }
}

/// An item instance: id plus accumulated xp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u8,
    pub xp: u16,
}

impl Item {
    pub fn new(id: u8, xp: u16) -> Self {
        Self { id, xp }
    }

    /// Greatness = floor(sqrt(xp)), capped at 20
    pub fn greatness(&self) -> u8 {
        let g = (self.xp as f64).sqrt().floor() as u8;
        g.min(MAX_GREATNESS).max(1)
    }

    pub fn tier(&self) -> u8 {
        tier_of(self.id)
    }

    pub fn slot(&self) -> Slot {
        slot_of(self.id)
    }

    pub fn weapon_type(&self) -> Option<WeaponType> {
        weapon_type_of(self.id)
    }

    pub fn armor_material(&self) -> Option<ArmorMaterial> {
        armor_material_of(self.id)
    }

    /// The suffix stat bonus is permanent once unlocked; items this close to
    /// it are protected from swaps and replacement.
    pub fn suffix_unlocked(&self) -> bool {
        self.greatness() >= SUFFIX_UNLOCK_GREATNESS
    }
}

/// Slot from item id
pub fn slot_of(id: u8) -> Slot {
    match id {
        PENDANT..=AMULET => Slot::Neck,
        SILVER_RING..=GOLD_RING => Slot::Ring,
        BLADE_BASE..=23 => Slot::Weapon,
        CLOTH_BASE..=MAX_ITEM_ID => {
            let offset = (id - CLOTH_BASE) % 25;
            Slot::ARMOR[(offset / 5) as usize]
        }
        _ => Slot::Weapon,
    }
}

/// Tier (1 best .. 5 worst) from item id
pub fn tier_of(id: u8) -> u8 {
    match id {
        PENDANT..=AMULET => 1,
        SILVER_RING => 2,
        BRONZE_RING => 3,
        PLATINUM_RING | TITANIUM_RING | GOLD_RING => 1,
        BLADE_BASE..=23 => (id - BLADE_BASE) % 5 + 1,
        CLOTH_BASE..=MAX_ITEM_ID => (id - CLOTH_BASE) % 5 + 1,
        _ => 5,
    }
}

/// Weapon family, for weapon ids only
pub fn weapon_type_of(id: u8) -> Option<WeaponType> {
    match id {
        BLADE_BASE..=13 => Some(WeaponType::Blade),
        BLUDGEON_BASE..=18 => Some(WeaponType::Bludgeon),
        MAGIC_BASE..=23 => Some(WeaponType::Magic),
        _ => None,
    }
}

/// Armor family, for armor ids only
pub fn armor_material_of(id: u8) -> Option<ArmorMaterial> {
    match id {
        CLOTH_BASE..=48 => Some(ArmorMaterial::Cloth),
        HIDE_BASE..=73 => Some(ArmorMaterial::Hide),
        METAL_BASE..=MAX_ITEM_ID => Some(ArmorMaterial::Metal),
        _ => None,
    }
}

/// The armor family a necklace reinforces: amulets back cloth, pendants back
/// hide, necklaces back metal.
pub fn necklace_boost(id: u8) -> Option<ArmorMaterial> {
    match id {
        AMULET => Some(ArmorMaterial::Cloth),
        PENDANT => Some(ArmorMaterial::Hide),
        NECKLACE => Some(ArmorMaterial::Metal),
        _ => None,
    }
}

/// Rings that boost critical-hit damage
pub fn is_critical_ring(id: u8) -> bool {
    id == TITANIUM_RING
}

pub fn is_jewelry(id: u8) -> bool {
    (PENDANT..=GOLD_RING).contains(&id)
}

/// Armor item id for (material, slot, tier); the inverse of the lookups above
pub fn armor_id(material: ArmorMaterial, slot: Slot, tier: u8) -> Option<u8> {
    let base = match material {
        ArmorMaterial::Cloth => CLOTH_BASE,
        ArmorMaterial::Hide => HIDE_BASE,
        ArmorMaterial::Metal => METAL_BASE,
    };
    let slot_index = Slot::ARMOR.iter().position(|s| *s == slot)?;
    if !(1..=5).contains(&tier) {
        return None;
    }
    Some(base + slot_index as u8 * 5 + (tier - 1))
}

/// Weapon item id for (family, tier)
pub fn weapon_id(family: WeaponType, tier: u8) -> Option<u8> {
    if !(1..=5).contains(&tier) {
        return None;
    }
    let base = match family {
        WeaponType::Blade => BLADE_BASE,
        WeaponType::Bludgeon => BLUDGEON_BASE,
        WeaponType::Magic => MAGIC_BASE,
    };
    Some(base + tier - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greatness_floor_sqrt() {
        assert_eq!(Item::new(9, 0).greatness(), 1);
        assert_eq!(Item::new(9, 1).greatness(), 1);
        assert_eq!(Item::new(9, 4).greatness(), 2);
        assert_eq!(Item::new(9, 224).greatness(), 14);
        assert_eq!(Item::new(9, 225).greatness(), 15);
        // capped at 20 even past 400 xp
        assert_eq!(Item::new(9, 500).greatness(), 20);
    }

    #[test]
    fn test_matchup_cycle() {
        assert_eq!(matchup(WeaponType::Magic, ArmorMaterial::Metal), Matchup::Strong);
        assert_eq!(matchup(WeaponType::Blade, ArmorMaterial::Cloth), Matchup::Strong);
        assert_eq!(matchup(WeaponType::Bludgeon, ArmorMaterial::Hide), Matchup::Strong);
        assert_eq!(matchup(WeaponType::Magic, ArmorMaterial::Hide), Matchup::Weak);
        assert_eq!(matchup(WeaponType::Blade, ArmorMaterial::Metal), Matchup::Weak);
        assert_eq!(matchup(WeaponType::Bludgeon, ArmorMaterial::Cloth), Matchup::Weak);
    }

    #[test]
    fn test_armor_id_round_trip() {
        for material in [ArmorMaterial::Cloth, ArmorMaterial::Hide, ArmorMaterial::Metal] {
            for slot in Slot::ARMOR {
                for tier in 1..=5 {
                    let id = armor_id(material, slot, tier).unwrap();
                    assert_eq!(slot_of(id), slot);
                    assert_eq!(tier_of(id), tier);
                    assert_eq!(armor_material_of(id), Some(material));
                }
            }
        }
    }

    #[test]
    fn test_weapon_id_round_trip() {
        for family in WeaponType::ALL {
            for tier in 1..=5 {
                let id = weapon_id(family, tier).unwrap();
                assert_eq!(slot_of(id), Slot::Weapon);
                assert_eq!(tier_of(id), tier);
                assert_eq!(weapon_type_of(id), Some(family));
            }
        }
    }

    #[test]
    fn test_jewelry_tiers() {
        assert_eq!(tier_of(SILVER_RING), 2);
        assert_eq!(tier_of(GOLD_RING), 1);
        assert_eq!(slot_of(PENDANT), Slot::Neck);
        assert_eq!(slot_of(TITANIUM_RING), Slot::Ring);
        assert!(is_critical_ring(TITANIUM_RING));
        assert!(!is_critical_ring(GOLD_RING));
    }
}
