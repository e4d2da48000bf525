//! Adventurer, stats, equipment and bag

use serde::{Deserialize, Serialize};

use super::item::{is_jewelry, Item, Slot};

/// Hard cap on any single allocatable stat
pub const STAT_CAP: u8 = 31;

/// Absolute health ceiling
pub const MAX_HEALTH_CAP: u16 = 1023;

/// Base health before vitality
pub const BASE_HEALTH: u16 = 100;

/// Health granted per point of vitality
pub const HEALTH_PER_VITALITY: u16 = 15;

/// Health restored per potion
pub const POTION_HEAL: u16 = 10;

/// Bag capacity
pub const BAG_CAPACITY: usize = 15;

/// The six allocatable stats. Luck is derived from jewelry, never allocated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub strength: u8,
    pub dexterity: u8,
    pub vitality: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

/// The eight equipment slots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub weapon: Option<Item>,
    pub chest: Option<Item>,
    pub head: Option<Item>,
    pub waist: Option<Item>,
    pub foot: Option<Item>,
    pub hand: Option<Item>,
    pub neck: Option<Item>,
    pub ring: Option<Item>,
}

impl Equipment {
    pub fn in_slot(&self, slot: Slot) -> Option<&Item> {
        match slot {
            Slot::Weapon => self.weapon.as_ref(),
            Slot::Chest => self.chest.as_ref(),
            Slot::Head => self.head.as_ref(),
            Slot::Waist => self.waist.as_ref(),
            Slot::Foot => self.foot.as_ref(),
            Slot::Hand => self.hand.as_ref(),
            Slot::Neck => self.neck.as_ref(),
            Slot::Ring => self.ring.as_ref(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        [
            &self.weapon, &self.chest, &self.head, &self.waist, &self.foot, &self.hand,
            &self.neck, &self.ring,
        ]
        .into_iter()
        .flatten()
    }
}

/// Bounded ordered item collection owned by the adventurer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bag {
    pub items: Vec<Item>,
}

impl Bag {
    pub fn is_full(&self) -> bool {
        self.items.len() >= BAG_CAPACITY
    }

    pub fn contains(&self, id: u8) -> bool {
        self.items.iter().any(|i| i.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Adventurer {
    pub health: u16,
    pub xp: u32,
    pub gold: u16,
    pub stat_upgrades_available: u8,
    /// Monotonic per-game action counter; part of the stale-read fingerprint
    pub action_count: u32,
    pub stats: Stats,
    pub equipment: Equipment,
}

impl Adventurer {
    /// Level = floor(sqrt(xp)), minimum 1
    pub fn level(&self) -> u16 {
        let level = (self.xp as f64).sqrt().floor() as u16;
        level.max(1)
    }

    /// Max health = min(1023, 100 + 15 * vitality)
    pub fn max_health(&self) -> u16 {
        max_health(self.stats.vitality)
    }

    /// Potion cost = max(1, level - 2 * charisma)
    pub fn potion_cost(&self) -> u16 {
        potion_cost(self.level(), self.stats.charisma)
    }

    /// Luck is derived: the summed greatness of all jewelry, equipped or bagged
    pub fn luck(&self, bag: &Bag) -> u16 {
        let equipped: u16 = [&self.equipment.neck, &self.equipment.ring]
            .into_iter()
            .flatten()
            .map(|i| i.greatness() as u16)
            .sum();
        let bagged: u16 = bag
            .items
            .iter()
            .filter(|i| is_jewelry(i.id))
            .map(|i| i.greatness() as u16)
            .sum();
        equipped + bagged
    }

    /// True while the opening encounter special case applies
    pub fn is_starter(&self) -> bool {
        self.level() == 1 && self.xp < 4
    }

    /// Item ids the adventurer already owns, equipped or bagged
    pub fn owned_ids(&self, bag: &Bag) -> Vec<u8> {
        self.equipment
            .iter()
            .map(|i| i.id)
            .chain(bag.items.iter().map(|i| i.id))
            .collect()
    }
}

pub fn max_health(vitality: u8) -> u16 {
    (BASE_HEALTH + HEALTH_PER_VITALITY * vitality as u16).min(MAX_HEALTH_CAP)
}

pub fn potion_cost(level: u16, charisma: u8) -> u16 {
    level.saturating_sub(2 * charisma as u16).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_floor_sqrt_min_one() {
        let mut a = Adventurer::default();
        assert_eq!(a.level(), 1);
        a.xp = 3;
        assert_eq!(a.level(), 1);
        a.xp = 4;
        assert_eq!(a.level(), 2);
        a.xp = 99;
        assert_eq!(a.level(), 9);
        a.xp = 100;
        assert_eq!(a.level(), 10);
    }

    #[test]
    fn test_max_health_caps() {
        assert_eq!(max_health(0), 100);
        assert_eq!(max_health(10), 250);
        // 100 + 15*62 = 1030, clipped to 1023
        assert_eq!(max_health(62), 1023);
    }

    #[test]
    fn test_potion_cost_floor() {
        assert_eq!(potion_cost(5, 0), 5);
        assert_eq!(potion_cost(5, 2), 1);
        assert_eq!(potion_cost(5, 10), 1);
        assert_eq!(potion_cost(20, 4), 12);
    }

    #[test]
    fn test_starter_window() {
        let mut a = Adventurer::default();
        assert!(a.is_starter());
        a.xp = 4;
        assert!(!a.is_starter());
    }

    #[test]
    fn test_luck_counts_equipped_and_bagged_jewelry() {
        let mut a = Adventurer::default();
        a.equipment.ring = Some(Item::new(crate::model::item::SILVER_RING, 9)); // greatness 3
        a.equipment.neck = Some(Item::new(crate::model::item::PENDANT, 4)); // greatness 2
        let bag = Bag {
            items: vec![
                Item::new(crate::model::item::GOLD_RING, 16), // greatness 4
                Item::new(9, 400),                            // weapon, ignored
            ],
        };
        assert_eq!(a.luck(&bag), 9);
    }
}
