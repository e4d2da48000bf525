//! Market purchase waterfall
//!
//! A strict multi-step pass over the current market listing. Gear steps
//! respect a gold reserve so they can never starve the potion passes that
//! follow them, and an unaffordable big weapon upgrade latches the plan into
//! saving gold instead of spending it on luxuries.

use serde::{Deserialize, Serialize};

use crate::core::config::EngineConfig;
use crate::model::adventurer::{Adventurer, Bag, POTION_HEAL};
use crate::model::item::{
    self, armor_material_of, is_jewelry, slot_of, tier_of, weapon_type_of, ArmorMaterial, Slot,
    WeaponType, MAX_GREATNESS,
};
use crate::model::market::{item_price, Market};

/// A ring with xp past this greatness keeps its slot even when a preferred
/// kind shows up; the invested greatness outweighs the kind upgrade.
const RING_REPLACE_MAX_GREATNESS: u8 = 5;

/// Highest tier worth stocking as an elemental backup weapon
const BACKUP_WEAPON_MAX_TIER: u8 = 3;

/// Ring kinds in descending preference
const RING_PREFERENCE: [u8; 5] = [
    item::TITANIUM_RING,
    item::GOLD_RING,
    item::PLATINUM_RING,
    item::SILVER_RING,
    item::BRONZE_RING,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: u8,
    pub price: u16,
    pub equip: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketPlan {
    pub potions: u8,
    pub purchases: Vec<Purchase>,
    pub gold_spent: u16,
    /// One line per step that did something, plus the save-gold latch if set
    pub rationale: Vec<String>,
}

impl MarketPlan {
    pub fn is_empty(&self) -> bool {
        self.potions == 0 && self.purchases.is_empty()
    }
}

struct Planner<'a> {
    adventurer: &'a Adventurer,
    bag: &'a Bag,
    market: &'a Market,
    cfg: &'a EngineConfig,
    owned: Vec<u8>,
    gold: u16,
    healed: u16,
    plan: MarketPlan,
    /// Set when a 2+ tier weapon upgrade exists but is out of reach:
    /// stop spending on anything that is not survival
    saving_for_weapon: bool,
}

/// Build the shopping plan for one market visit
pub fn plan_market(
    adventurer: &Adventurer,
    bag: &Bag,
    market: &Market,
    cfg: &EngineConfig,
) -> MarketPlan {
    let mut p = Planner {
        adventurer,
        bag,
        market,
        cfg,
        owned: adventurer.owned_ids(bag),
        gold: adventurer.gold,
        healed: 0,
        plan: MarketPlan::default(),
        saving_for_weapon: false,
    };

    p.safety_potions();
    p.weapon_upgrade();
    p.fill_armor_slots();
    p.replace_maxed_armor();
    p.potion_passes();
    p.ring_step();
    p.necklace_step();
    p.backup_weapons();
    p.speculative_jewelry();

    p.plan.gold_spent = adventurer.gold - p.gold;
    p.plan
}

impl<'a> Planner<'a> {
    fn potion_cost(&self) -> u16 {
        self.adventurer.potion_cost()
    }

    fn health_deficit(&self) -> u16 {
        self.adventurer
            .max_health()
            .saturating_sub(self.adventurer.health + self.healed)
    }

    /// Gold the gear steps must leave behind for potions
    fn reserve(&self) -> u16 {
        if self.health_deficit() < self.cfg.final_potion_min_deficit {
            return 0;
        }
        (self.cfg.potion_reserve_fraction * self.adventurer.gold as f64) as u16
    }

    fn buyable(&self, id: u8) -> bool {
        self.market.contains(id)
            && !self.owned.contains(&id)
            && !self.plan.purchases.iter().any(|p| p.id == id)
    }

    fn price(&self, id: u8) -> u16 {
        item_price(id, self.adventurer.stats.charisma)
    }

    /// Spend respecting the reserve; gear steps go through here
    fn buy_gear(&mut self, id: u8, equip: bool) -> bool {
        let price = self.price(id);
        if self.gold < price || self.gold - price < self.reserve() {
            return false;
        }
        self.gold -= price;
        self.plan.purchases.push(Purchase { id, price, equip });
        true
    }

    fn buy_potions(&mut self, count: u16) -> u16 {
        let cost = self.potion_cost();
        let affordable = self.gold / cost;
        let n = count.min(affordable).min(u8::MAX as u16 - self.plan.potions as u16);
        self.gold -= n * cost;
        self.healed += n * POTION_HEAL;
        self.plan.potions += n as u8;
        n
    }

    fn note(&mut self, line: String) {
        self.plan.rationale.push(line);
    }

    /// Step 1: get health to the safety floor before anything else
    fn safety_potions(&mut self) {
        let safety =
            (self.cfg.potion_safety_fraction * self.adventurer.max_health() as f64) as u16;
        let current = self.adventurer.health + self.healed;
        if current >= safety {
            return;
        }
        let need = div_ceil(safety - current, POTION_HEAL);
        let bought = self.buy_potions(need);
        if bought > 0 {
            self.note(format!("safety floor: {} potion(s) toward {} HP", bought, safety));
        }
    }

    /// Step 2: weapon tier upgrade, or latch into saving for one
    fn weapon_upgrade(&mut self) {
        let current_tier = self
            .adventurer
            .equipment
            .weapon
            .as_ref()
            .map(|w| w.tier())
            .unwrap_or(6);

        let mut best: Option<(u8, u8)> = None; // (tier, id)
        for &id in &self.market.item_ids {
            if slot_of(id) != Slot::Weapon || !self.buyable(id) {
                continue;
            }
            let tier = tier_of(id);
            if tier < current_tier && best.map_or(true, |(t, _)| tier < t) {
                best = Some((tier, id));
            }
        }
        let Some((tier, id)) = best else { return };

        if self.buy_gear(id, true) {
            self.note(format!("weapon upgrade: tier {} -> {} (item {})", current_tier, tier, id));
        } else if current_tier - tier >= 2 {
            self.saving_for_weapon = true;
            self.note(format!(
                "saving gold: tier {} weapon (item {}) listed but unaffordable",
                tier, id
            ));
        }
    }

    /// Step 3: fill naked armor slots cheaply, preferring the material the
    /// adventurer has already committed greatness to
    fn fill_armor_slots(&mut self) {
        if self.saving_for_weapon {
            return;
        }
        let committed = self.committed_material();
        for slot in Slot::ARMOR {
            if self.adventurer.equipment.in_slot(slot).is_some() {
                continue;
            }
            let candidates: Vec<u8> = self
                .market
                .item_ids
                .iter()
                .copied()
                .filter(|&id| slot_of(id) == slot && self.buyable(id))
                .collect();
            let pick = candidates
                .iter()
                .copied()
                .filter(|&id| armor_material_of(id) == Some(committed))
                .min_by_key(|&id| self.price(id))
                .or_else(|| candidates.iter().copied().min_by_key(|&id| self.price(id)));
            if let Some(id) = pick {
                if self.buy_gear(id, true) {
                    self.note(format!("filled empty {:?} slot with item {}", slot, id));
                }
            }
        }
    }

    /// Step 4: a maxed non-T1 armor piece has nowhere left to grow; replace
    /// it with tier 1 when the market offers one
    fn replace_maxed_armor(&mut self) {
        if self.saving_for_weapon {
            return;
        }
        for slot in Slot::ARMOR {
            let Some(worn) = self.adventurer.equipment.in_slot(slot) else { continue };
            if worn.greatness() < MAX_GREATNESS || worn.tier() == 1 {
                continue;
            }
            let t1 = self
                .market
                .item_ids
                .iter()
                .copied()
                .find(|&id| slot_of(id) == slot && tier_of(id) == 1 && self.buyable(id));
            if let Some(id) = t1 {
                if self.buy_gear(id, true) {
                    self.note(format!(
                        "replacing maxed tier-{} {:?} armor with tier 1 (item {})",
                        worn.tier(),
                        slot,
                        id
                    ));
                }
            }
        }
    }

    /// Step 5: emergency / regular / final potion passes
    fn potion_passes(&mut self) {
        let max = self.adventurer.max_health();

        // Emergency ignores the save-gold latch: survival first
        let deficit = self.health_deficit();
        if (deficit as f64) > self.cfg.emergency_deficit_fraction * max as f64 {
            let bought = self.buy_potions(div_ceil(deficit, POTION_HEAL));
            if bought > 0 {
                self.note(format!("emergency potions: {} for a {} HP deficit", bought, deficit));
            }
        }

        if self.saving_for_weapon {
            return;
        }

        let deficit = self.health_deficit();
        if deficit >= self.cfg.regular_potion_min_deficit {
            let bought = self.buy_potions(div_ceil(deficit, POTION_HEAL));
            if bought > 0 {
                self.note(format!("regular potions: {}", bought));
            }
        }

        let deficit = self.health_deficit();
        if deficit >= self.cfg.final_potion_min_deficit {
            let bought = self.buy_potions(div_ceil(deficit, POTION_HEAL));
            if bought > 0 {
                self.note(format!("final top-off: {} potion(s)", bought));
            }
        }
    }

    /// Step 6: ring selection with greatness preservation
    fn ring_step(&mut self) {
        if self.saving_for_weapon {
            return;
        }
        let worn = self.adventurer.equipment.ring.as_ref();
        if let Some(ring) = worn {
            // Invested greatness beats a kind upgrade
            if ring.greatness() > RING_REPLACE_MAX_GREATNESS {
                return;
            }
        }
        let worn_rank = worn.and_then(|r| RING_PREFERENCE.iter().position(|&p| p == r.id));
        for (rank, &id) in RING_PREFERENCE.iter().enumerate() {
            if worn_rank.map_or(false, |w| rank >= w) {
                break; // nothing strictly better remains
            }
            if self.buyable(id) && self.buy_gear(id, true) {
                self.note(format!("ring: equipping item {}", id));
                break;
            }
        }
    }

    /// Step 7: fill an empty neck slot with the cheapest necklace
    fn necklace_step(&mut self) {
        if self.saving_for_weapon || self.adventurer.equipment.neck.is_some() {
            return;
        }
        let pick = (item::PENDANT..=item::AMULET)
            .filter(|&id| self.buyable(id))
            .min_by_key(|&id| self.price(id));
        if let Some(id) = pick {
            if self.buy_gear(id, true) {
                self.note(format!("necklace: equipping item {}", id));
            }
        }
    }

    /// Step 8: level-gated backup weapons covering the missing elements
    fn backup_weapons(&mut self) {
        if self.saving_for_weapon || self.adventurer.level() < self.cfg.backup_weapon_level {
            return;
        }
        let mut covered: Vec<WeaponType> = self
            .adventurer
            .equipment
            .weapon
            .iter()
            .chain(self.bag.items.iter())
            .filter_map(|i| weapon_type_of(i.id))
            .collect();

        let mut slots_left = crate::model::adventurer::BAG_CAPACITY - self.bag.items.len();
        for family in WeaponType::ALL {
            if covered.contains(&family) || slots_left == 0 {
                continue;
            }
            let pick = self
                .market
                .item_ids
                .iter()
                .copied()
                .filter(|&id| {
                    weapon_type_of(id) == Some(family)
                        && tier_of(id) <= BACKUP_WEAPON_MAX_TIER
                        && self.buyable(id)
                })
                .min_by_key(|&id| self.price(id));
            if let Some(id) = pick {
                if self.buy_gear(id, false) {
                    self.note(format!("backup weapon for {:?} coverage: item {}", family, id));
                    covered.push(family);
                    slots_left -= 1;
                }
            }
        }
    }

    /// Step 9: level-gated jewelry speculation for the luck stat
    fn speculative_jewelry(&mut self) {
        if self.saving_for_weapon || self.adventurer.level() < self.cfg.jewelry_level {
            return;
        }
        let mut slots_left =
            crate::model::adventurer::BAG_CAPACITY.saturating_sub(self.bag.items.len());
        slots_left = slots_left
            .saturating_sub(self.plan.purchases.iter().filter(|p| !p.equip).count());

        let candidates: Vec<u8> = self
            .market
            .item_ids
            .iter()
            .copied()
            .filter(|&id| is_jewelry(id) && self.buyable(id))
            .collect();
        for id in candidates {
            if slots_left == 0 {
                break;
            }
            // the listing itself can repeat an id; re-check against the
            // purchases made so far
            if !self.buyable(id) {
                continue;
            }
            let price = self.price(id);
            if self.gold < price || self.gold - price < self.cfg.jewelry_surplus_gold {
                continue;
            }
            if self.buy_gear(id, false) {
                self.note(format!("speculative jewelry for luck: item {}", id));
                slots_left -= 1;
            }
        }
    }

    /// The armor family carrying the most equipped greatness
    fn committed_material(&self) -> ArmorMaterial {
        let mut totals = [(ArmorMaterial::Cloth, 0u32), (ArmorMaterial::Hide, 0), (ArmorMaterial::Metal, 0)];
        for slot in Slot::ARMOR {
            if let Some(worn) = self.adventurer.equipment.in_slot(slot) {
                if let Some(material) = worn.armor_material() {
                    for entry in totals.iter_mut() {
                        if entry.0 == material {
                            entry.1 += worn.greatness() as u32;
                        }
                    }
                }
            }
        }
        totals.iter().max_by_key(|(_, g)| *g).map(|(m, _)| *m).unwrap_or(ArmorMaterial::Metal)
    }
}

fn div_ceil(a: u16, b: u16) -> u16 {
    (a + b - 1) / b
}
