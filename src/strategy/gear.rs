//! Pre-combat weapon swap
//!
//! Equipping costs a turn, so a swap is only worth it when the fight looks
//! bad, the adventurer can absorb the beast's free counter-attack, and a bag
//! weapon scores strictly better against this beast's armor.

use serde::{Deserialize, Serialize};

use crate::core::config::EngineConfig;
use crate::model::adventurer::{Adventurer, Bag};
use crate::model::beast::Beast;
use crate::model::combat_math::beast_damage_by_slot;
use crate::model::item::{matchup, Item, Slot};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponSwap {
    pub item_id: u8,
    pub rationale: String,
}

/// Consider swapping the equipped weapon for a bag weapon before fighting.
///
/// Fires at most once per encounter (enforced by the caller's session
/// memory). Items close to the permanent suffix unlock are never candidates,
/// in either direction: their invested greatness outweighs matchup gains.
pub fn consider_weapon_swap(
    adventurer: &Adventurer,
    bag: &Bag,
    beast: &Beast,
    projected_win_rate: f64,
    cfg: &EngineConfig,
) -> Option<WeaponSwap> {
    if projected_win_rate >= cfg.gear_swap_win_rate {
        return None;
    }

    // The swap turn gives the beast a free hit; worst case must be survivable
    let worst_hit = beast_damage_by_slot(adventurer, beast)
        .iter()
        .map(|d| d.critical)
        .max()
        .unwrap_or(0);
    if adventurer.health <= worst_hit {
        return None;
    }

    // Protection applies in both directions: an equipped weapon near the
    // suffix unlock is never benched either
    let equipped = adventurer.equipment.weapon.as_ref();
    if equipped.map_or(false, |w| w.greatness() >= cfg.gear_swap_greatness_limit) {
        return None;
    }

    let equipped_score = equipped.map(|w| effective_score(w, beast)).unwrap_or(0.0);

    let best = bag
        .items
        .iter()
        .filter(|i| i.slot() == Slot::Weapon)
        .filter(|i| i.greatness() < cfg.gear_swap_greatness_limit)
        .map(|i| (i, effective_score(i, beast)))
        .filter(|(_, score)| *score > equipped_score)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    best.map(|(item, score)| WeaponSwap {
        item_id: item.id,
        rationale: format!(
            "swapping weapon to item {} (score {:.2} vs equipped {:.2}, win rate {:.3})",
            item.id, score, equipped_score, projected_win_rate
        ),
    })
}

/// Effective damage score: tier multiplier times elemental multiplier
fn effective_score(weapon: &Item, beast: &Beast) -> f64 {
    let tier_mult = (6 - weapon.tier()) as f64;
    let elemental = match weapon.weapon_type() {
        Some(family) => matchup(family, beast.armor_material()).multiplier(),
        None => 0.0,
    };
    tier_mult * elemental
}
