//! Pure damage formulas shared by the evaluator and the decision engine
//!
//! These reproduce the game contracts' arithmetic; the engine treats them as
//! given functions, not something to tune.

use super::adventurer::Adventurer;
use super::beast::Beast;
use super::item::{is_critical_ring, matchup, necklace_boost, Matchup, Slot};

/// Strength adds 10% of base damage per point
pub const STRENGTH_BONUS: f64 = 0.10;

/// A critical-type ring adds 3% of base damage per point of its greatness
pub const CRIT_RING_BONUS: f64 = 0.03;

/// A matching necklace strengthens armor by 3% per point of its greatness
pub const NECKLACE_BONUS: f64 = 0.03;

/// No strike ever lands for less than this
pub const MINIMUM_DAMAGE: u16 = 2;

/// Base and critical damage for one attacker/defender pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageSpec {
    pub base: u16,
    pub critical: u16,
}

/// Player critical-hit probability: luck / 100, capped at 1
pub fn player_crit_chance(luck: u16) -> f64 {
    (luck as f64 / 100.0).min(1.0)
}

/// Beast critical-hit probability: adventurer level / 100, capped at 1
pub fn beast_crit_chance(adventurer_level: u16) -> f64 {
    (adventurer_level as f64 / 100.0).min(1.0)
}

/// Damage the player deals to the beast per attack
pub fn player_damage(adventurer: &Adventurer, beast: &Beast) -> DamageSpec {
    let (power, elemental) = match &adventurer.equipment.weapon {
        Some(weapon) => {
            let power = weapon.greatness() as f64 * (6 - weapon.tier()) as f64;
            let elemental = match weapon.weapon_type() {
                Some(family) => matchup(family, beast.armor_material()).multiplier(),
                None => Matchup::Fair.multiplier(),
            };
            (power, elemental)
        }
        // Bare fists: greatness 1, worst tier, no elemental identity
        None => (1.0, Matchup::Fair.multiplier()),
    };

    let strength_bonus = STRENGTH_BONUS * adventurer.stats.strength as f64;
    let base_raw = power * elemental * (1.0 + strength_bonus);

    let ring_bonus = match &adventurer.equipment.ring {
        Some(ring) if is_critical_ring(ring.id) => {
            base_raw * CRIT_RING_BONUS * ring.greatness() as f64
        }
        _ => 0.0,
    };
    // Criticals double the adjusted base, then add the ring bonus
    let critical_raw = base_raw * 2.0 + ring_bonus;

    DamageSpec {
        base: floor_damage(base_raw),
        critical: floor_damage(critical_raw),
    }
}

/// Damage the beast deals against each of the five armor slots.
///
/// The beast picks a slot uniformly at random per hit; the evaluator samples
/// over this table.
pub fn beast_damage_by_slot(adventurer: &Adventurer, beast: &Beast) -> [DamageSpec; 5] {
    let beast_power = beast.level as f64 * (6 - beast.tier()) as f64;

    let neck = adventurer.equipment.neck.as_ref();

    let mut table = [DamageSpec { base: MINIMUM_DAMAGE, critical: MINIMUM_DAMAGE }; 5];
    for (i, slot) in Slot::ARMOR.into_iter().enumerate() {
        let (armor_value, elemental) = match adventurer.equipment.in_slot(slot) {
            Some(armor) => {
                let value = armor.greatness() as f64 * (6 - armor.tier()) as f64;
                let elemental = match armor.armor_material() {
                    Some(material) => matchup(beast.attack_type(), material).multiplier(),
                    None => Matchup::Fair.multiplier(),
                };
                // A matching necklace reinforces this armor family
                let neck_bonus = match neck.and_then(|n| necklace_boost(n.id)) {
                    Some(boosted) if Some(boosted) == armor.armor_material() => {
                        value * NECKLACE_BONUS * neck.map_or(0.0, |n| n.greatness() as f64)
                    }
                    _ => 0.0,
                };
                (value + neck_bonus, elemental)
            }
            // Naked slot: nothing absorbs, no elemental identity to exploit
            None => (0.0, Matchup::Fair.multiplier()),
        };

        let base = beast_power * elemental - armor_value;
        let critical = beast_power * elemental * 2.0 - armor_value;
        table[i] = DamageSpec {
            base: floor_damage(base),
            critical: floor_damage(critical),
        };
    }
    table
}

fn floor_damage(raw: f64) -> u16 {
    if raw <= MINIMUM_DAMAGE as f64 {
        MINIMUM_DAMAGE
    } else {
        raw.floor() as u16
    }
}
