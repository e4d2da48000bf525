//! Monte Carlo combat and flee evaluation
//!
//! Pure with respect to its inputs except for the caller-supplied RNG: the
//! per-round damage tables are precomputed once per call, then rounds are
//! sampled until one side drops. The player always strikes first and a beast
//! at zero health does not retaliate that round.

use rand::Rng;

use crate::model::adventurer::{Adventurer, Bag};
use crate::model::beast::Beast;
use crate::model::combat_math::{
    beast_crit_chance, beast_damage_by_slot, player_crit_chance, player_damage,
};

/// Default sample count
pub const DEFAULT_SAMPLES: u32 = 5000;

/// Statistics from simulated fights to the death
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatOutcome {
    pub win_rate: f64,
    /// Mean HP lost across all samples, wins and deaths alike
    pub expected_hp_loss: f64,
    /// Mean HP lost across winning samples only
    pub expected_hp_loss_on_win: f64,
    pub expected_rounds: f64,
    pub death_rate: f64,
}

/// Statistics from simulated flee attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FleeOutcome {
    pub expected_attempts: f64,
    pub expected_hp_loss: f64,
    pub flee_death_rate: f64,
    /// True when dexterity >= level made the escape deterministic
    pub guaranteed: bool,
}

/// Simulate fighting the beast to the death.
///
/// Fast path: when the beast cannot survive even a non-critical hit, the
/// outcome is certain and no sampling happens.
pub fn simulate_combat<R: Rng>(
    adventurer: &Adventurer,
    bag: &Bag,
    beast: &Beast,
    samples: u32,
    rng: &mut R,
) -> CombatOutcome {
    let player = player_damage(adventurer, beast);
    let beast_table = beast_damage_by_slot(adventurer, beast);

    if beast.health <= player.base {
        return CombatOutcome {
            win_rate: 1.0,
            expected_hp_loss: 0.0,
            expected_hp_loss_on_win: 0.0,
            expected_rounds: 1.0,
            death_rate: 0.0,
        };
    }

    let player_crit = player_crit_chance(adventurer.luck(bag));
    let beast_crit = beast_crit_chance(adventurer.level());

    let mut wins = 0u32;
    let mut total_loss = 0u64;
    let mut win_loss = 0u64;
    let mut total_rounds = 0u64;

    for _ in 0..samples.max(1) {
        let mut hp = adventurer.health as i32;
        let mut beast_hp = beast.health as i32;
        let start_hp = hp;
        let mut rounds = 0u32;

        loop {
            rounds += 1;

            let hit = if rng.gen_bool(player_crit) { player.critical } else { player.base };
            beast_hp -= hit as i32;
            if beast_hp <= 0 {
                wins += 1;
                win_loss += (start_hp - hp) as u64;
                break;
            }

            let slot = rng.gen_range(0..5);
            let strike = &beast_table[slot];
            let counter = if rng.gen_bool(beast_crit) { strike.critical } else { strike.base };
            hp -= counter as i32;
            if hp <= 0 {
                hp = 0;
                break;
            }
        }

        total_loss += (start_hp - hp) as u64;
        total_rounds += rounds as u64;
    }

    let n = samples.max(1) as f64;
    let win_rate = wins as f64 / n;
    CombatOutcome {
        win_rate,
        expected_hp_loss: total_loss as f64 / n,
        expected_hp_loss_on_win: if wins > 0 { win_loss as f64 / wins as f64 } else { 0.0 },
        expected_rounds: total_rounds as f64 / n,
        death_rate: 1.0 - win_rate,
    }
}

/// Simulate fleeing the beast.
///
/// With dexterity at or above level the escape succeeds on the first attempt
/// with certainty; otherwise each failed attempt grants the beast one free
/// strike from the same per-slot damage table used in combat.
pub fn simulate_flee<R: Rng>(
    adventurer: &Adventurer,
    beast: &Beast,
    samples: u32,
    rng: &mut R,
) -> FleeOutcome {
    let level = adventurer.level();
    let dex = adventurer.stats.dexterity as u16;

    if dex >= level {
        return FleeOutcome {
            expected_attempts: 1.0,
            expected_hp_loss: 0.0,
            flee_death_rate: 0.0,
            guaranteed: true,
        };
    }

    let success_chance = flee_chance(dex, level);
    let beast_table = beast_damage_by_slot(adventurer, beast);
    let beast_crit = beast_crit_chance(level);

    let mut total_attempts = 0u64;
    let mut total_loss = 0u64;
    let mut deaths = 0u32;

    for _ in 0..samples.max(1) {
        let mut hp = adventurer.health as i32;
        let start_hp = hp;
        let mut attempts = 0u64;

        loop {
            attempts += 1;
            if rng.gen_bool(success_chance) {
                break;
            }
            let slot = rng.gen_range(0..5);
            let strike = &beast_table[slot];
            let hit = if rng.gen_bool(beast_crit) { strike.critical } else { strike.base };
            hp -= hit as i32;
            if hp <= 0 {
                hp = 0;
                deaths += 1;
                break;
            }
        }

        total_attempts += attempts;
        total_loss += (start_hp - hp) as u64;
    }

    let n = samples.max(1) as f64;
    FleeOutcome {
        expected_attempts: total_attempts as f64 / n,
        expected_hp_loss: total_loss as f64 / n,
        flee_death_rate: deaths as f64 / n,
        guaranteed: false,
    }
}

/// Per-attempt flee success probability: min(1, (255 * dex / level) / 256)
pub fn flee_chance(dexterity: u16, level: u16) -> f64 {
    if level == 0 {
        return 1.0;
    }
    let scaled = 255.0 * dexterity as f64 / level as f64;
    (scaled / 256.0).min(1.0)
}
