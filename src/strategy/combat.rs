//! Combat decision ladder
//!
//! An ordered set of rules over the simulated win rate. Flee-to-the-death is
//! never emitted: repeated flee attempts against the same seed would loop
//! without terminating, so fleeing is always a single attempt.

use serde::{Deserialize, Serialize};

use crate::core::config::EngineConfig;
use crate::evaluator::{CombatOutcome, FleeOutcome};
use crate::model::adventurer::{Adventurer, POTION_HEAL};
use crate::model::beast::Beast;

/// Context provided to the combat decision
pub struct CombatContext<'a> {
    pub adventurer: &'a Adventurer,
    pub beast: &'a Beast,
    pub sim: &'a CombatOutcome,
    pub flee: &'a FleeOutcome,
}

/// What to do about the current encounter. The to-death flag exists only on
/// Attack; a flee is always a single attempt by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatAction {
    Attack { to_death: bool },
    Flee,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatDecision {
    pub action: CombatAction,
    pub rationale: String,
    /// Expected HP cost of the kill net of the gold it pays for in potions
    pub net_hp_cost: f64,
    pub profitable: bool,
}

/// Decide the current encounter.
///
/// Ladder, first match wins:
/// 1. starter beast: always attack to the death (guaranteed one-hit kill)
/// 2. win rate above the guaranteed band: attack to the death
/// 3. strong band: attack if profitable (to death when the expected loss is
///    comfortable), else flee when hurting and fleeing is safer, else attack
/// 4. favored band: attack if profitable, else flee if safe, else attack
/// 5. below that: whichever of flee/fight dies less, attack as last resort
pub fn decide_combat(ctx: &CombatContext, cfg: &EngineConfig) -> CombatDecision {
    let sim = ctx.sim;
    let flee = ctx.flee;
    let health = ctx.adventurer.health as f64;

    let potion_cost = ctx.adventurer.potion_cost() as f64;
    let gold_value = ctx.beast.gold_reward() as f64 * (POTION_HEAL as f64 / potion_cost);
    let net_hp_cost = sim.expected_hp_loss_on_win - gold_value;
    let profitable = net_hp_cost <= 0.0;

    let decide = |action: CombatAction, rationale: String| CombatDecision {
        action,
        rationale,
        net_hp_cost,
        profitable,
    };

    if ctx.adventurer.is_starter() {
        return decide(
            CombatAction::Attack { to_death: true },
            "starter beast: guaranteed one-hit kill".into(),
        );
    }

    if sim.win_rate > cfg.guaranteed_win_rate {
        let rationale = if sim.expected_rounds <= 1.0 {
            format!("guaranteed one-hit kill (win rate {:.3})", sim.win_rate)
        } else {
            format!("guaranteed kill (win rate {:.3})", sim.win_rate)
        };
        return decide(CombatAction::Attack { to_death: true }, rationale);
    }

    let hp_low = health < cfg.low_hp_fraction * ctx.adventurer.max_health() as f64;
    let flee_safer = flee.flee_death_rate < sim.death_rate;

    if sim.win_rate >= cfg.strong_win_rate {
        if profitable {
            let comfortable = sim.expected_hp_loss_on_win < cfg.comfortable_loss_fraction * health;
            return decide(
                CombatAction::Attack { to_death: comfortable },
                format!(
                    "strong favorite, profitable (net HP cost {:.1}, loss on win {:.1})",
                    net_hp_cost, sim.expected_hp_loss_on_win
                ),
            );
        }
        if hp_low && flee_safer {
            return decide(
                CombatAction::Flee,
                format!(
                    "strong favorite but unprofitable and hurting: flee death {:.3} < fight death {:.3}",
                    flee.flee_death_rate, sim.death_rate
                ),
            );
        }
        return decide(
            CombatAction::Attack { to_death: false },
            "strong favorite, unprofitable but no better option: forced attack".into(),
        );
    }

    if sim.win_rate >= cfg.favored_win_rate {
        if profitable {
            return decide(
                CombatAction::Attack { to_death: false },
                format!("favored and profitable (net HP cost {:.1})", net_hp_cost),
            );
        }
        let flee_safe = flee.flee_death_rate < cfg.safe_flee_death_rate && flee_safer;
        if flee_safe {
            return decide(
                CombatAction::Flee,
                format!("favored but unprofitable: safe flee ({:.3} death)", flee.flee_death_rate),
            );
        }
        return decide(
            CombatAction::Attack { to_death: false },
            "favored, unprofitable, no safe exit: forced attack".into(),
        );
    }

    // Coin flip and worse share one rule: minimize death rate, attack as
    // last resort. The band only changes the label.
    let band = if sim.win_rate >= cfg.coin_flip_win_rate { "coin flip" } else { "unfavored" };
    if flee_safer {
        return decide(
            CombatAction::Flee,
            format!(
                "{} (win rate {:.3}): flee dies less ({:.3} vs {:.3})",
                band, sim.win_rate, flee.flee_death_rate, sim.death_rate
            ),
        );
    }
    decide(
        CombatAction::Attack { to_death: false },
        format!(
            "{} (win rate {:.3}) but flee is no safer: attack as last resort",
            band, sim.win_rate
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(win_rate: f64, loss_on_win: f64) -> CombatOutcome {
        CombatOutcome {
            win_rate,
            expected_hp_loss: loss_on_win,
            expected_hp_loss_on_win: loss_on_win,
            expected_rounds: 3.0,
            death_rate: 1.0 - win_rate,
        }
    }

    fn flee(death_rate: f64) -> FleeOutcome {
        FleeOutcome {
            expected_attempts: 1.5,
            expected_hp_loss: 5.0,
            flee_death_rate: death_rate,
            guaranteed: false,
        }
    }

    fn adventurer() -> Adventurer {
        let mut a = Adventurer::default();
        a.health = 100;
        a.xp = 100; // level 10, clear of the starter window
        a
    }

    fn beast() -> Beast {
        Beast { id: 1, level: 10, health: 60, specials: (0, 0) }
    }

    fn decide(a: &Adventurer, b: &Beast, sim: &CombatOutcome, fl: &FleeOutcome) -> CombatDecision {
        decide_combat(
            &CombatContext { adventurer: a, beast: b, sim, flee: fl },
            &EngineConfig::default(),
        )
    }

    #[test]
    fn test_starter_always_attacks_to_death() {
        let mut a = adventurer();
        a.xp = 0;
        // even a hopeless simulation cannot override the starter rule
        let sim = outcome(0.01, 90.0);
        let d = decide(&a, &beast(), &sim, &flee(0.0));
        assert_eq!(d.action, CombatAction::Attack { to_death: true });
        assert!(d.rationale.contains("one-hit kill"));
    }

    #[test]
    fn test_guaranteed_band_attacks_to_death() {
        let sim = outcome(0.995, 10.0);
        let d = decide(&adventurer(), &beast(), &sim, &flee(0.5));
        assert_eq!(d.action, CombatAction::Attack { to_death: true });
    }

    #[test]
    fn test_strong_band_profitable_comfortable_goes_to_death() {
        // loss on win 20 < 40% of 100 HP, and heavily gold-positive
        let sim = outcome(0.95, 20.0);
        let d = decide(&adventurer(), &beast(), &sim, &flee(0.5));
        assert!(d.profitable, "net {}", d.net_hp_cost);
        assert_eq!(d.action, CombatAction::Attack { to_death: true });
    }

    #[test]
    fn test_strong_band_unprofitable_full_hp_forces_attack() {
        let mut b = beast();
        b.id = 25; // tier 5: reward 5 gold, 5 HP of potions at level 10
        let sim = outcome(0.95, 60.0);
        let d = decide(&adventurer(), &b, &sim, &flee(0.01));
        assert!(!d.profitable);
        assert_eq!(d.action, CombatAction::Attack { to_death: false });
    }

    #[test]
    fn test_strong_band_unprofitable_low_hp_flees_when_safer() {
        let mut a = adventurer();
        a.health = 30; // below 40% of max 100
        let mut b = beast();
        b.id = 25;
        let sim = outcome(0.95, 60.0);
        let d = decide(&a, &b, &sim, &flee(0.01));
        assert_eq!(d.action, CombatAction::Flee);
    }

    #[test]
    fn test_favored_band_unprofitable_safe_flee() {
        let mut b = beast();
        b.id = 25;
        let sim = outcome(0.80, 80.0);
        let d = decide(&adventurer(), &b, &sim, &flee(0.01));
        assert_eq!(d.action, CombatAction::Flee);
    }

    #[test]
    fn test_coin_flip_picks_lower_death_rate() {
        let sim = outcome(0.60, 50.0);
        let d = decide(&adventurer(), &beast(), &sim, &flee(0.10));
        assert_eq!(d.action, CombatAction::Flee);

        let d = decide(&adventurer(), &beast(), &sim, &flee(0.60));
        assert_eq!(d.action, CombatAction::Attack { to_death: false });
    }

    #[test]
    fn test_band_label_separates_coin_flip_from_unfavored() {
        let d = decide(&adventurer(), &beast(), &outcome(0.60, 50.0), &flee(0.10));
        assert!(d.rationale.contains("coin flip"), "{}", d.rationale);

        let d = decide(&adventurer(), &beast(), &outcome(0.30, 50.0), &flee(0.10));
        assert!(d.rationale.contains("unfavored"), "{}", d.rationale);
    }

    #[test]
    fn test_hopeless_fight_attacks_as_last_resort_when_flee_no_safer() {
        let sim = outcome(0.10, 90.0);
        let d = decide(&adventurer(), &beast(), &sim, &flee(0.95));
        assert_eq!(d.action, CombatAction::Attack { to_death: false });
        assert!(d.rationale.contains("last resort"));
    }
}
