//! Rule-based decision engine
//!
//! Each sub-module consumes an immutable snapshot (plus evaluator output where
//! combat is involved) and produces an intended action with a human-readable
//! rationale. The engine is a heuristic policy: correctness means reproducing
//! the documented rules, not optimal play.

pub mod combat;
pub mod gear;
pub mod market;
pub mod stats;

pub use combat::{decide_combat, CombatAction, CombatContext, CombatDecision};
pub use gear::{consider_weapon_swap, WeaponSwap};
pub use market::{plan_market, MarketPlan, Purchase};
pub use stats::{allocate_stats, StatAllocation};

use serde::{Deserialize, Serialize};

/// An intended game action, later lowered to a chain call list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Explore { till_beast: bool },
    Attack { to_death: bool },
    Flee,
    Equip { item_ids: Vec<u8> },
    BuyItems { potions: u8, purchases: Vec<Purchase> },
    UpgradeStats { allocation: StatAllocation },
}

/// A decision plus the reasoning behind it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub rationale: String,
}
