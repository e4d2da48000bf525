//! Phase classification
//!
//! The phase is a pure function of the latest snapshot plus two pieces of
//! session memory that the chain does not carry: whether this level's market
//! has already been shopped, and whether a gear swap was already attempted
//! against the current beast.

use serde::{Deserialize, Serialize};

use crate::model::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Dead,
    StarterBeast,
    InBattle,
    StatUpgrade,
    Shopping,
    Exploring,
}

/// Per-game memory that lives outside the chain snapshot
#[derive(Debug, Clone, Default)]
pub struct SessionMemory {
    shopped_at_level: Option<u16>,
    gear_swap_beast: Option<u64>,
}

impl SessionMemory {
    /// Record a completed shopping pass for the current level
    pub fn mark_shopped(&mut self, level: u16) {
        self.shopped_at_level = Some(level);
    }

    pub fn has_shopped(&self, level: u16) -> bool {
        self.shopped_at_level == Some(level)
    }

    /// Record a gear-swap attempt against a beast identity
    pub fn mark_gear_swap(&mut self, beast_identity: u64) {
        self.gear_swap_beast = Some(beast_identity);
    }

    pub fn gear_swap_attempted(&self, beast_identity: u64) -> bool {
        self.gear_swap_beast == Some(beast_identity)
    }

    /// Forget encounter memory when the beast changes, and shopping memory
    /// when the level moves on
    pub fn observe(&mut self, state: &GameState) {
        match &state.beast {
            Some(beast) => {
                if self.gear_swap_beast.is_some()
                    && self.gear_swap_beast != Some(beast.identity())
                {
                    self.gear_swap_beast = None;
                }
            }
            None => self.gear_swap_beast = None,
        }
        if let Some(level) = self.shopped_at_level {
            if state.adventurer.level() != level {
                self.shopped_at_level = None;
            }
        }
    }
}

/// Classify a snapshot into the phase that selects the next decision module
pub fn classify(state: &GameState, memory: &SessionMemory) -> Phase {
    let adventurer = &state.adventurer;

    if adventurer.health == 0 {
        return Phase::Dead;
    }

    if let Some(beast) = &state.beast {
        if beast.health > 0 {
            return if adventurer.is_starter() { Phase::StarterBeast } else { Phase::InBattle };
        }
    }

    if adventurer.stat_upgrades_available > 0 {
        return Phase::StatUpgrade;
    }

    if !state.market.is_empty() && !memory.has_shopped(adventurer.level()) {
        return Phase::Shopping;
    }

    Phase::Exploring
}
