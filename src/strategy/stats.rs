//! Stat point allocation
//!
//! Points are spent one at a time through a fixed priority list. When the
//! preferred stat sits at the cap the point cascades down a fallback chain,
//! so every available point is spent unless literally every stat is capped.

use serde::{Deserialize, Serialize};

use crate::core::config::EngineConfig;
use crate::model::adventurer::{Adventurer, Stats, STAT_CAP};

/// How many points go to each stat
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatAllocation {
    pub strength: u8,
    pub dexterity: u8,
    pub vitality: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
    /// Points that could not be placed because every stat was capped
    pub unspent: u8,
}

impl StatAllocation {
    pub fn total(&self) -> u8 {
        self.strength + self.dexterity + self.vitality + self.intelligence + self.wisdom
            + self.charisma
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatKind {
    Strength,
    Dexterity,
    Vitality,
    Intelligence,
    Wisdom,
    Charisma,
}

/// Cap-overflow cascade, in priority order
const CASCADE: [StatKind; 6] = [
    StatKind::Vitality,
    StatKind::Dexterity,
    StatKind::Charisma,
    StatKind::Strength,
    StatKind::Intelligence,
    StatKind::Wisdom,
];

/// Allocate every available upgrade point.
///
/// Per-point priority:
/// 1. emergency vitality while health is below a quarter of max
/// 2. guarantee at least one dexterity, then at least one charisma
/// 3. keep charisma at ceil(level / 2), which pins potion cost at its floor
/// 4. below the late-game level everything else goes to dexterity
/// 5. from the late-game level on, hold dexterity at ceil(level * 0.55) and
///    send the remainder to vitality
pub fn allocate_stats(adventurer: &Adventurer, cfg: &EngineConfig) -> StatAllocation {
    let points = adventurer.stat_upgrades_available;
    let level = adventurer.level();
    let cha_target = (level as f64 / 2.0).ceil() as u8;
    let dex_floor = (level as f64 * cfg.dex_floor_factor).ceil() as u8;

    let mut working = adventurer.stats;
    let mut allocation = StatAllocation::default();

    for _ in 0..points {
        let hp_after_vit = crate::model::adventurer::max_health(working.vitality);
        let emergency =
            (adventurer.health as f64) < cfg.emergency_hp_fraction * hp_after_vit as f64;

        let preferred = if emergency {
            StatKind::Vitality
        } else if working.dexterity == 0 {
            StatKind::Dexterity
        } else if working.charisma == 0 {
            StatKind::Charisma
        } else if working.charisma < cha_target {
            StatKind::Charisma
        } else if level < cfg.late_game_level {
            StatKind::Dexterity
        } else if working.dexterity < dex_floor {
            StatKind::Dexterity
        } else {
            StatKind::Vitality
        };

        match place_point(&mut working, &mut allocation, preferred) {
            true => {}
            false => {
                allocation.unspent += 1;
            }
        }
    }

    allocation
}

/// Put one point on the preferred stat, cascading on cap overflow.
/// Returns false only when all six stats are capped.
fn place_point(stats: &mut Stats, allocation: &mut StatAllocation, preferred: StatKind) -> bool {
    let order = std::iter::once(preferred).chain(CASCADE.into_iter().filter(move |k| *k != preferred));
    for kind in order {
        let (value, count) = match kind {
            StatKind::Strength => (&mut stats.strength, &mut allocation.strength),
            StatKind::Dexterity => (&mut stats.dexterity, &mut allocation.dexterity),
            StatKind::Vitality => (&mut stats.vitality, &mut allocation.vitality),
            StatKind::Intelligence => (&mut stats.intelligence, &mut allocation.intelligence),
            StatKind::Wisdom => (&mut stats.wisdom, &mut allocation.wisdom),
            StatKind::Charisma => (&mut stats.charisma, &mut allocation.charisma),
        };
        if *value < STAT_CAP {
            *value += 1;
            *count += 1;
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adventurer(level_xp: u32, points: u8) -> Adventurer {
        let mut a = Adventurer::default();
        a.xp = level_xp;
        a.health = 200;
        a.stats.vitality = 10; // max health 250, well above emergency
        a.stat_upgrades_available = points;
        a
    }

    #[test]
    fn test_spends_every_point() {
        let a = adventurer(100, 5);
        let alloc = allocate_stats(&a, &EngineConfig::default());
        assert_eq!(alloc.total(), 5);
        assert_eq!(alloc.unspent, 0);
    }

    #[test]
    fn test_first_points_guarantee_dex_and_cha() {
        let a = adventurer(100, 2);
        let alloc = allocate_stats(&a, &EngineConfig::default());
        assert!(alloc.dexterity >= 1);
        assert!(alloc.charisma >= 1);
    }

    #[test]
    fn test_charisma_held_at_half_level() {
        // level 10 -> charisma target 5
        let a = adventurer(100, 8);
        let alloc = allocate_stats(&a, &EngineConfig::default());
        assert_eq!(a.stats.charisma + alloc.charisma, 5);
        // remainder (after the 1 guaranteed dex) goes to dexterity pre-15
        assert_eq!(alloc.dexterity, 3);
    }

    #[test]
    fn test_emergency_vitality_overrides() {
        let mut a = adventurer(100, 3);
        a.health = 20; // far below 25% of max
        let alloc = allocate_stats(&a, &EngineConfig::default());
        assert_eq!(alloc.vitality, 3);
    }

    #[test]
    fn test_late_game_dex_floor_then_vitality() {
        // level 16: dex floor = ceil(16 * 0.55) = 9, charisma target 8
        let mut a = adventurer(256, 20);
        a.stats.charisma = 8;
        a.stats.dexterity = 9;
        let alloc = allocate_stats(&a, &EngineConfig::default());
        // floors already satisfied: everything lands on vitality
        assert_eq!(alloc.vitality, 20);
    }

    #[test]
    fn test_cap_overflow_cascades() {
        let mut a = adventurer(100, 4);
        a.stats.dexterity = STAT_CAP;
        a.stats.charisma = STAT_CAP;
        let alloc = allocate_stats(&a, &EngineConfig::default());
        assert_eq!(alloc.dexterity, 0);
        assert_eq!(alloc.charisma, 0);
        assert_eq!(alloc.total(), 4);
    }

    #[test]
    fn test_all_capped_reports_unspent() {
        let mut a = adventurer(100, 3);
        a.stats = Stats {
            strength: STAT_CAP,
            dexterity: STAT_CAP,
            vitality: STAT_CAP,
            intelligence: STAT_CAP,
            wisdom: STAT_CAP,
            charisma: STAT_CAP,
        };
        let alloc = allocate_stats(&a, &EngineConfig::default());
        assert_eq!(alloc.total(), 0);
        assert_eq!(alloc.unspent, 3);
    }
}
