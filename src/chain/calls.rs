//! Call builders for the game contract's entrypoints
//!
//! Every decision the strategy layer makes lowers to one of these. Flee
//! deliberately has no to-the-death variant: repeated flee attempts against
//! an identical seed would never terminate.

use starknet_types_core::felt::Felt;

use super::Call;
use crate::signing::selector_from_name;
use crate::strategy::{Purchase, StatAllocation};

pub fn explore(game: Felt, game_id: u64, till_beast: bool) -> Call {
    Call {
        to: game,
        selector: selector_from_name("explore"),
        calldata: vec![Felt::from(game_id), Felt::from(till_beast as u64)],
    }
}

pub fn attack(game: Felt, game_id: u64, to_death: bool) -> Call {
    Call {
        to: game,
        selector: selector_from_name("attack"),
        calldata: vec![Felt::from(game_id), Felt::from(to_death as u64)],
    }
}

pub fn flee(game: Felt, game_id: u64) -> Call {
    Call {
        to: game,
        selector: selector_from_name("flee"),
        // single attempt, never to the death
        calldata: vec![Felt::from(game_id), Felt::ZERO],
    }
}

pub fn equip(game: Felt, game_id: u64, item_ids: &[u8]) -> Call {
    let mut calldata = vec![Felt::from(game_id), Felt::from(item_ids.len() as u64)];
    calldata.extend(item_ids.iter().map(|&id| Felt::from(id as u64)));
    Call { to: game, selector: selector_from_name("equip"), calldata }
}

pub fn buy_items(game: Felt, game_id: u64, potions: u8, purchases: &[Purchase]) -> Call {
    let mut calldata = vec![
        Felt::from(game_id),
        Felt::from(potions as u64),
        Felt::from(purchases.len() as u64),
    ];
    for p in purchases {
        calldata.push(Felt::from(p.id as u64));
        calldata.push(Felt::from(p.equip as u64));
    }
    Call { to: game, selector: selector_from_name("buy_items"), calldata }
}

pub fn select_stat_upgrades(game: Felt, game_id: u64, allocation: &StatAllocation) -> Call {
    Call {
        to: game,
        selector: selector_from_name("select_stat_upgrades"),
        calldata: vec![
            Felt::from(game_id),
            Felt::from(allocation.strength as u64),
            Felt::from(allocation.dexterity as u64),
            Felt::from(allocation.vitality as u64),
            Felt::from(allocation.intelligence as u64),
            Felt::from(allocation.wisdom as u64),
            Felt::from(allocation.charisma as u64),
        ],
    }
}
