//! Outer game loop
//!
//! Snapshot, classify, decide, execute, resync. The loop owns the session
//! memory the chain does not carry, a consecutive-failure budget with
//! exponential backoff, and the triage that separates a dead game from a
//! stale read from a transient fault.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use starknet_types_core::felt::Felt;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};

use crate::chain::{calls, Call, StateReader, TxSubmitter};
use crate::core::config::EngineConfig;
use crate::core::error::{DelveError, Result};
use crate::evaluator::{simulate_combat, simulate_flee};
use crate::executor::{triage, Executor, Fingerprint, Triage};
use crate::model::GameState;
use crate::phase::{classify, Phase, SessionMemory};
use crate::strategy::{
    allocate_stats, consider_weapon_swap, decide_combat, plan_market, Action, CombatAction,
    CombatContext, Decision,
};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

pub struct GameRunner<C> {
    chain: Arc<C>,
    executor: Executor<C>,
    cfg: EngineConfig,
    telemetry: TelemetrySink,
    game_address: Felt,
    game_id: u64,
    memory: SessionMemory,
    shutdown: watch::Receiver<bool>,
}

impl<C: StateReader + TxSubmitter> GameRunner<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain: Arc<C>,
        executor: Executor<C>,
        cfg: EngineConfig,
        telemetry: TelemetrySink,
        game_address: Felt,
        game_id: u64,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            chain,
            executor,
            cfg,
            telemetry,
            game_address,
            game_id,
            memory: SessionMemory::default(),
            shutdown,
        }
    }

    /// Play the game until death, a hard fault, or a shutdown signal.
    pub async fn run(mut self) -> Result<()> {
        let mut state = self.refetch().await?;
        let mut consecutive_failures = 0u32;

        loop {
            if *self.shutdown.borrow() {
                tracing::info!(game_id = self.game_id, "shutdown requested, leaving the game");
                return Ok(());
            }

            self.memory.observe(&state);
            let phase = classify(&state, &self.memory);
            self.emit_snapshot(&state, phase);

            if phase == Phase::Dead {
                tracing::info!(
                    game_id = self.game_id,
                    xp = state.adventurer.xp,
                    "adventurer is dead, run over"
                );
                return Ok(());
            }

            // Racing against the shutdown channel aborts in-flight waits
            // (submission retries, receipt polls, resync); the per-attempt
            // signer makes dropping the step future safe
            let mut shutdown = self.shutdown.clone();
            let step = tokio::select! {
                result = self.step(&state, phase) => result,
                _ = shutdown.changed() => {
                    tracing::info!(game_id = self.game_id, "shutdown requested, aborting step");
                    return Ok(());
                }
            };

            match step {
                Ok(Some(next)) => {
                    state = next;
                    consecutive_failures = 0;
                }
                Ok(None) => {
                    // Decision resolved without a transaction; reclassify
                }
                Err(e) => {
                    let msg = e.to_string();
                    tracing::warn!(game_id = self.game_id, ?phase, error = %msg, "step failed");
                    self.telemetry.emit(TelemetryEvent::EngineError {
                        game_id: self.game_id,
                        context: format!("{phase:?}"),
                        error: msg.clone(),
                    });

                    match triage(&msg, &self.cfg) {
                        Triage::HardPermanent => {
                            return Err(DelveError::GameOver(msg));
                        }
                        Triage::LikelyStale => {
                            // Not this loop's fault: refresh and re-decide
                            state = self.refetch().await?;
                        }
                        Triage::Transient => {
                            consecutive_failures += 1;
                            if consecutive_failures > self.cfg.failure_budget {
                                return Err(DelveError::Submission(format!(
                                    "failure budget exhausted: {msg}"
                                )));
                            }
                            self.backoff(consecutive_failures).await;
                            state = self.refetch().await?;
                        }
                    }
                }
            }
        }
    }

    /// One decision for the current phase. Returns the post-transaction
    /// snapshot, or None when the decision needed no transaction.
    async fn step(&mut self, state: &GameState, phase: Phase) -> Result<Option<GameState>> {
        let decision = match phase {
            Phase::Dead => return Ok(None),
            Phase::StarterBeast | Phase::InBattle => match self.decide_combat_phase(state) {
                Some(decision) => decision,
                None => return Ok(None),
            },
            Phase::StatUpgrade => self.decide_stat_upgrade(state)?,
            Phase::Shopping => match self.decide_shopping(state) {
                Some(decision) => decision,
                None => return Ok(None),
            },
            Phase::Exploring => Decision {
                action: Action::Explore { till_beast: true },
                rationale: "nothing pending, exploring until a beast".into(),
            },
        };
        self.act(decision, state).await.map(Some)
    }

    fn decide_combat_phase(&mut self, state: &GameState) -> Option<Decision> {
        let adventurer = &state.adventurer;
        // classify() only routes here with a live beast present
        let beast = state.beast.as_ref()?;

        let mut rng = StdRng::from_entropy();
        let sim = simulate_combat(adventurer, &state.bag, beast, self.cfg.sim_samples, &mut rng);
        let flee = simulate_flee(adventurer, beast, self.cfg.sim_samples, &mut rng);
        self.telemetry.emit(TelemetryEvent::Simulation {
            game_id: self.game_id,
            win_rate: sim.win_rate,
            death_rate: sim.death_rate,
            expected_hp_loss: sim.expected_hp_loss,
            expected_hp_loss_on_win: sim.expected_hp_loss_on_win,
            expected_rounds: sim.expected_rounds,
            flee_death_rate: flee.flee_death_rate,
            flee_guaranteed: flee.guaranteed,
        });

        // One gear-swap attempt per encounter, before committing to the fight
        if !self.memory.gear_swap_attempted(beast.identity()) {
            self.memory.mark_gear_swap(beast.identity());
            if let Some(swap) =
                consider_weapon_swap(adventurer, &state.bag, beast, sim.win_rate, &self.cfg)
            {
                return Some(Decision {
                    action: Action::Equip { item_ids: vec![swap.item_id] },
                    rationale: swap.rationale,
                });
            }
        }

        let ctx = CombatContext { adventurer, beast, sim: &sim, flee: &flee };
        let decision = decide_combat(&ctx, &self.cfg);
        let action = match decision.action {
            CombatAction::Attack { to_death } => Action::Attack { to_death },
            CombatAction::Flee => Action::Flee,
        };
        Some(Decision { action, rationale: decision.rationale })
    }

    fn decide_stat_upgrade(&self, state: &GameState) -> Result<Decision> {
        let allocation = allocate_stats(&state.adventurer, &self.cfg);
        self.telemetry.emit(TelemetryEvent::StatAllocation {
            game_id: self.game_id,
            allocation,
        });

        if allocation.is_empty() {
            // Every stat capped; the points cannot be placed and the phase
            // cannot clear
            return Err(DelveError::GameOver(
                "all stats capped with upgrade points outstanding".into(),
            ));
        }
        if allocation.unspent > 0 {
            tracing::warn!(
                game_id = self.game_id,
                unspent = allocation.unspent,
                "stat caps left upgrade points unplaced"
            );
        }

        Ok(Decision {
            action: Action::UpgradeStats { allocation },
            rationale: "placing available stat points".into(),
        })
    }

    fn decide_shopping(&mut self, state: &GameState) -> Option<Decision> {
        let plan = plan_market(&state.adventurer, &state.bag, &state.market, &self.cfg);
        let level = state.adventurer.level();

        self.telemetry.emit(TelemetryEvent::MarketAction {
            game_id: self.game_id,
            potions: plan.potions,
            item_ids: plan.purchases.iter().map(|p| p.id).collect(),
            gold_spent: plan.gold_spent,
            rationale: plan.rationale.clone(),
        });

        // The visit is spent either way; an empty plan just skips the tx
        self.memory.mark_shopped(level);
        if plan.is_empty() {
            return None;
        }

        Some(Decision {
            action: Action::BuyItems { potions: plan.potions, purchases: plan.purchases },
            rationale: plan.rationale.join("; "),
        })
    }

    /// Lower the decision to chain calls, execute, and resync: the returned
    /// snapshot post-dates the transaction unless the fingerprint never moved.
    async fn act(&self, decision: Decision, state: &GameState) -> Result<GameState> {
        let label = action_label(&decision.action);
        self.telemetry.emit(TelemetryEvent::Decision {
            game_id: self.game_id,
            action: label.to_string(),
            rationale: decision.rationale,
        });

        let before = Fingerprint::of(state);
        self.executor.execute(self.lower(&decision.action), label).await?;
        self.executor.await_state_change(before).await
    }

    fn lower(&self, action: &Action) -> Vec<Call> {
        let game = self.game_address;
        let id = self.game_id;
        match action {
            Action::Explore { till_beast } => vec![calls::explore(game, id, *till_beast)],
            Action::Attack { to_death } => vec![calls::attack(game, id, *to_death)],
            Action::Flee => vec![calls::flee(game, id)],
            Action::Equip { item_ids } => vec![calls::equip(game, id, item_ids)],
            Action::BuyItems { potions, purchases } => {
                vec![calls::buy_items(game, id, *potions, purchases)]
            }
            Action::UpgradeStats { allocation } => {
                vec![calls::select_stat_upgrades(game, id, allocation)]
            }
        }
    }

    async fn refetch(&self) -> Result<GameState> {
        match self.chain.read_game_state(self.game_id).await? {
            Some(state) => Ok(state),
            None => Err(DelveError::GameOver("game not found on chain".into())),
        }
    }

    async fn backoff(&mut self, failures: u32) {
        let secs = self
            .cfg
            .backoff_base_secs
            .saturating_mul(1u64 << failures.saturating_sub(1).min(16))
            .min(self.cfg.backoff_cap_secs);
        tracing::info!(game_id = self.game_id, secs, "backing off before retry");
        tokio::select! {
            _ = sleep(Duration::from_secs(secs)) => {}
            _ = self.shutdown.changed() => {}
        }
    }

    fn emit_snapshot(&self, state: &GameState, phase: Phase) {
        let adventurer = &state.adventurer;
        self.telemetry.emit(TelemetryEvent::Snapshot {
            game_id: self.game_id,
            phase,
            health: adventurer.health,
            max_health: adventurer.max_health(),
            level: adventurer.level(),
            gold: adventurer.gold,
            xp: adventurer.xp,
            beast_health: state.beast.as_ref().map(|b| b.health),
        });
    }
}

fn action_label(action: &Action) -> &'static str {
    match action {
        Action::Explore { .. } => "explore",
        Action::Attack { .. } => "attack",
        Action::Flee => "flee",
        Action::Equip { .. } => "equip",
        Action::BuyItems { .. } => "buy_items",
        Action::UpgradeStats { .. } => "upgrade_stats",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StatAllocation;

    #[test]
    fn test_action_labels_cover_every_entrypoint() {
        let allocation = StatAllocation::default();
        let actions = [
            Action::Explore { till_beast: true },
            Action::Attack { to_death: false },
            Action::Flee,
            Action::Equip { item_ids: vec![7] },
            Action::BuyItems { potions: 1, purchases: vec![] },
            Action::UpgradeStats { allocation },
        ];
        let labels: Vec<_> = actions.iter().map(action_label).collect();
        let unique: std::collections::HashSet<_> = labels.iter().collect();
        assert_eq!(unique.len(), actions.len());
    }
}
