//! Consistency-aware transaction execution
//!
//! Owns the full submission lifecycle: fresh signer per attempt, bounded
//! submission await, rejection classification, receipt polling, and the
//! stale-read defense that keeps the decision engine from re-deciding
//! against pre-transaction state.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use starknet_types_core::felt::Felt;
use tokio::time::{sleep, timeout};

use crate::chain::{Call, ExecutionStatus, StateReader, SubmitOutcome, TxSubmitter};
use crate::core::config::{EngineConfig, SubmitMode};
use crate::core::error::{DelveError, Result};
use crate::model::GameState;
use crate::signing::hash::{InvokeFields, OutsideExecution};
use crate::signing::{short_string, ControllerClient, SessionCredentials};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Outer-loop classification of a failed iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Triage {
    /// The game itself is over or unreachable; abort the loop
    HardPermanent,
    /// The decision was made against stale state; refetch and retry free
    LikelyStale,
    /// Anything else; counts against the consecutive-failure budget
    Transient,
}

/// Case-insensitive substring triage over the configured phrase lists
pub fn triage(error: &str, cfg: &EngineConfig) -> Triage {
    let lowered = error.to_lowercase();
    if cfg.hard_permanent_phrases.iter().any(|p| lowered.contains(&p.to_lowercase())) {
        return Triage::HardPermanent;
    }
    if cfg.likely_stale_phrases.iter().any(|p| lowered.contains(&p.to_lowercase())) {
        return Triage::LikelyStale;
    }
    Triage::Transient
}

/// Is this rejection a contract revert that retrying cannot help?
pub fn is_revert(error: &str, cfg: &EngineConfig) -> bool {
    let lowered = error.to_lowercase();
    cfg.revert_markers.iter().any(|p| lowered.contains(&p.to_lowercase()))
}

/// The six fields whose movement proves the chain has seen our transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    health: u16,
    xp: u32,
    gold: u16,
    beast_health: u16,
    stat_upgrades: u8,
    action_count: u32,
}

impl Fingerprint {
    pub fn of(state: &GameState) -> Self {
        Self {
            health: state.adventurer.health,
            xp: state.adventurer.xp,
            gold: state.adventurer.gold,
            beast_health: state.beast.as_ref().map(|b| b.health).unwrap_or(0),
            stat_upgrades: state.adventurer.stat_upgrades_available,
            action_count: state.adventurer.action_count,
        }
    }
}

/// What execute() resolved to
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub tx_hash: Felt,
    /// Receipt polling ran out; treated as success-by-timeout
    pub confirmed_by_timeout: bool,
}

pub struct Executor<C> {
    chain: Arc<C>,
    creds: Arc<SessionCredentials>,
    chain_id: Felt,
    cfg: EngineConfig,
    telemetry: TelemetrySink,
    game_id: u64,
}

impl<C: StateReader + TxSubmitter> Executor<C> {
    pub fn new(
        chain: Arc<C>,
        creds: Arc<SessionCredentials>,
        chain_id: Felt,
        cfg: EngineConfig,
        telemetry: TelemetrySink,
        game_id: u64,
    ) -> Self {
        Self { chain, creds, chain_id, cfg, telemetry, game_id }
    }

    /// Submit a call list: up to the configured attempts, fresh signer each,
    /// reverts surfaced immediately, receipts polled to confirmation.
    pub async fn execute(&self, calls: Vec<Call>, description: &str) -> Result<ExecutionOutcome> {
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=self.cfg.max_submit_attempts {
            if attempt > 1 {
                sleep(Duration::from_millis(self.cfg.retry_delay_ms * (attempt - 1) as u64))
                    .await;
            }

            let outcome = timeout(
                Duration::from_secs(self.cfg.submit_timeout_secs),
                self.submit_once(&calls),
            )
            .await;

            match outcome {
                Err(_elapsed) => {
                    last_error = "submission timed out".into();
                    self.tx_status(description, "timeout", None, Some(&last_error));
                }
                Ok(Err(e)) => {
                    last_error = e.to_string();
                    self.tx_status(description, "submit_error", None, Some(&last_error));
                }
                Ok(Ok(SubmitOutcome::Rejected { error })) => {
                    if is_revert(&error, &self.cfg) {
                        self.tx_status(description, "reverted", None, Some(&error));
                        return Err(DelveError::Reverted(error));
                    }
                    last_error = error;
                    self.tx_status(description, "rejected", None, Some(&last_error));
                }
                Ok(Ok(SubmitOutcome::Accepted { tx_hash })) => {
                    self.tx_status(description, "submitted", Some(tx_hash), None);
                    return self.confirm(tx_hash, description).await;
                }
            }
        }

        Err(DelveError::Submission(format!(
            "{description}: attempts exhausted, last error: {last_error}"
        )))
    }

    /// One signed submission over the configured path
    async fn submit_once(&self, calls: &[Call]) -> Result<SubmitOutcome> {
        // The signer is strictly per-transaction; a cancelled attempt drops
        // it and the retry builds a fresh one
        let signer = ControllerClient::new(self.creds.clone(), self.chain_id);

        match self.cfg.submit_mode {
            SubmitMode::Relayed => {
                let execution = OutsideExecution {
                    caller: short_string("ANY_CALLER"),
                    nonce_channel: Felt::from(unix_now()),
                    nonce_mask: Felt::ONE,
                    execute_after: 0,
                    execute_before: self.creds.expires_at,
                    calls: calls.to_vec(),
                };
                let signature = signer.sign_outside_execution(&execution)?;
                self.chain
                    .submit_outside_execution(self.creds.controller_address, &execution, &signature)
                    .await
            }
            SubmitMode::DirectInvoke => {
                let nonce = self.chain.get_nonce(self.creds.controller_address).await?;
                let fields = InvokeFields::new(
                    self.creds.controller_address,
                    multicall_calldata(calls),
                    self.chain_id,
                    nonce,
                );
                let signature = signer.sign_invoke(&fields)?;
                self.chain.submit_invoke(&fields, &signature).await
            }
        }
    }

    /// Poll receipts until the transaction settles or polling runs out
    async fn confirm(&self, tx_hash: Felt, description: &str) -> Result<ExecutionOutcome> {
        for _ in 0..self.cfg.receipt_poll_attempts {
            sleep(Duration::from_millis(self.cfg.receipt_poll_interval_ms)).await;

            match self.chain.get_receipt(tx_hash).await {
                Ok(Some(receipt)) => match receipt.status {
                    ExecutionStatus::Succeeded => {
                        self.tx_status(description, "confirmed", Some(tx_hash), None);
                        return Ok(ExecutionOutcome { tx_hash, confirmed_by_timeout: false });
                    }
                    ExecutionStatus::Reverted => {
                        let reason = receipt
                            .revert_reason
                            .unwrap_or_else(|| "reverted with no reason".into());
                        self.tx_status(description, "reverted", Some(tx_hash), Some(&reason));
                        return Err(DelveError::Reverted(reason));
                    }
                    ExecutionStatus::Pending => {}
                },
                Ok(None) => {}
                Err(e) => {
                    // Receipt reads are retried implicitly by the next poll
                    tracing::debug!(error = %e, "receipt poll failed");
                }
            }
        }

        self.tx_status(description, "confirm_timeout", Some(tx_hash), None);
        Ok(ExecutionOutcome { tx_hash, confirmed_by_timeout: true })
    }

    /// Re-fetch state until the pre-submission fingerprint moves, so the
    /// next decision runs against post-transaction data. Returns the
    /// freshest snapshot either way; a still-stale one is logged.
    pub async fn await_state_change(&self, before: Fingerprint) -> Result<GameState> {
        let mut latest = None;
        for _ in 0..self.cfg.resync_attempts {
            sleep(Duration::from_millis(self.cfg.resync_interval_ms)).await;

            match self.chain.read_game_state(self.game_id).await {
                Ok(Some(state)) => {
                    if Fingerprint::of(&state) != before {
                        return Ok(state);
                    }
                    latest = Some(state);
                }
                Ok(None) => {
                    return Err(DelveError::GameOver("game not found on chain".into()));
                }
                Err(e) => {
                    tracing::debug!(error = %e, "state refetch failed");
                }
            }
        }

        tracing::warn!(game_id = self.game_id, "state fingerprint never moved; continuing stale");
        self.telemetry.emit(TelemetryEvent::EngineError {
            game_id: self.game_id,
            context: "stale-read defense".into(),
            error: "fingerprint unchanged after resync budget".into(),
        });
        latest.ok_or_else(|| DelveError::ChainRead("state unavailable during resync".into()))
    }

    fn tx_status(&self, description: &str, status: &str, tx_hash: Option<Felt>, detail: Option<&str>) {
        self.telemetry.emit(TelemetryEvent::TxStatus {
            game_id: self.game_id,
            description: description.to_string(),
            status: status.to_string(),
            tx_hash: tx_hash.map(|h| format!("{h:#x}")),
            detail: detail.map(str::to_string),
        });
    }
}

/// Standard account multicall encoding: call count, then per call the
/// target, selector, and length-prefixed calldata
pub fn multicall_calldata(calls: &[Call]) -> Vec<Felt> {
    let mut out = vec![Felt::from(calls.len() as u64)];
    for call in calls {
        out.push(call.to);
        out.push(call.selector);
        out.push(Felt::from(call.calldata.len() as u64));
        out.extend(call.calldata.iter().copied());
    }
    out
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}
