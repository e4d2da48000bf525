//! Structured telemetry sink
//!
//! The engine reports what it sees and decides to an external observer. The
//! sink must never block or fail the game loop: events go over an unbounded
//! channel and a closed receiver is silently tolerated.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::phase::Phase;
use crate::strategy::StatAllocation;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    Snapshot {
        game_id: u64,
        phase: Phase,
        health: u16,
        max_health: u16,
        level: u16,
        gold: u16,
        xp: u32,
        beast_health: Option<u16>,
    },
    Decision {
        game_id: u64,
        action: String,
        rationale: String,
    },
    Simulation {
        game_id: u64,
        win_rate: f64,
        death_rate: f64,
        expected_hp_loss: f64,
        expected_hp_loss_on_win: f64,
        expected_rounds: f64,
        flee_death_rate: f64,
        flee_guaranteed: bool,
    },
    MarketAction {
        game_id: u64,
        potions: u8,
        item_ids: Vec<u8>,
        gold_spent: u16,
        rationale: Vec<String>,
    },
    StatAllocation {
        game_id: u64,
        allocation: StatAllocation,
    },
    TxStatus {
        game_id: u64,
        description: String,
        status: String,
        tx_hash: Option<String>,
        detail: Option<String>,
    },
    EngineError {
        game_id: u64,
        context: String,
        error: String,
    },
}

/// Handle the engine emits through. Cloneable; cheap.
#[derive(Debug, Clone)]
pub struct TelemetrySink {
    tx: Option<mpsc::UnboundedSender<TelemetryEvent>>,
}

impl TelemetrySink {
    /// A sink plus the receiving end for the external observer
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TelemetryEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that drops everything; for tests and headless runs
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Emit an event. Never blocks, never errors: a departed observer is
    /// not the engine's problem.
    pub fn emit(&self, event: TelemetryEvent) {
        tracing::debug!(?event, "telemetry");
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
