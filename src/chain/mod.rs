//! Chain interfaces
//!
//! The engine talks to the chain only through these seams: an idempotent
//! reader for state and receipts, and a submitter that returns an explicit
//! accepted/rejected outcome. No side channels, no interception.

pub mod calls;
pub mod rpc;

pub use rpc::ChainClient;

use async_trait::async_trait;
use starknet_types_core::felt::Felt;

use crate::core::error::Result;
use crate::model::GameState;
use crate::signing::hash::{InvokeFields, OutsideExecution};
use crate::signing::SignatureBundle;

/// A single contract call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub to: Felt,
    pub selector: Felt,
    pub calldata: Vec<Felt>,
}

/// Execution status reported by a receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Succeeded,
    Reverted,
    Pending,
}

/// A transaction receipt; produced only by the chain, consumed read-only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub status: ExecutionStatus,
    pub revert_reason: Option<String>,
}

/// Result of handing a transaction to the chain or a relayer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted { tx_hash: Felt },
    Rejected { error: String },
}

/// Idempotent chain reads; safe to retry
#[async_trait]
pub trait StateReader: Send + Sync {
    async fn read_game_state(&self, game_id: u64) -> Result<Option<GameState>>;
    async fn get_receipt(&self, tx_hash: Felt) -> Result<Option<Receipt>>;
    /// Current account nonce, for the direct invoke path
    async fn get_nonce(&self, address: Felt) -> Result<Felt>;
}

/// Transaction submission over either path
#[async_trait]
pub trait TxSubmitter: Send + Sync {
    async fn submit_outside_execution(
        &self,
        controller: Felt,
        execution: &OutsideExecution,
        signature: &SignatureBundle,
    ) -> Result<SubmitOutcome>;

    async fn submit_invoke(
        &self,
        fields: &InvokeFields,
        signature: &SignatureBundle,
    ) -> Result<SubmitOutcome>;
}
