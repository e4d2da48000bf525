//! Single-use controller client
//!
//! The upstream wallet client this layer reconstructs is strictly one-shot:
//! it tears itself down asynchronously after its first successful use, and
//! that teardown may fail noisily. Both properties are modeled here: the
//! signing methods consume `self`, so reuse is a compile error, and teardown
//! runs as a detached task whose outcome nobody waits on.

use std::sync::Arc;

use starknet_crypto::poseidon_hash_many;
use starknet_types_core::felt::Felt;

use super::hash::{InvokeFields, OutsideExecution};
use super::session::{apply_wildcard_fix, SignatureBundle};
use super::SessionCredentials;
use crate::core::error::Result;

pub struct ControllerClient {
    creds: Arc<SessionCredentials>,
    chain_id: Felt,
}

impl ControllerClient {
    /// A fresh client. One per transaction; never reuse across attempts.
    pub fn new(creds: Arc<SessionCredentials>, chain_id: Felt) -> Self {
        Self { creds, chain_id }
    }

    /// Sign a relayed execution. Consumes the client.
    pub fn sign_outside_execution(self, execution: &OutsideExecution) -> Result<SignatureBundle> {
        let message_hash =
            execution.message_hash(self.creds.controller_address, self.chain_id);
        let policy_root = policy_root(execution.calls.iter().map(|c| c.selector));
        let bundle = self.sign_message(message_hash, policy_root)?;
        self.retire();
        Ok(bundle)
    }

    /// Sign a direct invoke. Consumes the client.
    pub fn sign_invoke(self, fields: &InvokeFields) -> Result<SignatureBundle> {
        let message_hash = fields.transaction_hash();
        let policy_root = policy_root(std::iter::empty());
        let bundle = self.sign_message(message_hash, policy_root)?;
        self.retire();
        Ok(bundle)
    }

    /// Produce the upstream-shaped bundle, then repair it: the upstream
    /// client authorizes against the specific policy root even though the
    /// registered session recognizes the wildcard.
    fn sign_message(&self, message_hash: Felt, policy_root: Felt) -> Result<SignatureBundle> {
        let proof = vec![self.creds.session_key_guid];
        let mut bundle =
            SignatureBundle::build(&self.creds, message_hash, policy_root, proof)?;
        apply_wildcard_fix(&mut bundle, message_hash, &self.creds)?;
        Ok(bundle)
    }

    /// The post-success teardown crashes inside the upstream client. It is
    /// background noise: spawn, detach, discard.
    fn retire(self) {
        tokio::spawn(async move {
            tracing::trace!(controller = %self.creds.controller_address, "session signer retired");
            drop(self);
        });
    }
}

/// Commitment over the calls' selectors, standing in for the session's
/// per-call policy root. The wildcard fix replaces it before submission.
fn policy_root(selectors: impl Iterator<Item = Felt>) -> Felt {
    let selectors: Vec<Felt> = selectors.collect();
    poseidon_hash_many(&selectors)
}
