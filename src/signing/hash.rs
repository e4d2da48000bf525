//! Hash domains for the two submission paths
//!
//! Both paths commit to the same call list but frame it differently: the
//! relayed path hashes a typed-data message bound to the controller account,
//! the direct path hashes a full fee-bearing transaction. The wildcard fix in
//! `session` applies identically on top of either message hash.

use starknet_crypto::poseidon_hash_many;
use starknet_types_core::felt::Felt;

use super::{invoke_prefix, selector_from_name, short_string, starknet_message_prefix};
use crate::chain::Call;

/// Transaction version for the direct invoke path
pub const INVOKE_VERSION: u64 = 3;

/// A relayed execution envelope: the relayer pays gas, the account only
/// authorizes the calls and a validity window.
#[derive(Debug, Clone)]
pub struct OutsideExecution {
    pub caller: Felt,
    pub nonce_channel: Felt,
    pub nonce_mask: Felt,
    pub execute_after: u64,
    pub execute_before: u64,
    pub calls: Vec<Call>,
}

impl OutsideExecution {
    /// Typed-data message hash bound to the controller account
    pub fn message_hash(&self, controller: Felt, chain_id: Felt) -> Felt {
        let call_hashes: Vec<Felt> = self.calls.iter().map(call_hash).collect();
        let calls_hash = poseidon_hash_many(&call_hashes);

        let struct_hash = poseidon_hash_many(&[
            outside_execution_type_hash(),
            self.caller,
            self.nonce_channel,
            self.nonce_mask,
            Felt::from(self.execute_after),
            Felt::from(self.execute_before),
            calls_hash,
        ]);

        poseidon_hash_many(&[
            starknet_message_prefix(),
            domain_hash(chain_id),
            controller,
            struct_hash,
        ])
    }
}

/// One resource bound of a v3 transaction, packed as
/// `name << 192 | max_amount << 128 | max_price_per_unit`
#[derive(Debug, Clone, Copy)]
pub struct ResourceBounds {
    pub resource: &'static str,
    pub max_amount: u64,
    pub max_price_per_unit: u128,
}

impl ResourceBounds {
    pub fn l1_gas(max_amount: u64, max_price_per_unit: u128) -> Self {
        Self { resource: "L1_GAS", max_amount, max_price_per_unit }
    }

    pub fn l2_gas(max_amount: u64, max_price_per_unit: u128) -> Self {
        Self { resource: "L2_GAS", max_amount, max_price_per_unit }
    }

    pub fn l1_data(max_amount: u64, max_price_per_unit: u128) -> Self {
        Self { resource: "L1_DATA", max_amount, max_price_per_unit }
    }

    /// The fixed bit layout is a wire contract; reproduce it exactly
    pub fn packed(&self) -> Felt {
        let mut bytes = [0u8; 32];
        let name = self.resource.as_bytes();
        debug_assert!(name.len() <= 8);
        bytes[8 - name.len()..8].copy_from_slice(name);
        bytes[8..16].copy_from_slice(&self.max_amount.to_be_bytes());
        bytes[16..32].copy_from_slice(&self.max_price_per_unit.to_be_bytes());
        Felt::from_bytes_be(&bytes)
    }
}

/// Fields of a direct (self-paying) invoke transaction
#[derive(Debug, Clone)]
pub struct InvokeFields {
    pub sender: Felt,
    pub calldata: Vec<Felt>,
    pub chain_id: Felt,
    pub nonce: Felt,
    pub tip: u64,
    pub l1_gas: ResourceBounds,
    pub l2_gas: ResourceBounds,
    pub l1_data_gas: ResourceBounds,
    pub paymaster_data: Vec<Felt>,
    pub account_deployment_data: Vec<Felt>,
    /// Data-availability mode bits: nonce mode in the high half, fee mode low
    pub nonce_da_mode: u32,
    pub fee_da_mode: u32,
}

impl InvokeFields {
    pub fn new(sender: Felt, calldata: Vec<Felt>, chain_id: Felt, nonce: Felt) -> Self {
        Self {
            sender,
            calldata,
            chain_id,
            nonce,
            tip: 0,
            l1_gas: ResourceBounds::l1_gas(0, 0),
            l2_gas: ResourceBounds::l2_gas(0, 0),
            l1_data_gas: ResourceBounds::l1_data(0, 0),
            paymaster_data: Vec::new(),
            account_deployment_data: Vec::new(),
            nonce_da_mode: 0,
            fee_da_mode: 0,
        }
    }

    /// Direct invoke transaction hash; the fee hash commits to the tip and
    /// all three resource bounds
    pub fn transaction_hash(&self) -> Felt {
        let fee_hash = poseidon_hash_many(&[
            Felt::from(self.tip),
            self.l1_gas.packed(),
            self.l2_gas.packed(),
            self.l1_data_gas.packed(),
        ]);
        let da_modes =
            Felt::from(((self.nonce_da_mode as u64) << 32) | self.fee_da_mode as u64);

        poseidon_hash_many(&[
            invoke_prefix(),
            Felt::from(INVOKE_VERSION),
            self.sender,
            fee_hash,
            poseidon_hash_many(&self.paymaster_data),
            self.chain_id,
            self.nonce,
            da_modes,
            poseidon_hash_many(&self.account_deployment_data),
            poseidon_hash_many(&self.calldata),
        ])
    }
}

/// Per-call hash: (target, selector, hashed calldata)
fn call_hash(call: &Call) -> Felt {
    poseidon_hash_many(&[call.to, call.selector, poseidon_hash_many(&call.calldata)])
}

/// Type hash of the relayed-execution struct, derived from its signature
fn outside_execution_type_hash() -> Felt {
    selector_from_name(
        "OutsideExecution(caller,nonce_channel,nonce_mask,execute_after,execute_before,calls)",
    )
}

/// Fixed typed-data domain, parameterized only by chain id
pub fn domain_hash(chain_id: Felt) -> Felt {
    poseidon_hash_many(&[
        selector_from_name("Domain(name,version,chainId,revision)"),
        short_string("Controller.OutsideExecution"),
        Felt::ONE,
        chain_id,
        Felt::ONE,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_calls() -> Vec<Call> {
        vec![Call {
            to: Felt::from(0x1234u64),
            selector: selector_from_name("attack"),
            calldata: vec![Felt::from(1u64), Felt::ZERO],
        }]
    }

    fn sample_execution() -> OutsideExecution {
        OutsideExecution {
            caller: Felt::from_hex("0x414e595f43414c4c4552").unwrap(),
            nonce_channel: Felt::ZERO,
            nonce_mask: Felt::ONE,
            execute_after: 0,
            execute_before: 2_000_000_000,
            calls: sample_calls(),
        }
    }

    #[test]
    fn test_message_hash_is_deterministic() {
        let execution = sample_execution();
        let controller = Felt::from(0xabcdu64);
        let chain = short_string("SN_MAIN");
        assert_eq!(
            execution.message_hash(controller, chain),
            execution.message_hash(controller, chain)
        );
    }

    #[test]
    fn test_message_hash_binds_calls_and_window() {
        let execution = sample_execution();
        let controller = Felt::from(0xabcdu64);
        let chain = short_string("SN_MAIN");
        let base = execution.message_hash(controller, chain);

        let mut other = execution.clone();
        other.calls[0].calldata[0] = Felt::from(2u64);
        assert_ne!(base, other.message_hash(controller, chain));

        let mut other = execution.clone();
        other.execute_before += 1;
        assert_ne!(base, other.message_hash(controller, chain));
    }

    #[test]
    fn test_resource_bounds_bit_layout() {
        let bounds = ResourceBounds::l1_gas(0x0102, 0x0304);
        let bytes = bounds.packed().to_bytes_be();
        assert_eq!(&bytes[8 - 6..8], b"L1_GAS");
        assert_eq!(bytes[14..16], [0x01, 0x02]);
        assert_eq!(bytes[30..32], [0x03, 0x04]);
    }

    #[test]
    fn test_invoke_hash_binds_nonce_and_fees() {
        let fields = InvokeFields::new(
            Felt::from(0xabcdu64),
            vec![Felt::ONE, Felt::TWO],
            short_string("SN_MAIN"),
            Felt::from(5u64),
        );
        let base = fields.transaction_hash();

        let mut other = fields.clone();
        other.nonce = Felt::from(6u64);
        assert_ne!(base, other.transaction_hash());

        let mut other = fields.clone();
        other.tip = 1;
        assert_ne!(base, other.transaction_hash());
    }

    #[test]
    fn test_fee_hash_commits_to_each_resource_bound() {
        let fields = InvokeFields::new(
            Felt::from(0xabcdu64),
            vec![Felt::ONE],
            short_string("SN_MAIN"),
            Felt::ZERO,
        );
        let base = fields.transaction_hash();

        let mut other = fields.clone();
        other.l1_gas = ResourceBounds::l1_gas(1, 0);
        assert_ne!(base, other.transaction_hash());

        let mut other = fields.clone();
        other.l2_gas = ResourceBounds::l2_gas(1, 0);
        assert_ne!(base, other.transaction_hash());

        let mut other = fields.clone();
        other.l1_data_gas = ResourceBounds::l1_data(1, 0);
        assert_ne!(base, other.transaction_hash());
    }
}
