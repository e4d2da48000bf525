//! JSON-RPC chain client
//!
//! One reqwest client serves both the node endpoint (reads, direct invokes)
//! and the relayer endpoint (outside executions). Reads are idempotent and
//! safe to retry; submissions report an explicit accepted/rejected outcome
//! instead of smuggling results through shared state.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use starknet_types_core::felt::Felt;

use super::{Call, ExecutionStatus, Receipt, StateReader, SubmitOutcome, TxSubmitter};
use crate::core::error::{DelveError, Result};
use crate::model::{Adventurer, Bag, Beast, GameState, Item, Market, Stats};
use crate::signing::hash::{InvokeFields, OutsideExecution, INVOKE_VERSION};
use crate::signing::{selector_from_name, SignatureBundle};

/// Receipt-not-found error code on the node's JSON-RPC surface
const TXN_HASH_NOT_FOUND: i64 = 29;

pub struct ChainClient {
    http: Client,
    rpc_url: String,
    relayer_url: String,
    game_address: Felt,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

enum RpcReply {
    Result(Value),
    Error { code: i64, message: String },
}

impl ChainClient {
    pub fn new(rpc_url: String, relayer_url: String, game_address: Felt) -> Self {
        Self { http: Client::new(), rpc_url, relayer_url, game_address }
    }

    pub fn game_address(&self) -> Felt {
        self.game_address
    }

    async fn rpc(&self, url: &str, method: &str, params: Value) -> Result<RpcReply> {
        let request = RpcRequest { jsonrpc: "2.0", id: 1, method, params };
        let response: Value = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = response.get("error") {
            return Ok(RpcReply::Error {
                code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown rpc error")
                    .to_string(),
            });
        }
        match response.get("result") {
            Some(result) => Ok(RpcReply::Result(result.clone())),
            None => Err(DelveError::ChainRead("rpc response had no result".into())),
        }
    }

    async fn call_contract(&self, selector: Felt, calldata: Vec<Felt>) -> Result<Vec<Felt>> {
        let params = json!({
            "request": {
                "contract_address": hex(self.game_address),
                "entry_point_selector": hex(selector),
                "calldata": calldata.iter().map(|f| hex(*f)).collect::<Vec<_>>(),
            },
            "block_id": "pending",
        });
        match self.rpc(&self.rpc_url, "starknet_call", params).await? {
            RpcReply::Result(value) => parse_felts(&value),
            RpcReply::Error { message, .. } => Err(DelveError::ChainRead(message)),
        }
    }
}

#[async_trait]
impl StateReader for ChainClient {
    async fn read_game_state(&self, game_id: u64) -> Result<Option<GameState>> {
        let felts = match self
            .call_contract(selector_from_name("game_state"), vec![Felt::from(game_id)])
            .await
        {
            Ok(felts) => felts,
            Err(DelveError::ChainRead(message)) if message.contains("not found") => {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };
        decode_game_state(&felts).map(Some)
    }

    async fn get_receipt(&self, tx_hash: Felt) -> Result<Option<Receipt>> {
        let params = json!({ "transaction_hash": hex(tx_hash) });
        match self
            .rpc(&self.rpc_url, "starknet_getTransactionReceipt", params)
            .await?
        {
            RpcReply::Result(value) => Ok(Some(decode_receipt(&value))),
            RpcReply::Error { code: TXN_HASH_NOT_FOUND, .. } => Ok(None),
            RpcReply::Error { message, .. } => Err(DelveError::ChainRead(message)),
        }
    }

    async fn get_nonce(&self, address: Felt) -> Result<Felt> {
        let params = json!({ "block_id": "pending", "contract_address": hex(address) });
        match self.rpc(&self.rpc_url, "starknet_getNonce", params).await? {
            RpcReply::Result(value) => parse_felt(&value),
            RpcReply::Error { message, .. } => Err(DelveError::ChainRead(message)),
        }
    }
}

#[async_trait]
impl TxSubmitter for ChainClient {
    async fn submit_outside_execution(
        &self,
        controller: Felt,
        execution: &OutsideExecution,
        signature: &SignatureBundle,
    ) -> Result<SubmitOutcome> {
        let params = json!({
            "address": hex(controller),
            "outside_execution": {
                "caller": hex(execution.caller),
                "nonce": [hex(execution.nonce_channel), hex(execution.nonce_mask)],
                "execute_after": execution.execute_after,
                "execute_before": execution.execute_before,
                "calls": execution.calls.iter().map(encode_call).collect::<Vec<_>>(),
            },
            "signature": signature.0.iter().map(|f| hex(*f)).collect::<Vec<_>>(),
        });
        match self
            .rpc(&self.relayer_url, "cartridge_addExecuteOutsideTransaction", params)
            .await?
        {
            RpcReply::Result(value) => {
                let tx_hash = value
                    .get("transaction_hash")
                    .ok_or_else(|| DelveError::Submission("relayer reply had no hash".into()))?;
                Ok(SubmitOutcome::Accepted { tx_hash: parse_felt(tx_hash)? })
            }
            RpcReply::Error { message, .. } => Ok(SubmitOutcome::Rejected { error: message }),
        }
    }

    async fn submit_invoke(
        &self,
        fields: &InvokeFields,
        signature: &SignatureBundle,
    ) -> Result<SubmitOutcome> {
        let params = json!({
            "invoke_transaction": {
                "type": "INVOKE",
                "version": format!("{:#x}", INVOKE_VERSION),
                "sender_address": hex(fields.sender),
                "calldata": fields.calldata.iter().map(|f| hex(*f)).collect::<Vec<_>>(),
                "signature": signature.0.iter().map(|f| hex(*f)).collect::<Vec<_>>(),
                "nonce": hex(fields.nonce),
                "tip": format!("{:#x}", fields.tip),
                "resource_bounds": {
                    "l1_gas": {
                        "max_amount": format!("{:#x}", fields.l1_gas.max_amount),
                        "max_price_per_unit": format!("{:#x}", fields.l1_gas.max_price_per_unit),
                    },
                    "l2_gas": {
                        "max_amount": format!("{:#x}", fields.l2_gas.max_amount),
                        "max_price_per_unit": format!("{:#x}", fields.l2_gas.max_price_per_unit),
                    },
                    "l1_data_gas": {
                        "max_amount": format!("{:#x}", fields.l1_data_gas.max_amount),
                        "max_price_per_unit": format!("{:#x}", fields.l1_data_gas.max_price_per_unit),
                    },
                },
                "paymaster_data": [],
                "account_deployment_data": [],
                "nonce_data_availability_mode": "L1",
                "fee_data_availability_mode": "L1",
            }
        });
        match self
            .rpc(&self.rpc_url, "starknet_addInvokeTransaction", params)
            .await?
        {
            RpcReply::Result(value) => {
                let tx_hash = value
                    .get("transaction_hash")
                    .ok_or_else(|| DelveError::Submission("node reply had no hash".into()))?;
                Ok(SubmitOutcome::Accepted { tx_hash: parse_felt(tx_hash)? })
            }
            RpcReply::Error { message, .. } => Ok(SubmitOutcome::Rejected { error: message }),
        }
    }
}

fn encode_call(call: &Call) -> Value {
    json!({
        "contract_address": hex(call.to),
        "entrypoint_selector": hex(call.selector),
        "calldata": call.calldata.iter().map(|f| hex(*f)).collect::<Vec<_>>(),
    })
}

fn hex(felt: Felt) -> String {
    format!("{felt:#x}")
}

fn parse_felt(value: &Value) -> Result<Felt> {
    let raw = value
        .as_str()
        .ok_or_else(|| DelveError::ChainRead("expected a hex string".into()))?;
    Felt::from_hex(raw).map_err(|_| DelveError::ChainRead(format!("bad field element: {raw}")))
}

fn parse_felts(value: &Value) -> Result<Vec<Felt>> {
    value
        .as_array()
        .ok_or_else(|| DelveError::ChainRead("expected a felt array".into()))?
        .iter()
        .map(parse_felt)
        .collect()
}

fn decode_receipt(value: &Value) -> Receipt {
    let execution = value.get("execution_status").and_then(Value::as_str);
    let finality = value.get("finality_status").and_then(Value::as_str);
    let status = match (execution, finality) {
        (Some("SUCCEEDED"), _) => ExecutionStatus::Succeeded,
        (Some("REVERTED"), _) => ExecutionStatus::Reverted,
        (None, Some("RECEIVED")) | (None, None) => ExecutionStatus::Pending,
        _ => ExecutionStatus::Pending,
    };
    Receipt {
        status,
        revert_reason: value
            .get("revert_reason")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// Flat felt layout of a game snapshot, as the contract's view returns it
struct FeltReader<'a> {
    felts: &'a [Felt],
    cursor: usize,
}

impl<'a> FeltReader<'a> {
    fn new(felts: &'a [Felt]) -> Self {
        Self { felts, cursor: 0 }
    }

    fn next(&mut self) -> Result<u64> {
        let felt = self
            .felts
            .get(self.cursor)
            .ok_or_else(|| DelveError::ChainRead("snapshot truncated".into()))?;
        self.cursor += 1;
        let bytes = felt.to_bytes_be();
        let mut value = 0u64;
        for &b in &bytes[24..] {
            value = value << 8 | b as u64;
        }
        Ok(value)
    }

    fn item(&mut self) -> Result<Option<Item>> {
        let id = self.next()? as u8;
        let xp = self.next()? as u16;
        Ok((id != 0).then(|| Item::new(id, xp)))
    }
}

pub fn decode_game_state(felts: &[Felt]) -> Result<GameState> {
    let mut r = FeltReader::new(felts);

    let mut adventurer = Adventurer {
        health: r.next()? as u16,
        xp: r.next()? as u32,
        gold: r.next()? as u16,
        stat_upgrades_available: r.next()? as u8,
        action_count: r.next()? as u32,
        stats: Stats {
            strength: r.next()? as u8,
            dexterity: r.next()? as u8,
            vitality: r.next()? as u8,
            intelligence: r.next()? as u8,
            wisdom: r.next()? as u8,
            charisma: r.next()? as u8,
        },
        equipment: Default::default(),
    };
    adventurer.equipment.weapon = r.item()?;
    adventurer.equipment.chest = r.item()?;
    adventurer.equipment.head = r.item()?;
    adventurer.equipment.waist = r.item()?;
    adventurer.equipment.foot = r.item()?;
    adventurer.equipment.hand = r.item()?;
    adventurer.equipment.neck = r.item()?;
    adventurer.equipment.ring = r.item()?;

    let bag_len = r.next()? as usize;
    let mut bag = Bag::default();
    for _ in 0..bag_len {
        if let Some(item) = r.item()? {
            bag.items.push(item);
        }
    }

    let beast = match r.next()? {
        0 => None,
        _ => Some(Beast {
            id: r.next()? as u8,
            level: r.next()? as u16,
            health: r.next()? as u16,
            specials: (r.next()? as u8, r.next()? as u8),
        }),
    };

    let market_len = r.next()? as usize;
    let mut market = Market::default();
    for _ in 0..market_len {
        market.item_ids.push(r.next()? as u8);
    }

    Ok(GameState { adventurer, bag, beast, market })
}
