//! Decoding Tron block transactions into `NormalizedTx`.
//!
//! Only two contract types carry value transfers worth reporting:
//! `TransferContract` (native TRX) and `TriggerSmartContract` (TRC20,
//! accepted only after confirming the transaction's receipt and log).

use serde_json::Value;
use sha2::{Digest, Sha256};

use chainwatch_core::types::NormalizedTx;
use primitive_types::U256;

/// `keccak256("Transfer(address,address,uint256)")`, without the `0x`
/// prefix — Tron logs report topics in bare hex.
pub const TRANSFER_TOPIC0: &str = "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

fn base58check_encode(payload: &[u8]) -> String {
    let round1 = Sha256::digest(payload);
    let round2 = Sha256::digest(round1);
    let mut full = payload.to_vec();
    full.extend_from_slice(&round2[..4]);
    bs58::encode(full).into_string()
}

/// Convert a Tron hex address to its base58check form. `has_prefix`
/// indicates the hex string already carries the `41` address-version byte
/// (true for `owner_address`/`to_address`/`contract_address` fields; false
/// for a bare 20-byte address recovered from a log topic).
pub fn tron_address_from_hex(hex_str: &str, has_prefix: bool) -> Option<String> {
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    let full_hex = if has_prefix { hex_str.to_string() } else { format!("41{hex_str}") };
    let bytes = hex::decode(full_hex).ok()?;
    Some(base58check_encode(&bytes))
}

fn contract(tx: &Value) -> Option<&Value> {
    tx["raw_data"]["contract"].as_array()?.first()
}

fn contract_ret_success(tx: &Value) -> bool {
    tx["ret"]
        .as_array()
        .and_then(|r| r.first())
        .and_then(|r| r["contractRet"].as_str())
        == Some("SUCCESS")
}

/// Decode a `TransferContract` (native TRX) entry. `None` if `tx` is not a
/// successful native transfer.
pub fn decode_native_transfer(tx: &Value, block_number: u64, timestamp: Option<u64>) -> Option<NormalizedTx> {
    if !contract_ret_success(tx) {
        return None;
    }
    let c = contract(tx)?;
    if c["type"].as_str()? != "TransferContract" {
        return None;
    }
    let value = &c["parameter"]["value"];
    let owner = tron_address_from_hex(value["owner_address"].as_str()?, true)?;
    let to = tron_address_from_hex(value["to_address"].as_str()?, true)?;
    let amount = value["amount"].as_u64()?;

    Some(NormalizedTx {
        hash: tx["txID"].as_str()?.to_string(),
        from: Some(owner),
        to,
        value: U256::from(amount),
        block_number,
        timestamp,
        token: None,
        symbol: None,
        fee: None,
        receipt: None,
    })
}

/// `true` if `tx`'s first contract entry is a `TriggerSmartContract` call
/// (the caller should then fetch transaction info to complete decoding).
pub fn is_smart_contract_trigger(tx: &Value) -> bool {
    contract_ret_success(tx) && contract(tx).and_then(|c| c["type"].as_str()) == Some("TriggerSmartContract")
}

/// Decode a `TriggerSmartContract` TRC20 transfer, given the transaction's
/// `gettransactioninfobyid` result. Requires `receipt.result == "SUCCESS"`,
/// exactly one log entry, and that log's first topic to be the `Transfer`
/// event signature. The amount is parsed from the call data at character
/// offset 74 (big-endian hex).
pub fn decode_token_transfer(tx: &Value, tx_info: &Value, block_number: u64, timestamp: Option<u64>) -> Option<NormalizedTx> {
    if !contract_ret_success(tx) {
        return None;
    }
    let c = contract(tx)?;
    if c["type"].as_str()? != "TriggerSmartContract" {
        return None;
    }

    if tx_info["receipt"]["result"].as_str()? != "SUCCESS" {
        return None;
    }
    let logs = tx_info["log"].as_array()?;
    if logs.len() != 1 {
        return None;
    }
    let log = &logs[0];
    let topics = log["topics"].as_array()?;
    if topics.first().and_then(Value::as_str) != Some(TRANSFER_TOPIC0) {
        return None;
    }

    let value = &c["parameter"]["value"];
    let data = value["data"].as_str()?;
    let token = tron_address_from_hex(value["contract_address"].as_str()?, true)?;
    let owner = tron_address_from_hex(value["owner_address"].as_str()?, true)?;

    if data.len() <= 74 {
        return None;
    }
    let amount = U256::from_str_radix(&data[74..], 16).ok()?;

    let to_topic = topics.get(2).and_then(Value::as_str)?;
    let to_hex = if to_topic.len() >= 40 { &to_topic[to_topic.len() - 40..] } else { return None };
    let to = tron_address_from_hex(to_hex, false)?;

    Some(NormalizedTx {
        hash: tx["txID"].as_str()?.to_string(),
        from: Some(owner),
        to,
        value: amount,
        block_number,
        timestamp,
        token: Some(token),
        symbol: None,
        fee: tx_info["fee"].as_u64().map(U256::from),
        receipt: Some("SUCCESS".to_string()),
    })
}
