//! Decoding a `getBlock` (jsonParsed) response into `NormalizedTx` records.
//!
//! Solana has no logs to decode the way EVM does — transfers are derived
//! from balance diffs, plus a direct harvest of `transferChecked`
//! instructions. `from` is left `None` for balance-diff transfers because
//! the sender cannot be recovered from a diff alone.

use serde_json::Value;

use chainwatch_core::types::NormalizedTx;
use primitive_types::U256;

fn account_key_at(account_keys: &[Value], index: u64) -> Option<String> {
    let entry = account_keys.get(index as usize)?;
    match entry {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => entry["pubkey"].as_str().map(String::from),
        _ => None,
    }
}

/// `true` if `tx` contains a `create`/`createIdempotent` associated-token-
/// account instruction whose target account is `account`.
fn has_ata_creation_for(instructions: &[Value], account: &str) -> bool {
    instructions.iter().any(|ix| {
        let parsed = &ix["parsed"];
        let kind = parsed["type"].as_str().unwrap_or("");
        (kind == "create" || kind == "createIdempotent") && parsed["info"]["account"].as_str() == Some(account)
    })
}

fn all_instructions(tx_entry: &Value) -> Vec<Value> {
    let mut out: Vec<Value> = tx_entry["transaction"]["message"]["instructions"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    if let Some(inner) = tx_entry["meta"]["innerInstructions"].as_array() {
        for group in inner {
            if let Some(ixs) = group["instructions"].as_array() {
                out.extend(ixs.clone());
            }
        }
    }
    out
}

/// Decode every native-transfer, SPL-token-transfer and `transferChecked`
/// record out of one transaction entry. One transaction can yield zero,
/// one, or several `NormalizedTx` records.
pub fn decode_transaction(tx_entry: &Value, slot: u64, block_time: Option<u64>) -> Vec<NormalizedTx> {
    let meta = &tx_entry["meta"];
    if !meta["err"].is_null() {
        return vec![];
    }
    if let Some(status) = meta.get("status") {
        if !status["Ok"].is_null() {
            return vec![];
        }
    }

    let Some(hash) = tx_entry["transaction"]["signatures"][0].as_str() else {
        return vec![];
    };

    let mut out = Vec::new();
    out.extend(decode_native_transfers(tx_entry, hash, slot, block_time));
    out.extend(decode_spl_token_transfers(tx_entry, hash, slot, block_time));
    out.extend(decode_transfer_checked(tx_entry, hash, slot, block_time));
    out
}

fn decode_native_transfers(tx_entry: &Value, hash: &str, slot: u64, block_time: Option<u64>) -> Vec<NormalizedTx> {
    let meta = &tx_entry["meta"];
    let account_keys = tx_entry["transaction"]["message"]["accountKeys"].as_array().cloned().unwrap_or_default();
    let (Some(pre), Some(post)) = (meta["preBalances"].as_array(), meta["postBalances"].as_array()) else {
        return vec![];
    };

    let mut out = Vec::new();
    for i in 0..pre.len().min(post.len()) {
        let pre_i = pre[i].as_u64().unwrap_or(0);
        let post_i = post[i].as_u64().unwrap_or(0);
        if post_i <= pre_i {
            continue;
        }
        let Some(to) = account_key_at(&account_keys, i as u64) else { continue };
        out.push(NormalizedTx {
            hash: hash.to_string(),
            from: None,
            to,
            value: U256::from(post_i - pre_i),
            block_number: slot,
            timestamp: block_time,
            token: None,
            symbol: None,
            fee: None,
            receipt: None,
        });
    }
    out
}

fn decode_spl_token_transfers(tx_entry: &Value, hash: &str, slot: u64, block_time: Option<u64>) -> Vec<NormalizedTx> {
    let meta = &tx_entry["meta"];
    let Some(post_balances) = meta["postTokenBalances"].as_array() else {
        return vec![];
    };
    let pre_balances = meta["preTokenBalances"].as_array().cloned().unwrap_or_default();
    let account_keys = tx_entry["transaction"]["message"]["accountKeys"].as_array().cloned().unwrap_or_default();
    let instructions = all_instructions(tx_entry);

    let mut out = Vec::new();
    for post in post_balances {
        let Some(idx) = post["accountIndex"].as_u64() else { continue };
        let post_amount: u128 = post["uiTokenAmount"]["amount"].as_str().and_then(|s| s.parse().ok()).unwrap_or(0);

        let pre_amount = match pre_balances.iter().find(|p| p["accountIndex"].as_u64() == Some(idx)) {
            Some(pre) => pre["uiTokenAmount"]["amount"].as_str().and_then(|s| s.parse::<u128>().ok()).unwrap_or(0),
            None => {
                let Some(account) = account_key_at(&account_keys, idx) else { continue };
                if has_ata_creation_for(&instructions, &account) {
                    0
                } else {
                    continue;
                }
            }
        };

        if post_amount <= pre_amount {
            continue;
        }
        let Some(owner) = post["owner"].as_str() else { continue };
        let Some(mint) = post["mint"].as_str() else { continue };

        out.push(NormalizedTx {
            hash: hash.to_string(),
            from: None,
            to: owner.to_string(),
            value: U256::from(post_amount - pre_amount),
            block_number: slot,
            timestamp: block_time,
            token: Some(mint.to_string()),
            symbol: None,
            fee: None,
            receipt: None,
        });
    }
    out
}

fn decode_transfer_checked(tx_entry: &Value, hash: &str, slot: u64, block_time: Option<u64>) -> Vec<NormalizedTx> {
    all_instructions(tx_entry)
        .into_iter()
        .filter(|ix| ix["parsed"]["type"].as_str() == Some("transferChecked"))
        .filter_map(|ix| {
            let info = &ix["parsed"]["info"];
            let source = info["source"].as_str()?.to_string();
            let destination = info["destination"].as_str()?.to_string();
            let mint = info["mint"].as_str()?.to_string();
            let amount: u128 = info["tokenAmount"]["amount"].as_str()?.parse().ok()?;
            if amount == 0 {
                return None;
            }
            Some(NormalizedTx {
                hash: hash.to_string(),
                from: Some(source),
                to: destination,
                value: U256::from(amount),
                block_number: slot,
                timestamp: block_time,
                token: Some(mint),
                symbol: None,
                fee: None,
                receipt: None,
            })
        })
        .collect()
}
