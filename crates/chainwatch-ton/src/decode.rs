//! Deposit-only transaction decoding for TON.
//!
//! TON transactions naturally fan out into multiple outgoing messages, but
//! this adapter only cares about simple inbound transfers: a transaction
//! with a non-empty outgoing message list is treated as non-deposit and
//! skipped entirely, rather than picked apart for partial value.

use primitive_types::U256;
use serde_json::Value;

use chainwatch_core::NormalizedTx;

/// TON indexers hand back transaction/message hashes as base64url; the rest
/// of this system compares hashes as plain base64, so normalize at the
/// decode boundary.
pub fn normalize_hash(raw: &str) -> String {
    raw.replace('-', "+").replace('_', "/")
}

fn out_msgs_is_empty(tx: &Value) -> bool {
    match tx.get("out_msgs").and_then(Value::as_array) {
        Some(arr) => arr.is_empty(),
        None => true,
    }
}

fn parse_nanotons(raw: &Value) -> Option<U256> {
    match raw {
        Value::String(s) => U256::from_dec_str(s).ok(),
        Value::Number(n) => n.as_u64().map(U256::from),
        _ => None,
    }
}

/// Decode one indexer transaction entry into a deposit, or `None` if it is
/// an outgoing/internal transaction, carries no inbound message, or moves
/// zero value.
pub fn decode_transaction(tx: &Value) -> Option<NormalizedTx> {
    if !out_msgs_is_empty(tx) {
        return None;
    }

    let in_msg = tx.get("in_msg")?;
    let value = parse_nanotons(in_msg.get("value")?)?;
    if value.is_zero() {
        return None;
    }

    let to = tx.get("account").and_then(Value::as_str)?.to_string();
    let from = in_msg
        .get("source")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    let lt_str = tx.get("transaction_id").and_then(|id| id.get("lt")).and_then(Value::as_str)?;
    let block_number = lt_str.parse::<u64>().ok()?;

    let hash = tx
        .get("transaction_id")
        .and_then(|id| id.get("hash"))
        .and_then(Value::as_str)
        .map(normalize_hash)?;

    let timestamp = tx.get("utime").and_then(Value::as_u64);

    Some(NormalizedTx {
        hash,
        from,
        to,
        value,
        block_number,
        timestamp,
        token: None,
        symbol: None,
        fee: None,
        receipt: None,
    })
}

/// Logical time of a transaction entry, used as the pagination cursor.
pub fn transaction_lt(tx: &Value) -> Option<u64> {
    tx.get("transaction_id")?.get("lt")?.as_str()?.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_base64url_hash() {
        assert_eq!(normalize_hash("ab-cd_ef"), "ab+cd/ef");
    }

    #[test]
    fn skips_transaction_with_outgoing_messages() {
        let tx = json!({
            "account": "EQAAowner",
            "transaction_id": { "lt": "100", "hash": "aa" },
            "utime": 1000,
            "in_msg": { "source": "EQAAsender", "value": "5000000000" },
            "out_msgs": [{ "destination": "EQAAother" }],
        });
        assert!(decode_transaction(&tx).is_none());
    }

    #[test]
    fn decodes_simple_deposit() {
        let tx = json!({
            "account": "EQAAowner",
            "transaction_id": { "lt": "100", "hash": "ab-cd_ef" },
            "utime": 1000,
            "in_msg": { "source": "EQAAsender", "value": "5000000000" },
            "out_msgs": [],
        });
        let normalized = decode_transaction(&tx).unwrap();
        assert_eq!(normalized.to, "EQAAowner");
        assert_eq!(normalized.from.as_deref(), Some("EQAAsender"));
        assert_eq!(normalized.hash, "ab+cd/ef");
        assert_eq!(normalized.value, U256::from(5_000_000_000u64));
    }

    #[test]
    fn skips_zero_value_deposit() {
        let tx = json!({
            "account": "EQAAowner",
            "transaction_id": { "lt": "100", "hash": "ab" },
            "utime": 1000,
            "in_msg": { "source": "EQAAsender", "value": "0" },
            "out_msgs": [],
        });
        assert!(decode_transaction(&tx).is_none());
    }

    #[test]
    fn missing_in_msg_is_skipped() {
        let tx = json!({
            "account": "EQAAowner",
            "transaction_id": { "lt": "100", "hash": "ab" },
            "utime": 1000,
            "out_msgs": [],
        });
        assert!(decode_transaction(&tx).is_none());
    }
}
