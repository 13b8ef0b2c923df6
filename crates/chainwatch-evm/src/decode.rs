//! Decoding raw `eth_getBlockByNumber`/`eth_getLogs` responses into
//! `NormalizedTx`. One decoder shared by both the local-node and
//! remote-provider adapters — they differ only in the `EvmRpcClient` they
//! wrap, never in how a log or transaction is interpreted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use chainwatch_core::types::NormalizedTx;
use primitive_types::U256;

use crate::client::parse_hex_u64;

/// `keccak256("Transfer(address,address,uint256)")`.
pub const TRANSFER_TOPIC0: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

/// A raw EVM log as returned by `eth_getLogs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    #[serde(rename = "transactionHash")]
    pub tx_hash: String,
    pub removed: Option<bool>,
}

impl RawLog {
    pub fn block_number_u64(&self) -> u64 {
        parse_hex_u64(&self.block_number)
    }

    pub fn is_removed(&self) -> bool {
        self.removed.unwrap_or(false)
    }
}

fn topic_to_address(topic: &str) -> Option<String> {
    let hex = topic.strip_prefix("0x")?;
    if hex.len() < 40 {
        return None;
    }
    Some(format!("0x{}", &hex[hex.len() - 40..]).to_lowercase())
}

/// Decode one `Transfer(address,address,uint256)` log into a `NormalizedTx`.
/// Returns `None` for malformed logs (wrong topic count, unparsable
/// addresses) — the caller logs and skips rather than failing the batch.
pub fn decode_transfer_log(log: &RawLog) -> Option<NormalizedTx> {
    if log.is_removed() {
        return None;
    }
    if log.topics.first().map(String::as_str) != Some(TRANSFER_TOPIC0) {
        return None;
    }
    if log.topics.len() != 3 {
        return None;
    }
    let from = topic_to_address(&log.topics[1])?;
    let to = topic_to_address(&log.topics[2])?;
    let value = U256::from_str_radix(log.data.strip_prefix("0x").unwrap_or(&log.data), 16).ok()?;

    Some(NormalizedTx {
        hash: log.tx_hash.to_lowercase(),
        from: Some(from),
        to,
        value,
        block_number: log.block_number_u64(),
        timestamp: None,
        token: Some(log.address.to_lowercase()),
        symbol: None,
        fee: None,
        receipt: None,
    })
}

/// Decode one transaction object from a full `eth_getBlockByNumber` result
/// into a native-value `NormalizedTx`. Returns `None` for malformed entries
/// (missing required fields).
pub fn decode_native_tx(tx: &Value, block_number: u64, timestamp: Option<u64>) -> Option<NormalizedTx> {
    let hash = tx["hash"].as_str()?.to_lowercase();
    let from = tx["from"].as_str()?.to_lowercase();
    let to = tx["to"].as_str()?.to_lowercase();
    let value_hex = tx["value"].as_str().unwrap_or("0x0");
    let value = U256::from_str_radix(value_hex.strip_prefix("0x").unwrap_or(value_hex), 16).ok()?;

    Some(NormalizedTx {
        hash,
        from: Some(from),
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transfer_log(from: &str, to: &str, value_hex: &str) -> RawLog {
        RawLog {
            address: "0xTokenContractAAAAAAAAAAAAAAAAAAAAAAAAAA".into(),
            topics: vec![
                TRANSFER_TOPIC0.into(),
                format!("0x000000000000000000000000{}", &from[2..]),
                format!("0x000000000000000000000000{}", &to[2..]),
            ],
            data: value_hex.into(),
            block_number: "0x64".into(),
            tx_hash: "0xHASH".into(),
            removed: None,
        }
    }

    #[test]
    fn decodes_transfer_log() {
        let log = transfer_log("0xfrom0000000000000000000000000000000001", "0xto00000000000000000000000000000000002", "0x0de0b6b3a7640000");
        let tx = decode_transfer_log(&log).unwrap();
        assert_eq!(tx.from.unwrap(), "0xfrom0000000000000000000000000000000001");
        assert_eq!(tx.to, "0xto00000000000000000000000000000000002");
        assert_eq!(tx.value, U256::from(1_000_000_000_000_000_000u64));
        assert_eq!(tx.token.unwrap(), "0xtokencontractaaaaaaaaaaaaaaaaaaaaaaaaaa");
    }

    #[test]
    fn rejects_removed_log() {
        let mut log = transfer_log("0xfrom0000000000000000000000000000000001", "0xto00000000000000000000000000000000002", "0x1");
        log.removed = Some(true);
        assert!(decode_transfer_log(&log).is_none());
    }

    #[test]
    fn rejects_non_transfer_topic() {
        let mut log = transfer_log("0xfrom0000000000000000000000000000000001", "0xto00000000000000000000000000000000002", "0x1");
        log.topics[0] = "0xdeadbeef".into();
        assert!(decode_transfer_log(&log).is_none());
    }

    #[test]
    fn decodes_native_tx() {
        let tx = json!({
            "hash": "0xABCDEF",
            "from": "0xFROMADDR",
            "to": "0xTOADDR",
            "value": "0x1bc16d674ec80000",
        });
        let normalized = decode_native_tx(&tx, 100, Some(1_700_000_000)).unwrap();
        assert_eq!(normalized.hash, "0xabcdef");
        assert_eq!(normalized.value, U256::from(2_000_000_000_000_000_000u64));
        assert_eq!(normalized.block_number, 100);
    }

    #[test]
    fn native_tx_missing_to_is_skipped() {
        let tx = json!({ "hash": "0xabc", "from": "0xdead", "value": "0x1" });
        assert!(decode_native_tx(&tx, 1, None).is_none());
    }
}
