//! `EvmAdapter` — the `ChainAdapter` implementation shared by the local-node
//! and remote-provider backends. Generic over `EvmRpcClient`; decoding is
//! entirely in `crate::decode` so both backends behave identically.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use chainwatch_core::{AdapterError, ChainAdapter, NormalizedTx};

use crate::client::EvmRpcClient;
use crate::decode::{decode_native_tx, decode_transfer_log};

/// A syntactically valid EVM address: `0x` followed by 40 hex digits.
fn is_syntactically_valid_address(addr: &str) -> bool {
    addr.strip_prefix("0x").is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

pub struct EvmAdapter<C: EvmRpcClient> {
    client: C,
    chain_name: String,
    poll_interval_ms: u64,
    /// Token contracts with an installed `Transfer` filter. EVM has no
    /// separate "install a filter" RPC in this design — tracking the
    /// address here is what `subscribe_contract` does, and `txs_at` fetches
    /// logs for every tracked contract on each height.
    tracked_tokens: Mutex<HashSet<String>>,
}

impl<C: EvmRpcClient> EvmAdapter<C> {
    pub fn new(client: C, chain_name: impl Into<String>, poll_interval_ms: u64) -> Self {
        Self {
            client,
            chain_name: chain_name.into(),
            poll_interval_ms,
            tracked_tokens: Mutex::new(HashSet::new()),
        }
    }

    fn tracked_tokens_snapshot(&self) -> Vec<String> {
        self.tracked_tokens.lock().unwrap().iter().cloned().collect()
    }
}

#[async_trait]
impl<C: EvmRpcClient> ChainAdapter for EvmAdapter<C> {
    async fn height(&self) -> Result<u64, AdapterError> {
        self.client.get_block_number().await
    }

    async fn txs_at(&self, height: u64) -> Result<Vec<NormalizedTx>, AdapterError> {
        let mut out = Vec::new();

        if let Some(block) = self.client.get_block_with_txs(height).await? {
            let timestamp = block["timestamp"]
                .as_str()
                .map(crate::client::parse_hex_u64);
            if let Some(txs) = block["transactions"].as_array() {
                for tx in txs {
                    if let Some(normalized) = decode_native_tx(tx, height, timestamp) {
                        if !normalized.is_zero_value() {
                            out.push(normalized);
                        }
                    }
                }
            }
        }

        for token in self.tracked_tokens_snapshot() {
            match self.client.get_logs(height, height, Some(&token)).await {
                Ok(logs) => {
                    for log in logs {
                        match decode_transfer_log(&log) {
                            Some(normalized) => out.push(normalized),
                            None => tracing::warn!(token, "skipping malformed transfer log"),
                        }
                    }
                }
                Err(e) => tracing::warn!(token, height, error = %e, "failed to fetch logs for tracked token"),
            }
        }

        Ok(out)
    }

    async fn subscribe_contract(&self, addr: &str) -> Result<(), AdapterError> {
        self.tracked_tokens.lock().unwrap().insert(addr.to_lowercase());
        Ok(())
    }

    fn is_account(&self, addr: &str) -> bool {
        is_syntactically_valid_address(addr) && !self.tracked_tokens.lock().unwrap().contains(&addr.to_lowercase())
    }

    fn block_read_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    fn chain_name(&self) -> &str {
        &self.chain_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU64, Ordering};

    use crate::decode::{RawLog, TRANSFER_TOPIC0};

    struct FakeClient {
        height: AtomicU64,
        block: Option<Value>,
        logs: Vec<RawLog>,
    }

    #[async_trait]
    impl EvmRpcClient for FakeClient {
        async fn get_block_number(&self) -> Result<u64, AdapterError> {
            Ok(self.height.load(Ordering::SeqCst))
        }
        async fn get_block_with_txs(&self, _number: u64) -> Result<Option<Value>, AdapterError> {
            Ok(self.block.clone())
        }
        async fn get_logs(&self, _from: u64, _to: u64, address: Option<&str>) -> Result<Vec<RawLog>, AdapterError> {
            Ok(self
                .logs
                .iter()
                .filter(|l| match address {
                    Some(a) => l.address.eq_ignore_ascii_case(a),
                    None => true,
                })
                .cloned()
                .collect())
        }
    }

    fn native_block() -> Value {
        json!({
            "timestamp": "0x64",
            "transactions": [
                { "hash": "0xabc", "from": "0xfrom0000000000000000000000000000000001", "to": "0xto00000000000000000000000000000000002", "value": "0x1" }
            ]
        })
    }

    #[tokio::test]
    async fn txs_at_decodes_native_transfers() {
        let client = FakeClient { height: AtomicU64::new(10), block: Some(native_block()), logs: vec![] };
        let adapter = EvmAdapter::new(client, "hardhat", 5000);
        let txs = adapter.txs_at(10).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].to, "0xto00000000000000000000000000000000002");
    }

    #[tokio::test]
    async fn txs_at_includes_token_logs_only_for_tracked_contracts() {
        let log = RawLog {
            address: "0xtoken".into(),
            topics: vec![
                TRANSFER_TOPIC0.into(),
                "0x000000000000000000000000from0000000000000000000000000000001".into(),
                "0x00000000000000000000000000to000000000000000000000000000002".into(),
            ],
            data: "0x1".into(),
            block_number: "0xa".into(),
            tx_hash: "0xtokentx".into(),
            removed: None,
        };
        let client = FakeClient { height: AtomicU64::new(10), block: None, logs: vec![log] };
        let adapter = EvmAdapter::new(client, "hardhat", 5000);

        assert_eq!(adapter.txs_at(10).await.unwrap().len(), 0);

        adapter.subscribe_contract("0xtoken").await.unwrap();
        assert_eq!(adapter.txs_at(10).await.unwrap().len(), 1);
    }

    #[test]
    fn is_account_rejects_tracked_tokens_and_malformed_addresses() {
        let client = FakeClient { height: AtomicU64::new(0), block: None, logs: vec![] };
        let adapter = EvmAdapter::new(client, "hardhat", 5000);
        assert!(adapter.is_account("0xf8200ce84c3151f64a79e723245544e1e58badec"));
        assert!(!adapter.is_account("not-an-address"));
    }
}
