//! `TronAdapter` — the `ChainAdapter` implementation for Tron.

use async_trait::async_trait;
use serde_json::Value;

use chainwatch_core::{AdapterError, ChainAdapter, NormalizedTx};

use crate::cache::DebouncedCache;
use crate::client::TronRpcClient;
use crate::decode::{decode_native_transfer, decode_token_transfer, is_smart_contract_trigger};

/// Tron's default poll cadence is faster than the generic 5 s default —
/// blocks are produced roughly every 3 s.
pub const TRON_BLOCK_READ_INTERVAL_MS: u64 = 2_000;

pub struct TronAdapter<C: TronRpcClient> {
    client: C,
    block_txs_cache: DebouncedCache<u64, Vec<Value>>,
    tx_info_cache: DebouncedCache<String, Value>,
}

impl<C: TronRpcClient> TronAdapter<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            block_txs_cache: DebouncedCache::new(),
            tx_info_cache: DebouncedCache::new(),
        }
    }

    async fn block_transactions(&self, height: u64) -> Result<Vec<Value>, AdapterError> {
        if let Some(cached) = self.block_txs_cache.get(&height) {
            return Ok(cached);
        }
        let txs = self.client.get_block_transactions(height).await?;
        self.block_txs_cache.insert(height, txs.clone());
        Ok(txs)
    }

    async fn transaction_info(&self, tx_id: &str) -> Result<Value, AdapterError> {
        if let Some(cached) = self.tx_info_cache.get(&tx_id.to_string()) {
            return Ok(cached);
        }
        let info = self.client.get_transaction_info(tx_id).await?;
        self.tx_info_cache.insert(tx_id.to_string(), info.clone());
        Ok(info)
    }
}

/// Syntactic Tron address check: `T` prefix, base58, 34 characters.
fn is_syntactically_valid_tron_address(addr: &str) -> bool {
    const ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
    addr.starts_with('T') && addr.len() == 34 && addr.chars().all(|c| ALPHABET.contains(c))
}

#[async_trait]
impl<C: TronRpcClient> ChainAdapter for TronAdapter<C> {
    async fn height(&self) -> Result<u64, AdapterError> {
        self.client.get_now_block().await
    }

    async fn txs_at(&self, height: u64) -> Result<Vec<NormalizedTx>, AdapterError> {
        let txs = self.block_transactions(height).await?;
        let mut out = Vec::new();

        for tx in &txs {
            if let Some(normalized) = decode_native_transfer(tx, height, None) {
                out.push(normalized);
                continue;
            }

            if is_smart_contract_trigger(tx) {
                let Some(tx_id) = tx["txID"].as_str() else { continue };
                match self.transaction_info(tx_id).await {
                    Ok(info) => {
                        if let Some(normalized) = decode_token_transfer(tx, &info, height, None) {
                            out.push(normalized);
                        }
                    }
                    Err(e) => tracing::warn!(tx_id, height, error = %e, "failed to fetch transaction info, skipping"),
                }
            }
        }

        Ok(out)
    }

    async fn subscribe_contract(&self, _addr: &str) -> Result<(), AdapterError> {
        // Every TRC20 transfer in a block is already decoded inline; there
        // is no separate upstream filter to install.
        Ok(())
    }

    fn is_account(&self, addr: &str) -> bool {
        is_syntactically_valid_tron_address(addr)
    }

    fn block_read_interval_ms(&self) -> u64 {
        TRON_BLOCK_READ_INTERVAL_MS
    }

    fn chain_name(&self) -> &str {
        "tron"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    struct FakeClient {
        height: AtomicU64,
        block_calls: AtomicU64,
        info_calls: AtomicU64,
        txs: Mutex<Vec<Value>>,
        info: Mutex<Value>,
    }

    #[async_trait]
    impl TronRpcClient for FakeClient {
        async fn get_now_block(&self) -> Result<u64, AdapterError> {
            Ok(self.height.load(Ordering::SeqCst))
        }
        async fn get_block_transactions(&self, _height: u64) -> Result<Vec<Value>, AdapterError> {
            self.block_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.txs.lock().unwrap().clone())
        }
        async fn get_transaction_info(&self, _tx_id: &str) -> Result<Value, AdapterError> {
            self.info_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.info.lock().unwrap().clone())
        }
    }

    fn native_tx() -> Value {
        json!({
            "ret": [{ "contractRet": "SUCCESS" }],
            "txID": "nativetx",
            "raw_data": { "contract": [{ "type": "TransferContract", "parameter": { "value": {
                "owner_address": "41a614f803b6fd780986a42c78ec9c7f77e6ded13c",
                "to_address": "41b614f803b6fd780986a42c78ec9c7f77e6ded13c",
                "amount": 5_000_000u64
            }}}] }
        })
    }

    #[tokio::test]
    async fn txs_at_decodes_native_transfer() {
        let client = FakeClient {
            height: AtomicU64::new(100),
            block_calls: AtomicU64::new(0),
            info_calls: AtomicU64::new(0),
            txs: Mutex::new(vec![native_tx()]),
            info: Mutex::new(Value::Null),
        };
        let adapter = TronAdapter::new(client);
        let txs = adapter.txs_at(100).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].value, primitive_types::U256::from(5_000_000u64));
    }

    #[tokio::test]
    async fn repeated_txs_at_calls_reuse_debounced_block_cache() {
        let client = FakeClient {
            height: AtomicU64::new(100),
            block_calls: AtomicU64::new(0),
            info_calls: AtomicU64::new(0),
            txs: Mutex::new(vec![native_tx()]),
            info: Mutex::new(Value::Null),
        };
        let adapter = TronAdapter::new(client);
        adapter.txs_at(100).await.unwrap();
        adapter.txs_at(100).await.unwrap();
        assert_eq!(adapter.client.block_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn is_account_rejects_non_tron_addresses() {
        let client = FakeClient {
            height: AtomicU64::new(0),
            block_calls: AtomicU64::new(0),
            info_calls: AtomicU64::new(0),
            txs: Mutex::new(vec![]),
            info: Mutex::new(Value::Null),
        };
        let adapter = TronAdapter::new(client);
        assert!(adapter.is_account("TLa2f6VPqDgRE67v1736s7bJ8Ray5wYjU7"));
        assert!(!adapter.is_account("0xabc"));
    }
}
