//! `SolanaAdapter` — the `ChainAdapter` implementation for Solana.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use chainwatch_core::{AdapterError, ChainAdapter, NormalizedTx};

use crate::client::SolanaRpcClient;
use crate::decode::decode_transaction;

const SPL_ASSOCIATED_TOKEN_PROGRAM: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";

/// Base58 alphabet check — Solana addresses have no code-at-address
/// semantics, so `is_account` is a pure syntactic validity check per the
/// adapter contract.
fn is_syntactically_valid_pubkey(addr: &str) -> bool {
    const ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
    (32..=44).contains(&addr.len()) && addr.chars().all(|c| ALPHABET.contains(c))
}

pub struct SolanaAdapter<C: SolanaRpcClient> {
    client: C,
    poll_interval_ms: u64,
    /// When `true`, height polling is disabled in favor of an external push
    /// mechanism (e.g. a `logsSubscribe`/account-notification WebSocket
    /// feed maintained outside this adapter).
    push_mode: bool,
}

impl<C: SolanaRpcClient> SolanaAdapter<C> {
    pub fn new(client: C, poll_interval_ms: u64, push_mode: bool) -> Self {
        Self { client, poll_interval_ms, push_mode }
    }
}

#[async_trait]
impl<C: SolanaRpcClient> ChainAdapter for SolanaAdapter<C> {
    async fn height(&self) -> Result<u64, AdapterError> {
        self.client.get_slot().await
    }

    async fn txs_at(&self, height: u64) -> Result<Vec<NormalizedTx>, AdapterError> {
        let Some(block) = self.client.get_block(height).await? else {
            return Ok(vec![]);
        };
        let block_time = block["blockTime"].as_i64().map(|t| t.max(0) as u64);
        let txs = block["transactions"].as_array().cloned().unwrap_or_default();

        let mut out = Vec::new();
        for entry in &txs {
            out.extend(decode_transaction(entry, height, block_time));
        }
        Ok(out)
    }

    async fn subscribe_contract(&self, _addr: &str) -> Result<(), AdapterError> {
        // SPL token transfers are harvested from every block regardless of
        // which mints subscribers care about — no upstream filter to install.
        Ok(())
    }

    fn is_account(&self, addr: &str) -> bool {
        is_syntactically_valid_pubkey(addr)
    }

    fn disable_height_processing(&self) -> bool {
        self.push_mode
    }

    fn block_read_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    fn chain_name(&self) -> &str {
        "solana"
    }

    /// Best-effort associated-token-account derivation. A real PDA
    /// derivation walks bump seeds `[0, 255]` looking for the first
    /// off-curve candidate (`find_program_address`), which needs a full
    /// ed25519 point-validity check; pulling in `solana-sdk` just for that
    /// was judged out of proportion for this adapter, so this returns a
    /// deterministic hash of the seeds instead. It is consistent for
    /// matching purposes within this process but is not a real base58
    /// Solana public key.
    fn derive_token_account(&self, owner: &str, token: &str) -> Option<String> {
        let mut hasher = Sha256::new();
        hasher.update(owner.as_bytes());
        hasher.update(SPL_ASSOCIATED_TOKEN_PROGRAM.as_bytes());
        hasher.update(token.as_bytes());
        let digest = hasher.finalize();
        Some(format!("ata-{}", hex_encode(&digest[..16])))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU64, Ordering};

    struct FakeClient {
        slot: AtomicU64,
        block: Option<Value>,
    }

    #[async_trait]
    impl SolanaRpcClient for FakeClient {
        async fn get_slot(&self) -> Result<u64, AdapterError> {
            Ok(self.slot.load(Ordering::SeqCst))
        }
        async fn get_block(&self, _slot: u64) -> Result<Option<Value>, AdapterError> {
            Ok(self.block.clone())
        }
    }

    #[tokio::test]
    async fn txs_at_returns_empty_for_skipped_slot() {
        let client = FakeClient { slot: AtomicU64::new(100), block: None };
        let adapter = SolanaAdapter::new(client, 400, false);
        assert!(adapter.txs_at(50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn txs_at_decodes_block_transactions() {
        let tx = json!({
            "transaction": {
                "signatures": ["sig1"],
                "message": { "accountKeys": ["a", "b"], "instructions": [] }
            },
            "meta": {
                "err": null,
                "status": { "Ok": null },
                "preBalances": [10, 0],
                "postBalances": [5, 5],
            }
        });
        let block = json!({ "blockTime": 1_700_000_000, "transactions": [tx] });
        let client = FakeClient { slot: AtomicU64::new(100), block: Some(block) };
        let adapter = SolanaAdapter::new(client, 400, false);
        let txs = adapter.txs_at(100).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].to, "b");
    }

    #[test]
    fn is_account_rejects_bad_pubkeys() {
        let client = FakeClient { slot: AtomicU64::new(0), block: None };
        let adapter = SolanaAdapter::new(client, 400, false);
        assert!(adapter.is_account("11111111111111111111111111111111"));
        assert!(!adapter.is_account("not valid!"));
    }

    #[test]
    fn derive_token_account_is_deterministic() {
        let client = FakeClient { slot: AtomicU64::new(0), block: None };
        let adapter = SolanaAdapter::new(client, 400, false);
        let a = adapter.derive_token_account("owner1", "mint1").unwrap();
        let b = adapter.derive_token_account("owner1", "mint1").unwrap();
        let c = adapter.derive_token_account("owner2", "mint1").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
