//! `TonAdapter` — the `ChainAdapter` implementation for TON.
//!
//! TON's indexer has no natural block-height cursor the way EVM/Tron do, so
//! `height()` is a self-ticking logical clock: every poll advances it by
//! exactly one, keeping it compatible with `HeightPoller`'s generic
//! `start..=head` loop. Real progress is tracked separately, by an internal
//! logical-time (`lt`) watermark that `txs_at` advances as it pages through
//! the indexer — `height`'s numeric value itself carries no chain meaning.
//!
//! Unlike a design that starts a per-subscription polling interval, this
//! adapter has exactly one background driver (the shared `HeightPoller`),
//! so there is nothing per-contract to leak or forget to cancel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use chainwatch_core::{AdapterError, ChainAdapter, NormalizedTx};

use crate::client::TonRpcClient;
use crate::decode::{decode_transaction, transaction_lt};

/// Indexer page size, per the paging policy.
const PAGE_LIMIT: u32 = 200;

/// Hard cap on pages fetched per `txs_at` call (50,000 records).
const MAX_PAGES: u32 = 250;

pub struct TonAdapter<C: TonRpcClient> {
    client: C,
    tick: AtomicU64,
    last_lt: Mutex<Option<u64>>,
}

impl<C: TonRpcClient> TonAdapter<C> {
    pub fn new(client: C) -> Self {
        Self { client, tick: AtomicU64::new(0), last_lt: Mutex::new(None) }
    }
}

/// TON "friendly" addresses are 48-character base64url strings.
fn is_syntactically_valid_ton_address(addr: &str) -> bool {
    addr.len() == 48 && addr.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl<C: TonRpcClient> ChainAdapter for TonAdapter<C> {
    async fn height(&self) -> Result<u64, AdapterError> {
        Ok(self.tick.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn txs_at(&self, _height: u64) -> Result<Vec<NormalizedTx>, AdapterError> {
        let since = *self.last_lt.lock().unwrap();
        let mut out = Vec::new();
        let mut high_watermark = since.unwrap_or(0);
        let mut cursor: Option<u64> = None;

        for page in 0..MAX_PAGES {
            let txs = self.client.get_transactions_page(cursor, PAGE_LIMIT).await?;
            if txs.is_empty() {
                break;
            }

            let mut hit_watermark = false;
            for tx in &txs {
                let Some(lt) = transaction_lt(tx) else { continue };
                if let Some(since_lt) = since {
                    if lt <= since_lt {
                        hit_watermark = true;
                        break;
                    }
                }
                if lt > high_watermark {
                    high_watermark = lt;
                }
                if let Some(normalized) = decode_transaction(tx) {
                    out.push(normalized);
                }
            }

            if hit_watermark {
                break;
            }

            let min_lt = txs.iter().filter_map(transaction_lt).min();
            cursor = min_lt;

            if txs.len() < PAGE_LIMIT as usize {
                break;
            }
            if page + 1 == MAX_PAGES {
                tracing::warn!(pages = MAX_PAGES, "hit the indexer page cap without draining new transactions");
            }
        }

        *self.last_lt.lock().unwrap() = Some(high_watermark);
        Ok(out)
    }

    async fn subscribe_contract(&self, _addr: &str) -> Result<(), AdapterError> {
        // Jetton transfers aren't decoded by this adapter (deposit-only);
        // there is no upstream filter to install.
        Ok(())
    }

    fn is_account(&self, addr: &str) -> bool {
        is_syntactically_valid_ton_address(addr)
    }

    fn chain_name(&self) -> &str {
        "ton"
    }
}
