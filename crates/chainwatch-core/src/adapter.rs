//! The `ChainAdapter` contract — the pluggable boundary between an upstream
//! chain data source and the subscription/dispatch engine.
//!
//! Every chain implementation (EVM local node, EVM remote provider, Solana,
//! Tron, TON) satisfies this capability set. Generic height-polling logic
//! (`crate::poller::HeightPoller`) is a free function over this trait, not a
//! base class — concrete chain SDKs never leak past this boundary.

use async_trait::async_trait;

use crate::error::AdapterError;
use crate::types::NormalizedTx;

/// Default poll cadence for adapters that don't override it.
pub const DEFAULT_BLOCK_READ_INTERVAL_MS: u64 = 5_000;

#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// Current best known height/slot.
    async fn height(&self) -> Result<u64, AdapterError>;

    /// All relevant transactions at `height`, already normalized. Returns an
    /// empty vector when the block has none or cannot be fetched in full —
    /// a partial failure of one tx among many must not fail the whole call;
    /// implementations drop and log the failed item instead.
    async fn txs_at(&self, height: u64) -> Result<Vec<NormalizedTx>, AdapterError>;

    /// Install whatever upstream log filter is needed to observe token
    /// transfer events for `addr`. Idempotent. A no-op for adapters that
    /// harvest token logs inline from the block fetch.
    async fn subscribe_contract(&self, addr: &str) -> Result<(), AdapterError>;

    /// `true` when `addr` is a plain externally-owned address, `false` for
    /// contracts. Chains without code-at-address semantics (TON, Solana)
    /// return a pure syntactic validity check.
    fn is_account(&self, addr: &str) -> bool;

    /// When `true`, the `HeightPoller` for this adapter returns immediately
    /// without ever fetching — used by adapters that rely on an external
    /// push mechanism instead of block-height polling.
    fn disable_height_processing(&self) -> bool {
        false
    }

    /// Poll cadence for this adapter, in milliseconds.
    fn block_read_interval_ms(&self) -> u64 {
        DEFAULT_BLOCK_READ_INTERVAL_MS
    }

    /// Chain slug used in logs and error messages (e.g. `"ethereum"`).
    fn chain_name(&self) -> &str;

    /// Derive the address that should also count as a match for
    /// `(owner, token)`, beyond `owner` itself. Solana overrides this with
    /// the associated token account; every other chain keeps the default
    /// (no derived alias).
    fn derive_token_account(&self, _owner: &str, _token: &str) -> Option<String> {
        None
    }
}
