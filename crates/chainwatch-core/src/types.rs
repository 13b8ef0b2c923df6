//! Shared types crossing the boundary between chain adapters and the matcher.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── ConnectionId ──────────────────────────────────────────────────────────

/// Opaque 128-bit identifier minted at WebSocket accept time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(u128);

impl ConnectionId {
    /// Mint a fresh random connection id.
    pub fn new() -> Self {
        Self(rand::random())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

// ─── NormalizedTx ──────────────────────────────────────────────────────────

/// The canonical, chain-agnostic transaction record produced by an adapter
/// and consumed by the matcher.
///
/// `from`/`to` are already in each chain's canonical lower-case form (the
/// adapter is responsible for that, not the matcher).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedTx {
    /// Adapter-defined canonical encoding: hex for EVM/Tron, base64 for TON,
    /// signature for Solana.
    pub hash: String,
    /// Sender address. Absent when the adapter cannot recover it (e.g. a
    /// Solana balance-diff derived transfer).
    pub from: Option<String>,
    /// Recipient address. Always present.
    pub to: String,
    /// Value in the asset's base unit. May exceed 64 bits for EVM.
    pub value: U256,
    /// Block number (slot number for Solana).
    pub block_number: u64,
    /// Adapter-reported timestamp (seconds or ms; adapter-documented).
    pub timestamp: Option<u64>,
    /// Token contract address when this is a token transfer; absent for
    /// native transfers.
    pub token: Option<String>,
    /// Informational token symbol.
    pub symbol: Option<String>,
    /// Adapter-reported network fee, when available (e.g. Tron).
    pub fee: Option<U256>,
    /// Adapter-reported receipt/status string, when available.
    pub receipt: Option<String>,
}

impl NormalizedTx {
    /// A record with `value == 0` carries no signal and is dropped before
    /// dispatch.
    pub fn is_zero_value(&self) -> bool {
        self.value.is_zero()
    }
}

/// The fixed set of subscribable events. Topics are fixed — this is not a
/// general pub/sub broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "subscribeAccount")]
    SubscribeAccount,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscribeAccount => write!(f, "subscribeAccount"),
        }
    }
}
