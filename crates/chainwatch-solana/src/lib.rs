//! chainwatch-solana — the `ChainAdapter` for Solana: balance-diff native
//! and SPL token transfers, plus direct `transferChecked` harvesting.

pub mod adapter;
pub mod client;
pub mod decode;

pub use adapter::SolanaAdapter;
pub use client::{SolanaRpcClient, SolanaRpcHttpClient};
pub use decode::decode_transaction;
