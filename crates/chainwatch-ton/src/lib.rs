//! chainwatch-ton — the `ChainAdapter` for TON: deposit-only transaction
//! decoding over a paginated indexer API.

pub mod adapter;
pub mod client;
pub mod decode;

pub use adapter::TonAdapter;
pub use client::{TonHttpClient, TonRpcClient};
pub use decode::{decode_transaction, normalize_hash};
