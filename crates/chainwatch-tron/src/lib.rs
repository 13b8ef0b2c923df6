//! chainwatch-tron — the `ChainAdapter` for Tron: native `TransferContract`
//! and TRC20 `TriggerSmartContract` decoding, with a debounced cache over
//! block-transactions and transaction-info lookups.

pub mod adapter;
pub mod cache;
pub mod client;
pub mod decode;

pub use adapter::TronAdapter;
pub use cache::DebouncedCache;
pub use client::{TronHttpClient, TronRpcClient};
pub use decode::{decode_native_transfer, decode_token_transfer, tron_address_from_hex};
