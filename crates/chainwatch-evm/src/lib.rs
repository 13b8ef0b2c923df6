//! chainwatch-evm — the `ChainAdapter` for EVM chains, backing both the
//! local development node and a remote multi-chain provider off one decoder.

pub mod adapter;
pub mod builder;
pub mod client;
pub mod decode;

pub use adapter::EvmAdapter;
pub use builder::EvmAdapterBuilder;
pub use client::{AnkrRpcClient, EvmRpcClient, HardhatRpcClient};
pub use decode::{decode_native_tx, decode_transfer_log, RawLog};
