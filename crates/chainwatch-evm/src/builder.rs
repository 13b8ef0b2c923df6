//! Fluent builder for constructing an `EvmAdapter` bound to a concrete
//! `EvmRpcClient`.
//!
//! # Example
//!
//! ```rust,no_run
//! use chainwatch_evm::{EvmAdapterBuilder, HardhatRpcClient};
//!
//! let adapter = EvmAdapterBuilder::new(HardhatRpcClient::new("http://127.0.0.1:8545"))
//!     .chain_name("hardhat")
//!     .poll_interval_ms(5_000)
//!     .build();
//! ```

use crate::adapter::EvmAdapter;
use crate::client::EvmRpcClient;

pub struct EvmAdapterBuilder<C: EvmRpcClient> {
    client: C,
    chain_name: String,
    poll_interval_ms: u64,
}

impl<C: EvmRpcClient> EvmAdapterBuilder<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            chain_name: "ethereum".into(),
            poll_interval_ms: chainwatch_core::DEFAULT_BLOCK_READ_INTERVAL_MS,
        }
    }

    pub fn chain_name(mut self, name: impl Into<String>) -> Self {
        self.chain_name = name.into();
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn build(self) -> EvmAdapter<C> {
        EvmAdapter::new(self.client, self.chain_name, self.poll_interval_ms)
    }
}
