//! JSON-RPC clients for EVM backends — a local development node
//! (Hardhat/Anvil) and a remote multi-chain provider (Ankr). Both speak the
//! same wire protocol; they differ only in base URL construction and how
//! the API key is attached. `EvmAdapter` is generic over `EvmRpcClient` so
//! the decoding logic never needs to know which one it's talking to.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use chainwatch_core::AdapterError;

use crate::decode::RawLog;

#[async_trait]
pub trait EvmRpcClient: Send + Sync {
    async fn get_block_number(&self) -> Result<u64, AdapterError>;

    /// Full block, including transaction objects (`eth_getBlockByNumber`
    /// with `full_transactions = true`).
    async fn get_block_with_txs(&self, number: u64) -> Result<Option<Value>, AdapterError>;

    /// All logs in `[from, to]`, optionally restricted to one contract
    /// address.
    async fn get_logs(&self, from: u64, to: u64, address: Option<&str>) -> Result<Vec<RawLog>, AdapterError>;
}

struct JsonRpc {
    http: reqwest::Client,
    url: String,
}

impl JsonRpc {
    fn new(url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), url: url.into() }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, AdapterError> {
        let body = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params });
        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| AdapterError::Unavailable(e.to_string()))?;
        let v: Value = resp.json().await.map_err(|e| AdapterError::Unavailable(e.to_string()))?;
        if let Some(err) = v.get("error") {
            return Err(AdapterError::Unavailable(err.to_string()));
        }
        Ok(v.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn get_block_number(&self) -> Result<u64, AdapterError> {
        let v = self.call("eth_blockNumber", json!([])).await?;
        Ok(parse_hex_u64(v.as_str().unwrap_or("0x0")))
    }

    async fn get_block_with_txs(&self, number: u64) -> Result<Option<Value>, AdapterError> {
        let v = self.call("eth_getBlockByNumber", json!([format!("0x{number:x}"), true])).await?;
        Ok(if v.is_null() { None } else { Some(v) })
    }

    async fn get_logs(&self, from: u64, to: u64, address: Option<&str>) -> Result<Vec<RawLog>, AdapterError> {
        let mut filter = json!({
            "fromBlock": format!("0x{from:x}"),
            "toBlock": format!("0x{to:x}"),
        });
        if let Some(addr) = address {
            filter["address"] = json!(addr);
        }
        let v = self.call("eth_getLogs", json!([filter])).await?;
        serde_json::from_value(v).map_err(|e| AdapterError::Unavailable(format!("malformed logs response: {e}")))
    }
}

/// Local development node (Hardhat, Anvil) reachable over plain HTTP, no
/// API key.
pub struct HardhatRpcClient {
    inner: JsonRpc,
}

impl HardhatRpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { inner: JsonRpc::new(url) }
    }
}

#[async_trait]
impl EvmRpcClient for HardhatRpcClient {
    async fn get_block_number(&self) -> Result<u64, AdapterError> {
        self.inner.get_block_number().await
    }
    async fn get_block_with_txs(&self, number: u64) -> Result<Option<Value>, AdapterError> {
        self.inner.get_block_with_txs(number).await
    }
    async fn get_logs(&self, from: u64, to: u64, address: Option<&str>) -> Result<Vec<RawLog>, AdapterError> {
        self.inner.get_logs(from, to, address).await
    }
}

/// Remote multi-chain provider (Ankr). The API key is embedded as a URL
/// path segment rather than a header, matching Ankr's public gateway.
pub struct AnkrRpcClient {
    inner: JsonRpc,
}

impl AnkrRpcClient {
    pub fn new(base_url: impl AsRef<str>, api_key: &str) -> Self {
        let url = format!("{}/{}", base_url.as_ref().trim_end_matches('/'), api_key);
        Self { inner: JsonRpc::new(url) }
    }
}

#[async_trait]
impl EvmRpcClient for AnkrRpcClient {
    async fn get_block_number(&self) -> Result<u64, AdapterError> {
        self.inner.get_block_number().await
    }
    async fn get_block_with_txs(&self, number: u64) -> Result<Option<Value>, AdapterError> {
        self.inner.get_block_with_txs(number).await
    }
    async fn get_logs(&self, from: u64, to: u64, address: Option<&str>) -> Result<Vec<RawLog>, AdapterError> {
        self.inner.get_logs(from, to, address).await
    }
}

/// Parse a hex-encoded string (with or without `0x`) to `u64`.
pub fn parse_hex_u64(s: &str) -> u64 {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_u64_basic() {
        assert_eq!(parse_hex_u64("0x1"), 1);
        assert_eq!(parse_hex_u64("0xff"), 255);
        assert_eq!(parse_hex_u64("1234"), 0x1234);
    }

    #[test]
    fn ankr_url_joins_api_key() {
        let client = AnkrRpcClient::new("https://rpc.ankr.com/eth", "my-key");
        assert_eq!(client.inner.url, "https://rpc.ankr.com/eth/my-key");
    }
}
