//! JSON-RPC client for a Solana full node / RPC provider.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use chainwatch_core::AdapterError;

#[async_trait]
pub trait SolanaRpcClient: Send + Sync {
    async fn get_slot(&self) -> Result<u64, AdapterError>;

    /// Full block at `slot` with parsed transaction details. `Ok(None)`
    /// when the slot was skipped (no block produced).
    async fn get_block(&self, slot: u64) -> Result<Option<Value>, AdapterError>;
}

pub struct SolanaRpcHttpClient {
    http: reqwest::Client,
    url: String,
}

impl SolanaRpcHttpClient {
    pub fn new(url: impl Into<String>) -> Self {
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
}

#[async_trait]
impl SolanaRpcClient for SolanaRpcHttpClient {
    async fn get_slot(&self) -> Result<u64, AdapterError> {
        let v = self.call("getSlot", json!([{"commitment": "confirmed"}])).await?;
        v.as_u64().ok_or_else(|| AdapterError::Unavailable("getSlot: non-numeric result".into()))
    }

    async fn get_block(&self, slot: u64) -> Result<Option<Value>, AdapterError> {
        let params = json!([
            slot,
            {
                "encoding": "jsonParsed",
                "transactionDetails": "full",
                "rewards": false,
                "maxSupportedTransactionVersion": 0,
            }
        ]);
        match self.call("getBlock", params).await {
            Ok(v) if v.is_null() => Ok(None),
            Ok(v) => Ok(Some(v)),
            // A skipped slot is reported as an RPC error in some node
            // versions rather than a null result.
            Err(e) if e.to_string().contains("-32007") || e.to_string().contains("skipped") => Ok(None),
            Err(e) => Err(e),
        }
    }
}
