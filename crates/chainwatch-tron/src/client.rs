//! HTTP client for a Tron full node (`/wallet/...` endpoints — not
//! JSON-RPC; Tron's node API takes a plain JSON body and returns the
//! result object directly).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use chainwatch_core::AdapterError;

#[async_trait]
pub trait TronRpcClient: Send + Sync {
    async fn get_now_block(&self) -> Result<u64, AdapterError>;
    async fn get_block_transactions(&self, height: u64) -> Result<Vec<Value>, AdapterError>;
    async fn get_transaction_info(&self, tx_id: &str) -> Result<Value, AdapterError>;
}

pub struct TronHttpClient {
    http: reqwest::Client,
    base_url: String,
}

impl TronHttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, AdapterError> {
        let url = format!("{}{path}", self.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| AdapterError::Unavailable(e.to_string()))?;
        resp.json().await.map_err(|e| AdapterError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl TronRpcClient for TronHttpClient {
    async fn get_now_block(&self) -> Result<u64, AdapterError> {
        let v = self.post("/wallet/getnowblock", json!({})).await?;
        v["block_header"]["raw_data"]["number"]
            .as_u64()
            .ok_or_else(|| AdapterError::Unavailable("getnowblock: missing block number".into()))
    }

    async fn get_block_transactions(&self, height: u64) -> Result<Vec<Value>, AdapterError> {
        let v = self.post("/wallet/getblockbynum", json!({ "num": height })).await?;
        Ok(v["transactions"].as_array().cloned().unwrap_or_default())
    }

    async fn get_transaction_info(&self, tx_id: &str) -> Result<Value, AdapterError> {
        self.post("/wallet/gettransactioninfobyid", json!({ "value": tx_id })).await
    }
}
