//! HTTP client for the TON indexer's paginated transaction feed.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use chainwatch_core::AdapterError;

#[async_trait]
pub trait TonRpcClient: Send + Sync {
    /// One page of transactions ordered by logical time descending.
    /// `before_lt`, when set, requests the page starting just below that
    /// logical time (pagination cursor); `limit` is capped by the caller at
    /// 200 per the adapter's paging policy.
    async fn get_transactions_page(&self, before_lt: Option<u64>, limit: u32) -> Result<Vec<Value>, AdapterError>;
}

pub struct TonHttpClient {
    http: reqwest::Client,
    base_url: String,
}

impl TonHttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl TonRpcClient for TonHttpClient {
    async fn get_transactions_page(&self, before_lt: Option<u64>, limit: u32) -> Result<Vec<Value>, AdapterError> {
        let mut req = self
            .http
            .get(format!("{}/getTransactions", self.base_url.trim_end_matches('/')))
            .query(&[("limit", limit.to_string())])
            .timeout(Duration::from_secs(10));
        if let Some(lt) = before_lt {
            req = req.query(&[("to_lt", lt.to_string())]);
        }
        let resp = req.send().await.map_err(|e| AdapterError::Unavailable(e.to_string()))?;
        let v: Value = resp.json().await.map_err(|e| AdapterError::Unavailable(e.to_string()))?;
        Ok(v["result"].as_array().cloned().unwrap_or_default())
    }
}
