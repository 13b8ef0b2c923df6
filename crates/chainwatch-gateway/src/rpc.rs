//! `POST /jsonrpc` — the stateless query surface over the adapter.
//!
//! Shares the adapter with the live WebSocket path and holds no index of
//! its own: `getTransactionsByAddress`/`getTokenTransfers` walk a block
//! range calling `adapter.txs_at(h)` and filter in-process.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use chainwatch_core::ChainAdapter;

use crate::state::AppState;

const DEFAULT_PAGE_SIZE: usize = 100;
const DEFAULT_BACKFILL_BLOCKS: u64 = 1_000;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    pub id: Value,
}

fn method_not_found(id: Value) -> Json<Value> {
    Json(json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": -32601, "message": "Method not found" },
    }))
}

fn rpc_error(id: Value, message: impl Into<String>) -> Json<Value> {
    Json(json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": -32000, "message": message.into() },
    }))
}

fn rpc_result(id: Value, result: Value) -> Json<Value> {
    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}

#[derive(Debug, Deserialize, Default)]
struct AddressQuery {
    address: String,
    #[serde(default)]
    from_block: Option<u64>,
    #[serde(default)]
    to_block: Option<u64>,
    #[serde(default)]
    page_size: Option<usize>,
    #[serde(default)]
    token_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenTransferQuery {
    address: String,
    jetton_master: String,
}

async fn transactions_in_range<A: ChainAdapter>(adapter: &A, from_block: u64, to_block: u64) -> Vec<chainwatch_core::NormalizedTx> {
    let mut out = Vec::new();
    for h in from_block..=to_block {
        match adapter.txs_at(h).await {
            Ok(mut txs) => out.append(&mut txs),
            Err(e) => tracing::warn!(chain = adapter.chain_name(), height = h, error = %e, "failed to fetch historical transactions, skipping"),
        }
    }
    out
}

fn addr_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

async fn handle_get_transactions_by_address<A: ChainAdapter>(adapter: &A, params: Value) -> Result<Value, String> {
    let query: AddressQuery = serde_json::from_value(params).map_err(|e| format!("invalid params: {e}"))?;
    let head = adapter.height().await.map_err(|e| e.to_string())?;
    let from_block = query.from_block.unwrap_or_else(|| head.saturating_sub(DEFAULT_BACKFILL_BLOCKS));
    let to_block = query.to_block.unwrap_or(head);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

    let txs = transactions_in_range(adapter, from_block, to_block).await;
    let matched: Vec<_> = txs
        .into_iter()
        .filter(|tx| {
            let side_matches = tx.from.as_deref().is_some_and(|f| addr_eq(f, &query.address)) || addr_eq(&tx.to, &query.address);
            let token_matches = match &query.token_address {
                Some(t) => tx.token.as_deref().is_some_and(|tok| addr_eq(tok, t)),
                None => true,
            };
            side_matches && token_matches
        })
        .take(page_size)
        .collect();

    serde_json::to_value(matched).map_err(|e| e.to_string())
}

async fn handle_get_token_transfers<A: ChainAdapter>(adapter: &A, params: Value) -> Result<Value, String> {
    let query: TokenTransferQuery = serde_json::from_value(params).map_err(|e| format!("invalid params: {e}"))?;
    let head = adapter.height().await.map_err(|e| e.to_string())?;
    let from_block = head.saturating_sub(DEFAULT_BACKFILL_BLOCKS);

    let txs = transactions_in_range(adapter, from_block, head).await;
    let matched: Vec<_> = txs
        .into_iter()
        .filter(|tx| {
            let side_matches = tx.from.as_deref().is_some_and(|f| addr_eq(f, &query.address)) || addr_eq(&tx.to, &query.address);
            let token_matches = tx.token.as_deref().is_some_and(|tok| addr_eq(tok, &query.jetton_master));
            side_matches && token_matches
        })
        .take(DEFAULT_PAGE_SIZE)
        .collect();

    serde_json::to_value(matched).map_err(|e| e.to_string())
}

pub async fn handle_jsonrpc<A: ChainAdapter>(State(state): State<Arc<AppState<A>>>, Json(req): Json<JsonRpcRequest>) -> Json<Value> {
    if req.jsonrpc != "2.0" {
        return rpc_error(req.id, "jsonrpc must be \"2.0\"");
    }

    match req.method.as_str() {
        "ping" => rpc_result(req.id, json!(["pong"])),
        "status" => match state.adapter.height().await {
            Ok(h) => rpc_result(req.id, json!({ "height": h })),
            Err(_) => rpc_error(req.id, "failed to get status"),
        },
        "getTransactionsByAddress" => {
            let params = req.params.clone().unwrap_or(Value::Null);
            match handle_get_transactions_by_address(state.adapter.as_ref(), params).await {
                Ok(result) => rpc_result(req.id, result),
                Err(message) => rpc_error(req.id, message),
            }
        }
        "getTokenTransfers" => {
            let params = req.params.clone().unwrap_or(Value::Null);
            match handle_get_token_transfers(state.adapter.as_ref(), params).await {
                Ok(result) => rpc_result(req.id, result),
                Err(message) => rpc_error(req.id, message),
            }
        }
        _ => method_not_found(req.id),
    }
}

pub async fn handle_ping() -> Json<Value> {
    Json(json!({ "result": ["pong"] }))
}
