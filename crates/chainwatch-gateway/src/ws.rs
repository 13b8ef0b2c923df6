//! `GET /ws` — the live `subscribeAccount` protocol.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use chainwatch_core::{ChainAdapter, Delivery};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct WsFrame {
    method: String,
    #[serde(default)]
    params: Value,
}

/// Bridges the synchronous `Delivery` trait to an async WebSocket sender
/// task via an unbounded channel — `send`/`error` must never block.
struct WsDelivery {
    out: mpsc::UnboundedSender<Value>,
}

impl Delivery for WsDelivery {
    fn send(&self, payload: Value) {
        let _ = self.out.send(payload);
    }

    fn error(&self, message: &str) {
        let _ = self.out.send(json!({ "error": message }));
    }
}

pub async fn upgrade<A: ChainAdapter + 'static>(ws: WebSocketUpgrade, State(state): State<Arc<AppState<A>>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket<A: ChainAdapter + 'static>(socket: WebSocket, state: Arc<AppState<A>>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();

    let forward = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sink.send(Message::Text(payload.to_string())).await.is_err() {
                break;
            }
        }
    });

    let cid = state.lifecycle.accept();
    let delivery: Arc<dyn Delivery> = Arc::new(WsDelivery { out: tx.clone() });

    while let Some(Ok(msg)) = stream.next().await {
        let Message::Text(text) = msg else { continue };
        let frame: WsFrame = match serde_json::from_str(&text) {
            Ok(f) => f,
            Err(e) => {
                let _ = tx.send(json!({ "error": format!("bad frame: {e}") }));
                continue;
            }
        };

        if frame.method != "subscribeAccount" {
            let _ = tx.send(json!({ "error": format!("unknown method: {}", frame.method) }));
            continue;
        }

        let Some(params) = frame.params.as_array() else {
            let _ = tx.send(json!({ "error": "params must be [address, tokens]" }));
            continue;
        };
        let Some(address) = params.first().and_then(Value::as_str) else {
            let _ = tx.send(json!({ "error": "missing address" }));
            continue;
        };
        let tokens: Vec<String> = params
            .get(1)
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();

        if let Err(e) = state.lifecycle.subscribe_account(cid, delivery.clone(), address, tokens).await {
            let _ = tx.send(json!({ "error": e.to_string() }));
        }
    }

    state.lifecycle.close(cid);
    forward.abort();
}
