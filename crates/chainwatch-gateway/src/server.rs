//! Router assembly and the `serve` entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use chainwatch_core::{spawn_sweeper, ChainAdapter, GatewayError, HeightPoller};

use crate::config::GatewayConfig;
use crate::rpc::{handle_jsonrpc, handle_ping};
use crate::state::AppState;
use crate::ws::upgrade;

fn router<A: ChainAdapter + 'static>(state: Arc<AppState<A>>) -> Router {
    Router::new()
        .route("/jsonrpc", post(handle_jsonrpc::<A>))
        .route("/ping", post(handle_ping))
        .route("/ws", get(upgrade::<A>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the poller, the tombstone sweeper, and the HTTP/WS server; runs
/// until the process is killed.
pub async fn serve<A: ChainAdapter + 'static>(adapter: Arc<A>, config: &GatewayConfig, use_txid_key: bool) -> Result<(), GatewayError> {
    let state = AppState::new(adapter.clone(), use_txid_key);

    let poller = Arc::new(
        HeightPoller::with_txid_key(adapter, state.table.clone(), use_txid_key)
            .await
            .map_err(GatewayError::Adapter)?,
    );
    tokio::spawn(poller.run());
    spawn_sweeper(state.table.clone());

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.ws_port));
    tracing::info!(%addr, "chainwatch-gateway listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| GatewayError::Fatal(format!("failed to bind {addr}: {e}")))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| GatewayError::Fatal(format!("server error: {e}")))
}
