//! chainwatch-gateway — the HTTP JSON-RPC + WebSocket transport over the
//! subscription/dispatch engine. Thin by design: all matching, dedup, and
//! polling logic lives in `chainwatch-core`; this crate only speaks wire
//! formats and owns the axum router.

pub mod config;
pub mod rpc;
pub mod server;
pub mod state;
pub mod ws;

pub use config::{init_tracing, GatewayConfig, LogConfig, UpstreamConfig};
pub use server::serve;
pub use state::AppState;
