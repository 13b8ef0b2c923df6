//! chainwatch CLI — start the gateway against a selected backend.
//!
//! Usage:
//! ```bash
//! chainwatch hardhat
//! chainwatch ankr
//! chainwatch solana
//! chainwatch tron
//! chainwatch toncenter
//! chainwatch version
//! chainwatch help
//! ```
//!
//! `config.json` (or the path in `CHAINWATCH_CONFIG`) supplies ports and
//! upstream URIs; individual `CHAINWATCH_*` env vars override specific
//! fields after the file is loaded.

use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use chainwatch_evm::{AnkrRpcClient, EvmAdapterBuilder, HardhatRpcClient};
use chainwatch_gateway::{init_tracing, GatewayConfig};
use chainwatch_solana::{SolanaAdapter, SolanaRpcHttpClient};
use chainwatch_ton::{TonAdapter, TonHttpClient};
use chainwatch_tron::{TronAdapter, TronHttpClient};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "version" | "--version" | "-V" => {
            println!("chainwatch {}", env!("CARGO_PKG_VERSION"));
        }
        "help" | "--help" | "-h" => print_usage(),
        backend @ ("hardhat" | "ankr" | "solana" | "tron" | "toncenter") => {
            if let Err(e) = run(backend).await {
                eprintln!("fatal: {e}");
                process::exit(1);
            }
        }
        other => {
            eprintln!("Unknown backend: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("chainwatch {}", env!("CARGO_PKG_VERSION"));
    println!("Blockchain subscription gateway — JSON-RPC + WebSocket over EVM, Solana, Tron, TON\n");
    println!("USAGE:");
    println!("    chainwatch <BACKEND>\n");
    println!("BACKENDS:");
    println!("    hardhat    Local EVM node (Hardhat/Anvil)");
    println!("    ankr       Remote EVM provider (Ankr)");
    println!("    solana     Solana RPC");
    println!("    tron       Tron full node");
    println!("    toncenter  TON indexer (toncenter-compatible)");
    println!("    version    Print version");
    println!("    help       Print this help");
}

async fn run(backend: &str) -> anyhow::Result<()> {
    let config_path = PathBuf::from(GatewayConfig::default_path());
    let config = GatewayConfig::load(&config_path)?;
    init_tracing(&config.log);

    tracing::info!(backend, "starting chainwatch gateway");

    match backend {
        "hardhat" => {
            let url = config.upstream.node_url.clone().expect("validated at config load");
            let adapter = Arc::new(EvmAdapterBuilder::new(HardhatRpcClient::new(url)).chain_name("hardhat").build());
            chainwatch_gateway::serve(adapter, &config, false).await?;
        }
        "ankr" => {
            let url = config.upstream.provider_url.clone().expect("validated at config load");
            let api_key = config.upstream.api_key.clone().unwrap_or_default();
            let adapter = Arc::new(EvmAdapterBuilder::new(AnkrRpcClient::new(url, &api_key)).chain_name("ankr-eth").build());
            chainwatch_gateway::serve(adapter, &config, false).await?;
        }
        "solana" => {
            let url = config.upstream.solana_rpc_url.clone().expect("validated at config load");
            let adapter = Arc::new(SolanaAdapter::new(SolanaRpcHttpClient::new(url), chainwatch_core::DEFAULT_BLOCK_READ_INTERVAL_MS, false));
            chainwatch_gateway::serve(adapter, &config, true).await?;
        }
        "tron" => {
            let url = config.upstream.tron_api_url.clone().expect("validated at config load");
            let adapter = Arc::new(TronAdapter::new(TronHttpClient::new(url)));
            chainwatch_gateway::serve(adapter, &config, true).await?;
        }
        "toncenter" => {
            let url = config.upstream.ton_indexer_url.clone().expect("validated at config load");
            let adapter = Arc::new(TonAdapter::new(TonHttpClient::new(url)));
            chainwatch_gateway::serve(adapter, &config, false).await?;
        }
        _ => unreachable!("filtered by caller"),
    }

    Ok(())
}
