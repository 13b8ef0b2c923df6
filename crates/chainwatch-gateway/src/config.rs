//! Gateway configuration — file defaults, env var overrides.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chainwatch_core::GatewayError;

/// Log level per component, same shape across the reference crate family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub components: HashMap<String, String>,
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: default_level(), components: HashMap::new(), json: false }
    }
}

/// Initialize tracing once at process startup.
pub fn init_tracing(config: &LogConfig) {
    let mut directives = config.level.clone();
    for (component, level) in &config.components {
        directives.push_str(&format!(",{}={}", component.replace('-', "_"), level));
    }
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json {
        tracing_subscriber::registry().with(filter).with(fmt::layer().json()).init();
    } else {
        tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
    }
}

/// Upstream connection details for one backend. Only the fields relevant to
/// the selected backend need to be populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Hardhat/local-node JSON-RPC URL.
    #[serde(default)]
    pub node_url: Option<String>,
    /// Ankr (or other remote EVM provider) base URL.
    #[serde(default)]
    pub provider_url: Option<String>,
    /// API key appended to the provider URL, when required.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Solana RPC endpoint.
    #[serde(default)]
    pub solana_rpc_url: Option<String>,
    /// Tron full-node HTTP API base URL.
    #[serde(default)]
    pub tron_api_url: Option<String>,
    /// TON indexer base URL (toncenter or self-hosted).
    #[serde(default)]
    pub ton_indexer_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// `hardhat | ankr | solana | tron | toncenter`
    pub backend: String,
    #[serde(default = "default_ws_port")]
    pub ws_port: u16,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_ws_port() -> u16 {
    8181
}

impl GatewayConfig {
    /// Load from `path`, then apply `CHAINWATCH_*` env var overrides.
    pub fn load(path: &Path) -> Result<Self, GatewayError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| GatewayError::Fatal(format!("failed to read config {}: {e}", path.display())))?;
        let mut config: GatewayConfig =
            serde_json::from_str(&raw).map_err(|e| GatewayError::Fatal(format!("invalid config {}: {e}", path.display())))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config path: `CHAINWATCH_CONFIG` env var, else `config.json`
    /// in the current directory.
    pub fn default_path() -> String {
        env::var("CHAINWATCH_CONFIG").unwrap_or_else(|_| "config.json".to_string())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("CHAINWATCH_BACKEND") {
            self.backend = v;
        }
        if let Ok(v) = env::var("CHAINWATCH_WS_PORT") {
            if let Ok(port) = v.parse() {
                self.ws_port = port;
            }
        }
        if let Ok(v) = env::var("CHAINWATCH_NODE_URL") {
            self.upstream.node_url = Some(v);
        }
        if let Ok(v) = env::var("CHAINWATCH_PROVIDER_URL") {
            self.upstream.provider_url = Some(v);
        }
        if let Ok(v) = env::var("CHAINWATCH_API_KEY") {
            self.upstream.api_key = Some(v);
        }
        if let Ok(v) = env::var("CHAINWATCH_SOLANA_RPC_URL") {
            self.upstream.solana_rpc_url = Some(v);
        }
        if let Ok(v) = env::var("CHAINWATCH_TRON_API_URL") {
            self.upstream.tron_api_url = Some(v);
        }
        if let Ok(v) = env::var("CHAINWATCH_TON_INDEXER_URL") {
            self.upstream.ton_indexer_url = Some(v);
        }
        if let Ok(v) = env::var("CHAINWATCH_LOG_LEVEL") {
            self.log.level = v;
        }
    }

    /// The selected backend's required upstream URI must be present.
    fn validate(&self) -> Result<(), GatewayError> {
        let missing = match self.backend.as_str() {
            "hardhat" => self.upstream.node_url.is_none(),
            "ankr" => self.upstream.provider_url.is_none(),
            "solana" => self.upstream.solana_rpc_url.is_none(),
            "tron" => self.upstream.tron_api_url.is_none(),
            "toncenter" => self.upstream.ton_indexer_url.is_none(),
            other => return Err(GatewayError::Fatal(format!("unknown backend: {other}"))),
        };
        if missing {
            return Err(GatewayError::Fatal(format!("missing required upstream URI for backend {}", self.backend)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_unknown_backend() {
        let config = GatewayConfig {
            backend: "bogus".into(),
            ws_port: 8181,
            upstream: UpstreamConfig::default(),
            log: LogConfig::default(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_upstream_for_selected_backend() {
        let config = GatewayConfig {
            backend: "hardhat".into(),
            ws_port: 8181,
            upstream: UpstreamConfig::default(),
            log: LogConfig::default(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_populated_upstream() {
        let config = GatewayConfig {
            backend: "hardhat".into(),
            ws_port: 8181,
            upstream: UpstreamConfig { node_url: Some("http://localhost:8545".into()), ..Default::default() },
            log: LogConfig::default(),
        };
        assert!(config.validate().is_ok());
    }
}
