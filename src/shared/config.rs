//! Settings for chains, the trading engines and the wallet manager

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::shared::errors::AppError;
use crate::shared::types::{ChainConfig, ChainId};

/// Multi-chain network configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MultiChainConfig {
    pub default_chain: ChainId,
    pub enabled_chains: Vec<ChainId>,
    pub chain_configs: HashMap<ChainId, ChainConfig>,
    pub dex_preferences: HashMap<ChainId, Vec<String>>,
}

impl Default for MultiChainConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl MultiChainConfig {
    /// Mainnet preset: solana, ethereum, arbitrum, base
    pub fn mainnet() -> Self {
        Self::build(
            ChainId::Solana,
            vec![ChainId::Solana, ChainId::Ethereum, ChainId::Arbitrum, ChainId::Base],
            false,
            &HashMap::new(),
        )
    }

    /// Testnet preset: solana devnet and ethereum sepolia
    pub fn testnet() -> Self {
        let mut env = HashMap::new();
        env.insert("SOLANA_DEVNET_RPC_URL".to_string(), "https://api.devnet.solana.com".to_string());
        env.insert("ETHEREUM_SEPOLIA_RPC_URL".to_string(), "https://rpc.sepolia.org".to_string());
        Self::build(ChainId::Solana, vec![ChainId::Solana, ChainId::Ethereum], true, &env)
    }

    /// Build from process environment
    pub fn from_env() -> Result<Self, AppError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::from_env_map(&env)
    }

    /// Build from an explicit environment map
    pub fn from_env_map(env: &HashMap<String, String>) -> Result<Self, AppError> {
        let enabled_chains = match env.get("ENABLED_CHAINS") {
            Some(list) => parse_chain_list(list)?,
            None => vec![ChainId::Solana, ChainId::Ethereum, ChainId::Arbitrum, ChainId::Base],
        };

        let default_chain = match env.get("DEFAULT_CHAIN") {
            Some(name) => name
                .parse::<ChainId>()
                .map_err(|e| AppError::ConfigError(format!("DEFAULT_CHAIN: {}", e)))?,
            None => ChainId::Solana,
        };

        let use_testnet = env.get("USE_TESTNET").map(|v| v == "true").unwrap_or(false);

        Ok(Self::build(default_chain, enabled_chains, use_testnet, env))
    }

    fn build(
        default_chain: ChainId,
        enabled_chains: Vec<ChainId>,
        use_testnet: bool,
        env: &HashMap<String, String>,
    ) -> Self {
        let chain_configs = enabled_chains
            .iter()
            .map(|chain| {
                let mut config = ChainConfig::builtin(*chain);
                if let Some(url) = env_rpc_url(env, *chain, use_testnet) {
                    config.rpc_urls.insert(0, url);
                }
                config.is_testnet = use_testnet;
                (*chain, config)
            })
            .collect();

        Self {
            default_chain,
            enabled_chains,
            chain_configs,
            dex_preferences: default_dex_preferences(),
        }
    }

    /// Configuration for a chain, falling back to the built-in descriptor
    pub fn chain_config(&self, chain_id: ChainId) -> ChainConfig {
        self.chain_configs
            .get(&chain_id)
            .cloned()
            .unwrap_or_else(|| ChainConfig::builtin(chain_id))
    }

    pub fn is_chain_enabled(&self, chain_id: ChainId) -> bool {
        self.enabled_chains.contains(&chain_id)
    }

    pub fn dex_preferences(&self, chain_id: ChainId) -> &[String] {
        self.dex_preferences
            .get(&chain_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn update_chain_config(&mut self, config: ChainConfig) {
        self.chain_configs.insert(config.chain_id, config);
    }
}

fn parse_chain_list(list: &str) -> Result<Vec<ChainId>, AppError> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            name.parse::<ChainId>()
                .map_err(|e| AppError::ConfigError(format!("ENABLED_CHAINS: {}", e)))
        })
        .collect()
}

fn env_rpc_url(env: &HashMap<String, String>, chain_id: ChainId, use_testnet: bool) -> Option<String> {
    let key = if use_testnet {
        match chain_id {
            ChainId::Solana => "SOLANA_DEVNET_RPC_URL",
            ChainId::Ethereum => "ETHEREUM_SEPOLIA_RPC_URL",
            _ => return None,
        }
    } else {
        match chain_id {
            ChainId::Solana => "SOLANA_RPC_URL",
            ChainId::Ethereum => "ETHEREUM_RPC_URL",
            ChainId::Arbitrum => "ARBITRUM_RPC_URL",
            ChainId::Base => "BASE_RPC_URL",
            ChainId::Polygon => "POLYGON_RPC_URL",
            ChainId::Avalanche => "AVALANCHE_RPC_URL",
        }
    };
    env.get(key).filter(|url| !url.is_empty()).cloned()
}

fn default_dex_preferences() -> HashMap<ChainId, Vec<String>> {
    let prefs: [(ChainId, &[&str]); 6] = [
        (ChainId::Solana, &["jupiter"]),
        (ChainId::Ethereum, &["uniswap", "sushiswap", "1inch"]),
        (ChainId::Arbitrum, &["camelot", "uniswap"]),
        (ChainId::Base, &["baseswap", "uniswap"]),
        (ChainId::Polygon, &["quickswap", "sushiswap"]),
        (ChainId::Avalanche, &["traderjoe", "pangolin"]),
    ];
    prefs
        .into_iter()
        .map(|(chain, dexs)| (chain, dexs.iter().map(|d| d.to_string()).collect()))
        .collect()
}

/// How a swap reaches the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapSubmission {
    /// Venue builds, wallet manager signs, chain adapter broadcasts
    Signed,
    /// Venue signs and broadcasts with the chain wallet
    Venue,
}

/// Trading engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradingEngineConfig {
    /// Slippage tolerance in percent
    pub default_slippage_tolerance: f64,
    pub confirmation_timeout_ms: u64,
    pub confirmation_poll_interval_ms: u64,
    pub required_confirmations: u32,
    pub default_wallet_id: Option<String>,
    /// Chains tried first for cross-chain trades, in order
    pub preferred_chains: Vec<ChainId>,
    /// Gas price ceiling per chain in native base units
    pub max_gas_prices: HashMap<ChainId, u64>,
    pub swap_submission: SwapSubmission,
}

impl Default for TradingEngineConfig {
    fn default() -> Self {
        let max_gas_prices = [
            (ChainId::Ethereum, 50_000_000_000u64),
            (ChainId::Arbitrum, 100_000_000),
            (ChainId::Base, 100_000_000),
            (ChainId::Polygon, 50_000_000_000),
            (ChainId::Avalanche, 30_000_000_000),
            (ChainId::Solana, 5_000),
        ]
        .into_iter()
        .collect();

        Self {
            default_slippage_tolerance: 0.5,
            confirmation_timeout_ms: 60_000,
            confirmation_poll_interval_ms: 1_000,
            required_confirmations: 1,
            default_wallet_id: None,
            preferred_chains: vec![ChainId::Solana, ChainId::Arbitrum, ChainId::Base],
            max_gas_prices,
            swap_submission: SwapSubmission::Signed,
        }
    }
}

/// Wallet manager configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalletManagerConfig {
    pub default_wallet_name_prefix: String,
    pub auto_create_wallet: bool,
    pub default_chains: Vec<ChainId>,
}

impl Default for WalletManagerConfig {
    fn default() -> Self {
        Self {
            default_wallet_name_prefix: "MultiChain Wallet".to_string(),
            auto_create_wallet: true,
            default_chains: vec![ChainId::Solana, ChainId::Ethereum, ChainId::Arbitrum],
        }
    }
}

/// Top-level settings file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chains: MultiChainConfig,
    pub engine: TradingEngineConfig,
    pub wallet: WalletManagerConfig,
}

impl Settings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::ConfigError(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, AppError> {
        toml::from_str(content)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {}", e)))
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from Config.toml in the working directory
    pub fn load_config() -> Result<Settings, AppError> {
        Settings::from_file("Config.toml")
    }
}
