//! Common types used across the application

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::shared::errors::ChainError;

/// Supported blockchain networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainId {
    Solana,
    Ethereum,
    Arbitrum,
    Base,
    Polygon,
    Avalanche,
}

impl ChainId {
    pub const ALL: [ChainId; 6] = [
        ChainId::Solana,
        ChainId::Ethereum,
        ChainId::Arbitrum,
        ChainId::Base,
        ChainId::Polygon,
        ChainId::Avalanche,
    ];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::Solana => "solana",
            ChainId::Ethereum => "ethereum",
            ChainId::Arbitrum => "arbitrum",
            ChainId::Base => "base",
            ChainId::Polygon => "polygon",
            ChainId::Avalanche => "avalanche",
        }
    }

    /// EVM-compatible chains share key format and gas units
    pub fn is_evm(&self) -> bool {
        !matches!(self, ChainId::Solana)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainId {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ChainId::ALL
            .into_iter()
            .find(|chain| chain.as_str() == normalized)
            .ok_or_else(|| ChainError::UnsupportedChain(s.trim().to_string()))
    }
}

// Parsed through FromStr so map keys in TOML and JSON accept any casing
impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Fungible token on a specific chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradableAsset {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
    pub chain_id: ChainId,
    /// Bridge contract per destination chain
    #[serde(default)]
    pub bridge_addresses: HashMap<ChainId, String>,
}

impl TradableAsset {
    pub fn new(symbol: impl Into<String>, address: impl Into<String>, decimals: u8, chain_id: ChainId) -> Self {
        Self {
            symbol: symbol.into(),
            address: address.into(),
            decimals,
            chain_id,
            bridge_addresses: HashMap::new(),
        }
    }

    pub fn with_bridge(mut self, chain_id: ChainId, bridge: impl Into<String>) -> Self {
        self.bridge_addresses.insert(chain_id, bridge.into());
        self
    }

    /// Whether a bridge contract to `chain_id` is known
    pub fn is_bridged_to(&self, chain_id: ChainId) -> bool {
        self.bridge_addresses.contains_key(&chain_id)
    }

    /// Same token on the same chain
    pub fn is_same_token(&self, other: &TradableAsset) -> bool {
        self.chain_id == other.chain_id && self.address == other.address
    }
}

/// Native currency of a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub symbol: String,
    pub decimals: u8,
}

/// Static per-chain descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: ChainId,
    pub name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub block_explorer_urls: Vec<String>,
    #[serde(default)]
    pub supported_dexs: Vec<String>,
    #[serde(default)]
    pub is_testnet: bool,
}

impl ChainConfig {
    /// Built-in descriptor for a chain
    pub fn builtin(chain_id: ChainId) -> Self {
        let (name, symbol, decimals, rpc_urls, explorers, dexs): (&str, &str, u8, &[&str], &[&str], &[&str]) =
            match chain_id {
                ChainId::Solana => (
                    "Solana",
                    "SOL",
                    9,
                    &["https://api.mainnet-beta.solana.com", "https://solana-api.projectserum.com"],
                    &["https://explorer.solana.com"],
                    &["jupiter"],
                ),
                ChainId::Ethereum => (
                    "Ethereum",
                    "ETH",
                    18,
                    &["https://eth.llamarpc.com", "https://rpc.ankr.com/eth", "https://ethereum.publicnode.com"],
                    &["https://etherscan.io"],
                    &["uniswap", "sushiswap", "1inch"],
                ),
                ChainId::Arbitrum => (
                    "Arbitrum One",
                    "ETH",
                    18,
                    &["https://arb1.arbitrum.io/rpc", "https://rpc.ankr.com/arbitrum"],
                    &["https://arbiscan.io"],
                    &["camelot", "uniswap", "sushiswap"],
                ),
                ChainId::Base => (
                    "Base",
                    "ETH",
                    18,
                    &["https://mainnet.base.org", "https://rpc.ankr.com/base"],
                    &["https://basescan.org"],
                    &["baseswap", "uniswap"],
                ),
                ChainId::Polygon => (
                    "Polygon",
                    "MATIC",
                    18,
                    &["https://polygon-rpc.com", "https://rpc.ankr.com/polygon"],
                    &["https://polygonscan.com"],
                    &["quickswap", "sushiswap", "uniswap"],
                ),
                ChainId::Avalanche => (
                    "Avalanche",
                    "AVAX",
                    18,
                    &["https://api.avax.network/ext/bc/C/rpc", "https://rpc.ankr.com/avalanche"],
                    &["https://snowtrace.io"],
                    &["traderjoe", "pangolin"],
                ),
            };

        Self {
            chain_id,
            name: name.to_string(),
            native_currency: NativeCurrency {
                symbol: symbol.to_string(),
                decimals,
            },
            rpc_urls: rpc_urls.iter().map(|s| s.to_string()).collect(),
            block_explorer_urls: explorers.iter().map(|s| s.to_string()).collect(),
            supported_dexs: dexs.iter().map(|s| s.to_string()).collect(),
            is_testnet: false,
        }
    }
}
