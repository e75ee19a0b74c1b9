//! Error handling for the trade execution core

use thiserror::Error;

use crate::shared::types::ChainId;

/// Chain registry and adapter errors
#[derive(Error, Debug, Clone)]
pub enum ChainError {
    #[error("Chain not supported: {0}")]
    UnsupportedChain(String),

    #[error("Network error on {chain}: {message}")]
    Network { chain: ChainId, message: String },

    #[error("Adapter error on {chain}: {message}")]
    Adapter { chain: ChainId, message: String },
}

impl ChainError {
    pub fn network(chain: ChainId, message: impl Into<String>) -> Self {
        ChainError::Network { chain, message: message.into() }
    }

    pub fn adapter(chain: ChainId, message: impl Into<String>) -> Self {
        ChainError::Adapter { chain, message: message.into() }
    }
}

/// Wallet management errors
#[derive(Error, Debug, Clone)]
pub enum WalletError {
    #[error("Wallet with ID {0} not found")]
    NotFound(String),

    #[error("Wallet {wallet_id} does not support chain {chain}")]
    UnsupportedChainForWallet { wallet_id: String, chain: ChainId },

    #[error("No wallets found and auto-create is disabled")]
    NoWalletAvailable,

    #[error("Wallet must support at least one chain")]
    NoChainsRequested,

    #[error("Wallet creation failed on {chain}: {reason}")]
    CreationFailed { chain: ChainId, reason: String },

    #[error("Wallet storage error: {0}")]
    Storage(String),

    #[error("Wallet encryption error: {0}")]
    Encryption(String),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Strategy errors
#[derive(Error, Debug, Clone)]
pub enum StrategyError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Errors raised while executing a trade on a chain
#[derive(Error, Debug, Clone)]
pub enum ExecutionError {
    #[error("Gas price too high on {chain}: {current} > {ceiling}")]
    GasPriceExceeded { chain: ChainId, current: u128, ceiling: u128 },

    #[error("Confirmation of {tx_hash} on {chain} timed out after {timeout_ms}ms")]
    ConfirmationTimeout { chain: ChainId, tx_hash: String, timeout_ms: u64 },

    #[error("Quote expired at {valid_until}")]
    QuoteExpired { valid_until: chrono::DateTime<chrono::Utc> },

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Execution failed on all available chains ({}): {source}", format_chains(.attempted))]
    AllChainsExhausted {
        attempted: Vec<ChainId>,
        source: Box<ExecutionError>,
    },

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

fn format_chains(chains: &[ChainId]) -> String {
    chains
        .iter()
        .map(|chain| chain.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Caller-facing trading errors
#[derive(Error, Debug, Clone)]
pub enum TradeError {
    #[error("Trade with ID {0} not found")]
    TradeNotFound(String),

    #[error("Trade with ID {trade_id} is {actual}, expected {expected}")]
    InvalidState {
        trade_id: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid trade parameters: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Configuration loading error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
