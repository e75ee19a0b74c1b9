//! Omnitrade - multi-chain trade execution core
//! Built with Domain-Driven Design principles

pub mod domain;
pub mod shared;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use domain::chain::{ChainProvider, ChainProviderFactory, MultiChainProviderFactory};
pub use domain::strategy::{PriceTargetStrategy, StrategyEngine};
pub use domain::trading::{MultiChainTradingEngine, Trade, TradeStatus, TradingEngine};
pub use domain::wallet::{InMemoryWalletStorage, UniversalWalletManager};
pub use shared::config::Settings;
pub use shared::errors::{ChainError, ExecutionError, TradeError, WalletError};
pub use shared::types::{ChainId, TradableAsset};
