//! Multi-chain trading engine
//!
//! Picks an execution chain per trade and, when the target chain's attempt
//! aborts before anything is broadcast, retries the same trade on each
//! alternative chain in turn.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::engine::EngineCore;
use super::pipeline::chain_statistics;
use super::{ChainStatistics, CreateTradeParams, Trade, TradeResult};
use crate::domain::chain::{ChainProvider, MultiChainProviderFactory};
use crate::domain::strategy::{StrategyAction, StrategyEngine};
use crate::domain::wallet::UniversalWalletManager;
use crate::shared::config::TradingEngineConfig;
use crate::shared::errors::{ChainError, ExecutionError, TradeError};
use crate::shared::types::{ChainId, TradableAsset};

pub struct MultiChainTradingEngine {
    core: EngineCore,
    providers: HashMap<ChainId, Arc<dyn ChainProvider>>,
    /// Enabled chains with a live provider, in configuration order
    enabled_chains: Vec<ChainId>,
    preferred_chains: Vec<ChainId>,
}

impl MultiChainTradingEngine {
    /// Build providers for every enabled chain; chains that fail to build are left out
    pub async fn new(
        providers: &MultiChainProviderFactory,
        wallets: Arc<UniversalWalletManager>,
        strategies: Arc<RwLock<StrategyEngine>>,
        config: TradingEngineConfig,
    ) -> Self {
        let built = providers.create_all().await;
        let enabled_chains = providers
            .config()
            .enabled_chains
            .iter()
            .copied()
            .filter(|chain_id| built.contains_key(chain_id))
            .collect();

        Self {
            preferred_chains: config.preferred_chains.clone(),
            core: EngineCore::new(wallets, strategies, config),
            providers: built,
            enabled_chains,
        }
    }

    pub fn enabled_chains(&self) -> &[ChainId] {
        &self.enabled_chains
    }

    fn provider(&self, chain_id: ChainId) -> Result<&Arc<dyn ChainProvider>, ChainError> {
        self.providers
            .get(&chain_id)
            .ok_or_else(|| ChainError::UnsupportedChain(chain_id.to_string()))
    }

    pub async fn create_trade(&self, params: CreateTradeParams) -> Result<Trade, TradeError> {
        params.validate()?;

        let target_chain = self.select_target_chain(&params).await;
        let provider = self.provider(target_chain)?.clone();
        let alternative_chains = self.alternative_chains(&params, target_chain).await;
        debug!("Alternatives for {} trade: {:?}", target_chain, alternative_chains);

        self.core.open_trade(params, provider.as_ref(), alternative_chains).await
    }

    /// Same chain when both assets share one, else the first preferred chain able to service the trade
    async fn select_target_chain(&self, params: &CreateTradeParams) -> ChainId {
        let input_chain = params.input_asset.chain_id;
        if input_chain == params.output_asset.chain_id {
            return input_chain;
        }

        for chain_id in &self.preferred_chains {
            if self.enabled_chains.contains(chain_id) && self.can_chain_handle_trade(*chain_id, params).await {
                return *chain_id;
            }
        }
        input_chain
    }

    async fn alternative_chains(&self, params: &CreateTradeParams, target_chain: ChainId) -> Vec<ChainId> {
        let mut alternatives = Vec::new();
        for chain_id in &self.enabled_chains {
            if *chain_id != target_chain && self.can_chain_handle_trade(*chain_id, params).await {
                alternatives.push(*chain_id);
            }
        }
        alternatives
    }

    /// Both assets are listed by the chain's venue or bridged to the chain
    async fn can_chain_handle_trade(&self, chain_id: ChainId, params: &CreateTradeParams) -> bool {
        let Ok(provider) = self.provider(chain_id) else {
            return false;
        };

        let supported = match provider.create_dex_adapter().get_supported_tokens().await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Could not list tokens on {}: {}", chain_id, e);
                return false;
            }
        };

        let reachable = |asset: &TradableAsset| {
            asset.is_bridged_to(chain_id) || supported.iter().any(|token| token.symbol == asset.symbol)
        };
        reachable(&params.input_asset) && reachable(&params.output_asset)
    }

    /// Execute on the target chain, then each alternative in order until one accepts the swap
    pub async fn execute_trade(&self, trade_id: &str) -> Result<TradeResult, TradeError> {
        let slot = self.core.store.slot(trade_id).await?;
        let _lifecycle = slot.lock_lifecycle().await;
        let trade = self.core.begin_execution(&slot).await?;

        let chains: Vec<ChainId> = std::iter::once(trade.target_chain)
            .chain(trade.alternative_chains.iter().copied())
            .collect();

        let mut attempted = Vec::with_capacity(chains.len());
        let mut origin: Option<ExecutionError> = None;

        for chain_id in chains {
            if !attempted.is_empty() {
                info!("Falling back to {} for trade {}", chain_id, trade_id);
            }
            attempted.push(chain_id);
            self.core.record_attempt(&slot, chain_id).await;

            let failure: ExecutionError = match self.provider(chain_id) {
                Ok(provider) => match self.core.pipeline.submit(&trade, provider.as_ref()).await {
                    // once broadcast, the transaction may still land: no further fallback
                    Ok(submission) => {
                        return self
                            .core
                            .finish_submitted(&slot, provider.as_ref(), submission)
                            .await
                    }
                    Err(e) => e,
                },
                Err(e) => e.into(),
            };

            warn!("Execution of trade {} on {} failed: {}", trade_id, chain_id, failure);
            origin.get_or_insert(failure);
        }

        let source = origin.unwrap_or_else(|| ExecutionError::TransactionFailed("no chain attempted".to_string()));
        self.core
            .fail(
                &slot,
                ExecutionError::AllChainsExhausted {
                    attempted,
                    source: Box::new(source),
                },
                None,
            )
            .await
    }

    pub async fn cancel_trade(&self, trade_id: &str) -> bool {
        self.core.cancel_trade(trade_id).await
    }

    pub async fn get_trade(&self, trade_id: &str) -> Result<Trade, TradeError> {
        self.core.get_trade(trade_id).await
    }

    pub async fn list_active_trades(&self) -> Vec<Trade> {
        self.core.list_active_trades().await
    }

    pub async fn list_all_trades(&self) -> Vec<Trade> {
        self.core.list_all_trades().await
    }

    /// Re-price on the trade's target chain and act on the strategy verdict
    pub async fn update_price_data(&self, trade_id: &str) -> Result<Trade, TradeError> {
        let target_chain = self.core.get_trade(trade_id).await?.target_chain;
        let provider = self.provider(target_chain)?.clone();

        let (trade, action) = self.core.refresh_price(trade_id, provider.as_ref()).await?;
        match action {
            Some(StrategyAction::Sell) => {
                if let Err(e) = self.execute_trade(trade_id).await {
                    warn!("Strategy-triggered execution of {} rejected: {}", trade_id, e);
                }
            }
            Some(StrategyAction::Cancel) => {
                self.cancel_trade(trade_id).await;
            }
            _ => return Ok(trade),
        }
        self.get_trade(trade_id).await
    }

    /// Gas price and health of every chain, queried in parallel
    pub async fn get_chain_statistics(&self) -> HashMap<ChainId, ChainStatistics> {
        chain_statistics(self.providers.values()).await
    }
}
