//! Trade lifecycle core and the single-chain trading engine

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::pipeline::{chain_statistics, ChainExecution, Submission, SwapPipeline};
use super::store::{TradeSlot, TradeStore};
use super::{ChainStatistics, CreateTradeParams, Trade, TradeResult, TradeStatus, WALLET_ID_KEY};
use crate::domain::chain::ChainProvider;
use crate::domain::strategy::{StrategyAction, StrategyEngine};
use crate::domain::wallet::UniversalWalletManager;
use crate::shared::config::TradingEngineConfig;
use crate::shared::errors::{ChainError, ExecutionError, TradeError};
use crate::shared::types::ChainId;

/// Lifecycle state shared by the single-chain and multi-chain engines
pub(crate) struct EngineCore {
    pub store: TradeStore,
    pub pipeline: SwapPipeline,
    pub strategies: Arc<RwLock<StrategyEngine>>,
}

impl EngineCore {
    pub fn new(
        wallets: Arc<UniversalWalletManager>,
        strategies: Arc<RwLock<StrategyEngine>>,
        config: TradingEngineConfig,
    ) -> Self {
        Self {
            store: TradeStore::default(),
            pipeline: SwapPipeline::new(wallets, config),
            strategies,
        }
    }

    /// Seed price data from a quote on `provider` and store a PENDING trade
    pub async fn open_trade(
        &self,
        params: CreateTradeParams,
        provider: &dyn ChainProvider,
        alternative_chains: Vec<ChainId>,
    ) -> Result<Trade, TradeError> {
        let (quote, price) = self
            .pipeline
            .quote_price(provider, &params.input_asset, &params.output_asset, params.input_amount)
            .await?;

        let mut trade = Trade::new(params, price, provider.chain_id(), alternative_chains);
        trade.expected_output_amount = Some(quote.output_amount);
        self.store.insert(trade.clone()).await;

        info!(
            "Trade {} created: {} {} -> {} on {} at {:.6}",
            trade.id,
            trade.input_amount,
            trade.input_asset.symbol,
            trade.output_asset.symbol,
            trade.target_chain,
            price
        );
        Ok(trade)
    }

    /// PENDING -> ACTIVE; rejects any other state without mutating the trade
    pub async fn begin_execution(&self, slot: &TradeSlot) -> Result<Trade, TradeError> {
        slot.update(|trade| {
            if trade.status != TradeStatus::Pending {
                return Err(TradeError::InvalidState {
                    trade_id: trade.id.clone(),
                    expected: TradeStatus::Pending.to_string(),
                    actual: trade.status.to_string(),
                });
            }
            trade.transition(TradeStatus::Active)?;
            trade.attempted_chains.clear();
            trade.error = None;
            info!("Trade {} is now ACTIVE", trade.id);
            Ok(trade.clone())
        })
        .await
    }

    pub async fn record_attempt(&self, slot: &TradeSlot, chain_id: ChainId) {
        slot.update(|trade| trade.attempted_chains.push(chain_id)).await;
    }

    /// Confirm a broadcast swap and settle the trade; never retried on another chain
    pub async fn finish_submitted(
        &self,
        slot: &TradeSlot,
        provider: &dyn ChainProvider,
        submission: Submission,
    ) -> Result<TradeResult, TradeError> {
        match self.pipeline.confirm(provider, &submission).await {
            Ok(receipt) => self.settle(slot, ChainExecution { submission, receipt }).await,
            Err(e) => {
                warn!(
                    "Transaction {} on {} did not resolve: {}",
                    submission.tx_hash, submission.chain_id, e
                );
                self.fail(slot, e, Some(&submission)).await
            }
        }
    }

    /// Apply a resolved on-chain execution: COMPLETED on success, FAILED otherwise
    async fn settle(&self, slot: &TradeSlot, execution: ChainExecution) -> Result<TradeResult, TradeError> {
        let submission = &execution.submission;
        let failure = (!execution.succeeded()).then(|| {
            TradeError::Execution(ExecutionError::TransactionFailed(format!(
                "transaction {} failed on {}",
                submission.tx_hash, submission.chain_id
            )))
        });

        let trade = slot
            .update(|trade| {
                record_submission(trade, submission);
                match &failure {
                    None => {
                        trade.transition(TradeStatus::Completed)?;
                        trade.actual_output_amount = Some(submission.quote.output_amount);
                        trade.target_chain = submission.chain_id;
                    }
                    Some(e) => {
                        trade.transition(TradeStatus::Failed)?;
                        trade.error = Some(e.to_string());
                    }
                }
                Ok::<_, TradeError>(trade.clone())
            })
            .await?;

        match &failure {
            None => info!(
                "Trade {} COMPLETED on {} ({})",
                trade.id, submission.chain_id, submission.tx_hash
            ),
            Some(e) => error!("Trade {} FAILED: {}", trade.id, e),
        }

        Ok(TradeResult {
            success: failure.is_none(),
            transaction_id: Some(submission.tx_hash.clone()),
            error: failure,
            trade,
        })
    }

    /// ACTIVE -> FAILED with the error kept for audit, plus the transaction if one was broadcast
    pub async fn fail(
        &self,
        slot: &TradeSlot,
        cause: ExecutionError,
        submission: Option<&Submission>,
    ) -> Result<TradeResult, TradeError> {
        let cause = TradeError::Execution(cause);
        let trade = slot
            .update(|trade| {
                if let Some(submission) = submission {
                    record_submission(trade, submission);
                }
                trade.transition(TradeStatus::Failed)?;
                trade.error = Some(cause.to_string());
                Ok::<_, TradeError>(trade.clone())
            })
            .await?;

        error!("Trade {} FAILED: {}", trade.id, cause);
        Ok(TradeResult {
            transaction_id: trade.transaction_id.clone(),
            trade,
            success: false,
            error: Some(cause),
        })
    }

    pub async fn cancel_trade(&self, trade_id: &str) -> bool {
        let Ok(slot) = self.store.slot(trade_id).await else {
            warn!("Cannot cancel unknown trade {}", trade_id);
            return false;
        };
        let _lifecycle = slot.lock_lifecycle().await;

        let cancelled = slot
            .update(|trade| trade.transition(TradeStatus::Cancelled))
            .await;
        match cancelled {
            Ok(()) => {
                info!("Trade {} CANCELLED", trade_id);
                true
            }
            Err(e) => {
                warn!("Trade {} not cancelled: {}", trade_id, e);
                false
            }
        }
    }

    /// Re-quote on `provider`, append the sample and return the strategy verdict for ACTIVE trades
    pub async fn refresh_price(
        &self,
        trade_id: &str,
        provider: &dyn ChainProvider,
    ) -> Result<(Trade, Option<StrategyAction>), TradeError> {
        let slot = self.store.slot(trade_id).await?;
        let snapshot = slot.snapshot().await;

        let (_, price) = self
            .pipeline
            .quote_price(provider, &snapshot.input_asset, &snapshot.output_asset, snapshot.input_amount)
            .await?;

        let trade = slot
            .update(|trade| {
                trade.price_data.record_price(price);
                trade.clone()
            })
            .await;

        if trade.status != TradeStatus::Active {
            return Ok((trade, None));
        }

        let evaluation = self.strategies.read().await.evaluate_strategies(&trade);
        info!("Trade {} strategy verdict: {}", trade.id, evaluation.explanation);
        Ok((trade, Some(evaluation.aggregated_action)))
    }

    pub async fn get_trade(&self, trade_id: &str) -> Result<Trade, TradeError> {
        self.store.get(trade_id).await
    }

    pub async fn list_active_trades(&self) -> Vec<Trade> {
        self.store.list_where(TradeStatus::is_active).await
    }

    pub async fn list_all_trades(&self) -> Vec<Trade> {
        self.store.list().await
    }
}

fn record_submission(trade: &mut Trade, submission: &Submission) {
    trade.expected_output_amount = Some(submission.quote.output_amount);
    trade.transaction_id = Some(submission.tx_hash.clone());
    trade.executed_at = Some(submission.submitted_at);
    trade
        .metadata
        .insert(WALLET_ID_KEY.to_string(), Value::String(submission.wallet_id.clone()));
}

/// Trading engine bound to a single chain; failures are never retried elsewhere
pub struct TradingEngine {
    core: EngineCore,
    provider: Arc<dyn ChainProvider>,
}

impl TradingEngine {
    pub fn new(
        provider: Arc<dyn ChainProvider>,
        wallets: Arc<UniversalWalletManager>,
        strategies: Arc<RwLock<StrategyEngine>>,
        config: TradingEngineConfig,
    ) -> Self {
        Self {
            core: EngineCore::new(wallets, strategies, config),
            provider,
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.provider.chain_id()
    }

    pub async fn create_trade(&self, params: CreateTradeParams) -> Result<Trade, TradeError> {
        params.validate()?;

        let chain_id = self.chain_id();
        for asset in [&params.input_asset, &params.output_asset] {
            if asset.chain_id != chain_id {
                return Err(ChainError::UnsupportedChain(asset.chain_id.to_string()).into());
            }
        }

        self.core.open_trade(params, self.provider.as_ref(), Vec::new()).await
    }

    pub async fn execute_trade(&self, trade_id: &str) -> Result<TradeResult, TradeError> {
        let slot = self.core.store.slot(trade_id).await?;
        let _lifecycle = slot.lock_lifecycle().await;
        let trade = self.core.begin_execution(&slot).await?;

        let chain_id = self.chain_id();
        self.core.record_attempt(&slot, chain_id).await;

        match self.core.pipeline.submit(&trade, self.provider.as_ref()).await {
            Ok(submission) => {
                self.core
                    .finish_submitted(&slot, self.provider.as_ref(), submission)
                    .await
            }
            Err(e) => {
                warn!("Execution of trade {} on {} failed: {}", trade_id, chain_id, e);
                self.core.fail(&slot, e, None).await
            }
        }
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

    pub async fn update_price_data(&self, trade_id: &str) -> Result<Trade, TradeError> {
        let (trade, action) = self.core.refresh_price(trade_id, self.provider.as_ref()).await?;
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

    pub async fn get_chain_statistics(&self) -> HashMap<ChainId, ChainStatistics> {
        chain_statistics([&self.provider]).await
    }
}
