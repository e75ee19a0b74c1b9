//! Single-chain execution pipeline: quote, build, sign, submit, confirm

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ChainStatistics, Trade};
use crate::domain::chain::{
    BlockchainAdapter, ChainProvider, Quote, QuoteParams, ReceiptStatus, SwapParams, TransactionReceipt,
};
use crate::domain::wallet::UniversalWalletManager;
use crate::shared::config::{SwapSubmission, TradingEngineConfig};
use crate::shared::errors::{ChainError, ExecutionError, WalletError};
use crate::shared::types::{ChainId, TradableAsset};
use crate::shared::utils::calculate_price;

/// A swap that reached the chain and has a transaction hash
#[derive(Debug, Clone)]
pub(crate) struct Submission {
    pub chain_id: ChainId,
    pub wallet_id: String,
    pub quote: Quote,
    pub tx_hash: String,
    pub submitted_at: DateTime<Utc>,
}

/// A submission whose receipt resolved
#[derive(Debug, Clone)]
pub(crate) struct ChainExecution {
    pub submission: Submission,
    pub receipt: TransactionReceipt,
}

impl ChainExecution {
    pub fn succeeded(&self) -> bool {
        self.receipt.status == ReceiptStatus::Success
    }
}

pub(crate) struct SwapPipeline {
    wallets: Arc<UniversalWalletManager>,
    config: TradingEngineConfig,
}

impl SwapPipeline {
    pub fn new(wallets: Arc<UniversalWalletManager>, config: TradingEngineConfig) -> Self {
        Self { wallets, config }
    }

    /// Quote without a wallet, returning the decimal-adjusted price
    pub async fn quote_price(
        &self,
        provider: &dyn ChainProvider,
        input_asset: &TradableAsset,
        output_asset: &TradableAsset,
        input_amount: u128,
    ) -> Result<(Quote, f64), ChainError> {
        let params = QuoteParams {
            input_asset: input_asset.clone(),
            output_asset: output_asset.clone(),
            input_amount,
            slippage_tolerance: self.config.default_slippage_tolerance,
            wallet_address: None,
        };
        let quote = provider.create_dex_adapter().get_quote(&params).await?;
        let price = calculate_price(input_amount, input_asset.decimals, quote.output_amount, output_asset.decimals);
        Ok((quote, price))
    }

    /// Quote, build, sign and broadcast `trade` on the provider's chain.
    ///
    /// `Err` means nothing was broadcast, so the trade may still be retried elsewhere.
    pub async fn submit(&self, trade: &Trade, provider: &dyn ChainProvider) -> Result<Submission, ExecutionError> {
        let chain_id = provider.chain_id();
        let blockchain = provider.create_blockchain_adapter();
        let dex = provider.create_dex_adapter();

        let wallet_id = self.resolve_wallet_id(trade).await?;
        let wallet = self.wallets.get_chain_wallet(&wallet_id, chain_id).await?;

        self.check_gas_price(chain_id, blockchain.as_ref()).await?;

        let quote_params = QuoteParams {
            input_asset: trade.input_asset.clone(),
            output_asset: trade.output_asset.clone(),
            input_amount: trade.input_amount,
            slippage_tolerance: self.config.default_slippage_tolerance,
            wallet_address: Some(wallet.address().to_string()),
        };
        let quote = dex.get_quote(&quote_params).await?;
        debug!(
            "Trade {} quoted on {} via {}: {} -> {}",
            trade.id,
            chain_id,
            dex.name(),
            quote.input_amount,
            quote.output_amount
        );

        let swap = SwapParams {
            quote_params,
            quote: quote.clone(),
        };

        let tx_hash = match self.config.swap_submission {
            SwapSubmission::Signed => {
                let mut transaction = dex.build_swap_transaction(&swap).await?;
                if transaction.gas_limit.is_none() {
                    transaction.gas_limit = Some(blockchain.estimate_gas(&transaction).await?);
                }
                let signed = self.wallets.sign_transaction(&transaction, &wallet_id).await?;
                ensure_quote_fresh(&quote)?;
                blockchain.send_transaction(&signed).await?
            }
            SwapSubmission::Venue => {
                ensure_quote_fresh(&quote)?;
                dex.execute_swap(&swap, wallet.as_ref()).await?
            }
        };
        let submitted_at = Utc::now();
        info!("Trade {} submitted on {}: {}", trade.id, chain_id, tx_hash);

        Ok(Submission {
            chain_id,
            wallet_id,
            quote,
            tx_hash,
            submitted_at,
        })
    }

    /// Wait for a submitted transaction to resolve, bounded by the confirmation timeout
    pub async fn confirm(
        &self,
        provider: &dyn ChainProvider,
        submission: &Submission,
    ) -> Result<TransactionReceipt, ExecutionError> {
        let blockchain = provider.create_blockchain_adapter();
        self.await_confirmation(submission.chain_id, blockchain.as_ref(), &submission.tx_hash)
            .await
    }

    /// Metadata wallet, else configured default, else the manager's default
    async fn resolve_wallet_id(&self, trade: &Trade) -> Result<String, WalletError> {
        if let Some(wallet_id) = trade.wallet_id() {
            return Ok(wallet_id.to_string());
        }
        if let Some(wallet_id) = &self.config.default_wallet_id {
            return Ok(wallet_id.clone());
        }
        Ok(self.wallets.get_default_wallet().await?.id)
    }

    async fn check_gas_price(&self, chain_id: ChainId, blockchain: &dyn BlockchainAdapter) -> Result<(), ExecutionError> {
        let Some(ceiling) = self.config.max_gas_prices.get(&chain_id) else {
            return Ok(());
        };

        let current = blockchain.get_gas_price().await?;
        let ceiling = u128::from(*ceiling);
        if current > ceiling {
            warn!("Gas price on {} is {} (ceiling {})", chain_id, current, ceiling);
            return Err(ExecutionError::GasPriceExceeded {
                chain: chain_id,
                current,
                ceiling,
            });
        }
        Ok(())
    }

    async fn await_confirmation(
        &self,
        chain_id: ChainId,
        blockchain: &dyn BlockchainAdapter,
        tx_hash: &str,
    ) -> Result<TransactionReceipt, ExecutionError> {
        let timeout_ms = self.config.confirmation_timeout_ms;
        let poll_interval = Duration::from_millis(self.config.confirmation_poll_interval_ms.max(1));
        let confirmations = self.config.required_confirmations;

        let wait = async {
            let mut receipt = blockchain.wait_for_confirmation(tx_hash, Some(confirmations)).await?;
            while receipt.status == ReceiptStatus::Pending {
                tokio::time::sleep(poll_interval).await;
                if let Some(latest) = blockchain.get_transaction_receipt(tx_hash).await? {
                    receipt = latest;
                }
            }
            Ok::<_, ChainError>(receipt)
        };

        match tokio::time::timeout(Duration::from_millis(timeout_ms), wait).await {
            Ok(receipt) => Ok(receipt?),
            Err(_) => Err(ExecutionError::ConfirmationTimeout {
                chain: chain_id,
                tx_hash: tx_hash.to_string(),
                timeout_ms,
            }),
        }
    }
}

fn ensure_quote_fresh(quote: &Quote) -> Result<(), ExecutionError> {
    if quote.is_expired(Utc::now()) {
        return Err(ExecutionError::QuoteExpired {
            valid_until: quote.valid_until,
        });
    }
    Ok(())
}

/// Gas price of every provider, queried in parallel; failures mark the chain unhealthy
pub(crate) async fn chain_statistics<'a, I>(providers: I) -> HashMap<ChainId, ChainStatistics>
where
    I: IntoIterator<Item = &'a Arc<dyn ChainProvider>>,
{
    let checks = providers.into_iter().map(|provider| async move {
        let chain_id = provider.chain_id();
        let stats = match provider.create_blockchain_adapter().get_gas_price().await {
            Ok(gas_price) => ChainStatistics {
                gas_price: Some(gas_price),
                is_healthy: true,
                last_checked: Utc::now(),
                error: None,
            },
            Err(e) => {
                warn!("Health check for {} failed: {}", chain_id, e);
                ChainStatistics {
                    gas_price: None,
                    is_healthy: false,
                    last_checked: Utc::now(),
                    error: Some(e.to_string()),
                }
            }
        };
        (chain_id, stats)
    });

    futures::future::join_all(checks).await.into_iter().collect()
}
