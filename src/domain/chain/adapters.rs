//! Collaborator contracts implemented per chain and per venue

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::shared::errors::ChainError;
use crate::shared::types::{ChainConfig, ChainId, TradableAsset};

/// Chain-agnostic unsigned transaction
#[derive(Debug, Clone, PartialEq)]
pub struct UniversalTransaction {
    pub chain_id: ChainId,
    pub to: Option<String>,
    pub data: Vec<u8>,
    pub value: u128,
    pub gas_limit: Option<u128>,
    pub metadata: HashMap<String, String>,
}

impl UniversalTransaction {
    pub fn new(chain_id: ChainId, data: Vec<u8>) -> Self {
        Self {
            chain_id,
            to: None,
            data,
            value: 0,
            gas_limit: None,
            metadata: HashMap::new(),
        }
    }
}

/// Signed payload ready for broadcast
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
    pub chain_id: ChainId,
    pub raw: Vec<u8>,
    pub signature: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Failed,
    Pending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionReceipt {
    pub tx_hash: String,
    pub status: ReceiptStatus,
    pub confirmations: u32,
    pub gas_used: Option<u128>,
    pub block_number: Option<u64>,
}

/// Gas pricing, broadcast and confirmation for one chain
#[async_trait]
pub trait BlockchainAdapter: Send + Sync {
    fn chain_id(&self) -> ChainId;

    async fn send_transaction(&self, signed: &SignedTransaction) -> Result<String, ChainError>;

    /// `None` while the transaction is unknown to the node
    async fn get_transaction_receipt(&self, tx_hash: &str) -> Result<Option<TransactionReceipt>, ChainError>;

    async fn estimate_gas(&self, transaction: &UniversalTransaction) -> Result<u128, ChainError>;

    /// Current gas price in native base units
    async fn get_gas_price(&self) -> Result<u128, ChainError>;

    async fn wait_for_confirmation(
        &self,
        tx_hash: &str,
        confirmations: Option<u32>,
    ) -> Result<TransactionReceipt, ChainError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteParams {
    pub input_asset: TradableAsset,
    pub output_asset: TradableAsset,
    pub input_amount: u128,
    /// Percent
    pub slippage_tolerance: f64,
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub input_amount: u128,
    pub output_amount: u128,
    pub minimum_output_amount: u128,
    pub price: f64,
    pub price_impact: f64,
    pub fees: u128,
    pub route: Vec<String>,
    pub valid_until: DateTime<Utc>,
}

impl Quote {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwapParams {
    pub quote_params: QuoteParams,
    pub quote: Quote,
}

/// Quoting and swap execution against one venue
#[async_trait]
pub trait DexAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn get_quote(&self, params: &QuoteParams) -> Result<Quote, ChainError>;

    async fn build_swap_transaction(&self, params: &SwapParams) -> Result<UniversalTransaction, ChainError>;

    /// Sign and broadcast through the venue, returning the transaction hash
    async fn execute_swap(&self, params: &SwapParams, wallet: &dyn UniversalWallet) -> Result<String, ChainError>;

    async fn get_supported_tokens(&self) -> Result<Vec<TradableAsset>, ChainError>;
}

/// Signing-capable wallet bound to one chain
#[async_trait]
pub trait UniversalWallet: Send + Sync {
    fn chain_id(&self) -> ChainId;

    fn address(&self) -> &str;

    /// Raw key bytes, handed straight to the encryption contract
    fn export_private_key(&self) -> Result<Vec<u8>, ChainError>;

    async fn sign_transaction(&self, transaction: &UniversalTransaction) -> Result<SignedTransaction, ChainError>;

    async fn get_balance(&self) -> Result<u128, ChainError>;

    async fn get_token_balance(&self, asset: &TradableAsset) -> Result<u128, ChainError>;
}

/// Capability set for one chain
#[async_trait]
pub trait ChainProvider: Send + Sync {
    fn chain_config(&self) -> &ChainConfig;

    fn chain_id(&self) -> ChainId {
        self.chain_config().chain_id
    }

    fn create_blockchain_adapter(&self) -> Arc<dyn BlockchainAdapter>;

    fn create_dex_adapter(&self) -> Arc<dyn DexAdapter>;

    /// New wallet, or one restored from a chain-formatted private key
    async fn create_wallet(&self, private_key: Option<&str>) -> Result<Arc<dyn UniversalWallet>, ChainError>;
}
