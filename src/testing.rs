//! Configurable in-process doubles for chain collaborators

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::chain::{
    BlockchainAdapter, ChainProvider, ChainProviderFactory, DexAdapter, Quote, QuoteParams, ReceiptStatus,
    SignedTransaction, SwapParams, TransactionReceipt, UniversalTransaction, UniversalWallet,
};
use crate::domain::strategy::{SharedStrategy, Strategy, StrategyAction, StrategyContext, StrategyResult};
use crate::domain::trading::{CreateTradeParams, Trade};
use crate::domain::wallet::{
    InMemoryWalletStorage, MultiChainWallet, UniversalWalletManager, WalletEncryption,
};
use crate::shared::config::{MultiChainConfig, TradingEngineConfig, WalletManagerConfig};
use crate::shared::errors::{ChainError, WalletError};
use crate::shared::types::{ChainConfig, ChainId, TradableAsset};
use crate::shared::utils::calculate_price;

/// Behaviour of one stub chain, adjustable mid-test
#[derive(Debug, Clone)]
pub struct StubKnobs {
    pub gas_price: u128,
    pub fail_gas_price: bool,
    pub fail_send: bool,
    pub fail_quote: bool,
    pub receipt_status: ReceiptStatus,
    pub confirmation_delay: Option<Duration>,
    pub quote_output: u128,
    pub quote_valid_for: chrono::Duration,
    pub supported_symbols: Vec<String>,
    pub fail_supported_tokens: bool,
    pub balance: u128,
    pub fail_balance: bool,
    pub fail_wallet_creation: bool,
    pub wallet_creation_delay: Option<Duration>,
}

impl Default for StubKnobs {
    fn default() -> Self {
        Self {
            gas_price: 1_000,
            fail_gas_price: false,
            fail_send: false,
            fail_quote: false,
            receipt_status: ReceiptStatus::Success,
            confirmation_delay: None,
            quote_output: 150_000_000,
            quote_valid_for: chrono::Duration::seconds(30),
            supported_symbols: vec!["SOL".to_string(), "USDC".to_string()],
            fail_supported_tokens: false,
            balance: 1_000_000,
            fail_balance: false,
            fail_wallet_creation: false,
            wallet_creation_delay: None,
        }
    }
}

#[derive(Debug, Default)]
struct StubCounters {
    sends: AtomicUsize,
    venue_swaps: AtomicUsize,
    gas_estimates: AtomicUsize,
    wallets_created: AtomicUsize,
}

/// Handle shared by every adapter a stub provider hands out
#[derive(Debug, Clone)]
pub struct StubChain {
    chain_id: ChainId,
    knobs: Arc<Mutex<StubKnobs>>,
    counters: Arc<StubCounters>,
}

impl StubChain {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            knobs: Arc::new(Mutex::new(StubKnobs::default())),
            counters: Arc::new(StubCounters::default()),
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn set(&self, apply: impl FnOnce(&mut StubKnobs)) {
        let mut knobs = self.knobs.lock().unwrap();
        apply(&mut *knobs);
    }

    fn read<R>(&self, get: impl FnOnce(&StubKnobs) -> R) -> R {
        let knobs = self.knobs.lock().unwrap();
        get(&*knobs)
    }

    pub fn quote_output(&self) -> u128 {
        self.read(|knobs| knobs.quote_output)
    }

    pub fn gas_price(&self) -> u128 {
        self.read(|knobs| knobs.gas_price)
    }

    pub fn sends(&self) -> usize {
        self.counters.sends.load(Ordering::SeqCst)
    }

    pub fn venue_swaps(&self) -> usize {
        self.counters.venue_swaps.load(Ordering::SeqCst)
    }

    pub fn gas_estimates(&self) -> usize {
        self.counters.gas_estimates.load(Ordering::SeqCst)
    }

    pub fn wallets_created(&self) -> usize {
        self.counters.wallets_created.load(Ordering::SeqCst)
    }

    pub async fn register(&self, factory: &ChainProviderFactory) {
        let stub = self.clone();
        factory
            .register(self.chain_id, move |config: &ChainConfig| {
                Ok(Arc::new(StubProvider {
                    config: config.clone(),
                    stub: stub.clone(),
                }) as Arc<dyn ChainProvider>)
            })
            .await;
    }

    fn receipt(&self, tx_hash: &str, confirmations: u32) -> TransactionReceipt {
        TransactionReceipt {
            tx_hash: tx_hash.to_string(),
            status: self.read(|knobs| knobs.receipt_status),
            confirmations,
            gas_used: Some(21_000),
            block_number: Some(1),
        }
    }
}

struct StubProvider {
    config: ChainConfig,
    stub: StubChain,
}

#[async_trait]
impl ChainProvider for StubProvider {
    fn chain_config(&self) -> &ChainConfig {
        &self.config
    }

    fn create_blockchain_adapter(&self) -> Arc<dyn BlockchainAdapter> {
        Arc::new(StubBlockchain(self.stub.clone()))
    }

    fn create_dex_adapter(&self) -> Arc<dyn DexAdapter> {
        Arc::new(StubDex(self.stub.clone()))
    }

    async fn create_wallet(&self, private_key: Option<&str>) -> Result<Arc<dyn UniversalWallet>, ChainError> {
        let chain_id = self.stub.chain_id;
        if self.stub.read(|knobs| knobs.fail_wallet_creation) {
            return Err(ChainError::adapter(chain_id, "wallet creation disabled"));
        }
        if let Some(delay) = self.stub.read(|knobs| knobs.wallet_creation_delay) {
            tokio::time::sleep(delay).await;
        }

        let n = self.stub.counters.wallets_created.fetch_add(1, Ordering::SeqCst);
        let key = match private_key {
            Some(formatted) => decode_key(chain_id, formatted)?,
            None => format!("{}-key-{}", chain_id, n).into_bytes(),
        };

        Ok(Arc::new(StubWallet {
            stub: self.stub.clone(),
            address: format!("{}-{}", chain_id, String::from_utf8_lossy(&key)),
            key,
        }))
    }
}

fn decode_key(chain_id: ChainId, formatted: &str) -> Result<Vec<u8>, ChainError> {
    if chain_id.is_evm() {
        hex::decode(formatted.trim_start_matches("0x")).map_err(|e| ChainError::adapter(chain_id, e.to_string()))
    } else {
        bs58::decode(formatted)
            .into_vec()
            .map_err(|e| ChainError::adapter(chain_id, e.to_string()))
    }
}

struct StubWallet {
    stub: StubChain,
    address: String,
    key: Vec<u8>,
}

#[async_trait]
impl UniversalWallet for StubWallet {
    fn chain_id(&self) -> ChainId {
        self.stub.chain_id
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn export_private_key(&self) -> Result<Vec<u8>, ChainError> {
        Ok(self.key.clone())
    }

    async fn sign_transaction(&self, transaction: &UniversalTransaction) -> Result<SignedTransaction, ChainError> {
        Ok(SignedTransaction {
            chain_id: transaction.chain_id,
            raw: transaction.data.clone(),
            signature: format!("sig:{}", self.address),
        })
    }

    async fn get_balance(&self) -> Result<u128, ChainError> {
        if self.stub.read(|knobs| knobs.fail_balance) {
            return Err(ChainError::network(self.stub.chain_id, "balance unavailable"));
        }
        Ok(self.stub.read(|knobs| knobs.balance))
    }

    async fn get_token_balance(&self, _asset: &TradableAsset) -> Result<u128, ChainError> {
        self.get_balance().await
    }
}

struct StubBlockchain(StubChain);

#[async_trait]
impl BlockchainAdapter for StubBlockchain {
    fn chain_id(&self) -> ChainId {
        self.0.chain_id
    }

    async fn send_transaction(&self, _signed: &SignedTransaction) -> Result<String, ChainError> {
        let n = self.0.counters.sends.fetch_add(1, Ordering::SeqCst);
        if self.0.read(|knobs| knobs.fail_send) {
            return Err(ChainError::network(self.0.chain_id, "send rejected"));
        }
        Ok(format!("{}-tx-{}", self.0.chain_id, n))
    }

    async fn get_transaction_receipt(&self, tx_hash: &str) -> Result<Option<TransactionReceipt>, ChainError> {
        Ok(Some(self.0.receipt(tx_hash, 1)))
    }

    async fn estimate_gas(&self, _transaction: &UniversalTransaction) -> Result<u128, ChainError> {
        self.0.counters.gas_estimates.fetch_add(1, Ordering::SeqCst);
        Ok(21_000)
    }

    async fn get_gas_price(&self) -> Result<u128, ChainError> {
        if self.0.read(|knobs| knobs.fail_gas_price) {
            return Err(ChainError::network(self.0.chain_id, "rpc unreachable"));
        }
        Ok(self.0.gas_price())
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: &str,
        confirmations: Option<u32>,
    ) -> Result<TransactionReceipt, ChainError> {
        if let Some(delay) = self.0.read(|knobs| knobs.confirmation_delay) {
            tokio::time::sleep(delay).await;
        }
        Ok(self.0.receipt(tx_hash, confirmations.unwrap_or(1)))
    }
}

struct StubDex(StubChain);

#[async_trait]
impl DexAdapter for StubDex {
    fn name(&self) -> &str {
        "stub-dex"
    }

    async fn get_quote(&self, params: &QuoteParams) -> Result<Quote, ChainError> {
        let knobs = self.0.read(Clone::clone);
        if knobs.fail_quote {
            return Err(ChainError::adapter(self.0.chain_id, "no route"));
        }

        let output_amount = knobs.quote_output;
        Ok(Quote {
            input_amount: params.input_amount,
            output_amount,
            minimum_output_amount: (output_amount as f64 * (1.0 - params.slippage_tolerance / 100.0)) as u128,
            price: calculate_price(
                params.input_amount,
                params.input_asset.decimals,
                output_amount,
                params.output_asset.decimals,
            ),
            price_impact: 0.1,
            fees: 0,
            route: vec![params.input_asset.symbol.clone(), params.output_asset.symbol.clone()],
            valid_until: Utc::now() + knobs.quote_valid_for,
        })
    }

    async fn build_swap_transaction(&self, _params: &SwapParams) -> Result<UniversalTransaction, ChainError> {
        let mut transaction = UniversalTransaction::new(self.0.chain_id, b"swap".to_vec());
        transaction.to = Some("stub-router".to_string());
        Ok(transaction)
    }

    async fn execute_swap(&self, _params: &SwapParams, wallet: &dyn UniversalWallet) -> Result<String, ChainError> {
        let n = self.0.counters.venue_swaps.fetch_add(1, Ordering::SeqCst);
        if self.0.read(|knobs| knobs.fail_send) {
            return Err(ChainError::network(self.0.chain_id, "venue rejected swap"));
        }
        Ok(format!("{}-venue-tx-{}-{}", self.0.chain_id, wallet.address(), n))
    }

    async fn get_supported_tokens(&self) -> Result<Vec<TradableAsset>, ChainError> {
        let knobs = self.0.read(Clone::clone);
        if knobs.fail_supported_tokens {
            return Err(ChainError::network(self.0.chain_id, "token list unavailable"));
        }
        Ok(knobs
            .supported_symbols
            .iter()
            .map(|symbol| asset(symbol, self.0.chain_id, 6))
            .collect())
    }
}

/// Reversible stand-in for real key encryption
pub struct XorEncryption;

#[async_trait]
impl WalletEncryption for XorEncryption {
    async fn encrypt_private_key(&self, private_key: &[u8]) -> Result<Vec<u8>, WalletError> {
        Ok(private_key.iter().map(|b| b ^ 0x5a).collect())
    }

    async fn decrypt_private_key(&self, ciphertext: &[u8]) -> Result<Vec<u8>, WalletError> {
        Ok(ciphertext.iter().map(|b| b ^ 0x5a).collect())
    }
}

/// Always votes the same way
#[derive(Debug)]
pub struct FixedStrategy {
    id: String,
    action: StrategyAction,
    reason: String,
}

impl FixedStrategy {
    pub fn new(id: impl Into<String>, action: StrategyAction, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action,
            reason: reason.into(),
        }
    }
}

impl Strategy for FixedStrategy {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Fixed"
    }

    fn description(&self) -> &str {
        "Always returns the configured action"
    }

    fn evaluate(&self, _context: &StrategyContext<'_>) -> StrategyResult {
        StrategyResult::new(self.action, self.reason.clone())
    }
}

/// Fixed vote that counts how often it was asked
#[derive(Debug)]
pub struct CountingStrategy {
    action: StrategyAction,
    evaluations: AtomicUsize,
}

impl CountingStrategy {
    pub fn new(action: StrategyAction) -> Self {
        Self {
            action,
            evaluations: AtomicUsize::new(0),
        }
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }
}

impl Strategy for CountingStrategy {
    fn id(&self) -> &str {
        "counting"
    }

    fn name(&self) -> &str {
        "Counting"
    }

    fn description(&self) -> &str {
        "Counts evaluations"
    }

    fn evaluate(&self, _context: &StrategyContext<'_>) -> StrategyResult {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        StrategyResult::new(self.action, "counted")
    }
}

pub fn asset(symbol: &str, chain_id: ChainId, decimals: u8) -> TradableAsset {
    TradableAsset::new(
        symbol,
        format!("{}-{}", chain_id, symbol.to_lowercase()),
        decimals,
        chain_id,
    )
}

/// PENDING SOL -> USDC trade on solana priced at 100
pub fn pending_trade(strategies: Vec<SharedStrategy>) -> Trade {
    let mut params = CreateTradeParams::new(
        asset("SOL", ChainId::Solana, 9),
        asset("USDC", ChainId::Solana, 6),
        1_000_000_000,
    );
    params.strategies = strategies;
    Trade::new(params, 100.0, ChainId::Solana, Vec::new())
}

pub async fn stub_registry(chains: &[&StubChain]) -> Arc<ChainProviderFactory> {
    let factory = Arc::new(ChainProviderFactory::new());
    for chain in chains {
        chain.register(&factory).await;
    }
    factory
}

/// Registry, wallet manager and one wallet spanning every stub chain
pub async fn wallet_fixture(
    chains: &[&StubChain],
) -> (Arc<ChainProviderFactory>, Arc<UniversalWalletManager>, MultiChainWallet) {
    let factory = stub_registry(chains).await;
    let wallets = Arc::new(UniversalWalletManager::new(
        factory.clone(),
        MultiChainConfig::mainnet(),
        Arc::new(InMemoryWalletStorage::new()),
        Arc::new(XorEncryption),
        WalletManagerConfig::default(),
    ));

    let chain_ids: Vec<ChainId> = chains.iter().map(|chain| chain.chain_id()).collect();
    let wallet = wallets
        .create_multi_chain_wallet(Some("fixture".to_string()), &chain_ids, HashMap::new())
        .await
        .unwrap();

    (factory, wallets, wallet)
}

/// Engine settings with short confirmation bounds
pub fn fast_config(wallet_id: &str) -> TradingEngineConfig {
    TradingEngineConfig {
        confirmation_timeout_ms: 2_000,
        confirmation_poll_interval_ms: 5,
        default_wallet_id: Some(wallet_id.to_string()),
        ..TradingEngineConfig::default()
    }
}
