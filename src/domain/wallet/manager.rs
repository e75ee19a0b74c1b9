//! Universal wallet manager
//!
//! Owns persistence and decryption of multi-chain wallets. Per-chain signing
//! wallets are derived on demand and cached by `(wallet id, chain id)`.

use chrono::Utc;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::{MultiChainWallet, WalletEncryption, WalletStorage};
use crate::domain::chain::{ChainProviderFactory, SignedTransaction, UniversalTransaction, UniversalWallet};
use crate::shared::config::{MultiChainConfig, WalletManagerConfig};
use crate::shared::errors::{ChainError, WalletError};
use crate::shared::types::{ChainId, TradableAsset};
use crate::shared::utils::generate_id;

type WalletCacheKey = (String, ChainId);

pub struct UniversalWalletManager {
    providers: Arc<ChainProviderFactory>,
    chains: MultiChainConfig,
    storage: Arc<dyn WalletStorage>,
    encryption: Arc<dyn WalletEncryption>,
    config: WalletManagerConfig,
    cache: RwLock<HashMap<WalletCacheKey, Arc<dyn UniversalWallet>>>,
    /// Held while a default wallet is auto-created
    default_wallet: Mutex<()>,
}

impl UniversalWalletManager {
    pub fn new(
        providers: Arc<ChainProviderFactory>,
        chains: MultiChainConfig,
        storage: Arc<dyn WalletStorage>,
        encryption: Arc<dyn WalletEncryption>,
        config: WalletManagerConfig,
    ) -> Self {
        Self {
            providers,
            chains,
            storage,
            encryption,
            config,
            cache: RwLock::new(HashMap::new()),
            default_wallet: Mutex::new(()),
        }
    }

    /// Create a wallet with one fresh key per requested chain.
    ///
    /// Nothing is persisted or cached unless every chain succeeds.
    pub async fn create_multi_chain_wallet(
        &self,
        name: Option<String>,
        chains: &[ChainId],
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<MultiChainWallet, WalletError> {
        let mut requested: Vec<ChainId> = Vec::with_capacity(chains.len());
        for chain_id in chains {
            if !requested.contains(chain_id) {
                requested.push(*chain_id);
            }
        }
        if requested.is_empty() {
            return Err(WalletError::NoChainsRequested);
        }

        let mut staged: Vec<(ChainId, Arc<dyn UniversalWallet>)> = Vec::with_capacity(requested.len());
        let mut addresses = HashMap::new();
        let mut encrypted_private_keys = HashMap::new();

        for chain_id in &requested {
            let (chain_wallet, ciphertext) = match self.new_chain_wallet(*chain_id).await {
                Ok(created) => created,
                Err(e) => {
                    warn!("Aborting wallet creation, {} failed: {}", chain_id, e);
                    return Err(e);
                }
            };
            addresses.insert(*chain_id, chain_wallet.address().to_string());
            encrypted_private_keys.insert(*chain_id, ciphertext);
            staged.push((*chain_id, chain_wallet));
        }

        let now = Utc::now();
        let primary_address = staged
            .first()
            .map(|(_, chain_wallet)| chain_wallet.address().to_string())
            .unwrap_or_default();

        let wallet = MultiChainWallet {
            id: generate_id(),
            name: name.unwrap_or_else(|| {
                format!("{} {}", self.config.default_wallet_name_prefix, now.timestamp_millis())
            }),
            address: primary_address,
            supported_chains: requested,
            addresses,
            encrypted_private_keys,
            created_at: now,
            last_used: now,
            metadata,
        };

        self.storage.save_wallet(&wallet).await?;

        let mut cache = self.cache.write().await;
        for (chain_id, chain_wallet) in staged {
            cache.insert((wallet.id.clone(), chain_id), chain_wallet);
        }

        info!(
            "Created multi-chain wallet {} ({}) on {} chains",
            wallet.id,
            wallet.name,
            wallet.supported_chains.len()
        );
        Ok(wallet)
    }

    /// Load a wallet and mark it as used
    pub async fn get_multi_chain_wallet(&self, wallet_id: &str) -> Result<MultiChainWallet, WalletError> {
        let mut wallet = self.load_wallet(wallet_id).await?;
        wallet.last_used = Utc::now();
        self.storage.save_wallet(&wallet).await?;
        Ok(wallet)
    }

    /// Signing wallet for one chain, re-hydrated from storage on a cache miss
    pub async fn get_chain_wallet(
        &self,
        wallet_id: &str,
        chain_id: ChainId,
    ) -> Result<Arc<dyn UniversalWallet>, WalletError> {
        let key = (wallet_id.to_string(), chain_id);
        if let Some(cached) = self.cache.read().await.get(&key) {
            return Ok(cached.clone());
        }

        let wallet = self.load_wallet(wallet_id).await?;
        let ciphertext = wallet
            .encrypted_private_keys
            .get(&chain_id)
            .ok_or_else(|| WalletError::UnsupportedChainForWallet {
                wallet_id: wallet_id.to_string(),
                chain: chain_id,
            })?;

        let private_key = self.encryption.decrypt_private_key(ciphertext).await?;
        let formatted = format_private_key(chain_id, &private_key);
        drop(private_key);

        let provider = self.providers.create(chain_id, &self.chains).await?;
        let chain_wallet = provider.create_wallet(Some(&formatted)).await?;

        debug!("Restored {} wallet for {}", chain_id, wallet_id);
        let mut cache = self.cache.write().await;
        Ok(cache.entry(key).or_insert(chain_wallet).clone())
    }

    /// Sign with the wallet's key for `transaction.chain_id`
    pub async fn sign_transaction(
        &self,
        transaction: &UniversalTransaction,
        wallet_id: &str,
    ) -> Result<SignedTransaction, WalletError> {
        let chain_wallet = self.get_chain_wallet(wallet_id, transaction.chain_id).await?;
        Ok(chain_wallet.sign_transaction(transaction).await?)
    }

    /// Native balance on every supported chain, queried in parallel.
    ///
    /// A chain that fails reports zero.
    pub async fn get_all_balances(&self, wallet_id: &str) -> Result<HashMap<ChainId, u128>, WalletError> {
        let wallet = self.load_wallet(wallet_id).await?;
        let wallet_id = wallet.id.as_str();

        let queries = wallet.supported_chains.iter().map(|chain_id| async move {
            let chain_id = *chain_id;
            let balance = match self.native_balance(wallet_id, chain_id).await {
                Ok(balance) => balance,
                Err(e) => {
                    warn!("Balance query for {} on {} failed: {}", wallet_id, chain_id, e);
                    0
                }
            };
            (chain_id, balance)
        });

        Ok(join_all(queries).await.into_iter().collect())
    }

    async fn native_balance(&self, wallet_id: &str, chain_id: ChainId) -> Result<u128, WalletError> {
        let chain_wallet = self.get_chain_wallet(wallet_id, chain_id).await?;
        Ok(chain_wallet.get_balance().await?)
    }

    pub async fn get_token_balance(&self, wallet_id: &str, asset: &TradableAsset) -> Result<u128, WalletError> {
        let chain_wallet = self.get_chain_wallet(wallet_id, asset.chain_id).await?;
        Ok(chain_wallet.get_token_balance(asset).await?)
    }

    pub async fn list_wallets(&self) -> Result<Vec<MultiChainWallet>, WalletError> {
        self.storage.list_wallets().await
    }

    /// Most recently used wallet, created on demand when allowed
    pub async fn get_default_wallet(&self) -> Result<MultiChainWallet, WalletError> {
        if let Some(wallet) = self.most_recently_used().await? {
            return Ok(wallet);
        }

        if !self.config.auto_create_wallet {
            return Err(WalletError::NoWalletAvailable);
        }

        let _creating = self.default_wallet.lock().await;
        if let Some(wallet) = self.most_recently_used().await? {
            return Ok(wallet);
        }

        info!("No wallets found, creating default wallet");
        let chains = self.config.default_chains.clone();
        self.create_multi_chain_wallet(None, &chains, HashMap::new()).await
    }

    async fn most_recently_used(&self) -> Result<Option<MultiChainWallet>, WalletError> {
        let wallets = self.storage.list_wallets().await?;
        Ok(wallets.into_iter().max_by_key(|wallet| wallet.last_used))
    }

    /// Add a chain to an existing wallet; no-op if already supported
    pub async fn add_chain_support(&self, wallet_id: &str, chain_id: ChainId) -> Result<MultiChainWallet, WalletError> {
        let mut wallet = self.load_wallet(wallet_id).await?;
        if wallet.supports_chain(chain_id) {
            debug!("Wallet {} already supports {}", wallet_id, chain_id);
            return Ok(wallet);
        }

        let (chain_wallet, ciphertext) = self.new_chain_wallet(chain_id).await?;
        wallet.supported_chains.push(chain_id);
        wallet.addresses.insert(chain_id, chain_wallet.address().to_string());
        wallet.encrypted_private_keys.insert(chain_id, ciphertext);
        self.storage.save_wallet(&wallet).await?;

        self.cache.write().await.insert((wallet.id.clone(), chain_id), chain_wallet);

        info!("Added {} support to wallet {}", chain_id, wallet_id);
        Ok(wallet)
    }

    /// Remove a wallet and every cached chain wallet derived from it
    pub async fn delete_wallet(&self, wallet_id: &str) -> Result<bool, WalletError> {
        let deleted = self.storage.delete_wallet(wallet_id).await?;
        self.cache.write().await.retain(|(id, _), _| id != wallet_id);
        Ok(deleted)
    }

    async fn load_wallet(&self, wallet_id: &str) -> Result<MultiChainWallet, WalletError> {
        self.storage
            .get_wallet(wallet_id)
            .await?
            .ok_or_else(|| WalletError::NotFound(wallet_id.to_string()))
    }

    async fn new_chain_wallet(&self, chain_id: ChainId) -> Result<(Arc<dyn UniversalWallet>, Vec<u8>), WalletError> {
        let creation_failed = move |e: ChainError| WalletError::CreationFailed {
            chain: chain_id,
            reason: e.to_string(),
        };

        let provider = self.providers.create(chain_id, &self.chains).await.map_err(creation_failed)?;
        let chain_wallet = provider.create_wallet(None).await.map_err(creation_failed)?;
        let private_key = chain_wallet.export_private_key().map_err(creation_failed)?;
        let ciphertext = self.encryption.encrypt_private_key(&private_key).await?;

        Ok((chain_wallet, ciphertext))
    }
}

/// Chain-native text form of a private key: base58 on solana, 0x-hex on EVM chains
pub(crate) fn format_private_key(chain_id: ChainId, private_key: &[u8]) -> String {
    if chain_id.is_evm() {
        format!("0x{}", hex::encode(private_key))
    } else {
        bs58::encode(private_key).into_string()
    }
}
