//! Wallet domain - multi-chain identities, their storage and key encryption

mod manager;
mod storage;

pub use manager::UniversalWalletManager;
pub use storage::InMemoryWalletStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::shared::errors::WalletError;
use crate::shared::types::ChainId;

/// Logical identity holding one address and one encrypted key per chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiChainWallet {
    pub id: String,
    pub name: String,
    /// Address on the first chain the wallet was created with
    pub address: String,
    pub supported_chains: Vec<ChainId>,
    pub addresses: HashMap<ChainId, String>,
    /// Ciphertext produced by the configured `WalletEncryption`
    pub encrypted_private_keys: HashMap<ChainId, Vec<u8>>,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl MultiChainWallet {
    pub fn supports_chain(&self, chain_id: ChainId) -> bool {
        self.supported_chains.contains(&chain_id)
    }

    pub fn address_on(&self, chain_id: ChainId) -> Option<&str> {
        self.addresses.get(&chain_id).map(String::as_str)
    }

    /// Matches the primary address or any per-chain address
    pub fn owns_address(&self, address: &str) -> bool {
        self.address == address || self.addresses.values().any(|a| a == address)
    }
}

/// Persistence contract for multi-chain wallets
#[async_trait]
pub trait WalletStorage: Send + Sync {
    async fn save_wallet(&self, wallet: &MultiChainWallet) -> Result<(), WalletError>;

    async fn get_wallet(&self, wallet_id: &str) -> Result<Option<MultiChainWallet>, WalletError>;

    async fn get_wallet_by_address(&self, address: &str) -> Result<Option<MultiChainWallet>, WalletError>;

    async fn list_wallets(&self) -> Result<Vec<MultiChainWallet>, WalletError>;

    /// Returns false if the wallet did not exist
    async fn delete_wallet(&self, wallet_id: &str) -> Result<bool, WalletError>;
}

/// Encryption contract for private key material
#[async_trait]
pub trait WalletEncryption: Send + Sync {
    async fn encrypt_private_key(&self, private_key: &[u8]) -> Result<Vec<u8>, WalletError>;

    async fn decrypt_private_key(&self, ciphertext: &[u8]) -> Result<Vec<u8>, WalletError>;
}
