//! In-memory wallet storage

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{MultiChainWallet, WalletStorage};
use crate::shared::errors::WalletError;

/// Process-local wallet store
#[derive(Default)]
pub struct InMemoryWalletStorage {
    wallets: RwLock<HashMap<String, MultiChainWallet>>,
}

impl InMemoryWalletStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletStorage for InMemoryWalletStorage {
    async fn save_wallet(&self, wallet: &MultiChainWallet) -> Result<(), WalletError> {
        self.wallets.write().await.insert(wallet.id.clone(), wallet.clone());
        Ok(())
    }

    async fn get_wallet(&self, wallet_id: &str) -> Result<Option<MultiChainWallet>, WalletError> {
        Ok(self.wallets.read().await.get(wallet_id).cloned())
    }

    async fn get_wallet_by_address(&self, address: &str) -> Result<Option<MultiChainWallet>, WalletError> {
        Ok(self
            .wallets
            .read()
            .await
            .values()
            .find(|wallet| wallet.owns_address(address))
            .cloned())
    }

    async fn list_wallets(&self) -> Result<Vec<MultiChainWallet>, WalletError> {
        let mut wallets: Vec<_> = self.wallets.read().await.values().cloned().collect();
        wallets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(wallets)
    }

    async fn delete_wallet(&self, wallet_id: &str) -> Result<bool, WalletError> {
        Ok(self.wallets.write().await.remove(wallet_id).is_some())
    }
}
