//! Chain provider registry

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::adapters::ChainProvider;
use crate::shared::config::MultiChainConfig;
use crate::shared::errors::ChainError;
use crate::shared::types::{ChainConfig, ChainId};

/// Builds a provider from its chain descriptor
pub type ProviderConstructor =
    Arc<dyn Fn(&ChainConfig) -> Result<Arc<dyn ChainProvider>, ChainError> + Send + Sync>;

/// Factory for creating chain providers
#[derive(Default)]
pub struct ChainProviderFactory {
    constructors: RwLock<HashMap<ChainId, ProviderConstructor>>,
}

impl ChainProviderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the constructor for a chain
    pub async fn register<F>(&self, chain_id: ChainId, constructor: F)
    where
        F: Fn(&ChainConfig) -> Result<Arc<dyn ChainProvider>, ChainError> + Send + Sync + 'static,
    {
        let mut constructors = self.constructors.write().await;
        if constructors.insert(chain_id, Arc::new(constructor)).is_some() {
            debug!("Replaced provider constructor for {}", chain_id);
        } else {
            debug!("Registered provider constructor for {}", chain_id);
        }
    }

    pub async fn unregister(&self, chain_id: ChainId) -> bool {
        self.constructors.write().await.remove(&chain_id).is_some()
    }

    /// Create a provider for `chain_id` using its descriptor from `config`
    pub async fn create(
        &self,
        chain_id: ChainId,
        config: &MultiChainConfig,
    ) -> Result<Arc<dyn ChainProvider>, ChainError> {
        let constructor = self
            .constructors
            .read()
            .await
            .get(&chain_id)
            .cloned()
            .ok_or_else(|| ChainError::UnsupportedChain(chain_id.to_string()))?;

        constructor(&config.chain_config(chain_id))
    }

    pub async fn supported_chains(&self) -> BTreeSet<ChainId> {
        self.constructors.read().await.keys().copied().collect()
    }

    pub async fn is_supported(&self, chain_id: ChainId) -> bool {
        self.constructors.read().await.contains_key(&chain_id)
    }
}

/// Builds one provider per enabled chain
pub struct MultiChainProviderFactory {
    factory: Arc<ChainProviderFactory>,
    config: MultiChainConfig,
}

impl MultiChainProviderFactory {
    pub fn new(factory: Arc<ChainProviderFactory>, config: MultiChainConfig) -> Self {
        Self { factory, config }
    }

    pub fn config(&self) -> &MultiChainConfig {
        &self.config
    }

    /// Providers for every enabled chain; chains that fail to build are skipped
    pub async fn create_all(&self) -> HashMap<ChainId, Arc<dyn ChainProvider>> {
        let mut providers = HashMap::new();

        for chain_id in &self.config.enabled_chains {
            match self.factory.create(*chain_id, &self.config).await {
                Ok(provider) => {
                    providers.insert(*chain_id, provider);
                }
                Err(e) => {
                    warn!("Skipping chain {}: {}", chain_id, e);
                }
            }
        }

        info!("Created {} of {} enabled chain providers", providers.len(), self.config.enabled_chains.len());
        providers
    }

    /// Provider for the configured default chain
    pub async fn default_provider(&self) -> Result<Arc<dyn ChainProvider>, ChainError> {
        self.factory.create(self.config.default_chain, &self.config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubChain;

    #[tokio::test]
    async fn test_unregistered_chain_is_unsupported() {
        let factory = ChainProviderFactory::new();
        let result = factory.create(ChainId::Polygon, &MultiChainConfig::mainnet()).await;
        assert!(matches!(result, Err(ChainError::UnsupportedChain(name)) if name == "polygon"));
    }

    #[tokio::test]
    async fn test_runtime_registration() {
        let factory = ChainProviderFactory::new();
        StubChain::new(ChainId::Solana).register(&factory).await;

        assert!(factory.is_supported(ChainId::Solana).await);
        assert_eq!(factory.supported_chains().await.into_iter().collect::<Vec<_>>(), vec![ChainId::Solana]);

        let provider = factory.create(ChainId::Solana, &MultiChainConfig::mainnet()).await.unwrap();
        assert_eq!(provider.chain_id(), ChainId::Solana);
        assert_eq!(provider.chain_config().native_currency.symbol, "SOL");

        assert!(factory.unregister(ChainId::Solana).await);
        assert!(!factory.is_supported(ChainId::Solana).await);
    }

    #[tokio::test]
    async fn test_create_all_skips_unregistered_chains() {
        let factory = Arc::new(ChainProviderFactory::new());
        StubChain::new(ChainId::Solana).register(&factory).await;
        StubChain::new(ChainId::Base).register(&factory).await;

        let multi = MultiChainProviderFactory::new(factory, MultiChainConfig::mainnet());
        let providers = multi.create_all().await;

        assert_eq!(providers.len(), 2);
        assert!(providers.contains_key(&ChainId::Solana));
        assert!(providers.contains_key(&ChainId::Base));
        assert!(!providers.contains_key(&ChainId::Ethereum));

        let default = multi.default_provider().await.unwrap();
        assert_eq!(default.chain_id(), ChainId::Solana);
    }
}
