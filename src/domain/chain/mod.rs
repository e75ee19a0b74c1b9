//! Chain domain - per-network capability sets and their registry

mod adapters;
mod registry;

pub use adapters::{
    BlockchainAdapter, ChainProvider, DexAdapter, Quote, QuoteParams, ReceiptStatus, SignedTransaction, SwapParams,
    TransactionReceipt, UniversalTransaction, UniversalWallet,
};
pub use registry::{ChainProviderFactory, MultiChainProviderFactory, ProviderConstructor};
