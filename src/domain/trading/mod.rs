//! Trading domain - trade lifecycle, execution and fallback

mod engine;
mod multi_chain;
mod pipeline;
mod store;

pub use engine::TradingEngine;
pub use multi_chain::MultiChainTradingEngine;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::domain::strategy::SharedStrategy;
use crate::shared::errors::TradeError;
use crate::shared::types::{ChainId, TradableAsset};
use crate::shared::utils::generate_id;

/// Metadata key carrying the wallet used to execute a trade
pub const WALLET_ID_KEY: &str = "wallet_id";

/// Trade lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Pending,
    Active,
    Completed,
    Failed,
    Cancelled,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Pending => "PENDING",
            TradeStatus::Active => "ACTIVE",
            TradeStatus::Completed => "COMPLETED",
            TradeStatus::Failed => "FAILED",
            TradeStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TradeStatus::Completed | TradeStatus::Failed | TradeStatus::Cancelled)
    }

    /// PENDING and ACTIVE trades are still live
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    pub fn can_transition_to(&self, next: TradeStatus) -> bool {
        matches!(
            (self, next),
            (TradeStatus::Pending, TradeStatus::Active)
                | (TradeStatus::Pending, TradeStatus::Cancelled)
                | (TradeStatus::Active, TradeStatus::Completed)
                | (TradeStatus::Active, TradeStatus::Failed)
                | (TradeStatus::Active, TradeStatus::Cancelled)
        )
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// Price tracking owned by one trade
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceData {
    pub current_price: f64,
    pub starting_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    /// Append-only
    pub price_history: Vec<PricePoint>,
    pub last_updated: DateTime<Utc>,
}

impl PriceData {
    pub fn new(price: f64) -> Self {
        let now = Utc::now();
        Self {
            current_price: price,
            starting_price: price,
            high_price: price,
            low_price: price,
            price_history: vec![PricePoint { price, timestamp: now }],
            last_updated: now,
        }
    }

    pub fn record_price(&mut self, price: f64) {
        let now = Utc::now();
        self.current_price = price;
        self.high_price = self.high_price.max(price);
        self.low_price = self.low_price.min(price);
        self.price_history.push(PricePoint { price, timestamp: now });
        self.last_updated = now;
    }
}

/// Parameters for creating a trade
#[derive(Debug, Clone)]
pub struct CreateTradeParams {
    pub input_asset: TradableAsset,
    pub output_asset: TradableAsset,
    pub input_amount: u128,
    pub strategies: Vec<SharedStrategy>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl CreateTradeParams {
    pub fn new(input_asset: TradableAsset, output_asset: TradableAsset, input_amount: u128) -> Self {
        Self {
            input_asset,
            output_asset,
            input_amount,
            strategies: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: SharedStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Execute with a specific wallet instead of the configured default
    pub fn with_wallet(self, wallet_id: impl Into<String>) -> Self {
        self.with_metadata(WALLET_ID_KEY, serde_json::Value::String(wallet_id.into()))
    }

    pub(crate) fn validate(&self) -> Result<(), TradeError> {
        if self.input_amount == 0 {
            return Err(TradeError::InvalidParams("input amount must be greater than zero".to_string()));
        }
        for asset in [&self.input_asset, &self.output_asset] {
            if asset.symbol.trim().is_empty() || asset.address.trim().is_empty() {
                return Err(TradeError::InvalidParams("asset symbol and address are required".to_string()));
            }
        }
        if self.input_asset.is_same_token(&self.output_asset) {
            return Err(TradeError::InvalidParams("input and output assets are the same token".to_string()));
        }
        Ok(())
    }
}

/// Trade intent and its execution record
#[derive(Debug, Clone)]
pub struct Trade {
    pub id: String,
    pub input_asset: TradableAsset,
    pub output_asset: TradableAsset,
    pub input_amount: u128,
    pub expected_output_amount: Option<u128>,
    /// Set only once the trade is COMPLETED
    pub actual_output_amount: Option<u128>,
    pub status: TradeStatus,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub strategies: Vec<SharedStrategy>,
    pub price_data: PriceData,
    pub metadata: HashMap<String, serde_json::Value>,
    /// Chain that executed the trade once completed
    pub target_chain: ChainId,
    pub alternative_chains: Vec<ChainId>,
    pub transaction_id: Option<String>,
    /// Audit text for FAILED trades
    pub error: Option<String>,
    pub attempted_chains: Vec<ChainId>,
}

impl Trade {
    pub fn new(
        params: CreateTradeParams,
        starting_price: f64,
        target_chain: ChainId,
        alternative_chains: Vec<ChainId>,
    ) -> Self {
        Self {
            id: generate_id(),
            input_asset: params.input_asset,
            output_asset: params.output_asset,
            input_amount: params.input_amount,
            expected_output_amount: None,
            actual_output_amount: None,
            status: TradeStatus::Pending,
            created_at: Utc::now(),
            executed_at: None,
            completed_at: None,
            strategies: params.strategies,
            price_data: PriceData::new(starting_price),
            metadata: params.metadata,
            target_chain,
            alternative_chains,
            transaction_id: None,
            error: None,
            attempted_chains: Vec::new(),
        }
    }

    pub fn wallet_id(&self) -> Option<&str> {
        self.metadata.get(WALLET_ID_KEY).and_then(|value| value.as_str())
    }

    /// Move to `next`, rejecting anything the lifecycle does not allow
    pub fn transition(&mut self, next: TradeStatus) -> Result<(), TradeError> {
        if !self.status.can_transition_to(next) {
            return Err(TradeError::InvalidState {
                trade_id: self.id.clone(),
                expected: expected_predecessor(next).to_string(),
                actual: self.status.to_string(),
            });
        }
        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }
}

fn expected_predecessor(next: TradeStatus) -> &'static str {
    match next {
        TradeStatus::Pending | TradeStatus::Active => "PENDING",
        TradeStatus::Completed | TradeStatus::Failed => "ACTIVE",
        TradeStatus::Cancelled => "PENDING or ACTIVE",
    }
}

/// Outcome of an execution request
#[derive(Debug, Clone)]
pub struct TradeResult {
    pub trade: Trade,
    pub success: bool,
    pub transaction_id: Option<String>,
    pub error: Option<TradeError>,
}

/// Health snapshot for one chain
#[derive(Debug, Clone, Serialize)]
pub struct ChainStatistics {
    pub gas_price: Option<u128>,
    pub is_healthy: bool,
    pub last_checked: DateTime<Utc>,
    pub error: Option<String>,
}
