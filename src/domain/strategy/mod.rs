//! Strategy domain - pluggable exit rules evaluated against live prices

mod engine;
mod price_target;

pub use engine::StrategyEngine;
pub use price_target::{PriceDirection, PriceTargetParams, PriceTargetStrategy};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::domain::trading::{PricePoint, Trade};

/// Recommended action, ordered by aggregation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StrategyAction {
    Hold,
    Buy,
    Sell,
    Cancel,
}

impl StrategyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyAction::Hold => "HOLD",
            StrategyAction::Buy => "BUY",
            StrategyAction::Sell => "SELL",
            StrategyAction::Cancel => "CANCEL",
        }
    }
}

impl fmt::Display for StrategyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a single strategy evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResult {
    pub action: StrategyAction,
    pub reason: String,
}

impl StrategyResult {
    pub fn new(action: StrategyAction, reason: impl Into<String>) -> Self {
        Self {
            action,
            reason: reason.into(),
        }
    }

    pub fn hold(reason: impl Into<String>) -> Self {
        Self::new(StrategyAction::Hold, reason)
    }
}

/// Market context handed to each strategy
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    pub trade: &'a Trade,
    pub current_price: f64,
    pub price_history: &'a [PricePoint],
}

/// Aggregated outcome across every strategy attached to a trade
#[derive(Debug, Clone)]
pub struct StrategyEvaluationResult {
    pub trade_id: String,
    pub results: Vec<StrategyResult>,
    pub aggregated_action: StrategyAction,
    pub explanation: String,
}

/// Trading strategy
pub trait Strategy: fmt::Debug + Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn evaluate(&self, context: &StrategyContext<'_>) -> StrategyResult;
}

pub type SharedStrategy = Arc<dyn Strategy>;
