//! Strategy registry and aggregation

use std::collections::HashMap;
use tracing::debug;

use super::{SharedStrategy, StrategyAction, StrategyContext, StrategyEvaluationResult, StrategyResult};
use crate::domain::trading::Trade;

/// Holds registered strategies and evaluates those attached to a trade
#[derive(Debug, Default)]
pub struct StrategyEngine {
    registry: HashMap<String, SharedStrategy>,
}

impl StrategyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy, replacing any with the same id
    pub fn register_strategy(&mut self, strategy: SharedStrategy) {
        debug!("Registering strategy {} ({})", strategy.id(), strategy.name());
        self.registry.insert(strategy.id().to_string(), strategy);
    }

    pub fn unregister_strategy(&mut self, strategy_id: &str) -> bool {
        self.registry.remove(strategy_id).is_some()
    }

    pub fn get_strategy(&self, strategy_id: &str) -> Option<SharedStrategy> {
        self.registry.get(strategy_id).cloned()
    }

    pub fn list_strategies(&self) -> Vec<SharedStrategy> {
        let mut strategies: Vec<_> = self.registry.values().cloned().collect();
        strategies.sort_by(|a, b| a.id().cmp(b.id()));
        strategies
    }

    /// Evaluate every strategy attached to `trade`
    pub fn evaluate_strategies(&self, trade: &Trade) -> StrategyEvaluationResult {
        let context = StrategyContext {
            trade,
            current_price: trade.price_data.current_price,
            price_history: &trade.price_data.price_history,
        };

        let results: Vec<StrategyResult> = trade
            .strategies
            .iter()
            .map(|strategy| strategy.evaluate(&context))
            .collect();

        let aggregated_action = aggregate_action(&results);
        let explanation = explain(&results, aggregated_action);

        debug!("Trade {}: {}", trade.id, explanation);
        StrategyEvaluationResult {
            trade_id: trade.id.clone(),
            results,
            aggregated_action,
            explanation,
        }
    }
}

/// CANCEL > SELL > BUY > HOLD, regardless of vote counts
fn aggregate_action(results: &[StrategyResult]) -> StrategyAction {
    results
        .iter()
        .map(|result| result.action)
        .max()
        .unwrap_or(StrategyAction::Hold)
}

fn explain(results: &[StrategyResult], action: StrategyAction) -> String {
    let reasons: Vec<&str> = results
        .iter()
        .filter(|result| result.action == action)
        .map(|result| result.reason.as_str())
        .collect();

    if reasons.is_empty() {
        return format!("No strategies triggered action {}", action);
    }

    format!(
        "Action {} triggered by {} strategies: {}",
        action,
        reasons.len(),
        reasons.join("; ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pending_trade, FixedStrategy};
    use std::sync::Arc;

    fn votes(actions: &[StrategyAction]) -> Vec<SharedStrategy> {
        actions
            .iter()
            .enumerate()
            .map(|(i, action)| {
                Arc::new(FixedStrategy::new(format!("s{}", i), *action, format!("vote {}", i))) as SharedStrategy
            })
            .collect()
    }

    #[test]
    fn test_aggregation_priority() {
        let engine = StrategyEngine::new();

        let trade = pending_trade(votes(&[StrategyAction::Hold, StrategyAction::Buy, StrategyAction::Sell]));
        let result = engine.evaluate_strategies(&trade);
        assert_eq!(result.aggregated_action, StrategyAction::Sell);
        assert_eq!(result.results.len(), 3);
        assert_eq!(result.explanation, "Action SELL triggered by 1 strategies: vote 2");

        let trade = pending_trade(votes(&[
            StrategyAction::Hold,
            StrategyAction::Buy,
            StrategyAction::Sell,
            StrategyAction::Cancel,
        ]));
        assert_eq!(engine.evaluate_strategies(&trade).aggregated_action, StrategyAction::Cancel);
    }

    #[test]
    fn test_tied_reasons_are_concatenated() {
        let engine = StrategyEngine::new();
        let trade = pending_trade(votes(&[StrategyAction::Sell, StrategyAction::Hold, StrategyAction::Sell]));

        let result = engine.evaluate_strategies(&trade);
        assert_eq!(result.explanation, "Action SELL triggered by 2 strategies: vote 0; vote 2");
    }

    #[test]
    fn test_no_strategies_holds() {
        let engine = StrategyEngine::new();
        let result = engine.evaluate_strategies(&pending_trade(Vec::new()));

        assert_eq!(result.aggregated_action, StrategyAction::Hold);
        assert_eq!(result.explanation, "No strategies triggered action HOLD");
    }

    #[test]
    fn test_registry() {
        let mut engine = StrategyEngine::new();
        for strategy in votes(&[StrategyAction::Hold, StrategyAction::Sell]) {
            engine.register_strategy(strategy);
        }

        assert_eq!(engine.list_strategies().len(), 2);
        assert_eq!(engine.get_strategy("s1").map(|s| s.id().to_string()), Some("s1".to_string()));
        assert!(engine.unregister_strategy("s1"));
        assert!(!engine.unregister_strategy("s1"));
        assert!(engine.get_strategy("s1").is_none());
    }
}
