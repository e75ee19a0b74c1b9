//! Price target strategy

use serde::{Deserialize, Serialize};

use super::{Strategy, StrategyAction, StrategyContext, StrategyResult};
use crate::shared::errors::StrategyError;
use crate::shared::utils::generate_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriceDirection {
    #[default]
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceTargetParams {
    /// Absolute target, takes precedence over `target_percentage`
    pub target_price: Option<f64>,
    /// Move relative to the trade's starting price, in percent
    pub target_percentage: Option<f64>,
    pub direction: PriceDirection,
    pub action: StrategyAction,
}

impl Default for PriceTargetParams {
    fn default() -> Self {
        Self {
            target_price: None,
            target_percentage: None,
            direction: PriceDirection::Up,
            action: StrategyAction::Sell,
        }
    }
}

impl PriceTargetParams {
    fn validate(&self) -> Result<(), StrategyError> {
        for (name, value) in [("target_price", self.target_price), ("target_percentage", self.target_percentage)] {
            if let Some(value) = value {
                if !value.is_finite() || value <= 0.0 {
                    return Err(StrategyError::InvalidParameters(format!(
                        "{} must be greater than 0, got {}",
                        name, value
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Triggers a configured action once the price crosses a target
#[derive(Debug, Clone)]
pub struct PriceTargetStrategy {
    id: String,
    params: PriceTargetParams,
}

impl Default for PriceTargetStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceTargetStrategy {
    pub fn new() -> Self {
        Self {
            id: generate_id(),
            params: PriceTargetParams::default(),
        }
    }

    pub fn with_params(params: PriceTargetParams) -> Result<Self, StrategyError> {
        let mut strategy = Self::new();
        strategy.set_parameters(params)?;
        Ok(strategy)
    }

    /// Build from JSON parameters, e.g. `{"target_percentage": 10, "direction": "UP"}`
    pub fn from_json(params: &str) -> Result<Self, StrategyError> {
        let params: PriceTargetParams =
            serde_json::from_str(params).map_err(|e| StrategyError::InvalidParameters(e.to_string()))?;
        Self::with_params(params)
    }

    pub fn set_parameters(&mut self, params: PriceTargetParams) -> Result<(), StrategyError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn parameters(&self) -> &PriceTargetParams {
        &self.params
    }

    fn target_price(&self, starting_price: f64) -> Option<f64> {
        if let Some(price) = self.params.target_price {
            return Some(price);
        }
        let percentage = self.params.target_percentage?;
        let factor = match self.params.direction {
            PriceDirection::Up => 1.0 + percentage / 100.0,
            PriceDirection::Down => 1.0 - percentage / 100.0,
        };
        Some(starting_price * factor)
    }
}

impl Strategy for PriceTargetStrategy {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Price Target Strategy"
    }

    fn description(&self) -> &str {
        "Triggers an action when the price reaches a specific target"
    }

    fn evaluate(&self, context: &StrategyContext<'_>) -> StrategyResult {
        let Some(target) = self.target_price(context.trade.price_data.starting_price) else {
            return StrategyResult::hold("No price target set");
        };

        let reached = match self.params.direction {
            PriceDirection::Up => context.current_price >= target,
            PriceDirection::Down => context.current_price <= target,
        };

        if reached {
            StrategyResult::new(
                self.params.action,
                format!("Price target of {:.6} reached (current: {:.6})", target, context.current_price),
            )
        } else {
            StrategyResult::hold(format!(
                "Price target of {:.6} not yet reached (current: {:.6})",
                target, context.current_price
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::pending_trade;

    fn evaluate_at(strategy: &PriceTargetStrategy, starting_price: f64, current_price: f64) -> StrategyResult {
        let mut trade = pending_trade(Vec::new());
        trade.price_data.starting_price = starting_price;
        trade.price_data.current_price = current_price;

        let context = StrategyContext {
            trade: &trade,
            current_price,
            price_history: &trade.price_data.price_history,
        };
        strategy.evaluate(&context)
    }

    #[test]
    fn test_absolute_target_upward() {
        let strategy = PriceTargetStrategy::with_params(PriceTargetParams {
            target_price: Some(110.0),
            ..PriceTargetParams::default()
        })
        .unwrap();

        let result = evaluate_at(&strategy, 100.0, 120.0);
        assert_eq!(result.action, StrategyAction::Sell);
        assert!(result.reason.contains("Price target of 110.000000 reached"));

        let result = evaluate_at(&strategy, 100.0, 105.0);
        assert_eq!(result.action, StrategyAction::Hold);
        assert!(result.reason.contains("not yet reached"));
    }

    #[test]
    fn test_absolute_target_downward() {
        let strategy = PriceTargetStrategy::with_params(PriceTargetParams {
            target_price: Some(90.0),
            direction: PriceDirection::Down,
            action: StrategyAction::Buy,
            ..PriceTargetParams::default()
        })
        .unwrap();

        let result = evaluate_at(&strategy, 100.0, 80.0);
        assert_eq!(result.action, StrategyAction::Buy);
        assert!(result.reason.contains("Price target of 90.000000 reached"));
    }

    #[test]
    fn test_percentage_target() {
        let up = PriceTargetStrategy::from_json(r#"{"target_percentage": 10}"#).unwrap();
        assert_eq!(evaluate_at(&up, 100.0, 115.0).action, StrategyAction::Sell);
        assert_eq!(evaluate_at(&up, 100.0, 105.0).action, StrategyAction::Hold);

        let down = PriceTargetStrategy::from_json(r#"{"target_percentage": 10, "direction": "DOWN", "action": "CANCEL"}"#)
            .unwrap();
        let result = evaluate_at(&down, 100.0, 85.0);
        assert_eq!(result.action, StrategyAction::Cancel);
        assert!(result.reason.contains("Price target of 90.000000 reached"));
    }

    #[test]
    fn test_no_target_holds() {
        let result = evaluate_at(&PriceTargetStrategy::new(), 100.0, 1_000.0);
        assert_eq!(result.action, StrategyAction::Hold);
        assert_eq!(result.reason, "No price target set");
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let mut strategy = PriceTargetStrategy::new();
        let result = strategy.set_parameters(PriceTargetParams {
            target_price: Some(-100.0),
            ..PriceTargetParams::default()
        });
        assert!(matches!(result, Err(StrategyError::InvalidParameters(_))));
        assert_eq!(strategy.parameters(), &PriceTargetParams::default());

        assert!(PriceTargetStrategy::from_json(r#"{"target_percentage": 0}"#).is_err());
        assert!(PriceTargetStrategy::from_json(r#"{"direction": "SIDEWAYS"}"#).is_err());
    }
}
