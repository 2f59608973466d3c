//! Engine configuration, run errors, and run result types.

use crate::domain::{BarError, Trade};
use crate::engine::cost_basis::CostBasis;
use crate::strategy::{RecordTable, StrategyError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected engine settings.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },
}

/// Failures that abort a run. The ledger is left as it was after the last
/// fully processed bar.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),

    #[error("bar {index} at {current} is not after the previous bar at {previous}")]
    OutOfOrder {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("bar {index} rejected: {source}")]
    InvalidBar {
        index: usize,
        #[source]
        source: BarError,
    },

    #[error("strategy failed at bar {index}: {source}")]
    Strategy {
        index: usize,
        #[source]
        source: StrategyError,
    },
}

/// Configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Instrument traded in this run.
    pub symbol: String,
    /// Starting cash; the balance column is this plus cumulative profit.
    pub initial_cash: f64,
    /// Notional multiplier applied to turnover. Realized P&L is unlevered.
    pub leverage: f64,
    /// Commission as a fraction of turnover.
    pub commission_rate: f64,
    /// Slippage cost as a fraction of turnover.
    pub slippage_rate: f64,
    pub cost_basis: CostBasis,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            initial_cash: 1_000_000.0,
            leverage: 1.0,
            commission_rate: 7.0 / 10_000.0,
            slippage_rate: 5.0 / 10_000.0,
            cost_basis: CostBasis::Fifo,
        }
    }
}

impl EngineConfig {
    pub fn new(symbol: impl Into<String>, initial_cash: f64) -> Self {
        Self {
            symbol: symbol.into(),
            initial_cash,
            ..Self::default()
        }
    }

    /// Config with no commission or slippage.
    pub fn frictionless(symbol: impl Into<String>, initial_cash: f64) -> Self {
        Self {
            commission_rate: 0.0,
            slippage_rate: 0.0,
            ..Self::new(symbol, initial_cash)
        }
    }

    /// Reject non-finite numbers before they reach P&L arithmetic.
    ///
    /// Negative rates and leverage are accepted with a warning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("initial_cash", self.initial_cash),
            ("leverage", self.leverage),
            ("commission_rate", self.commission_rate),
            ("slippage_rate", self.slippage_rate),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
            if value < 0.0 {
                tracing::warn!(field, value, "negative engine setting accepted");
            }
        }
        Ok(())
    }
}

/// Result of a complete replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub symbol: String,
    /// Every fill, in execution order.
    pub trades: Vec<Trade>,
    /// Net position after the last bar.
    pub final_position: f64,
    pub bar_count: usize,
    /// Orders still pending when the feed ended.
    pub open_orders: usize,
    pub orders_placed: u64,
    /// Auxiliary series recorded by the strategy.
    pub records: RecordTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.leverage, 1.0);
        assert_eq!(config.initial_cash, 1_000_000.0);
        assert!((config.commission_rate - 0.0007).abs() < 1e-12);
        assert!((config.slippage_rate - 0.0005).abs() < 1e-12);
        assert_eq!(config.cost_basis, CostBasis::Fifo);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_finite_settings_rejected() {
        let mut config = EngineConfig::frictionless("ETHUSDT", 10_000.0);
        config.commission_rate = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite {
                field: "commission_rate",
                ..
            })
        ));

        let mut config = EngineConfig::default();
        config.leverage = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_rates_are_accepted() {
        let mut config = EngineConfig::default();
        config.slippage_rate = -0.001;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"leverage": 2.0}"#).unwrap();
        assert_eq!(config.leverage, 2.0);
        assert_eq!(config.symbol, "BTCUSDT");
    }
}
