//! Strategy collaborator: the pluggable decision logic driven by the run loop.
//!
//! A strategy sees each bar once, after pending orders have been matched
//! against it, and may queue or cancel orders through [`StrategyContext`].
//! It never touches the position or the ledger directly. Orders it places
//! while handling bar N are first eligible for matching on bar N+1.
//!
//! All strategy state lives on the instance. Parameter sweeps build a fresh
//! instance per run, so nothing carries over between runs.

pub mod context;
pub mod examples;
pub mod records;

pub use context::StrategyContext;
pub use records::RecordTable;

use crate::data::AggregateError;
use crate::domain::Bar;
use crate::engine::order_book::OrderBookError;
use std::collections::BTreeMap;
use thiserror::Error;

/// Named numeric strategy parameters, ordered by name.
pub type Params = BTreeMap<String, f64>;

/// Errors a strategy may raise. Any of them aborts the run.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("order rejected: {0}")]
    Order(#[from] OrderBookError),

    #[error("aggregation failed: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("missing parameter '{0}'")]
    MissingParam(String),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParam { name: String, reason: String },
}

/// Strategy lifecycle: start, one call per bar, stop.
pub trait Strategy {
    /// Strategy name for reports and logging.
    fn name(&self) -> &str;

    /// Called once before the first bar.
    fn on_start(&mut self) {}

    /// Called once per bar after matching.
    fn on_bar(&mut self, bar: &Bar, ctx: &mut StrategyContext<'_>) -> Result<(), StrategyError>;

    /// Called once after the last bar.
    fn on_stop(&mut self) {}
}

/// Read a required parameter.
pub fn param(params: &Params, name: &str) -> Result<f64, StrategyError> {
    params
        .get(name)
        .copied()
        .ok_or_else(|| StrategyError::MissingParam(name.to_string()))
}

/// Read a parameter that must be a whole number of at least 1.
pub fn count_param(params: &Params, name: &str) -> Result<u32, StrategyError> {
    let value = param(params, name)?;
    if value.fract() != 0.0 || value < 1.0 || value > f64::from(u32::MAX) {
        return Err(StrategyError::InvalidParam {
            name: name.to_string(),
            reason: format!("expected a positive whole number, got {value}"),
        });
    }
    Ok(value as u32)
}
