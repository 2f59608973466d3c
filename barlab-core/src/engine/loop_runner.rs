//! Bar-by-bar replay loop: the heart of the backtesting engine.
//!
//! Per bar:
//! 1. Validate: finite prices, strictly after the previous bar
//! 2. Match: pending orders from earlier bars cross against this bar
//! 3. Strategy: the bar and the post-match position go to the strategy
//!
//! A bar rejected at step 1 stops the run before anything is matched, so the
//! ledger and position reflect exactly the bars before it.

use crate::domain::Bar;
use crate::strategy::{RecordTable, Strategy, StrategyContext};

use super::matching::MatchingEngine;
use super::order_book::OrderBook;
use super::state::{EngineConfig, EngineError, RunResult};

/// Replay `bars` through `strategy` and return the trade ledger.
pub fn run_backtest<S>(
    bars: &[Bar],
    config: &EngineConfig,
    strategy: &mut S,
) -> Result<RunResult, EngineError>
where
    S: Strategy + ?Sized,
{
    config.validate()?;

    let mut book = OrderBook::new(config.symbol.clone());
    let mut engine = MatchingEngine::new();
    let mut records = RecordTable::new();

    tracing::info!(
        symbol = %config.symbol,
        strategy = strategy.name(),
        bars = bars.len(),
        "replay started"
    );
    strategy.on_start();

    let mut previous: Option<&Bar> = None;
    for (index, bar) in bars.iter().enumerate() {
        bar.validate()
            .map_err(|source| EngineError::InvalidBar { index, source })?;
        if let Some(prev) = previous {
            if bar.timestamp <= prev.timestamp {
                return Err(EngineError::OutOfOrder {
                    index,
                    previous: prev.timestamp,
                    current: bar.timestamp,
                });
            }
        }
        previous = Some(bar);

        engine.match_bar(bar, &mut book);

        let mut ctx =
            StrategyContext::new(bar.timestamp, engine.position(), &mut book, &mut records);
        strategy
            .on_bar(bar, &mut ctx)
            .map_err(|source| EngineError::Strategy { index, source })?;
    }

    strategy.on_stop();

    let result = RunResult {
        symbol: config.symbol.clone(),
        final_position: engine.position(),
        bar_count: bars.len(),
        open_orders: book.len(),
        orders_placed: book.orders_placed(),
        records,
        trades: engine.into_trades(),
    };
    tracing::info!(
        trades = result.trades.len(),
        final_position = result.final_position,
        open_orders = result.open_orders,
        "replay finished"
    );
    Ok(result)
}
