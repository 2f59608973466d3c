//! BarLab Core: deterministic bar replay, order matching, and trade accounting.
//!
//! This crate contains the heart of the backtesting engine:
//! - Domain types (bars, orders, trades, IDs)
//! - Bar aggregation from a base timeframe into coarser windows
//! - Order book with separate limit and stop sets
//! - Matching engine that fills orders against each bar's OHLC
//! - Bar-by-bar replay loop driving a pluggable strategy
//! - Performance reconstruction with an explicit cost-basis ledger

pub mod data;
pub mod domain;
pub mod engine;
pub mod strategy;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: core data types are Send + Sync, so sweeps can
    /// move them across worker threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Order>();
        require_sync::<domain::Order>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<data::BarAggregator>();
        require_sync::<data::BarAggregator>();
        require_send::<engine::EngineConfig>();
        require_sync::<engine::EngineConfig>();
        require_send::<engine::RunResult>();
        require_sync::<engine::RunResult>();
        require_send::<engine::ReportRow>();
        require_sync::<engine::ReportRow>();
        require_send::<engine::OrderBook>();
        require_sync::<engine::OrderBook>();
    }

    /// Architecture contract: strategies see the position by value.
    ///
    /// `StrategyContext::position()` returns `f64`, and the context holds no
    /// reference to the matching engine. The only way a strategy can affect
    /// the position is by queueing orders that fill on later bars.
    #[test]
    fn strategy_context_exposes_position_by_value() {
        fn _check(ctx: &strategy::StrategyContext<'_>) -> f64 {
            ctx.position()
        }
    }
}
