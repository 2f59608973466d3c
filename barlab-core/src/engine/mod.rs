//! Backtesting engine: order book, matching, replay loop, and reporting.
//!
//! The replay consumes an ordered bar feed and a strategy, and produces the
//! trade ledger. Reporting runs afterwards over the ledger and the same bars.

pub mod cost_basis;
pub mod loop_runner;
pub mod matching;
pub mod order_book;
pub mod performance;
pub mod state;

pub use cost_basis::{CostBasis, LotLedger};
pub use loop_runner::run_backtest;
pub use matching::{limit_fill_price, stop_fill_price, MatchingEngine};
pub use order_book::{OrderBook, OrderBookError};
pub use performance::{reconstruct, ReportError, ReportRow};
pub use state::{ConfigError, EngineConfig, EngineError, RunResult};
