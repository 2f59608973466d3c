//! Backtest runner: wires together data, strategy, engine, and metrics.
//!
//! Entry points:
//! - `run_from_config()`: loads the CSV named in the config, then runs. Used by the CLI.
//! - `run_with_strategy()`: takes pre-loaded bars and a built strategy. Used by sweeps and tests.

use barlab_core::domain::{Bar, Trade};
use barlab_core::engine::{
    reconstruct, run_backtest, EngineConfig, EngineError, ReportError, ReportRow, RunResult,
};
use barlab_core::strategy::examples::ChannelBreakout;
use barlab_core::strategy::{Params, Strategy, StrategyError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{BacktestConfig, RunnerConfigError};
use crate::data_loader::{dataset_hash, load_csv, LoadError};
use crate::metrics::PerformanceSummary;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] RunnerConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("unknown strategy '{0}' (available: channel_breakout)")]
    UnknownStrategy(String),
    #[error("strategy setup failed: {0}")]
    Strategy(#[from] StrategyError),
    #[error("backtest failed: {0}")]
    Engine(#[from] EngineError),
    #[error("report failed: {0}")]
    Report(#[from] ReportError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// A strategy instance the runner can move across threads.
pub type BoxedStrategy = Box<dyn Strategy + Send>;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub strategy: String,
    pub params: Params,
    pub engine: EngineConfig,
    pub dataset_hash: String,
    /// BLAKE3 over the trade ledger; equal ledgers give equal fingerprints.
    pub fingerprint: String,
    pub summary: PerformanceSummary,
    pub rows: Vec<ReportRow>,
    pub result: RunResult,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Build a fresh strategy instance by registered name.
pub fn build_strategy(name: &str, params: &Params) -> Result<BoxedStrategy, RunError> {
    match name {
        ChannelBreakout::NAME => Ok(Box::new(ChannelBreakout::from_params(params)?)),
        other => Err(RunError::UnknownStrategy(other.to_string())),
    }
}

/// Run a backtest from a config file's settings (loads the CSV feed).
pub fn run_from_config(config: &BacktestConfig) -> Result<BacktestReport, RunError> {
    config.validate()?;
    let loaded = load_csv(&config.data.path)?;
    let mut strategy = build_strategy(&config.strategy.name, &config.strategy.params)?;
    run_with_strategy(
        &loaded.bars,
        &config.engine,
        strategy.as_mut(),
        &config.strategy.params,
    )
}

/// Run a backtest over pre-loaded bars without any I/O.
pub fn run_with_strategy<S>(
    bars: &[Bar],
    engine: &EngineConfig,
    strategy: &mut S,
    params: &Params,
) -> Result<BacktestReport, RunError>
where
    S: Strategy + ?Sized,
{
    let name = strategy.name().to_string();
    let result = run_backtest(bars, engine, strategy)?;
    let rows = reconstruct(&result.trades, bars, engine)?;
    let summary = PerformanceSummary::compute(&rows, engine.initial_cash);

    tracing::info!(
        strategy = %name,
        trades = summary.trade_count,
        net_profit = summary.net_profit,
        final_balance = summary.final_balance,
        "backtest complete"
    );

    Ok(BacktestReport {
        schema_version: SCHEMA_VERSION,
        strategy: name,
        params: params.clone(),
        engine: engine.clone(),
        dataset_hash: dataset_hash(bars),
        fingerprint: ledger_fingerprint(&result.trades),
        summary,
        rows,
        result,
    })
}

/// Deterministic BLAKE3 hash of a trade ledger.
pub fn ledger_fingerprint(trades: &[Trade]) -> String {
    let mut hasher = blake3::Hasher::new();
    for t in trades {
        hasher.update(&t.id.0.to_le_bytes());
        hasher.update(&t.order_id.0.to_le_bytes());
        hasher.update(t.intent.as_str().as_bytes());
        hasher.update(&t.price.to_le_bytes());
        hasher.update(&t.quantity.to_le_bytes());
        hasher.update(&t.timestamp.and_utc().timestamp_millis().to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
