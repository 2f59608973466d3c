//! BarLab Runner: backtest orchestration, sweeps, metrics, and export.
//!
//! This crate builds on `barlab-core` to provide:
//! - TOML run configuration
//! - CSV bar loading with validation, plus a seeded synthetic feed
//! - Single-backtest runner with report reconstruction and summary metrics
//! - Parameter sweeps (sequential or rayon-parallel)
//! - CSV/JSON artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, RunnerConfigError};
pub use data_loader::{load_csv, synthetic_minute_bars, LoadError, LoadedBars};
pub use export::{save_artifacts, save_sweep, ArtifactPaths};
pub use metrics::PerformanceSummary;
pub use runner::{
    build_strategy, run_from_config, run_with_strategy, BacktestReport, BoxedStrategy, RunError,
};
pub use sweep::{registry_sweep, ParamGrid, ParamSweep, SweepEntry, SweepResults};
