//! Parameter sweep over a grid of strategy parameters.
//!
//! Every parameter set gets a freshly built strategy and its own engine run,
//! so runs share nothing but the read-only bar slice. Results come back in
//! grid order whether the sweep ran sequentially or on the rayon pool.

use barlab_core::domain::Bar;
use barlab_core::engine::EngineConfig;
use barlab_core::strategy::Params;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::SweepConfig;
use crate::metrics::PerformanceSummary;
use crate::runner::{build_strategy, run_with_strategy, BoxedStrategy, RunError};

/// Parameter grid specification: candidate values per parameter name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    params: BTreeMap<String, Vec<f64>>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the candidates for one parameter.
    pub fn with(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.params.insert(name.into(), values);
        self
    }

    /// Returns the total number of parameter sets in this grid.
    pub fn size(&self) -> usize {
        if self.params.is_empty() {
            return 0;
        }
        self.params.values().map(Vec::len).product()
    }

    /// Cross product of all candidates layered over `base`.
    ///
    /// Ordering is deterministic: parameters vary in name order, the last
    /// name fastest. Grid values override same-named base parameters.
    pub fn combinations(&self, base: &Params) -> Vec<Params> {
        if self.params.is_empty() {
            return Vec::new();
        }
        let mut sets = vec![base.clone()];
        for (name, values) in &self.params {
            sets = sets
                .into_iter()
                .flat_map(|set| {
                    values.iter().map(move |&v| {
                        let mut next = set.clone();
                        next.insert(name.clone(), v);
                        next
                    })
                })
                .collect();
        }
        sets
    }
}

impl From<&SweepConfig> for ParamGrid {
    fn from(config: &SweepConfig) -> Self {
        Self {
            params: config.params.clone(),
        }
    }
}

/// One finished run of a sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepEntry {
    pub params: Params,
    pub summary: PerformanceSummary,
    pub fingerprint: String,
}

/// Parameter sweep executor.
///
/// Runs backtests for all parameter sets in a grid, optionally in parallel.
pub struct ParamSweep<F> {
    engine: EngineConfig,
    base_params: Params,
    factory: F,
    parallel: bool,
}

impl<F> ParamSweep<F>
where
    F: Fn(&Params) -> Result<BoxedStrategy, RunError> + Sync,
{
    /// Creates a sweep that builds each strategy with `factory`.
    pub fn new(engine: EngineConfig, factory: F) -> Self {
        Self {
            engine,
            base_params: Params::new(),
            factory,
            parallel: true,
        }
    }

    /// Parameters shared by every run unless the grid overrides them.
    pub fn with_base_params(mut self, params: Params) -> Self {
        self.base_params = params;
        self
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Executes the sweep over `bars`. The first failing run aborts the sweep.
    pub fn sweep(&self, grid: &ParamGrid, bars: &[Bar]) -> Result<SweepResults, RunError> {
        let sets = grid.combinations(&self.base_params);
        tracing::info!(runs = sets.len(), parallel = self.parallel, "sweep started");

        let entries = if self.parallel {
            sets.par_iter()
                .map(|params| self.run_one(params, bars))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            sets.iter()
                .map(|params| self.run_one(params, bars))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(SweepResults { entries })
    }

    fn run_one(&self, params: &Params, bars: &[Bar]) -> Result<SweepEntry, RunError> {
        let mut strategy = (self.factory)(params)?;
        let report = run_with_strategy(bars, &self.engine, strategy.as_mut(), params)?;
        tracing::debug!(?params, net_profit = report.summary.net_profit, "sweep run done");
        Ok(SweepEntry {
            params: report.params,
            summary: report.summary,
            fingerprint: report.fingerprint,
        })
    }
}

/// Sweep over a strategy from the built-in registry.
pub fn registry_sweep(
    engine: EngineConfig,
    strategy: String,
) -> ParamSweep<impl Fn(&Params) -> Result<BoxedStrategy, RunError> + Sync> {
    ParamSweep::new(engine, move |params: &Params| build_strategy(&strategy, params))
}

/// Results from a parameter sweep, in grid order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepResults {
    entries: Vec<SweepEntry>,
}

impl SweepResults {
    /// Returns all results as a slice.
    pub fn all(&self) -> &[SweepEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns results sorted by net profit (descending). Ties keep grid order.
    pub fn sorted_by_net_profit(&self) -> Vec<&SweepEntry> {
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by(|a, b| {
            b.summary
                .net_profit
                .partial_cmp(&a.summary.net_profit)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }

    /// Returns the top N results by net profit.
    pub fn top_n(&self, n: usize) -> Vec<&SweepEntry> {
        self.sorted_by_net_profit().into_iter().take(n).collect()
    }

    pub fn best(&self) -> Option<&SweepEntry> {
        self.sorted_by_net_profit().into_iter().next()
    }
}
